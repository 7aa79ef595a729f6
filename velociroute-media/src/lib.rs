pub mod image;

pub use crate::image::image::Image;

pub use ::image::{ImageFormat, Rgb, RgbImage};
