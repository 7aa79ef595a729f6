use anyhow::{bail, Result};
use ndarray::Array4;
use rayon::prelude::*;
use velociroute_media::Image;

/// Per-channel pixel normalization applied while building the input tensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub scale: f32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Default for Normalization {
    fn default() -> Self {
        Self {
            scale: 255.0,
            mean: [0.485, 0.456, 0.406],
            std: [0.229, 0.224, 0.225],
        }
    }
}

impl Normalization {
    /// Raw `0..=255` values, as expected by models with a built-in rescaling layer.
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            mean: [0.0; 3],
            std: [1.0; 3],
        }
    }
}

pub trait ExtraToTensor {
    fn extra_standard_image_to_tensor(&self, normalization: &Normalization) -> Result<Array4<f32>>;
}

impl ExtraToTensor for Image {
    /// Packed RGB24 into a planar `[1, 3, height, width]` tensor.
    fn extra_standard_image_to_tensor(&self, normalization: &Normalization) -> Result<Array4<f32>> {
        if normalization.scale == 0.0 || normalization.std.contains(&0.0) {
            bail!("Normalization scale and std must be non-zero");
        }

        let (width, height) = (self.get_width() as usize, self.get_height() as usize);
        let plane = width * height;
        let raw = self.raw_data();
        if raw.len() != plane * 3 {
            bail!("Expected {} bytes of RGB24 data, got {}", plane * 3, raw.len());
        }

        let mut tensor = vec![0f32; plane * 3];
        tensor
            .par_chunks_mut(plane.max(1))
            .enumerate()
            .for_each(|(channel, values)| {
                let mean = normalization.mean[channel];
                let std = normalization.std[channel];
                for (value, pixel) in values.iter_mut().zip(raw.chunks_exact(3)) {
                    *value = (pixel[channel] as f32 / normalization.scale - mean) / std;
                }
            });

        Ok(Array4::from_shape_vec((1, 3, height, width), tensor)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use velociroute_media::image::decoder::size::ResizeImage;
    use velociroute_media::{Rgb, RgbImage};

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Image {
        Image::from_rgb(RgbImage::from_pixel(width, height, Rgb(rgb)))
    }

    #[test]
    fn planar_layout() {
        let tensor = solid(4, 2, [255, 0, 51])
            .extra_standard_image_to_tensor(&Normalization::identity())
            .unwrap();

        assert_eq!(tensor.shape(), &[1, 3, 2, 4]);
        assert_eq!(tensor[[0, 0, 1, 3]], 255.0);
        assert_eq!(tensor[[0, 1, 0, 0]], 0.0);
        assert_eq!(tensor[[0, 2, 1, 2]], 51.0);
    }

    #[test]
    fn imagenet_normalization() {
        let mut image = solid(100, 50, [128, 128, 128]);
        image.resize_to((224, 224)).unwrap();

        let tensor = image
            .extra_standard_image_to_tensor(&Normalization::default())
            .unwrap();
        let expected = (128.0 / 255.0 - 0.485) / 0.229;

        assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
        assert_abs_diff_eq!(tensor[[0, 0, 0, 0]], expected, epsilon = 1e-4);
        assert_abs_diff_eq!(tensor[[0, 0, 223, 223]], expected, epsilon = 1e-4);
    }

    #[test]
    fn reject_zero_std() {
        let normalization = Normalization {
            std: [1.0, 0.0, 1.0],
            ..Normalization::default()
        };
        assert!(solid(2, 2, [0, 0, 0])
            .extra_standard_image_to_tensor(&normalization)
            .is_err());
    }
}
