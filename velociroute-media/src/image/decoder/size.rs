use crate::Image;
use ::image::imageops::{self, FilterType};
use anyhow::{bail, Result};

pub trait ResizeImage {
    fn resize_to(&mut self, size: (u32, u32)) -> Result<()>;
    fn resize_into(&self, size: (u32, u32)) -> Result<Self>
    where
        Self: Sized;
}

impl ResizeImage for Image {
    fn resize_to(&mut self, size: (u32, u32)) -> Result<()> {
        if size.0 == 0 || size.1 == 0 {
            bail!("Cannot resize image to {}x{}", size.0, size.1);
        }
        if self.get_size() == size {
            return Ok(());
        }

        self.frame = imageops::resize(&self.frame, size.0, size.1, FilterType::Triangle);
        Ok(())
    }

    fn resize_into(&self, size: (u32, u32)) -> Result<Self> {
        let mut new = self.clone();
        new.resize_to(size)?;
        Ok(new)
    }
}
