use crate::Image;
use anyhow::{bail, Context, Result};
use log::debug;
use std::path::Path;

impl Image {
    pub fn open_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let buffer = std::fs::read(path)
            .with_context(|| format!("Failed to read image file {}", path.display()))?;

        Self::from_bytes(buffer.as_slice())
    }

    pub fn from_bytes(buffer: &[u8]) -> Result<Self> {
        if buffer.is_empty() {
            bail!("Empty image buffer");
        }

        let format = ::image::guess_format(buffer).context("Unrecognized image format")?;
        let decoded = ::image::load_from_memory_with_format(buffer, format)
            .with_context(|| format!("Failed to decode {:?} image", format))?;

        debug!(
            "Decoded {:?} image of {}x{}",
            format,
            decoded.width(),
            decoded.height()
        );

        Ok(Image {
            frame: decoded.to_rgb8(),
            format: Some(format),
        })
    }
}
