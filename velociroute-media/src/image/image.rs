use ::image::{ImageFormat, RgbImage};

/// A decoded picture held as packed RGB24 rows.
#[derive(Debug, Clone)]
pub struct Image {
    pub(crate) frame: RgbImage,
    pub(crate) format: Option<ImageFormat>,
}

impl Image {
    pub fn from_rgb(frame: RgbImage) -> Self {
        Self {
            frame,
            format: None,
        }
    }

    pub fn get_width(&self) -> u32 {
        self.frame.width()
    }

    pub fn get_height(&self) -> u32 {
        self.frame.height()
    }

    pub fn get_size(&self) -> (u32, u32) {
        self.frame.dimensions()
    }

    /// Container format the image was decoded from, if it came from encoded bytes.
    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    /// Interleaved `RGBRGB...` bytes, row major.
    pub fn raw_data(&self) -> &[u8] {
        self.frame.as_raw()
    }
}
