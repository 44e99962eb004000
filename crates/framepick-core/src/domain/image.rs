//! Decoded pixel buffers.

use image::{GrayImage, RgbImage};

use crate::metrics::luma_bt601;

/// A decoded, three-channel image owned by the scoring call that produced it.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    rgb: RgbImage,
}

impl DecodedImage {
    /// Wraps an RGB buffer.
    #[must_use]
    pub fn new(rgb: RgbImage) -> Self {
        let (width, height) = rgb.dimensions();
        Self { width, height, rgb }
    }

    /// Converts any decoded image to 8-bit RGB.
    #[must_use]
    pub fn from_dynamic(image: &image::DynamicImage) -> Self {
        Self::new(image.to_rgb8())
    }

    /// The colour pixels.
    #[must_use]
    pub const fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    /// Single-channel luminance (BT.601 weights, as used by the detectors).
    #[must_use]
    pub fn to_gray(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            image::Luma([luma_bt601(self.rgb.get_pixel(x, y).0)])
        })
    }

    /// Returns true when the buffer holds no pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
