//! Mean-luminance brightness.

use image::GrayImage;

use crate::domain::DecodedImage;

/// Brightness of a decoded image: mean luminance in `[0, 255]`.
#[must_use]
pub fn brightness(image: &DecodedImage) -> f64 {
    Histogram::from_luma(&image.to_gray()).mean()
}

/// 256-bin histogram of luminance values.
#[derive(Debug, Clone)]
pub struct Histogram {
    bins: [u64; 256],
    total: u64,
}

impl Histogram {
    /// Compute histogram from grayscale image.
    #[must_use]
    pub fn from_luma(image: &GrayImage) -> Self {
        let mut bins = [0u64; 256];
        for pixel in image.pixels() {
            bins[usize::from(pixel.0[0])] += 1;
        }
        let total = bins.iter().sum();
        Self { bins, total }
    }

    /// Calculate mean luminance.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let sum: u64 = self
            .bins
            .iter()
            .zip(0u64..)
            .map(|(&count, level)| level * count)
            .sum();
        sum as f64 / self.total as f64
    }
}
