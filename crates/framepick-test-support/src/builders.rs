//! Synthetic image builders for testing.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use framepick_core::{BatchItem, DecodedImage};
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, Rgb, RgbImage};

/// A generated test image with a name, ready to be encoded.
#[derive(Debug, Clone)]
pub struct SyntheticImage {
    /// Identifier used as the batch item name.
    pub name: String,
    /// Pixels.
    pub rgb: RgbImage,
}

impl SyntheticImage {
    fn new(name: &str, rgb: RgbImage) -> Self {
        Self {
            name: name.to_string(),
            rgb,
        }
    }

    /// Renames the image.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    /// The pixels as the scorer sees them after decoding.
    #[must_use]
    pub fn decoded(&self) -> DecodedImage {
        DecodedImage::new(self.rgb.clone())
    }

    /// Lossless PNG encoding.
    ///
    /// # Panics
    ///
    /// Panics if encoding fails, which only happens for zero-sized images.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn png(&self) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        self.rgb
            .write_to(&mut buf, ImageFormat::Png)
            .expect("PNG encoding of a synthetic image");
        buf.into_inner()
    }

    /// JPEG encoding at the given quality (1-100).
    ///
    /// # Panics
    ///
    /// Panics if encoding fails, which only happens for zero-sized images.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn jpeg(&self, quality: u8) -> Vec<u8> {
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, quality)
            .encode_image(&self.rgb)
            .expect("JPEG encoding of a synthetic image");
        buf
    }

    /// JPEG encoding carrying an Exif Orientation tag, as cameras write for
    /// pictures taken with the device turned.
    ///
    /// The pixels are stored as-is; `orientation` (1-8) tells viewers how to
    /// turn them.
    #[must_use]
    pub fn jpeg_with_orientation(&self, quality: u8, orientation: u16) -> Vec<u8> {
        let jpeg = self.jpeg(quality);
        let [hi, lo] = orientation.to_be_bytes();
        // APP1: "Exif\0\0", big-endian TIFF header, one IFD entry (0x0112, SHORT, 1)
        let app1: [u8; 36] = [
            0xFF, 0xE1, 0x00, 0x22, b'E', b'x', b'i', b'f', 0x00, 0x00, b'M', b'M', 0x00, 0x2A,
            0x00, 0x00, 0x00, 0x08, 0x00, 0x01, 0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01,
            hi, lo, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        let mut out = Vec::with_capacity(jpeg.len() + app1.len());
        out.extend_from_slice(&jpeg[..2]);
        out.extend_from_slice(&app1);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    /// A batch item carrying the PNG encoding.
    #[must_use]
    pub fn batch_item(&self) -> BatchItem {
        BatchItem::new(self.name.clone(), self.png())
    }

    /// Writes the image into `dir` as `<stem>.png` and returns the path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_png(&self, dir: &Path, stem: &str) -> Result<PathBuf> {
        let path = dir.join(format!("{stem}.png"));
        std::fs::write(&path, self.png())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Writes the image into `dir` as `<stem>.jpg` and returns the path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_jpeg(&self, dir: &Path, stem: &str, quality: u8) -> Result<PathBuf> {
        let path = dir.join(format!("{stem}.jpg"));
        std::fs::write(&path, self.jpeg(quality))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

/// Builder for creating synthetic test images.
///
/// Provides convenience methods for generating images with specific
/// characteristics (sharp, flat, dark, noisy, etc.).
pub struct SyntheticImageBuilder;

impl SyntheticImageBuilder {
    // === Sharp/High-Contrast Images ===

    /// Creates a high-contrast checkerboard pattern (very sharp edges).
    #[must_use]
    pub fn checkerboard(width: u32, height: u32) -> SyntheticImage {
        Self::checkerboard_with_cell_size(width, height, 8)
    }

    /// Creates a checkerboard with custom cell size.
    #[must_use]
    pub fn checkerboard_with_cell_size(width: u32, height: u32, cell_size: u32) -> SyntheticImage {
        let cell = cell_size.max(1);
        let img = RgbImage::from_fn(width, height, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        SyntheticImage::new("checkerboard", img)
    }

    /// Creates vertical bars pattern (sharp edges).
    #[must_use]
    pub fn vertical_bars(width: u32, height: u32, bar_width: u32) -> SyntheticImage {
        let bar = bar_width.max(1);
        let img = RgbImage::from_fn(width, height, |x, _| {
            if (x / bar) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        SyntheticImage::new("vertical_bars", img)
    }

    /// Dark left part and bright right part, switching at column `edge`.
    #[must_use]
    pub fn step_edge(width: u32, height: u32, edge: u32) -> SyntheticImage {
        let img = RgbImage::from_fn(width, height, |x, _| {
            if x < edge {
                Rgb([20, 20, 20])
            } else {
                Rgb([230, 230, 230])
            }
        });
        SyntheticImage::new("step_edge", img)
    }

    /// Bright rows above row `edge`, dark rows from it down.
    #[must_use]
    pub fn bright_over_dark(width: u32, height: u32, edge: u32) -> SyntheticImage {
        let img = RgbImage::from_fn(width, height, |_, y| {
            if y < edge {
                Rgb([230, 230, 230])
            } else {
                Rgb([20, 20, 20])
            }
        });
        SyntheticImage::new("bright_over_dark", img)
    }

    // === Flat Images ===

    /// Creates a uniform gray image (no edges).
    #[must_use]
    pub fn uniform_gray(width: u32, height: u32, value: u8) -> SyntheticImage {
        let img = RgbImage::from_pixel(width, height, Rgb([value, value, value]));
        SyntheticImage::new("uniform_gray", img)
    }

    /// Creates a smooth horizontal gradient (low Laplacian response).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn horizontal_gradient(width: u32, height: u32) -> SyntheticImage {
        let img = RgbImage::from_fn(width, height, |x, _| {
            let val = ((u32::from(u8::MAX) * x) / width.max(1)) as u8;
            Rgb([val, val, val])
        });
        SyntheticImage::new("horizontal_gradient", img)
    }

    /// Creates an RGB color image.
    #[must_use]
    pub fn rgb_uniform(width: u32, height: u32, r: u8, g: u8, b: u8) -> SyntheticImage {
        let img = RgbImage::from_pixel(width, height, Rgb([r, g, b]));
        SyntheticImage::new("rgb_uniform", img)
    }

    /// Deterministic pseudo-random colour noise; compresses poorly.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn noise(width: u32, height: u32, seed: u64) -> SyntheticImage {
        let mut state = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        let mut next = move || {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (state >> 33) as u8
        };
        let img = RgbImage::from_fn(width, height, |_, _| Rgb([next(), next(), next()]));
        SyntheticImage::new("noise", img)
    }

    // === Special Test Images ===

    /// Creates a 1x1 pixel gray image (edge case).
    #[must_use]
    pub fn single_pixel(value: u8) -> SyntheticImage {
        Self::uniform_gray(1, 1, value).named("1x1")
    }
}

/// Convenience functions for common test inputs.
impl SyntheticImageBuilder {
    /// Returns a standard sharp test image (128x128 checkerboard).
    #[must_use]
    pub fn sharp_image() -> SyntheticImage {
        Self::checkerboard(128, 128)
    }

    /// Returns a standard flat test image (128x128 mid-gray).
    #[must_use]
    pub fn flat_image() -> SyntheticImage {
        Self::uniform_gray(128, 128, 128)
    }

    /// PNG bytes of a single black pixel.
    #[must_use]
    pub fn black_pixel_png() -> Vec<u8> {
        Self::single_pixel(0).png()
    }

    /// A JPEG that stops right after its JFIF header.
    #[must_use]
    pub fn truncated_jpeg() -> Vec<u8> {
        vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F']
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkerboard_dimensions() {
        let img = SyntheticImageBuilder::checkerboard(100, 80);
        assert_eq!(img.width(), 100);
        assert_eq!(img.height(), 80);
        assert_eq!(img.name, "checkerboard");
    }

    #[test]
    fn test_checkerboard_pattern() {
        let img = SyntheticImageBuilder::checkerboard_with_cell_size(16, 16, 8);
        assert_eq!(img.rgb.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(img.rgb.get_pixel(8, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_step_edge() {
        let img = SyntheticImageBuilder::step_edge(10, 4, 5);
        assert_eq!(img.rgb.get_pixel(4, 0).0[0], 20);
        assert_eq!(img.rgb.get_pixel(5, 3).0[0], 230);
    }

    #[test]
    fn test_orientation_tag_spliced_after_soi() {
        let img = SyntheticImageBuilder::bright_over_dark(16, 8, 4);
        let bytes = img.jpeg_with_orientation(90, 6);
        assert_eq!(&bytes[..4], &[0xFF, 0xD8, 0xFF, 0xE1]);
        assert_eq!(&bytes[6..10], b"Exif");
        assert_eq!(bytes.len(), img.jpeg(90).len() + 36);
    }

    #[test]
    fn test_encodings_decode() {
        let img = SyntheticImageBuilder::horizontal_gradient(32, 16);
        for bytes in [img.png(), img.jpeg(90)] {
            let decoded = framepick_core::decode(&bytes).unwrap_or_else(|e| panic!("{e}"));
            assert_eq!((decoded.width, decoded.height), (32, 16));
        }
    }

    #[test]
    fn test_noise_is_deterministic() {
        let a = SyntheticImageBuilder::noise(16, 16, 7);
        let b = SyntheticImageBuilder::noise(16, 16, 7);
        let c = SyntheticImageBuilder::noise(16, 16, 8);
        assert_eq!(a.rgb, b.rgb);
        assert_ne!(a.rgb, c.rgb);
    }

    #[test]
    fn test_truncated_jpeg_does_not_decode() {
        assert!(framepick_core::decode(&SyntheticImageBuilder::truncated_jpeg()).is_err());
    }

    #[test]
    fn test_batch_item_named() {
        let item = SyntheticImageBuilder::sharp_image().named("a.png").batch_item();
        assert_eq!(item.name, "a.png");
        assert!(!item.bytes.is_empty());
    }
}
