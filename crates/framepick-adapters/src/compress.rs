//! Size capping of images before scoring.

use framepick_core::decode;
use image::codecs::jpeg::JpegEncoder;
use tracing::debug;

/// Size above which images are recompressed, in kilobytes.
pub const DEFAULT_MAX_KB: u64 = 700;

const START_QUALITY: u8 = 85;
const MIN_QUALITY: u8 = 30;
const QUALITY_STEP: u8 = 10;

/// Re-encodes images larger than `max_kb` as JPEG.
///
/// Tries quality 85, 75, ... 35 and returns the first encoding that fits,
/// otherwise the last one tried. The copy carries no metadata, so any Exif
/// rotation is applied to its pixels. Inputs already small enough, and inputs
/// that cannot be decoded or re-encoded, are returned unchanged.
#[must_use]
pub fn compress_for_scoring(bytes: &[u8], max_kb: u64) -> Vec<u8> {
    let limit = max_kb.saturating_mul(1024);
    if bytes.len() as u64 <= limit {
        return bytes.to_vec();
    }

    let Ok(img) = decode(bytes) else {
        return bytes.to_vec();
    };
    let rgb = img.rgb();

    let mut last = None;
    let mut quality = START_QUALITY;
    while quality >= MIN_QUALITY {
        let mut buf = Vec::new();
        if JpegEncoder::new_with_quality(&mut buf, quality)
            .encode_image(rgb)
            .is_err()
        {
            return bytes.to_vec();
        }
        debug!("Recompressed at quality {}: {} bytes", quality, buf.len());
        if buf.len() as u64 <= limit {
            return buf;
        }
        last = Some(buf);
        quality -= QUALITY_STEP;
    }

    last.unwrap_or_else(|| bytes.to_vec())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use image::{ImageFormat, Rgb, RgbImage};

    fn noisy_png(size: u32) -> Vec<u8> {
        let mut state = 12_345_u32;
        let img = RgbImage::from_fn(size, size, |_, _| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let v = state.to_be_bytes();
            Rgb([v[0], v[1], v[2]])
        });
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_small_input_unchanged() {
        let bytes = vec![1u8; 100];
        assert_eq!(compress_for_scoring(&bytes, 1), bytes);
    }

    #[test]
    fn test_undecodable_input_unchanged() {
        let bytes = vec![7u8; 4096];
        assert_eq!(compress_for_scoring(&bytes, 1), bytes);
    }

    #[test]
    fn test_large_png_becomes_jpeg() {
        let png = noisy_png(256);
        assert!(png.len() > 64 * 1024);

        let out = compress_for_scoring(&png, 64);
        assert!(out.len() < png.len());
        assert_eq!(&out[..2], &[0xFF, 0xD8]);
        assert!(image::load_from_memory(&out).is_ok());
    }

    #[test]
    fn test_unreachable_limit_returns_last_attempt() {
        let png = noisy_png(128);
        let out = compress_for_scoring(&png, 0);
        assert_eq!(&out[..2], &[0xFF, 0xD8]);
    }
}
