//! Encoded bytes to pixels.

use std::io::Cursor;

use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageError, ImageReader};
use tracing::trace;

use crate::domain::DecodedImage;
use crate::error::DecodeError;

/// Decodes JPEG, PNG, TIFF, WebP, BMP or GIF bytes into an RGB buffer.
///
/// The container format is sniffed from the bytes; file names play no part.
/// An Exif orientation tag is applied, so pictures taken with the camera
/// turned come out upright. Alpha is discarded and 16-bit images are reduced
/// to 8 bits per channel.
///
/// # Errors
///
/// Returns [`DecodeError::Empty`] for empty input and
/// [`DecodeError::Malformed`] for unrecognised, truncated or corrupt data.
pub fn decode(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(ImageError::IoError)?
        .into_decoder()?;
    // unreadable metadata leaves the pixels as stored
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut img = DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);
    trace!("Decoded {}x{} image ({} bytes)", img.width(), img.height(), bytes.len());
    Ok(DecodedImage::from_dynamic(&img))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use image::{ImageFormat, Rgb, RgbImage};

    fn encode(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_decode_png() {
        let img = RgbImage::from_pixel(3, 2, Rgb([10, 20, 30]));
        let decoded = decode(&encode(&img, ImageFormat::Png)).unwrap();
        assert_eq!((decoded.width, decoded.height), (3, 2));
        assert_eq!(decoded.rgb().get_pixel(2, 1), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_decode_jpeg() {
        let img = RgbImage::from_pixel(16, 16, Rgb([128, 128, 128]));
        let decoded = decode(&encode(&img, ImageFormat::Jpeg)).unwrap();
        assert_eq!((decoded.width, decoded.height), (16, 16));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(decode(&[]), Err(DecodeError::Empty)));
    }

    #[test]
    fn test_garbage_input() {
        let err = decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
        assert_eq!(err.tag(), "cannot_decode_image");
    }

    #[test]
    fn test_truncated_jpeg_header() {
        let bytes = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn test_truncated_png() {
        let img = RgbImage::from_pixel(32, 32, Rgb([200, 10, 10]));
        let bytes = encode(&img, ImageFormat::Png);
        assert!(decode(&bytes[..bytes.len() / 2]).is_err());
    }
}
