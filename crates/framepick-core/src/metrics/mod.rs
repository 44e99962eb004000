//! Objective quality signals computed from a decoded image.
//!
//! Both metrics work on single-channel luminance and are pure functions of
//! the pixels.

mod brightness;
mod sharpness;

pub use brightness::{brightness, Histogram};
pub use sharpness::{laplacian_variance, sharpness};

/// BT.601 luminance in 14-bit fixed point.
///
/// Matches the usual `RGB -> GRAY` conversion exactly, so detectors trained
/// on such grayscale see the same values.
#[inline]
#[must_use]
pub fn luma_bt601([r, g, b]: [u8; 3]) -> u8 {
    const R: u32 = 4899;
    const G: u32 = 9617;
    const B: u32 = 1868;
    let y = (u32::from(r) * R + u32::from(g) * G + u32::from(b) * B + (1 << 13)) >> 14;
    // R + G + B == 1 << 14, so y <= 255
    u8::try_from(y).unwrap_or(u8::MAX)
}
