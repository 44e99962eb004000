//! Laplacian-variance sharpness.

use image::GrayImage;

use crate::domain::DecodedImage;

/// Sharpness of a decoded image: variance of the Laplacian of its luminance.
///
/// Higher means more high-frequency detail. In-focus photos typically land
/// in the tens to hundreds; blurred or flat images approach zero.
#[must_use]
pub fn sharpness(image: &DecodedImage) -> f64 {
    laplacian_variance(&image.to_gray())
}

/// Variance of the 4-neighbour Laplacian response.
///
/// Kernel `[0 1 0; 1 -4 1; 0 1 0]` with reflect-101 borders; every pixel
/// contributes one response value.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return 0.0;
    }

    let px = |x: u32, y: u32| i32::from(gray.get_pixel(x, y).0[0]);

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for y in 0..height {
        let up = reflect_101(i64::from(y) - 1, height);
        let down = reflect_101(i64::from(y) + 1, height);
        for x in 0..width {
            let left = reflect_101(i64::from(x) - 1, width);
            let right = reflect_101(i64::from(x) + 1, width);

            let response =
                px(x, up) + px(x, down) + px(left, y) + px(right, y) - 4 * px(x, y);
            let response = f64::from(response);
            sum += response;
            sum_sq += response * response;
        }
    }

    let n = f64::from(width) * f64::from(height);
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0)
}

/// Mirrors an out-of-range coordinate without repeating the edge pixel.
fn reflect_101(i: i64, len: u32) -> u32 {
    let len = i64::from(len);
    if len == 1 {
        return 0;
    }
    let mut i = i;
    while i < 0 || i >= len {
        i = if i < 0 { -i } else { 2 * (len - 1) - i };
    }
    u32::try_from(i).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_flat_image_is_zero() {
        let img = GrayImage::from_fn(32, 32, |_, _| Luma([137u8]));
        assert!(laplacian_variance(&img).abs() < f64::EPSILON);
    }

    #[test]
    fn test_single_pixel_is_zero() {
        let img = GrayImage::from_fn(1, 1, |_, _| Luma([255u8]));
        assert!(laplacian_variance(&img).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_image_is_zero() {
        let img = GrayImage::new(0, 0);
        assert!(laplacian_variance(&img).abs() < f64::EPSILON);
    }

    #[test]
    fn test_checkerboard_is_sharp() {
        let img = GrayImage::from_fn(64, 64, |x, y| {
            if (x / 4 + y / 4) % 2 == 0 {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        });
        let v = laplacian_variance(&img);
        assert!(v > 1000.0, "checkerboard variance should be large, got {v}");
    }

    #[test]
    fn test_smooth_gradient_less_sharp_than_edges() {
        let gradient = GrayImage::from_fn(64, 64, |x, _| Luma([(x * 4) as u8]));
        let bars = GrayImage::from_fn(64, 64, |x, _| {
            Luma([if (x / 8) % 2 == 0 { 255u8 } else { 0 }])
        });
        assert!(laplacian_variance(&gradient) < laplacian_variance(&bars));
    }

    #[test]
    fn test_single_spike_matches_hand_computation() {
        // 3x3 with one bright centre. Reflect-101 borders make each edge
        // midpoint see the centre twice (+200); the centre gives -400 and
        // the corners 0.
        let mut img = GrayImage::new(3, 3);
        img.put_pixel(1, 1, Luma([100u8]));
        let v = laplacian_variance(&img);

        let values = [-400.0, 200.0, 200.0, 200.0, 200.0, 0.0, 0.0, 0.0, 0.0];
        let mean: f64 = values.iter().sum::<f64>() / 9.0;
        let expected: f64 = values.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / 9.0;
        assert!((v - expected).abs() < 1e-9, "got {v}, expected {expected}");
    }

    #[test]
    fn test_image_without_interior_still_measured() {
        // 2x2 has no interior pixel; every response comes from mirrored
        // borders: -400, 200, 200, 0
        let mut img = GrayImage::new(2, 2);
        img.put_pixel(0, 0, Luma([100u8]));
        assert!((laplacian_variance(&img) - 60_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(2, 5), 2);
        assert_eq!(reflect_101(-1, 1), 0);
        assert_eq!(reflect_101(-1, 2), 1);
    }
}
