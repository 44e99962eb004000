//! Summed-area tables for constant-time rectangle sums.

use image::GrayImage;

/// Upright, squared and (optionally) 45°-rotated integral images of one
/// pyramid level.
///
/// Upright tables have one extra row and column: entry `(x, y)` holds the sum
/// of all pixels strictly above and to the left.
#[derive(Debug)]
pub(crate) struct IntegralImages {
    stride: usize,
    sum: Vec<i64>,
    sq_sum: Vec<i64>,
    tilted: Option<TiltedIntegral>,
}

impl IntegralImages {
    pub fn new(gray: &GrayImage, with_tilted: bool) -> Self {
        let (width, height) = gray.dimensions();
        let (w, h) = (width as usize, height as usize);
        let stride = w + 1;
        let mut sum = vec![0_i64; stride * (h + 1)];
        let mut sq_sum = vec![0_i64; stride * (h + 1)];

        for y in 0..h {
            let mut row = 0_i64;
            let mut row_sq = 0_i64;
            for x in 0..w {
                let v = i64::from(gray.as_raw()[y * w + x]);
                row += v;
                row_sq += v * v;
                let idx = (y + 1) * stride + x + 1;
                sum[idx] = sum[idx - stride] + row;
                sq_sum[idx] = sq_sum[idx - stride] + row_sq;
            }
        }

        Self {
            stride,
            sum,
            sq_sum,
            tilted: with_tilted.then(|| TiltedIntegral::new(gray)),
        }
    }

    /// Sum of the upright rectangle at `(x, y)` with size `w`×`h`.
    pub fn rect_sum(&self, x: u32, y: u32, w: u32, h: u32) -> i64 {
        Self::table_sum(&self.sum, self.stride, x, y, w, h)
    }

    /// Sum of squared pixels over the upright rectangle.
    pub fn rect_sq_sum(&self, x: u32, y: u32, w: u32, h: u32) -> i64 {
        Self::table_sum(&self.sq_sum, self.stride, x, y, w, h)
    }

    /// Sum of the 45°-rotated rectangle whose top corner is `(x, y)`.
    ///
    /// The rectangle extends `w` pixels down-right and `h` pixels down-left.
    /// Returns 0 when the tilted table was not built.
    pub fn tilted_sum(&self, x: u32, y: u32, w: u32, h: u32) -> i64 {
        self.tilted.as_ref().map_or(0, |t| {
            let (x, y, w, h) = (i64::from(x), i64::from(y), i64::from(w), i64::from(h));
            t.at(x, y) - t.at(x - h, y + h) - t.at(x + w, y + w) + t.at(x + w - h, y + w + h)
        })
    }

    fn table_sum(table: &[i64], stride: usize, x: u32, y: u32, w: u32, h: u32) -> i64 {
        let (x, y, w, h) = (x as usize, y as usize, w as usize, h as usize);
        let top = y * stride;
        let bottom = (y + h) * stride;
        table[top + x] - table[top + x + w] - table[bottom + x] + table[bottom + x + w]
    }
}

/// Rotated summed-area table.
///
/// `T(X, Y)` is the sum of pixels `(x, y)` with `y < Y` and
/// `|x - X + 1| <= Y - y - 1`: a triangle opening upward from just above
/// `(X - 1, Y)`. Columns are padded by `height + 1` on both sides so that
/// rotated rectangles touching the left or right border need no clipping.
#[derive(Debug)]
struct TiltedIntegral {
    pad: i64,
    cols: usize,
    data: Vec<i64>,
}

impl TiltedIntegral {
    fn new(gray: &GrayImage) -> Self {
        let (width, height) = gray.dimensions();
        let (w, h) = (i64::from(width), i64::from(height));
        let pad = h + 1;
        let cols = usize::try_from(w + 2 * pad + 1).unwrap_or(0);
        let rows = usize::try_from(h + 1).unwrap_or(0);
        let mut t = Self {
            pad,
            cols,
            data: vec![0; cols * rows],
        };

        let pixel = |x: i64, y: i64| -> i64 {
            if x < 0 || y < 0 || x >= w || y >= h {
                return 0;
            }
            u32::try_from(x)
                .ok()
                .zip(u32::try_from(y).ok())
                .map_or(0, |(x, y)| i64::from(gray.get_pixel(x, y).0[0]))
        };

        for y in 1..=h {
            for x in -pad..=w + pad {
                let up_left = if x > -pad { t.at(x - 1, y - 1) } else { 0 };
                let up_right = if x < w + pad { t.at(x + 1, y - 1) } else { 0 };
                let overlap = if y >= 2 { t.at(x, y - 2) } else { 0 };
                let value =
                    up_left + up_right - overlap + pixel(x - 1, y - 1) + pixel(x - 1, y - 2);
                let idx = t.index(x, y);
                t.data[idx] = value;
            }
        }

        t
    }

    fn index(&self, x: i64, y: i64) -> usize {
        let col = usize::try_from(x + self.pad).unwrap_or(0);
        let row = usize::try_from(y).unwrap_or(0);
        row * self.cols + col
    }

    fn at(&self, x: i64, y: i64) -> i64 {
        self.data[self.index(x, y)]
    }
}

#[cfg(test)]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
mod tests {
    use super::*;
    use image::Luma;

    fn pattern(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| Luma([((x * 37 + y * 91 + x * y) % 256) as u8]))
    }

    fn brute_rect(img: &GrayImage, x: u32, y: u32, w: u32, h: u32) -> i64 {
        let mut s = 0;
        for yy in y..y + h {
            for xx in x..x + w {
                s += i64::from(img.get_pixel(xx, yy).0[0]);
            }
        }
        s
    }

    fn brute_tilted(img: &GrayImage, big_x: i64, big_y: i64) -> i64 {
        let mut s = 0;
        for y in 0..i64::from(img.height()) {
            for x in 0..i64::from(img.width()) {
                if y < big_y && (x - big_x + 1).abs() <= big_y - y - 1 {
                    s += i64::from(img.get_pixel(x as u32, y as u32).0[0]);
                }
            }
        }
        s
    }

    #[test]
    fn test_upright_sums_match_brute_force() {
        let img = pattern(13, 9);
        let ii = IntegralImages::new(&img, false);
        for (x, y, w, h) in [(0, 0, 13, 9), (2, 3, 4, 5), (12, 8, 1, 1), (5, 0, 0, 3)] {
            assert_eq!(ii.rect_sum(x, y, w, h), brute_rect(&img, x, y, w, h));
        }
    }

    #[test]
    fn test_squared_sums() {
        let img = GrayImage::from_pixel(4, 4, Luma([3]));
        let ii = IntegralImages::new(&img, false);
        assert_eq!(ii.rect_sq_sum(0, 0, 4, 4), 16 * 9);
        assert_eq!(ii.rect_sq_sum(1, 1, 2, 2), 4 * 9);
    }

    #[test]
    fn test_tilted_table_matches_definition() {
        let img = pattern(11, 7);
        let t = TiltedIntegral::new(&img);
        for y in 0..=7 {
            for x in -8..=19 {
                assert_eq!(t.at(x, y), brute_tilted(&img, x, y), "T({x}, {y})");
            }
        }
    }

    #[test]
    fn test_unit_tilted_rect_on_flat_image() {
        let img = GrayImage::from_pixel(12, 12, Luma([1]));
        let ii = IntegralImages::new(&img, true);
        // a 1x1 rotated square covers two pixels
        assert_eq!(ii.tilted_sum(5, 3, 1, 1), 2);
        assert_eq!(ii.tilted_sum(5, 3, 2, 2), 8);
    }

    #[test]
    fn test_tilted_sum_without_table() {
        let img = GrayImage::from_pixel(6, 6, Luma([9]));
        let ii = IntegralImages::new(&img, false);
        assert_eq!(ii.tilted_sum(2, 0, 2, 2), 0);
    }
}
