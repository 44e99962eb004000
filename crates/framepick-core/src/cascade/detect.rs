//! Sliding-window evaluation over an image pyramid.

use std::borrow::Cow;

use image::{GrayImage, Luma};
use tracing::trace;

use super::group::{group_rectangles, Rect, GROUP_EPS};
use super::integral::IntegralImages;
use super::model::{CascadeClassifier, HaarFeature, WeakClassifier};
use crate::domain::DetectionRegion;
use crate::error::ConfigError;

/// Multi-scale detection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectParams {
    /// Ratio between consecutive pyramid levels; must exceed 1.0.
    pub scale_factor: f64,
    /// Raw hits a cluster needs (strictly more than this) to be reported.
    pub min_neighbors: u32,
    /// Smallest window, in source pixels, that is considered.
    pub min_size: (u32, u32),
}

impl DetectParams {
    /// Creates a parameter set.
    #[must_use]
    pub const fn new(scale_factor: f64, min_neighbors: u32, min_size: (u32, u32)) -> Self {
        Self {
            scale_factor,
            min_neighbors,
            min_size,
        }
    }

    /// Checks the parameters, naming `detector` in any error.
    ///
    /// # Errors
    ///
    /// Returns an error if the scale factor is not finite and above 1.0 or if
    /// either minimum dimension is zero.
    pub fn validate(&self, detector: &'static str) -> Result<(), ConfigError> {
        if !self.scale_factor.is_finite() || self.scale_factor <= 1.0 {
            return Err(ConfigError::InvalidScaleFactor {
                detector,
                value: self.scale_factor,
            });
        }
        if self.min_size.0 == 0 || self.min_size.1 == 0 {
            return Err(ConfigError::InvalidMinSize {
                detector,
                width: self.min_size.0,
                height: self.min_size.1,
            });
        }
        Ok(())
    }
}

/// Outcome of running the cascade on one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Accepted,
    Rejected { stage: usize },
}

impl CascadeClassifier {
    /// Finds objects of every size in `gray`.
    ///
    /// Windows are scanned on a pyramid of downscaled copies, accepted windows
    /// are mapped back to source coordinates, and overlapping hits are merged.
    /// Returns an empty list for images smaller than the cascade window.
    #[must_use]
    pub fn detect_multi_scale(&self, gray: &GrayImage, params: &DetectParams) -> Vec<DetectionRegion> {
        let raw = self.scan_pyramid(gray, params);
        let raw_count = raw.len();
        let grouped = group_rectangles(raw, params.min_neighbors, GROUP_EPS);
        trace!("{} raw hits grouped into {}", raw_count, grouped.len());

        grouped
            .into_iter()
            .map(|r| {
                DetectionRegion::new(
                    u32::try_from(r.x).unwrap_or(0),
                    u32::try_from(r.y).unwrap_or(0),
                    u32::try_from(r.width).unwrap_or(0),
                    u32::try_from(r.height).unwrap_or(0),
                )
            })
            .filter(|r| r.width > 0 && r.height > 0)
            .collect()
    }

    fn scan_pyramid(&self, gray: &GrayImage, params: &DetectParams) -> Vec<Rect> {
        let (img_w, img_h) = gray.dimensions();
        let mut hits = Vec::new();
        if !(params.scale_factor.is_finite() && params.scale_factor > 1.0) {
            return hits;
        }

        let mut factor = 1.0_f64;
        loop {
            let scaled_w = round_u32(f64::from(img_w) / factor);
            let scaled_h = round_u32(f64::from(img_h) / factor);
            if scaled_w <= self.window_width || scaled_h <= self.window_height {
                break;
            }

            let window_w = round_u32(f64::from(self.window_width) * factor);
            let window_h = round_u32(f64::from(self.window_height) * factor);

            if window_w >= params.min_size.0 && window_h >= params.min_size.1 {
                let level: Cow<'_, GrayImage> = if scaled_w == img_w && scaled_h == img_h {
                    Cow::Borrowed(gray)
                } else {
                    Cow::Owned(resize_bilinear(gray, scaled_w, scaled_h))
                };
                self.scan_level(&level, factor, (window_w, window_h), &mut hits);
            }

            factor *= params.scale_factor;
        }

        hits
    }

    fn scan_level(&self, level: &GrayImage, factor: f64, window: (u32, u32), hits: &mut Vec<Rect>) {
        let ii = IntegralImages::new(level, self.has_tilted);
        let step = if factor > 2.0 { 1 } else { 2 };
        let max_x = level.width() - self.window_width;
        let max_y = level.height() - self.window_height;
        let (window_w, window_h) = (
            i32::try_from(window.0).unwrap_or(i32::MAX),
            i32::try_from(window.1).unwrap_or(i32::MAX),
        );

        let mut y = 0;
        while y <= max_y {
            let mut x = 0;
            while x <= max_x {
                match self.evaluate(&ii, x, y) {
                    Verdict::Accepted => hits.push(Rect::new(
                        round_i32(f64::from(x) * factor),
                        round_i32(f64::from(y) * factor),
                        window_w,
                        window_h,
                    )),
                    // failing the very first stage means the neighbourhood is flat
                    Verdict::Rejected { stage: 0 } => x += step,
                    Verdict::Rejected { .. } => {}
                }
                x += step;
            }
            y += step;
        }
    }

    /// Runs all stages on the window whose top-left corner is `(x, y)`.
    #[allow(clippy::cast_precision_loss)]
    fn evaluate(&self, ii: &IntegralImages, x: u32, y: u32) -> Verdict {
        let (w, h) = (self.window_width, self.window_height);
        let inv_norm = if w > 2 && h > 2 {
            let (nw, nh) = (w - 2, h - 2);
            let area = f64::from(nw * nh);
            let sum = ii.rect_sum(x + 1, y + 1, nw, nh) as f64;
            let sq_sum = ii.rect_sq_sum(x + 1, y + 1, nw, nh) as f64;
            let variance = area * sq_sum - sum * sum;
            if variance > 0.0 {
                1.0 / variance.sqrt()
            } else {
                1.0
            }
        } else {
            1.0
        };

        for (idx, stage) in self.stages.iter().enumerate() {
            let total: f64 = stage
                .classifiers
                .iter()
                .map(|wc| self.tree_response(wc, ii, x, y, inv_norm))
                .sum();
            if total < f64::from(stage.threshold) {
                return Verdict::Rejected { stage: idx };
            }
        }
        Verdict::Accepted
    }

    fn tree_response(
        &self,
        wc: &WeakClassifier,
        ii: &IntegralImages,
        x: u32,
        y: u32,
        inv_norm: f64,
    ) -> f64 {
        let mut idx = 0_i32;
        loop {
            let Some(node) = usize::try_from(idx).ok().and_then(|i| wc.nodes.get(i)) else {
                return 0.0;
            };
            let value = feature_value(&self.features[node.feature], ii, x, y) * inv_norm;
            idx = if value < f64::from(node.threshold) {
                node.left
            } else {
                node.right
            };
            if idx <= 0 {
                let leaf = usize::try_from(-i64::from(idx)).unwrap_or(usize::MAX);
                return wc.leaves.get(leaf).map_or(0.0, |&v| f64::from(v));
            }
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn feature_value(feature: &HaarFeature, ii: &IntegralImages, x: u32, y: u32) -> f64 {
    feature
        .rects
        .iter()
        .map(|r| {
            let (rx, ry) = (x + r.x, y + r.y);
            let sum = if feature.tilted {
                ii.tilted_sum(rx, ry, r.width, r.height)
            } else {
                ii.rect_sum(rx, ry, r.width, r.height)
            };
            f64::from(r.weight) * sum as f64
        })
        .sum()
}

/// Bilinear resampling at half-pixel centres without a low-pass prefilter,
/// the way OpenCV's `INTER_LINEAR` shrinks pyramid levels.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn resize_bilinear(src: &GrayImage, width: u32, height: u32) -> GrayImage {
    let (src_w, src_h) = src.dimensions();
    let cols: Vec<Tap> = (0..width).map(|x| Tap::new(x, src_w, width)).collect();
    let rows: Vec<Tap> = (0..height).map(|y| Tap::new(y, src_h, height)).collect();
    let px = |x: u32, y: u32| f64::from(src.get_pixel(x, y).0[0]);

    GrayImage::from_fn(width, height, |x, y| {
        let (c, r) = (&cols[x as usize], &rows[y as usize]);
        let top = px(c.lo, r.lo).mul_add(1.0 - c.frac, px(c.hi, r.lo) * c.frac);
        let bottom = px(c.lo, r.hi).mul_add(1.0 - c.frac, px(c.hi, r.hi) * c.frac);
        let v = top.mul_add(1.0 - r.frac, bottom * r.frac);
        Luma([v.round().clamp(0.0, 255.0) as u8])
    })
}

/// The two source samples a destination coordinate interpolates between.
struct Tap {
    lo: u32,
    hi: u32,
    frac: f64,
}

impl Tap {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn new(dst: u32, src_len: u32, dst_len: u32) -> Self {
        let pos = (f64::from(dst) + 0.5).mul_add(f64::from(src_len) / f64::from(dst_len), -0.5);
        let last = src_len.saturating_sub(1);
        if pos <= 0.0 {
            return Self { lo: 0, hi: 0, frac: 0.0 };
        }
        let lo = pos.floor();
        let i = lo as u32;
        if i >= last {
            return Self {
                lo: last,
                hi: last,
                frac: 0.0,
            };
        }
        Self {
            lo: i,
            hi: i + 1,
            frac: pos - lo,
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_u32(v: f64) -> u32 {
    v.round_ties_even().max(0.0) as u32
}

#[allow(clippy::cast_possible_truncation)]
fn round_i32(v: f64) -> i32 {
    v.round_ties_even() as i32
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const EDGE_CASCADE: &str = r#"<?xml version="1.0"?>
<opencv_storage>
<cascade type_id="opencv-cascade-classifier"><stageType>BOOST</stageType>
  <featureType>HAAR</featureType>
  <height>4</height>
  <width>4</width>
  <stages>
    <_>
      <stageThreshold>0.</stageThreshold>
      <weakClassifiers>
        <_>
          <internalNodes>0 -1 0 0.5</internalNodes>
          <leafValues>-1. 1.</leafValues></_></weakClassifiers></_></stages>
  <features>
    <_>
      <rects>
        <_>0 0 2 4 -1.</_>
        <_>2 0 2 4 1.</_></rects></_></features></cascade>
</opencv_storage>
"#;

    /// Stage 0: a two-node tree that passes a vertical edge (right half
    /// brighter) or a horizontal one (bottom half brighter). Stage 1: a stump
    /// that only passes the horizontal edge.
    const TWO_STAGE_CASCADE: &str = r#"<?xml version="1.0"?>
<opencv_storage>
<cascade type_id="opencv-cascade-classifier"><stageType>BOOST</stageType>
  <featureType>HAAR</featureType>
  <height>4</height>
  <width>4</width>
  <stages>
    <_>
      <stageThreshold>0.</stageThreshold>
      <weakClassifiers>
        <_>
          <internalNodes>1 -2 0 0.5 0 -1 1 0.5</internalNodes>
          <leafValues>-1. 0.5 1.</leafValues></_></weakClassifiers></_>
    <_>
      <stageThreshold>0.</stageThreshold>
      <weakClassifiers>
        <_>
          <internalNodes>0 -1 1 0.5</internalNodes>
          <leafValues>-1. 1.</leafValues></_></weakClassifiers></_></stages>
  <features>
    <_>
      <rects>
        <_>0 0 2 4 -1.</_>
        <_>2 0 2 4 1.</_></rects></_>
    <_>
      <rects>
        <_>0 0 4 2 -1.</_>
        <_>0 2 4 2 1.</_></rects></_></features></cascade>
</opencv_storage>
"#;

    /// A stump on the plain window sum with a threshold of 20.
    const WINDOW_SUM_CASCADE: &str = r#"<?xml version="1.0"?>
<opencv_storage>
<cascade type_id="opencv-cascade-classifier"><stageType>BOOST</stageType>
  <featureType>HAAR</featureType>
  <height>4</height>
  <width>4</width>
  <stages>
    <_>
      <stageThreshold>0.</stageThreshold>
      <weakClassifiers>
        <_>
          <internalNodes>0 -1 0 20.</internalNodes>
          <leafValues>-1. 1.</leafValues></_></weakClassifiers></_></stages>
  <features>
    <_>
      <rects>
        <_>0 0 4 4 1.</_></rects></_></features></cascade>
</opencv_storage>
"#;

    /// A stump on a 45-degree feature: a 2x2 rotated square minus twice a
    /// 1x1 one, thresholded at 100.
    const TILTED_CASCADE: &str = r#"<?xml version="1.0"?>
<opencv_storage>
<cascade type_id="opencv-cascade-classifier"><stageType>BOOST</stageType>
  <featureType>HAAR</featureType>
  <height>4</height>
  <width>4</width>
  <stages>
    <_>
      <stageThreshold>0.</stageThreshold>
      <weakClassifiers>
        <_>
          <internalNodes>0 -1 0 100.</internalNodes>
          <leafValues>-1. 1.</leafValues></_></weakClassifiers></_></stages>
  <features>
    <_>
      <rects>
        <_>2 0 2 2 1.</_>
        <_>1 0 1 1 -2.</_></rects>
      <tilted>1</tilted></_></features></cascade>
</opencv_storage>
"#;

    fn parse(xml: &str) -> CascadeClassifier {
        CascadeClassifier::from_xml(xml).unwrap_or_else(|e| panic!("{e}"))
    }

    fn edge_cascade() -> CascadeClassifier {
        parse(EDGE_CASCADE)
    }

    /// Dark left half, bright right half, edge at `x = edge`.
    fn step_image(width: u32, height: u32, edge: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| if x < edge { Luma([20]) } else { Luma([230]) })
    }

    #[test]
    fn test_params_validation() {
        assert!(DetectParams::new(1.1, 5, (30, 30)).validate("face").is_ok());
        assert_eq!(
            DetectParams::new(1.0, 5, (30, 30)).validate("face"),
            Err(ConfigError::InvalidScaleFactor {
                detector: "face",
                value: 1.0
            })
        );
        assert!(DetectParams::new(f64::NAN, 5, (30, 30)).validate("eye").is_err());
        assert_eq!(
            DetectParams::new(1.2, 3, (0, 10)).validate("eye"),
            Err(ConfigError::InvalidMinSize {
                detector: "eye",
                width: 0,
                height: 10
            })
        );
    }

    #[test]
    fn test_uniform_image_has_no_hits() {
        let cascade = edge_cascade();
        let img = GrayImage::from_pixel(40, 40, Luma([128]));
        let params = DetectParams::new(1.25, 0, (4, 4));
        assert!(cascade.detect_multi_scale(&img, &params).is_empty());
    }

    #[test]
    fn test_edge_found_near_step() {
        let cascade = edge_cascade();
        let img = step_image(40, 40, 20);
        let params = DetectParams::new(1.25, 0, (4, 4));
        let hits = cascade.detect_multi_scale(&img, &params);
        assert!(!hits.is_empty());
        for r in &hits {
            assert!(
                r.x <= 20 + r.width && r.x + r.width + r.width >= 20,
                "hit {r:?} far from the edge"
            );
        }
    }

    #[test]
    fn test_min_size_skips_small_windows() {
        let cascade = edge_cascade();
        let img = step_image(40, 40, 20);
        let params = DetectParams::new(1.25, 0, (12, 12));
        let hits = cascade.detect_multi_scale(&img, &params);
        assert!(hits.iter().all(|r| r.width >= 12 && r.height >= 12));
    }

    #[test]
    fn test_image_smaller_than_window() {
        let cascade = edge_cascade();
        let img = step_image(4, 4, 2);
        let params = DetectParams::new(1.1, 0, (1, 1));
        assert!(cascade.detect_multi_scale(&img, &params).is_empty());
    }

    #[test]
    fn test_single_window_accept_and_reject() {
        let cascade = edge_cascade();
        let edge = IntegralImages::new(&step_image(4, 4, 2), false);
        assert_eq!(cascade.evaluate(&edge, 0, 0), Verdict::Accepted);

        let flat = IntegralImages::new(&GrayImage::from_pixel(4, 4, Luma([90])), false);
        assert_eq!(cascade.evaluate(&flat, 0, 0), Verdict::Rejected { stage: 0 });
    }

    /// Dark top half, bright bottom half, edge at `y = edge`.
    fn bottom_bright(width: u32, height: u32, edge: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |_, y| if y < edge { Luma([20]) } else { Luma([230]) })
    }

    #[allow(clippy::cast_possible_truncation)]
    fn pattern(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| Luma([((x * 37 + y * 91 + x * y) % 256) as u8]))
    }

    /// Pixels of the rotated rectangle with top corner `(x, y)`, reaching `w`
    /// down-right and `h` down-left, summed pixel by pixel along diagonals.
    fn brute_tilted_rect(img: &GrayImage, x: u32, y: u32, w: u32, h: u32) -> i64 {
        let (x, y, w, h) = (i64::from(x), i64::from(y), i64::from(w), i64::from(h));
        let mut sum = 0;
        for (px, py, p) in img.enumerate_pixels() {
            let (px, py) = (i64::from(px), i64::from(py));
            let along = px + py;
            let across = py - px;
            if along > x + y - 2
                && along <= x + y - 2 + 2 * w
                && across > y - x
                && across <= y - x + 2 * h
            {
                sum += i64::from(p.0[0]);
            }
        }
        sum
    }

    #[test]
    fn test_two_node_tree_and_second_stage() {
        let cascade = parse(TWO_STAGE_CASCADE);
        assert_eq!(cascade.stage_count(), 2);
        assert_eq!(cascade.stages[0].classifiers[0].nodes.len(), 2);

        // Inner 2x2 of either edge holds 20, 230, 20, 230: 4 * 106600 - 500^2 = 420^2.
        // Either feature sums to 8 * 230 - 8 * 20 = 1680, normalised 1680 / 420 = 4.
        //
        // Vertical edge: node 0 sends it to leaf 2 (1.0), stage 1 sees 0 and rejects.
        let vertical = IntegralImages::new(&step_image(4, 4, 2), false);
        assert_eq!(cascade.evaluate(&vertical, 0, 0), Verdict::Rejected { stage: 1 });

        // Horizontal edge: node 0 sees 0 and defers to node 1, which returns 0.5.
        let horizontal = IntegralImages::new(&bottom_bright(4, 4, 2), false);
        assert_eq!(cascade.evaluate(&horizontal, 0, 0), Verdict::Accepted);

        // Flat: node 0 -> node 1 -> leaf 0 (-1.0).
        let flat = IntegralImages::new(&GrayImage::from_pixel(4, 4, Luma([90])), false);
        assert_eq!(cascade.evaluate(&flat, 0, 0), Verdict::Rejected { stage: 0 });
    }

    #[test]
    fn test_two_stage_cascade_scans_only_horizontal_edges() {
        let cascade = parse(TWO_STAGE_CASCADE);
        let params = DetectParams::new(1.25, 0, (4, 4));
        assert!(!cascade.detect_multi_scale(&bottom_bright(40, 40, 20), &params).is_empty());
        assert!(cascade.detect_multi_scale(&step_image(40, 40, 20), &params).is_empty());
    }

    #[test]
    fn test_variance_normalisation_changes_verdict() {
        let cascade = parse(WINDOW_SUM_CASCADE);

        // Flat 2: no variance, so the raw sum 32 is compared with 20.
        let flat = IntegralImages::new(&GrayImage::from_pixel(4, 4, Luma([2])), false);
        assert_eq!(cascade.evaluate(&flat, 0, 0), Verdict::Accepted);

        // One inner pixel raised to 4: the raw sum grows to 34, but the inner
        // 2x2 (4, 2, 2, 2) gives 4 * 28 - 10^2 = 12, and 34 / sqrt(12) < 20.
        let mut bumped = GrayImage::from_pixel(4, 4, Luma([2]));
        bumped.put_pixel(1, 1, Luma([4]));
        let bumped = IntegralImages::new(&bumped, false);
        assert_eq!(bumped.rect_sum(0, 0, 4, 4), 34);
        assert_eq!(cascade.evaluate(&bumped, 0, 0), Verdict::Rejected { stage: 0 });
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn test_tilted_feature_matches_brute_force() {
        let cascade = parse(TILTED_CASCADE);
        assert!(cascade.has_tilted);
        let feature = &cascade.features[0];

        let img = pattern(11, 9);
        let ii = IntegralImages::new(&img, cascade.has_tilted);
        for (wx, wy) in [(0, 0), (3, 2), (7, 5), (5, 0)] {
            let expected: f64 = feature
                .rects
                .iter()
                .map(|r| {
                    f64::from(r.weight)
                        * brute_tilted_rect(&img, wx + r.x, wy + r.y, r.width, r.height) as f64
                })
                .sum();
            let got = feature_value(feature, &ii, wx, wy);
            assert!((got - expected).abs() < 1e-9, "window ({wx}, {wy}): {got} vs {expected}");
        }
    }

    #[test]
    fn test_tilted_feature_verdict() {
        let cascade = parse(TILTED_CASCADE);
        // flat v: 8 pixels * v - 2 * (2 pixels * v) = 4v against 100
        for (value, verdict) in [
            (10, Verdict::Rejected { stage: 0 }),
            (30, Verdict::Accepted),
        ] {
            let img = GrayImage::from_pixel(6, 6, Luma([value]));
            let ii = IntegralImages::new(&img, cascade.has_tilted);
            assert_eq!(cascade.evaluate(&ii, 1, 1), verdict, "flat {value}");
        }
    }

    #[test]
    fn test_grouping_merges_edge_hits() {
        let cascade = edge_cascade();
        let img = step_image(40, 40, 20);
        let raw = cascade.detect_multi_scale(&img, &DetectParams::new(1.25, 0, (4, 4)));
        let grouped = cascade.detect_multi_scale(&img, &DetectParams::new(1.25, 1, (4, 4)));
        assert!(grouped.len() <= raw.len());
    }

    #[test]
    fn test_pyramid_shrink_interpolates_between_neighbours() {
        let src = GrayImage::from_fn(3, 1, |x, _| Luma([[0, 100, 200][x as usize]]));
        let out = resize_bilinear(&src, 2, 1);
        // centres land at 0.25 and 1.75 source pixels
        assert_eq!(out.get_pixel(0, 0).0[0], 25);
        assert_eq!(out.get_pixel(1, 0).0[0], 175);
    }

    #[test]
    fn test_pyramid_shrink_has_no_prefilter() {
        // every fourth column bright; a 4x shrink samples between columns 1 and 2
        let src = GrayImage::from_fn(16, 16, |x, _| Luma([if x % 4 == 0 { 255 } else { 0 }]));
        let out = resize_bilinear(&src, 4, 4);
        assert!(out.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_pyramid_edges_clamp_to_border() {
        let src = GrayImage::from_fn(2, 2, |x, y| Luma([u8::try_from(x * 10 + y * 100).unwrap()]));
        let out = resize_bilinear(&src, 4, 4);
        assert_eq!(out.get_pixel(0, 0).0[0], 0);
        assert_eq!(out.get_pixel(3, 3).0[0], 110);
        assert_eq!(out.get_pixel(3, 0).0[0], 10);
    }
}
