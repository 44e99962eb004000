//! Per-image score breakdown.

use serde::Serialize;

/// The immutable result of scoring one image.
///
/// Built once by [`crate::scoring::ScoringConfig::compose`]; fields are only
/// readable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    score: f64,
    sharpness: f64,
    brightness: f64,
    faces: u32,
    eyes_open: u32,
    smiles: u32,
}

impl ScoreBreakdown {
    pub(crate) const fn new(
        score: f64,
        sharpness: f64,
        brightness: f64,
        faces: u32,
        eyes_open: u32,
        smiles: u32,
    ) -> Self {
        Self {
            score,
            sharpness,
            brightness,
            faces,
            eyes_open,
            smiles,
        }
    }

    /// Combined score. Higher is better.
    #[must_use]
    pub const fn score(&self) -> f64 {
        self.score
    }

    /// Laplacian variance.
    #[must_use]
    pub const fn sharpness(&self) -> f64 {
        self.sharpness
    }

    /// Mean luminance, 0-255.
    #[must_use]
    pub const fn brightness(&self) -> f64 {
        self.brightness
    }

    /// Number of detected faces.
    #[must_use]
    pub const fn faces(&self) -> u32 {
        self.faces
    }

    /// Eye detections accumulated over all faces.
    #[must_use]
    pub const fn eyes_open(&self) -> u32 {
        self.eyes_open
    }

    /// Smile detections accumulated over all faces.
    #[must_use]
    pub const fn smiles(&self) -> u32 {
        self.smiles
    }
}
