//! Combining quality metrics and detection counts into one score.
//!
//! ```text
//! score = w_s * s / (s + k)
//!       + w_b * curve(b) * scale
//!       + w_f * faces
//!       + w_e * eyes_open / 2
//!       + w_m * smiles
//! ```

use crate::domain::ScoreBreakdown;
use crate::error::ConfigError;

/// Per-term weights of the composite score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    /// Normalised sharpness.
    pub sharpness: f64,
    /// Normalised brightness (already scaled by the brightness scale).
    pub brightness: f64,
    /// Per detected face.
    pub faces: f64,
    /// Per pair of open eyes.
    pub eyes_open: f64,
    /// Per detected smile.
    pub smiles: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            sharpness: 1.0,
            brightness: 0.005,
            faces: 1.0,
            eyes_open: 1.5,
            smiles: 2.0,
        }
    }
}

impl ScoreWeights {
    /// Checks that every weight is finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidWeight`] for the first offending weight.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("sharpness", self.sharpness),
            ("brightness", self.brightness),
            ("faces", self.faces),
            ("eyes_open", self.eyes_open),
            ("smiles", self.smiles),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }
        Ok(())
    }
}

/// Shape of the brightness preference curve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BrightnessCurve {
    /// Logistic: rises through the midpoint, favouring brighter images.
    #[default]
    Sigmoid,
    /// Gaussian bump peaking at the midpoint, with sigma = 1 / slope.
    Bell,
}

/// Parameters mapping raw metrics onto `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    /// `k` in `s / (s + k)`; the sharpness at which the term reaches 0.5.
    pub sharpness_smoothing: f64,
    /// Brightness at the centre of the curve.
    pub brightness_midpoint: f64,
    /// Steepness of the curve.
    pub brightness_slope: f64,
    /// Multiplier applied to the normalised brightness before weighting.
    pub brightness_scale: f64,
    /// Curve shape.
    pub curve: BrightnessCurve,
}

impl Default for Normalization {
    fn default() -> Self {
        Self {
            sharpness_smoothing: 50.0,
            brightness_midpoint: 100.0,
            brightness_slope: 0.02,
            brightness_scale: 100.0,
            curve: BrightnessCurve::Sigmoid,
        }
    }
}

impl Normalization {
    /// Checks that every parameter is finite and positive.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidParameter`] for the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("sharpness_smoothing", self.sharpness_smoothing),
            ("brightness_midpoint", self.brightness_midpoint),
            ("brightness_slope", self.brightness_slope),
            ("brightness_scale", self.brightness_scale),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }

    /// Maps a non-negative sharpness onto `[0, 1)`.
    #[must_use]
    pub fn sharpness(&self, sharpness: f64) -> f64 {
        sharpness / (sharpness + self.sharpness_smoothing)
    }

    /// Maps a brightness onto `(0, 1]`.
    #[must_use]
    pub fn brightness(&self, brightness: f64) -> f64 {
        let offset = brightness - self.brightness_midpoint;
        match self.curve {
            BrightnessCurve::Sigmoid => 1.0 / (1.0 + (-self.brightness_slope * offset).exp()),
            BrightnessCurve::Bell => {
                let z = offset * self.brightness_slope;
                (-0.5 * z * z).exp()
            }
        }
    }
}

/// Everything the composer needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    /// Term weights.
    pub weights: ScoreWeights,
    /// Normalisation parameters.
    pub normalization: Normalization,
    /// Decimal places kept in score, sharpness and brightness.
    pub precision: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            normalization: Normalization::default(),
            precision: 3,
        }
    }
}

impl ScoringConfig {
    /// Validates weights and normalisation.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        self.normalization.validate()
    }

    /// Builds the breakdown for one image.
    ///
    /// Non-finite metrics count as 0, sharpness is floored at 0 and
    /// brightness clamped to `[0, 255]`, so the score is always finite for a
    /// validated config.
    #[must_use]
    pub fn compose(
        &self,
        sharpness: f64,
        brightness: f64,
        faces: u32,
        eyes_open: u32,
        smiles: u32,
    ) -> ScoreBreakdown {
        let sharpness = finite_or_zero(sharpness).max(0.0);
        let brightness = finite_or_zero(brightness).clamp(0.0, 255.0);
        let w = &self.weights;
        let n = &self.normalization;

        let score = w.sharpness * n.sharpness(sharpness)
            + w.brightness * n.brightness(brightness) * n.brightness_scale
            + w.faces * f64::from(faces)
            + w.eyes_open * (f64::from(eyes_open) / 2.0)
            + w.smiles * f64::from(smiles);

        ScoreBreakdown::new(
            self.round(finite_or_zero(score)),
            self.round(sharpness),
            self.round(brightness),
            faces,
            eyes_open,
            smiles,
        )
    }

    fn round(&self, value: f64) -> f64 {
        let factor = 10_f64.powi(i32::try_from(self.precision.min(15)).unwrap_or(15));
        let rounded = (value * factor).round() / factor;
        if rounded.is_finite() {
            rounded
        } else {
            value
        }
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}
