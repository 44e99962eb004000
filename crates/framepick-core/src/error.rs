//! Error taxonomy for the scoring core.
//!
//! Three kinds of failure with very different blast radius:
//! - [`DecodeError`]: one image could not be read; the batch carries on.
//! - [`SetupError`]: a cascade definition failed to load; nothing can be scored.
//! - [`ConfigError`]: weights or detector parameters are invalid; rejected at startup.

use std::path::PathBuf;

use thiserror::Error;

/// Stable tag reported for images that could not be decoded.
pub const DECODE_ERROR_TAG: &str = "cannot_decode_image";

/// Stable tag reported for inputs whose bytes could not be read at all.
pub const READ_ERROR_TAG: &str = "cannot_read_image";

/// Per-image decode failure.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// No bytes were supplied.
    #[error("cannot_decode_image: input is empty")]
    Empty,
    /// The bytes are not a recognisable, complete image.
    #[error("cannot_decode_image: {0}")]
    Malformed(#[from] image::ImageError),
}

impl DecodeError {
    /// Machine-readable tag for result listings.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        DECODE_ERROR_TAG
    }
}

/// Fatal failure while loading cascade definitions.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The cascade file could not be read.
    #[error("failed to read cascade {}: {source}", path.display())]
    Io {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The XML document is not well formed.
    #[error("cascade is not valid XML: {0}")]
    Xml(#[from] roxmltree::Error),
    /// The document is XML but not a usable cascade.
    #[error("malformed cascade: {0}")]
    Malformed(String),
    /// The cascade uses a flavour this engine does not evaluate.
    #[error("unsupported cascade: {0}")]
    Unsupported(String),
    /// A cascade failed to load; wraps the underlying error with the detector name.
    #[error("failed to load {name} cascade: {source}")]
    Detector {
        /// Which detector (`face`, `eye`, `smile`).
        name: &'static str,
        /// What went wrong.
        #[source]
        source: Box<SetupError>,
    },
}

/// Invalid scoring or detection configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A weight is negative or not finite.
    #[error("weight `{name}` must be a finite, non-negative number, got {value}")]
    InvalidWeight {
        /// Weight name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
    /// A normalisation parameter is out of range.
    #[error("`{name}` must be finite and positive, got {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
    /// Cascade scale step must be greater than one.
    #[error("{detector} scale factor must be finite and > 1.0, got {value}")]
    InvalidScaleFactor {
        /// Which detector.
        detector: &'static str,
        /// Offending value.
        value: f64,
    },
    /// Minimum detection size must be non-zero.
    #[error("{detector} minimum size must be non-zero, got {width}x{height}")]
    InvalidMinSize {
        /// Which detector.
        detector: &'static str,
        /// Configured width.
        width: u32,
        /// Configured height.
        height: u32,
    },
    /// Ranking requires at least one slot.
    #[error("top_n must be at least 1")]
    InvalidTopN,
}
