//! Boosted Haar cascade object detection.
//!
//! Evaluates cascades in the XML layout produced by OpenCV's trainer, which is
//! how the stock frontal-face, eye and smile models are distributed.
//!
//! - [`model`]: XML parsing and validation into a [`CascadeClassifier`]
//! - `integral`: upright, squared and rotated summed-area tables
//! - `detect`: pyramid scan and per-window stage evaluation
//! - `group`: merging of overlapping hits

mod detect;
mod group;
mod integral;
pub mod model;

pub use detect::DetectParams;
pub use model::CascadeClassifier;
