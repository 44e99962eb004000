//! Core domain types for scoring and ranking.

mod breakdown;
mod image;
mod region;
mod result;

pub use breakdown::ScoreBreakdown;
pub use image::DecodedImage;
pub use region::DetectionRegion;
pub use result::{BatchItem, BatchReport, ImageBytes, RankedResult, ScoreOutcome};
