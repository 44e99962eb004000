//! framepick core - photo scoring and ranking
//!
//! Decodes candidate photos, measures sharpness and brightness, counts faces,
//! open eyes and smiles with Haar cascades, combines everything into one score
//! and picks the best images of a batch.

pub mod cascade;
pub mod decode;
pub mod detection;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod ports;
pub mod ranking;
pub mod scoring;

pub use cascade::{CascadeClassifier, DetectParams};
pub use decode::decode;
pub use detection::{
    detect, CascadeBank, CascadePaths, Detections, DetectorSettings, FaceCrop, FeatureDetector,
    LazyCascadeBank,
};
pub use domain::{
    BatchItem, BatchReport, DecodedImage, DetectionRegion, ImageBytes, RankedResult,
    ScoreBreakdown, ScoreOutcome,
};
pub use error::{ConfigError, DecodeError, SetupError, DECODE_ERROR_TAG, READ_ERROR_TAG};
pub use metrics::{brightness, sharpness};
pub use pipeline::Scorer;
pub use ports::{
    ImageSource, ProgressEvent, ProgressSink, ResultOutput, SelectionStore, StoredImage,
};
pub use ranking::{rank_positions, top_n, DEFAULT_TOP_N};
pub use scoring::{BrightnessCurve, Normalization, ScoreWeights, ScoringConfig};
