//! Single-image and batch scoring.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::decode::decode;
use crate::detection::{detect_with_gray, FeatureDetector};
use crate::domain::{
    BatchItem, BatchReport, DecodedImage, RankedResult, ScoreBreakdown, ScoreOutcome,
};
use crate::error::{ConfigError, DecodeError, READ_ERROR_TAG};
use crate::metrics::{laplacian_variance, Histogram};
use crate::ports::{ProgressEvent, ProgressSink};
use crate::ranking::rank_positions;
use crate::scoring::ScoringConfig;

/// Scores images with a fixed detector and configuration.
///
/// Holds no per-image state; one scorer can be shared by any number of
/// threads and every score depends only on its own image.
#[derive(Clone)]
pub struct Scorer {
    detector: Arc<dyn FeatureDetector>,
    config: ScoringConfig,
}

impl fmt::Debug for Scorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scorer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Scorer {
    /// Creates a scorer.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn new(detector: Arc<dyn FeatureDetector>, config: ScoringConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { detector, config })
    }

    /// The scoring configuration in use.
    #[must_use]
    pub const fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Scores an already decoded image.
    #[must_use]
    pub fn score_image(&self, image: &DecodedImage) -> ScoreBreakdown {
        let gray = image.to_gray();
        let sharpness = laplacian_variance(&gray);
        let brightness = Histogram::from_luma(&gray).mean();
        let found = detect_with_gray(self.detector.as_ref(), image, &gray);
        self.config
            .compose(sharpness, brightness, found.faces, found.eyes_open, found.smiles)
    }

    /// Decodes and scores encoded image bytes.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the bytes are not a decodable image.
    pub fn score_bytes(&self, bytes: &[u8]) -> Result<ScoreBreakdown, DecodeError> {
        let image = decode(bytes)?;
        Ok(self.score_image(&image))
    }

    /// Scores one batch item, turning read and decode failures into a failed
    /// result.
    #[must_use]
    pub fn score_item(&self, item: &BatchItem) -> RankedResult {
        if let Some(ref reason) = item.read_error {
            return RankedResult::failed(
                item.name.clone(),
                READ_ERROR_TAG,
                Some(reason.clone()),
                item.bytes.clone(),
            );
        }
        match self.score_bytes(item.scoring_bytes().as_slice()) {
            Ok(breakdown) => {
                debug!("{}: score {}", item.name, breakdown.score());
                RankedResult::scored(item.name.clone(), breakdown, item.bytes.clone())
            }
            Err(e) => {
                warn!("{}: {e}", item.name);
                RankedResult::failed(
                    item.name.clone(),
                    e.tag(),
                    Some(e.to_string()),
                    item.bytes.clone(),
                )
            }
        }
    }

    /// Scores a batch in parallel and ranks it.
    ///
    /// `all` keeps input order and includes failures; `top` holds at most
    /// `top_n` scored images, best first.
    #[must_use]
    pub fn score_batch(&self, items: Vec<BatchItem>, top_n: NonZeroUsize) -> BatchReport {
        self.score_batch_with_progress(items, top_n, None)
    }

    /// Like [`Scorer::score_batch`], reporting progress to `progress`.
    #[must_use]
    pub fn score_batch_with_progress(
        &self,
        items: Vec<BatchItem>,
        top_n: NonZeroUsize,
        progress: Option<&dyn ProgressSink>,
    ) -> BatchReport {
        let total = items.len();
        info!("Scoring {} images", total);

        let all: Vec<RankedResult> = items
            .par_iter()
            .enumerate()
            .map(|(index, item)| {
                if let Some(sink) = progress {
                    sink.on_event(ProgressEvent::Started {
                        name: item.name.clone(),
                        index,
                        total,
                    });
                }
                let result = self.score_item(item);
                if let Some(sink) = progress {
                    sink.on_event(match &result.outcome {
                        ScoreOutcome::Scored(_) => ProgressEvent::Completed {
                            result: result.clone(),
                        },
                        ScoreOutcome::Failed { error, .. } => {
                            ProgressEvent::Skipped {
                                name: result.filename.clone(),
                                reason: error.clone(),
                            }
                        }
                    });
                }
                result
            })
            .collect();

        let positions = rank_positions(&all, top_n);
        let report = BatchReport::new(all, positions);

        let scored = report.scored_count();
        info!("Scored {} of {} images", scored, total);
        if let Some(sink) = progress {
            sink.on_event(ProgressEvent::Finished {
                scored,
                failed: total - scored,
            });
        }
        report
    }
}
