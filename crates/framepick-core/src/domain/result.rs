//! Batch-level result records.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::ScoreBreakdown;

/// Shared, immutable handle to the original encoded bytes of an image.
///
/// Cloning is cheap; the bytes are kept around so the selected originals can
/// be stored after ranking.
#[derive(Clone)]
pub struct ImageBytes(Arc<[u8]>);

impl ImageBytes {
    /// Borrow the bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Number of bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no bytes are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ImageBytes {
    fn default() -> Self {
        Self(Arc::from(Vec::new()))
    }
}

impl From<Vec<u8>> for ImageBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Arc::from(bytes))
    }
}

impl From<&[u8]> for ImageBytes {
    fn from(bytes: &[u8]) -> Self {
        Self(Arc::from(bytes))
    }
}

impl AsRef<[u8]> for ImageBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for ImageBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageBytes({} bytes)", self.0.len())
    }
}

/// Either a score breakdown or the reason scoring failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScoreOutcome {
    /// The image was scored.
    Scored(ScoreBreakdown),
    /// The image could not be scored.
    Failed {
        /// Stable error tag, e.g. `cannot_decode_image`.
        error: String,
        /// Human-readable detail.
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
}

impl ScoreOutcome {
    /// The breakdown, if the image was scored.
    #[must_use]
    pub const fn breakdown(&self) -> Option<&ScoreBreakdown> {
        match self {
            Self::Scored(b) => Some(b),
            Self::Failed { .. } => None,
        }
    }

    /// The score, if the image was scored and it is a usable number.
    #[must_use]
    pub fn score(&self) -> Option<f64> {
        self.breakdown()
            .map(ScoreBreakdown::score)
            .filter(|s| s.is_finite())
    }
}

/// One input image of a batch, with its outcome.
#[derive(Debug, Clone, Serialize)]
pub struct RankedResult {
    /// Identifier supplied by the caller (usually the file name).
    pub filename: String,
    /// Score breakdown or failure.
    #[serde(flatten)]
    pub outcome: ScoreOutcome,
    /// Original encoded bytes.
    #[serde(skip)]
    pub original: ImageBytes,
}

impl RankedResult {
    /// A successfully scored image.
    #[must_use]
    pub fn scored(filename: impl Into<String>, breakdown: ScoreBreakdown, original: ImageBytes) -> Self {
        Self {
            filename: filename.into(),
            outcome: ScoreOutcome::Scored(breakdown),
            original,
        }
    }

    /// An image that could not be scored.
    #[must_use]
    pub fn failed(
        filename: impl Into<String>,
        error: impl Into<String>,
        detail: Option<String>,
        original: ImageBytes,
    ) -> Self {
        Self {
            filename: filename.into(),
            outcome: ScoreOutcome::Failed {
                error: error.into(),
                detail,
            },
            original,
        }
    }

    /// The score, if any.
    #[must_use]
    pub fn score(&self) -> Option<f64> {
        self.outcome.score()
    }
}

/// An identifier plus encoded bytes, as handed to the batch scorer.
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// Caller-supplied identifier.
    pub name: String,
    /// Original encoded bytes; these are what gets stored if selected.
    pub bytes: ImageBytes,
    /// Smaller re-encoding to score instead of the original, if any.
    pub scoring_copy: Option<ImageBytes>,
    /// Why the bytes could not be read; such items are reported, never scored.
    pub read_error: Option<String>,
}

impl BatchItem {
    /// Creates a batch item.
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: impl Into<ImageBytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            scoring_copy: None,
            read_error: None,
        }
    }

    /// An input that was found but whose bytes could not be read.
    #[must_use]
    pub fn unreadable(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            read_error: Some(reason.into()),
            ..Self::new(name, ImageBytes::default())
        }
    }

    /// Scores `copy` in place of the original bytes.
    #[must_use]
    pub fn with_scoring_copy(mut self, copy: impl Into<ImageBytes>) -> Self {
        self.scoring_copy = Some(copy.into());
        self
    }

    /// The bytes the scorer should decode.
    #[must_use]
    pub fn scoring_bytes(&self) -> &ImageBytes {
        self.scoring_copy.as_ref().unwrap_or(&self.bytes)
    }
}

/// Ranked subset plus the full, input-ordered result list.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Number of input images.
    pub count: usize,
    /// Best images, highest score first.
    pub top: Vec<RankedResult>,
    /// Every input image in input order, failures included.
    pub all: Vec<RankedResult>,
    /// Index into `all` of each `top` entry.
    #[serde(skip)]
    top_positions: Vec<usize>,
}

impl BatchReport {
    /// Builds a report from every result and the positions of the selected
    /// ones in `all`, best first. Positions past the end are dropped.
    #[must_use]
    pub fn new(all: Vec<RankedResult>, top_positions: Vec<usize>) -> Self {
        let top_positions: Vec<usize> = top_positions
            .into_iter()
            .filter(|&i| i < all.len())
            .collect();
        let top = top_positions.iter().map(|&i| all[i].clone()).collect();
        Self {
            count: all.len(),
            top,
            all,
            top_positions,
        }
    }

    /// 1-based place in `top` of the result at `position` in `all`.
    #[must_use]
    pub fn rank_of(&self, position: usize) -> Option<usize> {
        self.top_positions
            .iter()
            .position(|&i| i == position)
            .map(|i| i + 1)
    }

    /// Number of images that were scored.
    #[must_use]
    pub fn scored_count(&self) -> usize {
        self.all.iter().filter(|r| r.score().is_some()).count()
    }

    /// Images that could not be scored.
    pub fn failures(&self) -> impl Iterator<Item = &RankedResult> {
        self.all.iter().filter(|r| r.score().is_none())
    }
}
