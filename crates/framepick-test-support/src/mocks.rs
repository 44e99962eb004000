//! Mock implementations of core port traits.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::bail;
use framepick_core::detection::{FaceCrop, FeatureDetector};
use framepick_core::domain::{BatchItem, BatchReport, DetectionRegion, RankedResult};
use framepick_core::ports::{
    ImageSource, ProgressEvent, ProgressSink, ResultOutput, SelectionStore, StoredImage,
};
use image::GrayImage;

/// Mock implementation of `ImageSource` for testing.
///
/// Yields pre-built items and tracks iteration for assertions.
pub struct MockImageSource {
    items: Vec<BatchItem>,
    iteration_count: Arc<Mutex<usize>>,
}

impl MockImageSource {
    /// Creates a new mock source with the given items.
    #[must_use]
    pub fn new(items: Vec<BatchItem>) -> Self {
        Self {
            items,
            iteration_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Creates an empty mock source.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(vec![])
    }

    /// Returns the number of times the source has been iterated.
    #[must_use]
    pub fn iteration_count(&self) -> usize {
        *self
            .iteration_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl ImageSource for MockImageSource {
    fn items(&self) -> Box<dyn Iterator<Item = anyhow::Result<BatchItem>> + Send + '_> {
        if let Ok(mut c) = self.iteration_count.lock() {
            *c += 1;
        }
        Box::new(self.items.iter().cloned().map(Ok))
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

/// Mock implementation of `ResultOutput` for testing.
///
/// Captures reports for later assertions.
pub struct MockResultOutput {
    reports: Arc<Mutex<Vec<(BatchReport, Vec<StoredImage>)>>>,
    flush_count: Arc<Mutex<usize>>,
}

impl MockResultOutput {
    /// Creates a new mock output.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reports: Arc::new(Mutex::new(Vec::new())),
            flush_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Returns all captured reports with their stored selections.
    #[must_use]
    pub fn reports(&self) -> Vec<(BatchReport, Vec<StoredImage>)> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of times `flush()` was called.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        *self
            .flush_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockResultOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultOutput for MockResultOutput {
    fn write_report(&self, report: &BatchReport, saved: &[StoredImage]) -> anyhow::Result<()> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((report.clone(), saved.to_vec()));
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        if let Ok(mut c) = self.flush_count.lock() {
            *c += 1;
        }
        Ok(())
    }
}

/// Mock implementation of `ProgressSink` for testing.
///
/// Captures events for later assertions.
pub struct MockProgressSink {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl MockProgressSink {
    /// Creates a new mock progress sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of `Started` events.
    #[must_use]
    pub fn started_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Started { .. }))
            .count()
    }

    /// Returns the number of `Completed` events.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Completed { .. }))
            .count()
    }

    /// Returns the number of `Skipped` events.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Skipped { .. }))
            .count()
    }

    /// Returns the `(scored, failed)` counts of the `Finished` event, if any.
    #[must_use]
    pub fn finished_counts(&self) -> Option<(usize, usize)> {
        self.events().iter().find_map(|e| match e {
            ProgressEvent::Finished { scored, failed } => Some((*scored, *failed)),
            _ => None,
        })
    }
}

impl Default for MockProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for MockProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Mock implementation of `FeatureDetector` for testing.
///
/// Reports a fixed face list for every image and a fixed number of eyes and
/// smiles per face. Counts calls for assertions.
pub struct MockDetector {
    faces: Vec<DetectionRegion>,
    eyes_per_face: usize,
    smiles_per_face: usize,
    face_calls: Arc<Mutex<usize>>,
}

impl MockDetector {
    /// A detector that finds nothing.
    #[must_use]
    pub fn none() -> Self {
        Self::new(vec![], 0, 0)
    }

    /// A detector with the given faces and per-face feature counts.
    #[must_use]
    pub fn new(faces: Vec<DetectionRegion>, eyes_per_face: usize, smiles_per_face: usize) -> Self {
        Self {
            faces,
            eyes_per_face,
            smiles_per_face,
            face_calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Returns how many images were searched for faces.
    #[must_use]
    pub fn face_calls(&self) -> usize {
        *self
            .face_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl FeatureDetector for MockDetector {
    fn detect_faces(&self, _gray: &GrayImage) -> Vec<DetectionRegion> {
        if let Ok(mut c) = self.face_calls.lock() {
            *c += 1;
        }
        self.faces.clone()
    }

    fn detect_eyes(&self, face: &FaceCrop) -> Vec<DetectionRegion> {
        vec![DetectionRegion::new(0, 0, face.region.width.min(2), 1); self.eyes_per_face]
    }

    fn detect_smiles(&self, face: &FaceCrop) -> Vec<DetectionRegion> {
        vec![DetectionRegion::new(0, 0, face.region.width.min(3), 1); self.smiles_per_face]
    }
}

/// Mock implementation of `SelectionStore` for testing.
///
/// Records what was stored; can be told to fail for specific files.
pub struct MockSelectionStore {
    stored: Arc<Mutex<Vec<StoredImage>>>,
    failing: HashSet<String>,
}

impl MockSelectionStore {
    /// Creates a store that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stored: Arc::new(Mutex::new(Vec::new())),
            failing: HashSet::new(),
        }
    }

    /// Makes `store` fail for `filename`.
    #[must_use]
    pub fn failing_for(mut self, filename: impl Into<String>) -> Self {
        self.failing.insert(filename.into());
        self
    }

    /// Returns everything stored so far.
    #[must_use]
    pub fn stored(&self) -> Vec<StoredImage> {
        self.stored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for MockSelectionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionStore for MockSelectionStore {
    fn store(&self, result: &RankedResult, rank: usize) -> anyhow::Result<StoredImage> {
        if self.failing.contains(&result.filename) {
            bail!("refusing to store {}", result.filename);
        }
        let mut stored = self.stored.lock().unwrap_or_else(PoisonError::into_inner);
        let saved_as = format!("stored-{}.jpg", stored.len());
        let image = StoredImage {
            filename: result.filename.clone(),
            rank,
            url: format!("memory://{saved_as}"),
            saved_as,
            score: result.score().unwrap_or_default(),
        };
        stored.push(image.clone());
        Ok(image)
    }
}
