//! Progress reporting port for UI integration.

use crate::domain::RankedResult;

/// Events emitted while a batch is scored.
///
/// Items are scored in parallel, so `Started` and `Completed` events of
/// different images interleave in no particular order.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Scoring started for an image.
    Started {
        /// Image identifier.
        name: String,
        /// Index in the batch (0-based).
        index: usize,
        /// Total images in the batch.
        total: usize,
    },
    /// An image was scored.
    Completed {
        /// The scored result.
        result: RankedResult,
    },
    /// An image could not be scored.
    Skipped {
        /// Image identifier.
        name: String,
        /// Reason for skipping.
        reason: String,
    },
    /// All images have been processed.
    Finished {
        /// Images scored.
        scored: usize,
        /// Images that failed.
        failed: usize,
    },
}

/// Port for receiving progress events.
pub trait ProgressSink: Send + Sync {
    /// Called when a progress event occurs.
    fn on_event(&self, event: ProgressEvent);
}
