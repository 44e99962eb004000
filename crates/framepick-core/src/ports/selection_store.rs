//! Selection store port for persisting the chosen originals.

use serde::Serialize;
use tracing::warn;

use crate::domain::RankedResult;

/// Where a selected original ended up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredImage {
    /// Identifier of the input image.
    pub filename: String,
    /// 1-based place in the selection.
    pub rank: usize,
    /// Generated unique name it was stored under.
    pub saved_as: String,
    /// Locator for retrieving it: a URL or a file path.
    pub url: String,
    /// Score that got it selected.
    pub score: f64,
}

/// Port for storing the originals of selected images.
pub trait SelectionStore: Send + Sync {
    /// Stores one selected image under a fresh unique name.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be written.
    fn store(&self, result: &RankedResult, rank: usize) -> anyhow::Result<StoredImage>;

    /// Stores a ranked selection, best first, logging and skipping the ones
    /// that fail.
    fn store_all(&self, results: &[RankedResult]) -> Vec<StoredImage> {
        results
            .iter()
            .zip(1..)
            .filter_map(|(r, rank)| match self.store(r, rank) {
                Ok(stored) => Some(stored),
                Err(e) => {
                    warn!("Failed to store {}: {e:#}", r.filename);
                    None
                }
            })
            .collect()
    }
}
