//! Result output port for writing batch reports.

use super::StoredImage;
use crate::domain::BatchReport;

/// Port for outputting scoring results.
pub trait ResultOutput: Send + Sync {
    /// Writes the report of one batch together with the stored selection.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_report(&self, report: &BatchReport, saved: &[StoredImage]) -> anyhow::Result<()>;

    /// Flushes any buffered output.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    fn flush(&self) -> anyhow::Result<()>;
}
