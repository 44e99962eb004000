//! Top-N selection.

use std::num::NonZeroUsize;

use crate::domain::RankedResult;
use crate::error::ConfigError;

/// Default number of images selected from a batch.
pub const DEFAULT_TOP_N: usize = 3;

/// Converts a configured count into a ranking size.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidTopN`] for zero.
pub fn top_n(n: usize) -> Result<NonZeroUsize, ConfigError> {
    NonZeroUsize::new(n).ok_or(ConfigError::InvalidTopN)
}

/// Positions in `results` of the best `top_n` scored results, highest score
/// first.
///
/// Results without a score are skipped. The sort is stable, so equal scores
/// keep their input order.
#[must_use]
pub fn rank_positions(results: &[RankedResult], top_n: NonZeroUsize) -> Vec<usize> {
    let mut scored: Vec<(f64, usize)> = results
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.score().map(|s| (s, i)))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored
        .into_iter()
        .take(top_n.get())
        .map(|(_, i)| i)
        .collect()
}
