//! Test support utilities for framepick.
//!
//! Provides mocks, synthetic image builders, and cascade fixtures for testing
//! the scoring pipeline.
//!
//! # Example
//!
//! ```
//! use framepick_test_support::{MockImageSource, SyntheticImageBuilder};
//!
//! // Create synthetic test images
//! let sharp = SyntheticImageBuilder::checkerboard(128, 128).named("sharp.png");
//! let flat = SyntheticImageBuilder::uniform_gray(128, 128, 128).named("flat.png");
//!
//! // Create mock image source
//! let source = MockImageSource::new(vec![sharp.batch_item(), flat.batch_item()]);
//! ```

mod builders;
pub mod cascades;
mod mocks;

pub use builders::{SyntheticImage, SyntheticImageBuilder};
pub use cascades::{never_firing_bank, write_cascade_set, EDGE_CASCADE, NEVER_FIRES_CASCADE};
pub use mocks::{
    MockDetector, MockImageSource, MockProgressSink, MockResultOutput, MockSelectionStore,
};
