//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the scoring core and external adapters.

mod image_source;
mod progress;
mod result_output;
mod selection_store;

pub use image_source::ImageSource;
pub use progress::{ProgressEvent, ProgressSink};
pub use result_output::ResultOutput;
pub use selection_store::{SelectionStore, StoredImage};
