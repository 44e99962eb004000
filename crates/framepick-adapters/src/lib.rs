//! framepick adapters - external adapters for framepick.
//!
//! This crate provides adapters for:
//! - Filesystem image source
//! - Size capping before scoring
//! - Cascade downloading and caching
//! - Directory selection store

pub mod compress;
pub mod fs;
pub mod models;
pub mod store;

pub use compress::{compress_for_scoring, DEFAULT_MAX_KB};
pub use fs::FsImageSource;
pub use models::{default_cascades_dir, CascadeStore, CASCADES};
pub use store::DirectoryStore;
