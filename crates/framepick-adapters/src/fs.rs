//! Filesystem adapter for loading images.

use std::path::{Path, PathBuf};

use anyhow::Result;
use framepick_core::{BatchItem, ImageSource};
use tracing::{debug, warn};

use crate::compress::compress_for_scoring;

/// Supported image extensions.
const RASTER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "tif", "webp", "bmp", "gif"];

/// Filesystem image source adapter.
///
/// Yields the raw bytes of every supported file. Decoding happens in the
/// scorer, so a corrupt file becomes a failed result rather than a load error.
/// A file that cannot be read is yielded as [`BatchItem::unreadable`].
pub struct FsImageSource {
    paths: Vec<PathBuf>,
    recursive: bool,
    max_kb: Option<u64>,
}

impl FsImageSource {
    /// Creates a new filesystem image source.
    ///
    /// # Arguments
    ///
    /// * `paths` - Files or directories to scan
    /// * `recursive` - Whether to recurse into subdirectories
    #[must_use]
    pub const fn new(paths: Vec<PathBuf>, recursive: bool) -> Self {
        Self {
            paths,
            recursive,
            max_kb: None,
        }
    }

    /// Scores a recompressed copy of files larger than `max_kb` kilobytes.
    #[must_use]
    pub const fn with_max_kb(mut self, max_kb: Option<u64>) -> Self {
        self.max_kb = max_kb;
        self
    }

    /// Collects all image files from the configured paths.
    fn collect_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for path in &self.paths {
            if path.is_file() {
                if is_supported_image(path) {
                    files.push(path.clone());
                } else {
                    warn!("Unsupported file type: {}", path.display());
                }
            } else if path.is_dir() {
                self.collect_from_dir(path, &mut files);
            } else {
                warn!("Path does not exist: {}", path.display());
            }
        }

        files
    }

    fn collect_from_dir(&self, dir: &Path, files: &mut Vec<PathBuf>) {
        let entries = match std::fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!("Failed to read directory {}: {e}", dir.display());
                return;
            }
        };

        let mut paths: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
        paths.sort();

        for path in paths {
            if path.is_file() && is_supported_image(&path) {
                files.push(path);
            } else if path.is_dir() && self.recursive {
                self.collect_from_dir(&path, files);
            }
        }
    }

    fn load(&self, path: &Path) -> BatchItem {
        let name = path.to_string_lossy().into_owned();
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to read image {}: {e}", path.display());
                return BatchItem::unreadable(name, e.to_string());
            }
        };

        match self.max_kb {
            Some(max_kb) => {
                let copy = compress_for_scoring(&bytes, max_kb);
                if copy.len() < bytes.len() {
                    debug!("{}: scoring {} byte copy", name, copy.len());
                    BatchItem::new(name, bytes).with_scoring_copy(copy)
                } else {
                    BatchItem::new(name, bytes)
                }
            }
            None => BatchItem::new(name, bytes),
        }
    }
}

impl ImageSource for FsImageSource {
    fn items(&self) -> Box<dyn Iterator<Item = Result<BatchItem>> + Send + '_> {
        let files = self.collect_files();
        debug!("Found {} image files", files.len());

        Box::new(files.into_iter().map(|path| Ok(self.load(&path))))
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.collect_files().len())
    }
}

/// Checks if a path has a supported image extension.
fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|e| RASTER_EXTENSIONS.contains(&e.as_str()))
}
