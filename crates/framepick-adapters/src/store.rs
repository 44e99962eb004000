//! Directory-backed selection store.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use framepick_core::{RankedResult, SelectionStore, StoredImage};
use tracing::info;
use uuid::Uuid;

/// Extension used when the original name has none.
const DEFAULT_EXTENSION: &str = ".jpg";

/// Writes selected originals into a directory under generated unique names.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    dir: PathBuf,
    base_url: Option<String>,
}

impl DirectoryStore {
    /// Creates the store, creating `dir` if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create selection directory {}", dir.display()))?;
        Ok(Self {
            dir,
            base_url: None,
        })
    }

    /// Reports locators as `<base_url>/<name>` instead of file paths.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url.map(|u| u.trim_end_matches('/').to_string());
        self
    }

    /// The target directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn locator(&self, name: &str, path: &Path) -> String {
        self.base_url.as_ref().map_or_else(
            || path.to_string_lossy().into_owned(),
            |base| format!("{base}/{name}"),
        )
    }
}

impl SelectionStore for DirectoryStore {
    fn store(&self, result: &RankedResult, rank: usize) -> Result<StoredImage> {
        if result.original.is_empty() {
            bail!("No original bytes for {}", result.filename);
        }

        let saved_as = format!(
            "{}{}",
            Uuid::new_v4().simple(),
            extension_of(&result.filename)
        );
        let path = self.dir.join(&saved_as);
        fs::write(&path, result.original.as_slice())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Stored {} as {}", result.filename, saved_as);

        Ok(StoredImage {
            filename: result.filename.clone(),
            rank,
            url: self.locator(&saved_as, &path),
            saved_as,
            score: result.score().unwrap_or_default(),
        })
    }
}

/// Extension of `filename` as written, including the dot, or `.jpg`.
fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map_or_else(
            || DEFAULT_EXTENSION.to_string(),
            |e| format!(".{e}"),
        )
}
