//! Cascade downloading and caching adapter.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use framepick_core::detection::{EYE_CASCADE_FILE, FACE_CASCADE_FILE, SMILE_CASCADE_FILE};
use framepick_core::{CascadeClassifier, CascadePaths};
use tracing::{debug, info};

const OPENCV_HAARCASCADES: &str =
    "https://raw.githubusercontent.com/opencv/opencv/master/data/haarcascades";

/// Cascade metadata.
#[derive(Debug, Clone)]
pub struct CascadeInfo {
    /// Short name (`face`, `eye`, `smile`).
    pub name: &'static str,
    /// File name in the cascades directory and in the OpenCV repository.
    pub filename: &'static str,
}

impl CascadeInfo {
    /// Download URL in the OpenCV repository.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{OPENCV_HAARCASCADES}/{}", self.filename)
    }
}

/// Known cascades.
pub const CASCADES: &[CascadeInfo] = &[
    CascadeInfo {
        name: "face",
        filename: FACE_CASCADE_FILE,
    },
    CascadeInfo {
        name: "eye",
        filename: EYE_CASCADE_FILE,
    },
    CascadeInfo {
        name: "smile",
        filename: SMILE_CASCADE_FILE,
    },
];

/// Returns the default cascades directory path.
///
/// Uses `XDG_DATA_HOME/framepick/cascades` or `~/.local/share/framepick/cascades`.
#[must_use]
pub fn default_cascades_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("framepick")
        .join("cascades")
}

/// A directory holding the three cascade files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeStore {
    dir: PathBuf,
}

impl Default for CascadeStore {
    fn default() -> Self {
        Self::new(default_cascades_dir())
    }
}

impl CascadeStore {
    /// A store rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths of the three cascade files, installed or not.
    #[must_use]
    pub fn paths(&self) -> CascadePaths {
        CascadePaths::in_dir(&self.dir)
    }

    /// Checks if all cascades are installed.
    #[must_use]
    pub fn all_installed(&self) -> bool {
        CASCADES.iter().all(|c| self.dir.join(c.filename).exists())
    }

    /// Lists cascades with their installation status.
    #[must_use]
    pub fn list(&self) -> Vec<(String, bool)> {
        CASCADES
            .iter()
            .map(|c| (c.name.to_string(), self.dir.join(c.filename).exists()))
            .collect()
    }

    /// Ensures all cascades are present, downloading missing ones.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The cascades directory cannot be created
    /// - A download fails
    /// - A downloaded file is not a usable cascade
    pub fn ensure(&self) -> Result<()> {
        self.ensure_with_progress(|_, _| {})
    }

    /// Like [`CascadeStore::ensure`], calling `on_download(name, bytes)`
    /// after each file is fetched.
    ///
    /// # Errors
    ///
    /// See [`CascadeStore::ensure`].
    pub fn ensure_with_progress(&self, mut on_download: impl FnMut(&str, usize)) -> Result<()> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create cascades directory {}", self.dir.display())
        })?;

        for cascade in CASCADES {
            let path = self.dir.join(cascade.filename);
            if path.exists() {
                debug!("Cascade {} already exists", cascade.name);
            } else {
                let len = download_cascade(cascade, &path)?;
                on_download(cascade.name, len);
            }
        }

        Ok(())
    }

    /// Re-downloads every cascade, replacing existing files.
    ///
    /// # Errors
    ///
    /// See [`CascadeStore::ensure`].
    pub fn refresh(&self) -> Result<()> {
        for cascade in CASCADES {
            let path = self.dir.join(cascade.filename);
            if path.exists() {
                fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
            }
        }
        self.ensure()
    }
}

/// Downloads a cascade from the OpenCV repository.
fn download_cascade(cascade: &CascadeInfo, path: &Path) -> Result<usize> {
    let url = cascade.url();
    info!("Downloading cascade: {} from {}", cascade.name, url);

    let response = reqwest::blocking::get(&url)
        .with_context(|| format!("Failed to download {}", cascade.name))?;

    if !response.status().is_success() {
        bail!("Download failed with status: {}", response.status());
    }

    let bytes = response
        .bytes()
        .with_context(|| format!("Failed to read response for {}", cascade.name))?;

    verify_cascade(cascade, &bytes)?;

    let partial = path.with_extension("xml.part");
    fs::write(&partial, &bytes).with_context(|| format!("Failed to write {}", cascade.name))?;
    fs::rename(&partial, path)
        .with_context(|| format!("Failed to move {} into place", cascade.name))?;

    info!("Downloaded {} ({} bytes)", cascade.name, bytes.len());
    Ok(bytes.len())
}

/// Checks that downloaded bytes parse as a cascade.
fn verify_cascade(cascade: &CascadeInfo, bytes: &[u8]) -> Result<()> {
    let xml = std::str::from_utf8(bytes)
        .with_context(|| format!("Downloaded {} is not UTF-8 text", cascade.name))?;
    CascadeClassifier::from_xml(xml)
        .with_context(|| format!("Downloaded {} is not a usable cascade", cascade.name))?;
    Ok(())
}
