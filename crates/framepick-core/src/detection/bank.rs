//! The three stock cascades bundled as one detector.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::GrayImage;
use once_cell::sync::OnceCell;
use tracing::{debug, info};

use super::{FaceCrop, FeatureDetector};
use crate::cascade::{CascadeClassifier, DetectParams};
use crate::domain::DetectionRegion;
use crate::error::{ConfigError, SetupError};

/// File name of the frontal face cascade.
pub const FACE_CASCADE_FILE: &str = "haarcascade_frontalface_default.xml";
/// File name of the eye cascade.
pub const EYE_CASCADE_FILE: &str = "haarcascade_eye.xml";
/// File name of the smile cascade.
pub const SMILE_CASCADE_FILE: &str = "haarcascade_smile.xml";

/// Scan parameters for each of the three cascades.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorSettings {
    /// Faces, on the whole image.
    pub face: DetectParams,
    /// Eyes, inside each face.
    pub eye: DetectParams,
    /// Smiles, inside each face.
    pub smile: DetectParams,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            face: DetectParams::new(1.1, 5, (30, 30)),
            eye: DetectParams::new(1.1, 3, (10, 10)),
            smile: DetectParams::new(1.7, 22, (15, 15)),
        }
    }
}

impl DetectorSettings {
    /// Validates all three parameter sets.
    ///
    /// # Errors
    ///
    /// Returns the first invalid parameter found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.face.validate("face")?;
        self.eye.validate("eye")?;
        self.smile.validate("smile")
    }
}

/// Locations of the three cascade files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadePaths {
    /// Frontal face cascade.
    pub face: PathBuf,
    /// Eye cascade.
    pub eye: PathBuf,
    /// Smile cascade.
    pub smile: PathBuf,
}

impl CascadePaths {
    /// The stock file names inside `dir`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            face: dir.join(FACE_CASCADE_FILE),
            eye: dir.join(EYE_CASCADE_FILE),
            smile: dir.join(SMILE_CASCADE_FILE),
        }
    }
}

/// Face, eye and smile cascades plus their scan parameters.
#[derive(Debug, Clone)]
pub struct CascadeBank {
    face: CascadeClassifier,
    eye: CascadeClassifier,
    smile: CascadeClassifier,
    settings: DetectorSettings,
}

impl CascadeBank {
    /// Assembles a bank from cascades that are already loaded.
    #[must_use]
    pub const fn new(
        face: CascadeClassifier,
        eye: CascadeClassifier,
        smile: CascadeClassifier,
        settings: DetectorSettings,
    ) -> Self {
        Self {
            face,
            eye,
            smile,
            settings,
        }
    }

    /// Loads all three cascades from disk.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::Detector`] naming the cascade that failed.
    pub fn load(paths: &CascadePaths, settings: DetectorSettings) -> Result<Self, SetupError> {
        let load = |name: &'static str, path: &Path| {
            CascadeClassifier::from_file(path).map_err(|e| SetupError::Detector {
                name,
                source: Box::new(e),
            })
        };

        let bank = Self::new(
            load("face", &paths.face)?,
            load("eye", &paths.eye)?,
            load("smile", &paths.smile)?,
            settings,
        );
        info!("Loaded face, eye and smile cascades");
        Ok(bank)
    }

    /// The scan parameters in use.
    #[must_use]
    pub const fn settings(&self) -> &DetectorSettings {
        &self.settings
    }
}

impl FeatureDetector for CascadeBank {
    fn detect_faces(&self, gray: &GrayImage) -> Vec<DetectionRegion> {
        self.face.detect_multi_scale(gray, &self.settings.face)
    }

    fn detect_eyes(&self, face: &FaceCrop) -> Vec<DetectionRegion> {
        self.eye.detect_multi_scale(&face.gray, &self.settings.eye)
    }

    fn detect_smiles(&self, face: &FaceCrop) -> Vec<DetectionRegion> {
        self.smile.detect_multi_scale(&face.gray, &self.settings.smile)
    }
}

/// A [`CascadeBank`] that is loaded on first use.
///
/// Concurrent first calls to [`LazyCascadeBank::get`] load the files once;
/// every caller receives the same shared bank.
#[derive(Debug)]
pub struct LazyCascadeBank {
    paths: CascadePaths,
    settings: DetectorSettings,
    bank: OnceCell<Arc<CascadeBank>>,
}

impl LazyCascadeBank {
    /// Creates a loader; nothing is read until [`LazyCascadeBank::get`].
    #[must_use]
    pub const fn new(paths: CascadePaths, settings: DetectorSettings) -> Self {
        Self {
            paths,
            settings,
            bank: OnceCell::new(),
        }
    }

    /// Returns the bank, loading it if necessary.
    ///
    /// # Errors
    ///
    /// Returns the load error; a later call retries.
    pub fn get(&self) -> Result<Arc<CascadeBank>, SetupError> {
        self.bank
            .get_or_try_init(|| {
                debug!("Loading cascades from {}", self.paths.face.display());
                CascadeBank::load(&self.paths, self.settings).map(Arc::new)
            })
            .cloned()
    }

    /// Returns true once the bank has been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.bank.get().is_some()
    }
}
