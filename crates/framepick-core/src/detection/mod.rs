//! Face, eye and smile detection.
//!
//! Faces are searched on the whole grayscale image; eyes and smiles only
//! inside each face. Counts accumulate across faces, so two faces with two
//! eyes each report four open eyes.

mod bank;

use image::{imageops, GrayImage, RgbImage};
use tracing::debug;

use crate::domain::{DecodedImage, DetectionRegion};

pub use bank::{
    CascadeBank, CascadePaths, DetectorSettings, LazyCascadeBank, EYE_CASCADE_FILE,
    FACE_CASCADE_FILE, SMILE_CASCADE_FILE,
};

/// Capability to locate faces and facial features.
///
/// Implementations must be immutable after construction so one handle can be
/// shared by all scoring threads.
pub trait FeatureDetector: Send + Sync {
    /// Faces in a full grayscale image.
    fn detect_faces(&self, gray: &GrayImage) -> Vec<DetectionRegion>;

    /// Eyes inside one face crop.
    fn detect_eyes(&self, face: &FaceCrop) -> Vec<DetectionRegion>;

    /// Smiles inside one face crop.
    fn detect_smiles(&self, face: &FaceCrop) -> Vec<DetectionRegion>;
}

/// One detected face cut out of the image.
#[derive(Debug, Clone)]
pub struct FaceCrop {
    /// Where the face sits in the full image.
    pub region: DetectionRegion,
    /// Grayscale pixels of the face.
    pub gray: GrayImage,
    /// Colour pixels of the face.
    pub color: RgbImage,
}

impl FaceCrop {
    /// Cuts `region` out of both buffers, clipped to the image.
    ///
    /// Returns `None` if the region lies entirely outside the image.
    #[must_use]
    pub fn extract(image: &DecodedImage, gray: &GrayImage, region: DetectionRegion) -> Option<Self> {
        let r = region.clip_to(image.width, image.height)?;
        Some(Self {
            region: r,
            gray: imageops::crop_imm(gray, r.x, r.y, r.width, r.height).to_image(),
            color: imageops::crop_imm(image.rgb(), r.x, r.y, r.width, r.height).to_image(),
        })
    }
}

/// Detection counts for one image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Detections {
    /// Faces found.
    pub faces: u32,
    /// Eyes found inside faces, summed over faces.
    pub eyes_open: u32,
    /// Smiles found inside faces, summed over faces.
    pub smiles: u32,
}

/// Runs the detector over an image.
#[must_use]
pub fn detect(detector: &dyn FeatureDetector, image: &DecodedImage) -> Detections {
    detect_with_gray(detector, image, &image.to_gray())
}

/// Like [`detect`], reusing an already computed grayscale buffer.
#[must_use]
pub fn detect_with_gray(
    detector: &dyn FeatureDetector,
    image: &DecodedImage,
    gray: &GrayImage,
) -> Detections {
    let faces = detector.detect_faces(gray);
    let mut counts = Detections {
        faces: count(faces.len()),
        ..Detections::default()
    };

    for face in faces {
        let Some(crop) = FaceCrop::extract(image, gray, face) else {
            continue;
        };
        counts.eyes_open = counts
            .eyes_open
            .saturating_add(count(detector.detect_eyes(&crop).len()));
        counts.smiles = counts
            .smiles
            .saturating_add(count(detector.detect_smiles(&crop).len()));
    }

    debug!(
        "Detected {} faces, {} eyes, {} smiles",
        counts.faces, counts.eyes_open, counts.smiles
    );
    counts
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
