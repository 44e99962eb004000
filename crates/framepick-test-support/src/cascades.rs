//! Small hand-written cascade definitions.
//!
//! The stock OpenCV cascades are downloaded at runtime, so tests use these
//! instead: one that never fires and one that fires on vertical dark-to-bright
//! edges.

use std::path::Path;

use anyhow::{Context, Result};
use framepick_core::detection::{EYE_CASCADE_FILE, FACE_CASCADE_FILE, SMILE_CASCADE_FILE};
use framepick_core::{CascadeBank, CascadeClassifier, CascadePaths, DetectorSettings};

/// One stage whose leaves can never reach its threshold.
pub const NEVER_FIRES_CASCADE: &str = r#"<?xml version="1.0"?>
<opencv_storage>
<cascade type_id="opencv-cascade-classifier"><stageType>BOOST</stageType>
  <featureType>HAAR</featureType>
  <height>4</height>
  <width>4</width>
  <stageParams><maxWeakCount>1</maxWeakCount></stageParams>
  <featureParams><maxCatCount>0</maxCatCount></featureParams>
  <stageNum>1</stageNum>
  <stages>
    <_>
      <maxWeakCount>1</maxWeakCount>
      <stageThreshold>1.</stageThreshold>
      <weakClassifiers>
        <_>
          <internalNodes>
            0 -1 0 0.</internalNodes>
          <leafValues>
            -1. -1.</leafValues></_></weakClassifiers></_></stages>
  <features>
    <_>
      <rects>
        <_>
          0 0 4 4 1.</_></rects></_></features></cascade>
</opencv_storage>
"#;

/// A 4x4 stump that accepts windows whose right half is brighter than the left.
pub const EDGE_CASCADE: &str = r#"<?xml version="1.0"?>
<opencv_storage>
<cascade type_id="opencv-cascade-classifier"><stageType>BOOST</stageType>
  <featureType>HAAR</featureType>
  <height>4</height>
  <width>4</width>
  <stageParams><maxWeakCount>1</maxWeakCount></stageParams>
  <featureParams><maxCatCount>0</maxCatCount></featureParams>
  <stageNum>1</stageNum>
  <stages>
    <_>
      <maxWeakCount>1</maxWeakCount>
      <stageThreshold>0.</stageThreshold>
      <weakClassifiers>
        <_>
          <internalNodes>
            0 -1 0 5.0000000000000000e-01</internalNodes>
          <leafValues>
            -1. 1.</leafValues></_></weakClassifiers></_></stages>
  <features>
    <_>
      <rects>
        <_>
          0 0 2 4 -1.</_>
        <_>
          2 0 2 4 1.</_></rects></_></features></cascade>
</opencv_storage>
"#;

/// Parses one of the fixtures above.
///
/// # Panics
///
/// Panics if `xml` is not a valid cascade.
#[must_use]
pub fn cascade(xml: &str) -> CascadeClassifier {
    CascadeClassifier::from_xml(xml).unwrap_or_else(|e| panic!("fixture cascade: {e}"))
}

/// A bank whose three cascades never fire.
#[must_use]
pub fn never_firing_bank() -> CascadeBank {
    CascadeBank::new(
        cascade(NEVER_FIRES_CASCADE),
        cascade(NEVER_FIRES_CASCADE),
        cascade(NEVER_FIRES_CASCADE),
        DetectorSettings::default(),
    )
}

/// Writes `xml` under all three stock cascade file names in `dir`.
///
/// # Errors
///
/// Returns an error if a file cannot be written.
pub fn write_cascade_set(dir: &Path, xml: &str) -> Result<CascadePaths> {
    for name in [FACE_CASCADE_FILE, EYE_CASCADE_FILE, SMILE_CASCADE_FILE] {
        let path = dir.join(name);
        std::fs::write(&path, xml).with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(CascadePaths::in_dir(dir))
}
