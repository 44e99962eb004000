//! Cascade definition loading.
//!
//! Reads the XML layout written by OpenCV's cascade trainer (the
//! `opencv-cascade-classifier` flavour): boosted stages of small decision
//! trees over Haar-like rectangle features.

use std::path::Path;
use std::str::FromStr;

use roxmltree::{Document, Node};
use tracing::debug;

use crate::error::SetupError;

/// Slack subtracted from every stage threshold, as the trainer expects.
const THRESHOLD_EPS: f32 = 1e-5;

/// A weighted rectangle of a Haar feature, relative to the detection window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct WeightedRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub weight: f32,
}

/// A Haar-like feature: up to three weighted rectangles, upright or rotated 45°.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HaarFeature {
    pub rects: Vec<WeightedRect>,
    pub tilted: bool,
}

/// Internal split node of a weak classifier tree.
///
/// Children `> 0` index further nodes; children `<= 0` index leaf `-child`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TreeNode {
    pub left: i32,
    pub right: i32,
    pub feature: usize,
    pub threshold: f32,
}

/// A boosted decision tree (a stump in most published cascades).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WeakClassifier {
    pub nodes: Vec<TreeNode>,
    pub leaves: Vec<f32>,
}

/// One cascade stage: the sum of its trees must reach `threshold`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Stage {
    pub threshold: f32,
    pub classifiers: Vec<WeakClassifier>,
}

/// A loaded boosted Haar cascade.
///
/// Immutable once built and safe to share between threads.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeClassifier {
    pub(crate) window_width: u32,
    pub(crate) window_height: u32,
    pub(crate) stages: Vec<Stage>,
    pub(crate) features: Vec<HaarFeature>,
    pub(crate) has_tilted: bool,
}

impl CascadeClassifier {
    /// Loads a cascade definition from an XML file.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::Io`] if the file cannot be read, or any parse
    /// error from [`CascadeClassifier::from_xml`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SetupError> {
        let path = path.as_ref();
        debug!("Loading cascade from {}", path.display());
        let xml = std::fs::read_to_string(path).map_err(|source| SetupError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_xml(&xml)
    }

    /// Parses a cascade definition from XML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not XML, is not a cascade, or uses a
    /// flavour other than boosted Haar stages.
    pub fn from_xml(xml: &str) -> Result<Self, SetupError> {
        let doc = Document::parse(xml)?;
        let cascade = doc
            .root_element()
            .children()
            .find(Node::is_element)
            .ok_or_else(|| SetupError::Malformed("document has no cascade element".into()))?;

        if find_child(cascade, "stageType").is_none() {
            return Err(match cascade.attribute("type_id") {
                Some("opencv-haar-classifier") => SetupError::Unsupported(
                    "legacy opencv-haar-classifier layout; re-export with opencv_traincascade"
                        .into(),
                ),
                _ => SetupError::Malformed(format!(
                    "<{}> is not a cascade classifier",
                    cascade.tag_name().name()
                )),
            });
        }

        let stage_type = child_text(cascade, "stageType")?;
        if stage_type != "BOOST" {
            return Err(SetupError::Unsupported(format!("stage type {stage_type}")));
        }
        let feature_type = child_text(cascade, "featureType")?;
        if feature_type != "HAAR" {
            return Err(SetupError::Unsupported(format!("feature type {feature_type}")));
        }

        let window_width: u32 = parse_token(child_text(cascade, "width")?, "width")?;
        let window_height: u32 = parse_token(child_text(cascade, "height")?, "height")?;
        if window_width == 0 || window_height == 0 {
            return Err(SetupError::Malformed("window size must be non-zero".into()));
        }

        let features = items(child(cascade, "features")?)
            .map(|node| parse_feature(node, window_width, window_height))
            .collect::<Result<Vec<_>, _>>()?;

        let stages = items(child(cascade, "stages")?)
            .map(|node| parse_stage(node, features.len()))
            .collect::<Result<Vec<_>, _>>()?;

        if stages.is_empty() {
            return Err(SetupError::Malformed("cascade has no stages".into()));
        }

        let has_tilted = features.iter().any(|f| f.tilted);
        debug!(
            "Cascade loaded: {}x{} window, {} stages, {} features",
            window_width,
            window_height,
            stages.len(),
            features.len()
        );

        Ok(Self {
            window_width,
            window_height,
            stages,
            features,
            has_tilted,
        })
    }

    /// Size of the detection window the cascade was trained on.
    #[must_use]
    pub const fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    /// Number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Number of distinct Haar features.
    #[must_use]
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }
}

fn parse_stage(node: Node<'_, '_>, feature_count: usize) -> Result<Stage, SetupError> {
    let threshold: f32 = parse_token(child_text(node, "stageThreshold")?, "stageThreshold")?;
    let classifiers = items(child(node, "weakClassifiers")?)
        .map(|wc| parse_weak_classifier(wc, feature_count))
        .collect::<Result<Vec<_>, _>>()?;

    if classifiers.is_empty() {
        return Err(SetupError::Malformed("stage has no weak classifiers".into()));
    }

    Ok(Stage {
        threshold: threshold - THRESHOLD_EPS,
        classifiers,
    })
}

fn parse_weak_classifier(
    node: Node<'_, '_>,
    feature_count: usize,
) -> Result<WeakClassifier, SetupError> {
    let raw: Vec<&str> = child_text(node, "internalNodes")?
        .split_whitespace()
        .collect();
    if raw.is_empty() || raw.len() % 4 != 0 {
        return Err(SetupError::Malformed(format!(
            "internalNodes must hold groups of 4 values, got {}",
            raw.len()
        )));
    }

    let nodes = raw
        .chunks_exact(4)
        .map(|chunk| {
            Ok(TreeNode {
                left: parse_token(chunk[0], "internalNodes")?,
                right: parse_token(chunk[1], "internalNodes")?,
                feature: parse_token(chunk[2], "internalNodes")?,
                threshold: parse_token(chunk[3], "internalNodes")?,
            })
        })
        .collect::<Result<Vec<_>, SetupError>>()?;

    let leaves = child_text(node, "leafValues")?
        .split_whitespace()
        .map(|t| parse_token::<f32>(t, "leafValues"))
        .collect::<Result<Vec<_>, _>>()?;

    for (idx, n) in nodes.iter().enumerate() {
        if n.feature >= feature_count {
            return Err(SetupError::Malformed(format!(
                "feature index {} out of range ({feature_count} features)",
                n.feature
            )));
        }
        for child in [n.left, n.right] {
            let ok = if child > 0 {
                // children only point forward, so evaluation always terminates
                usize::try_from(child).is_ok_and(|c| c > idx && c < nodes.len())
            } else {
                usize::try_from(-i64::from(child)).is_ok_and(|leaf| leaf < leaves.len())
            };
            if !ok {
                return Err(SetupError::Malformed(format!(
                    "tree child {child} out of range ({} nodes, {} leaves)",
                    nodes.len(),
                    leaves.len()
                )));
            }
        }
    }

    Ok(WeakClassifier { nodes, leaves })
}

fn parse_feature(
    node: Node<'_, '_>,
    window_width: u32,
    window_height: u32,
) -> Result<HaarFeature, SetupError> {
    let tilted = match find_child(node, "tilted").and_then(|n| n.text()) {
        Some(t) => parse_token::<i32>(t.trim(), "tilted")? != 0,
        None => false,
    };

    let rects = items(child(node, "rects")?)
        .map(|r| {
            let text = r.text().unwrap_or_default();
            let tokens: Vec<&str> = text.split_whitespace().collect();
            if tokens.len() != 5 {
                return Err(SetupError::Malformed(format!(
                    "feature rect needs 5 values, got '{}'",
                    text.trim()
                )));
            }
            Ok(WeightedRect {
                x: parse_token(tokens[0], "rect")?,
                y: parse_token(tokens[1], "rect")?,
                width: parse_token(tokens[2], "rect")?,
                height: parse_token(tokens[3], "rect")?,
                weight: parse_token(tokens[4], "rect")?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if rects.is_empty() {
        return Err(SetupError::Malformed("feature has no rectangles".into()));
    }

    for r in &rects {
        let fits = if tilted {
            // rotated rects reach `height` pixels left of their top corner
            r.x >= r.height
                && r.x + r.width <= window_width
                && r.y + r.width + r.height <= window_height
        } else {
            r.x + r.width <= window_width && r.y + r.height <= window_height
        };
        if !fits {
            return Err(SetupError::Malformed(format!(
                "feature rect ({}, {}, {}, {}) exceeds {window_width}x{window_height} window",
                r.x, r.y, r.width, r.height
            )));
        }
    }

    Ok(HaarFeature { rects, tilted })
}

/// Element children named `_` (the trainer's list-item tag).
fn items<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(|n| n.is_element() && n.tag_name().name() == "_")
}

fn find_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Result<Node<'a, 'input>, SetupError> {
    find_child(node, name).ok_or_else(|| {
        SetupError::Malformed(format!(
            "<{}> is missing <{name}>",
            node.tag_name().name()
        ))
    })
}

fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str, SetupError> {
    Ok(child(node, name)?.text().unwrap_or_default().trim())
}

fn parse_token<T: FromStr>(token: &str, what: &str) -> Result<T, SetupError> {
    token
        .parse()
        .map_err(|_| SetupError::Malformed(format!("invalid {what} value '{token}'")))
}
