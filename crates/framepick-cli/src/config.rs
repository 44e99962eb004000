//! Configuration file support for framepick.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/framepick/config.toml` (lowest priority)
//! - Project-local: `.framepick.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use framepick_core::{BrightnessCurve, DetectParams, DetectorSettings, ScoringConfig};
use serde::Deserialize;
use tracing::{debug, info};

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General options.
    pub general: GeneralConfig,
    /// Score composition settings.
    pub scoring: ScoringSection,
    /// Cascade scan settings.
    pub detection: DetectionConfig,
    /// Where and how the best originals are saved.
    pub selection: SelectionConfig,
    /// Cascade file settings.
    pub models: ModelsConfig,
    /// Output formatting settings.
    pub output: OutputConfig,
}

/// General configuration options.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Recurse into subdirectories by default.
    pub recursive: Option<bool>,
    /// Worker threads for scoring.
    pub threads: Option<usize>,
    /// Number of images to select.
    pub top_n: Option<usize>,
}

/// Score weights.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct WeightsConfig {
    pub sharpness: Option<f64>,
    pub brightness: Option<f64>,
    pub faces: Option<f64>,
    pub eyes_open: Option<f64>,
    pub smiles: Option<f64>,
}

/// Score composition configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringSection {
    /// Per-term weights.
    pub weights: WeightsConfig,
    /// Sharpness at which the sharpness term reaches half its weight.
    pub sharpness_smoothing: Option<f64>,
    /// Centre of the brightness curve.
    pub brightness_midpoint: Option<f64>,
    /// Steepness of the brightness curve.
    pub brightness_slope: Option<f64>,
    /// Brightness curve: "sigmoid" or "bell".
    pub brightness_curve: Option<String>,
    /// Decimal places kept in reported numbers.
    pub precision: Option<u32>,
}

/// Scan parameters for one cascade.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    pub scale_factor: Option<f64>,
    pub min_neighbors: Option<u32>,
    pub min_width: Option<u32>,
    pub min_height: Option<u32>,
}

impl CascadeConfig {
    fn apply(&self, base: DetectParams) -> DetectParams {
        DetectParams::new(
            self.scale_factor.unwrap_or(base.scale_factor),
            self.min_neighbors.unwrap_or(base.min_neighbors),
            (
                self.min_width.unwrap_or(base.min_size.0),
                self.min_height.unwrap_or(base.min_size.1),
            ),
        )
    }

    fn merge(&mut self, other: Self) {
        self.scale_factor = other.scale_factor.or(self.scale_factor);
        self.min_neighbors = other.min_neighbors.or(self.min_neighbors);
        self.min_width = other.min_width.or(self.min_width);
        self.min_height = other.min_height.or(self.min_height);
    }
}

/// Cascade scan configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub face: CascadeConfig,
    pub eye: CascadeConfig,
    pub smile: CascadeConfig,
}

/// Selection store configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Directory the selected originals are copied into.
    pub save_dir: Option<PathBuf>,
    /// Public URL prefix for saved files.
    pub base_url: Option<String>,
    /// Size in kilobytes above which a smaller copy is scored.
    pub max_kb: Option<u64>,
}

/// Cascade file configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Custom cascades directory path.
    pub dir: Option<PathBuf>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "json" or "jsonl".
    pub format: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
    /// Show progress bar.
    pub progress: Option<bool>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/framepick/config.toml`
    /// 2. Project-local: `.framepick.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Unreadable files are logged as warnings.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        config
    }

    /// Validate values that the core does not check itself.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first offending key.
    pub fn validate(&self) -> Result<(), String> {
        if self.general.top_n == Some(0) {
            return Err("general.top_n must be at least 1".to_string());
        }
        if self.general.threads == Some(0) {
            return Err("general.threads must be at least 1".to_string());
        }
        if self.selection.max_kb == Some(0) {
            return Err("selection.max_kb must be at least 1".to_string());
        }

        if let Some(ref c) = self.scoring.brightness_curve {
            parse_curve(c)?;
        }

        if let Some(ref f) = self.output.format {
            if f != "json" && f != "jsonl" {
                return Err(format!(
                    "output.format must be 'json' or 'jsonl', got '{f}'"
                ));
            }
        }

        Ok(())
    }

    /// Scoring configuration from defaults overlaid with this file's values.
    ///
    /// Weights are left at their defaults; the rank command layers them
    /// together with the CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown brightness curve.
    pub fn scoring_config(&self) -> Result<ScoringConfig, String> {
        let mut config = ScoringConfig::default();
        let s = &self.scoring;
        let n = &mut config.normalization;

        n.sharpness_smoothing = s.sharpness_smoothing.unwrap_or(n.sharpness_smoothing);
        n.brightness_midpoint = s.brightness_midpoint.unwrap_or(n.brightness_midpoint);
        n.brightness_slope = s.brightness_slope.unwrap_or(n.brightness_slope);
        if let Some(ref c) = s.brightness_curve {
            n.curve = parse_curve(c)?;
        }
        config.precision = s.precision.unwrap_or(config.precision);

        Ok(config)
    }

    /// Detector settings from defaults overlaid with this file's values.
    #[must_use]
    pub fn detector_settings(&self) -> DetectorSettings {
        let defaults = DetectorSettings::default();
        DetectorSettings {
            face: self.detection.face.apply(defaults.face),
            eye: self.detection.eye.apply(defaults.eye),
            smile: self.detection.smile.apply(defaults.smile),
        }
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    pub fn merge(&mut self, other: Self) {
        // General
        self.general.recursive = other.general.recursive.or(self.general.recursive);
        self.general.threads = other.general.threads.or(self.general.threads);
        self.general.top_n = other.general.top_n.or(self.general.top_n);

        // Scoring
        let (w, ow) = (&mut self.scoring.weights, other.scoring.weights);
        w.sharpness = ow.sharpness.or(w.sharpness);
        w.brightness = ow.brightness.or(w.brightness);
        w.faces = ow.faces.or(w.faces);
        w.eyes_open = ow.eyes_open.or(w.eyes_open);
        w.smiles = ow.smiles.or(w.smiles);
        self.scoring.sharpness_smoothing = other
            .scoring
            .sharpness_smoothing
            .or(self.scoring.sharpness_smoothing);
        self.scoring.brightness_midpoint = other
            .scoring
            .brightness_midpoint
            .or(self.scoring.brightness_midpoint);
        self.scoring.brightness_slope = other
            .scoring
            .brightness_slope
            .or(self.scoring.brightness_slope);
        self.scoring.brightness_curve = other
            .scoring
            .brightness_curve
            .or_else(|| self.scoring.brightness_curve.take());
        self.scoring.precision = other.scoring.precision.or(self.scoring.precision);

        // Detection
        self.detection.face.merge(other.detection.face);
        self.detection.eye.merge(other.detection.eye);
        self.detection.smile.merge(other.detection.smile);

        // Selection
        self.selection.save_dir = other
            .selection
            .save_dir
            .or_else(|| self.selection.save_dir.take());
        self.selection.base_url = other
            .selection
            .base_url
            .or_else(|| self.selection.base_url.take());
        self.selection.max_kb = other.selection.max_kb.or(self.selection.max_kb);

        // Models
        self.models.dir = other.models.dir.or_else(|| self.models.dir.take());

        // Output
        self.output.format = other.output.format.or_else(|| self.output.format.take());
        self.output.pretty = other.output.pretty.or(self.output.pretty);
        self.output.progress = other.output.progress.or(self.output.progress);
    }
}

fn parse_curve(name: &str) -> Result<BrightnessCurve, String> {
    match name {
        "sigmoid" => Ok(BrightnessCurve::Sigmoid),
        "bell" => Ok(BrightnessCurve::Bell),
        other => Err(format!(
            "scoring.brightness_curve must be 'sigmoid' or 'bell', got '{other}'"
        )),
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("framepick").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.framepick.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(".framepick.toml");
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}
