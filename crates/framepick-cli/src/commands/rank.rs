//! Rank command - score images and select the best ones.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use framepick_adapters::{CascadeStore, DirectoryStore, FsImageSource, DEFAULT_MAX_KB};
use framepick_core::{
    top_n, BatchItem, ImageSource, LazyCascadeBank, RankedResult, ResultOutput, Scorer,
    ScoringConfig, SelectionStore, StoredImage, DEFAULT_TOP_N,
};
use tracing::{debug, info};

use super::ExitCode;
use crate::config::AppConfig;
use crate::output::{JsonOutput, ProgressBar};

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON report object
    #[default]
    Json,
    /// JSON Lines (one result per line, input order)
    Jsonl,
}

/// Parse and validate a score weight (finite, non-negative).
fn parse_weight(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("{value} is not a finite, non-negative weight"))
    }
}

/// Parse a count that must be at least one.
fn parse_positive(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid count"))?;
    if value == 0 {
        Err("must be at least 1".to_string())
    } else {
        Ok(value)
    }
}

/// Shared arguments for scoring and selection.
#[derive(Args, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct RankArgs {
    /// Files or directories to score
    pub paths: Vec<PathBuf>,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Number of images to select
    #[arg(short = 'n', long, value_parser = parse_positive)]
    pub top_n: Option<usize>,

    /// Weight of the sharpness term
    #[arg(long, value_parser = parse_weight)]
    pub sharpness_weight: Option<f64>,

    /// Weight of the brightness term
    #[arg(long, value_parser = parse_weight)]
    pub brightness_weight: Option<f64>,

    /// Weight per detected face
    #[arg(long, value_parser = parse_weight)]
    pub faces_weight: Option<f64>,

    /// Weight per pair of open eyes
    #[arg(long, value_parser = parse_weight)]
    pub eyes_weight: Option<f64>,

    /// Weight per detected smile
    #[arg(long, value_parser = parse_weight)]
    pub smiles_weight: Option<f64>,

    /// Copy the selected originals into this directory
    #[arg(long, value_name = "DIR")]
    pub save_dir: Option<PathBuf>,

    /// URL prefix reported for saved files
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Score a recompressed copy of files larger than this many kilobytes
    #[arg(long, value_name = "KB", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_kb: Option<u64>,

    /// Score files at full size
    #[arg(long)]
    pub no_compress: bool,

    /// Worker threads for scoring
    #[arg(long, value_parser = parse_positive)]
    pub threads: Option<usize>,

    /// Show progress bar
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output (only affects --format json)
    #[arg(long)]
    pub pretty: bool,

    /// Custom cascades directory (overrides default and config)
    #[arg(long, value_name = "DIR")]
    pub cascades_dir: Option<PathBuf>,

    /// Merged config (populated by `with_config`, not from CLI).
    #[arg(skip)]
    config: Option<AppConfig>,
}

impl RankArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest):
    /// 1. Hardcoded defaults (in accessor methods)
    /// 2. Config file values (XDG, then project-local)
    /// 3. CLI arguments (already set on self)
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        if !args.recursive {
            args.recursive = config.general.recursive.unwrap_or(false);
        }
        args.top_n = args.top_n.or(config.general.top_n);
        args.threads = args.threads.or(config.general.threads);

        // Weights: CLI > config > default
        let w = &config.scoring.weights;
        args.sharpness_weight = args.sharpness_weight.or(w.sharpness);
        args.brightness_weight = args.brightness_weight.or(w.brightness);
        args.faces_weight = args.faces_weight.or(w.faces);
        args.eyes_weight = args.eyes_weight.or(w.eyes_open);
        args.smiles_weight = args.smiles_weight.or(w.smiles);

        if args.save_dir.is_none() {
            args.save_dir.clone_from(&config.selection.save_dir);
        }
        if args.base_url.is_none() {
            args.base_url.clone_from(&config.selection.base_url);
        }
        args.max_kb = args.max_kb.or(config.selection.max_kb);

        if args.format.is_none() {
            args.format = config
                .output
                .format
                .as_ref()
                .and_then(|s| match s.as_str() {
                    "json" => Some(OutputFormat::Json),
                    "jsonl" => Some(OutputFormat::Jsonl),
                    _ => None,
                });
        }
        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }
        if !args.progress {
            args.progress = config.output.progress.unwrap_or(false);
        }

        if args.cascades_dir.is_none() {
            args.cascades_dir.clone_from(&config.models.dir);
        }

        args.config = Some(config.clone());
        args
    }

    fn top_n(&self) -> usize {
        self.top_n.unwrap_or(DEFAULT_TOP_N)
    }

    fn format(&self) -> OutputFormat {
        self.format.unwrap_or_default()
    }

    fn max_kb(&self) -> Option<u64> {
        if self.no_compress {
            None
        } else {
            Some(self.max_kb.unwrap_or(DEFAULT_MAX_KB))
        }
    }

    /// Scoring config: defaults, then the config file, then weight flags.
    fn scoring_config(&self) -> Result<ScoringConfig> {
        let mut scoring = match self.config {
            Some(ref c) => c.scoring_config().map_err(anyhow::Error::msg)?,
            None => ScoringConfig::default(),
        };
        let w = &mut scoring.weights;
        w.sharpness = self.sharpness_weight.unwrap_or(w.sharpness);
        w.brightness = self.brightness_weight.unwrap_or(w.brightness);
        w.faces = self.faces_weight.unwrap_or(w.faces);
        w.eyes_open = self.eyes_weight.unwrap_or(w.eyes_open);
        w.smiles = self.smiles_weight.unwrap_or(w.smiles);
        Ok(scoring)
    }

    fn cascade_store(&self) -> CascadeStore {
        self.cascades_dir
            .as_ref()
            .map_or_else(CascadeStore::default, CascadeStore::new)
    }
}

/// Result of running the rank command.
#[allow(dead_code)] // Fields exposed for programmatic use
pub struct RankResult {
    /// Number of images scored.
    pub scored: usize,
    /// Number of images that could not be scored.
    pub failed: usize,
    /// Selected images that were saved.
    pub saved: usize,
    /// Exit code.
    pub exit_code: ExitCode,
}

/// Run the rank command.
///
/// Expects `args` to have been processed through `with_config()` first
/// to apply configuration file settings.
pub fn run(args: &RankArgs) -> Result<RankResult> {
    info!("Running rank command on {} paths", args.paths.len());

    if args.paths.is_empty() {
        anyhow::bail!("No paths specified");
    }

    let top_n = top_n(args.top_n())?;
    let settings = args
        .config
        .as_ref()
        .map(AppConfig::detector_settings)
        .unwrap_or_default();
    settings.validate()?;
    let scoring = args.scoring_config()?;
    scoring.validate()?;

    if let Some(threads) = args.threads {
        debug!("Using {} worker threads", threads);
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    let store = args.cascade_store();
    if !store.all_installed() {
        anyhow::bail!(
            "Cascade files missing in {}. Run `framepick models fetch`.",
            store.dir().display()
        );
    }
    let bank = LazyCascadeBank::new(store.paths(), settings);
    let scorer = Scorer::new(bank.get()?, scoring)?;

    let source = FsImageSource::new(args.paths.clone(), args.recursive).with_max_kb(args.max_kb());
    let total = source.count_hint();

    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let progress_bar = ProgressBar::new(total.map(|t| t as u64), args.quiet, show_progress);

    let items = read_items(&source);
    let report = scorer.score_batch_with_progress(items, top_n, Some(&progress_bar));

    let saved = save_selection(args, &report.top)?;

    let output = JsonOutput::stdout(args.format(), args.pretty);
    output.write_report(&report, &saved)?;
    output.flush()?;

    let scored = report.scored_count();
    let failed = report.count - scored;
    let exit_code = if failed > 0 {
        ExitCode::SomeFailed
    } else {
        ExitCode::Success
    };

    Ok(RankResult {
        scored,
        failed,
        saved: saved.len(),
        exit_code,
    })
}

/// Reads every file up front; inputs that cannot be read stay in the batch
/// so they are reported as failures.
fn read_items(source: &FsImageSource) -> Vec<BatchItem> {
    source
        .items()
        .enumerate()
        .map(|(index, item)| {
            item.unwrap_or_else(|e| {
                BatchItem::unreadable(format!("image {index}"), format!("{e:#}"))
            })
        })
        .collect()
}

/// Stores the selected originals when a save directory is configured.
fn save_selection(args: &RankArgs, top: &[RankedResult]) -> Result<Vec<StoredImage>> {
    let Some(ref dir) = args.save_dir else {
        return Ok(Vec::new());
    };

    let store = DirectoryStore::new(dir)?.with_base_url(args.base_url.clone());
    let saved = store.store_all(top);
    info!("Saved {} of {} selected images", saved.len(), top.len());
    Ok(saved)
}

