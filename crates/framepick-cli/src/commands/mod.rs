//! CLI command definitions and handlers.

pub mod models;
pub mod rank;

use clap::{Parser, Subcommand};

/// framepick - score a batch of photos and keep the best ones
#[derive(Parser)]
#[command(name = "framepick")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Shared rank arguments (paths, weights, selection).
    #[command(flatten)]
    pub rank: rank::RankArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Score images and select the best ones
    Rank(rank::RankArgs),
    /// Manage cascade files
    Models(models::ModelsArgs),
}

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Every image was scored.
    Success,
    /// At least one image could not be scored.
    SomeFailed,
    /// Setup, configuration or I/O failure.
    Error,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        match code {
            ExitCode::Success => Self::SUCCESS,
            ExitCode::SomeFailed => Self::from(1),
            ExitCode::Error => Self::from(2),
        }
    }
}
