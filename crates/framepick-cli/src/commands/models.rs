//! Models command - manage cascade files.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use framepick_adapters::{CascadeStore, CASCADES};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::AppConfig;

/// Arguments for the models command
#[derive(Args)]
pub struct ModelsArgs {
    /// Custom cascades directory (overrides default and config)
    #[arg(long, value_name = "DIR", global = true)]
    pub cascades_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Models subcommands
#[derive(Subcommand)]
pub enum ModelsCommand {
    /// Download missing cascade files
    Fetch {
        /// Download again even if present
        #[arg(long)]
        force: bool,
    },
    /// List installed cascade files
    List,
    /// Print cascades directory path
    Path,
}

/// Run the models command.
pub fn run(args: &ModelsArgs, config: &AppConfig) -> Result<()> {
    let store = args
        .cascades_dir
        .clone()
        .or_else(|| config.models.dir.clone())
        .map_or_else(CascadeStore::default, CascadeStore::new);

    match args.command {
        ModelsCommand::Fetch { force } => fetch_cascades(&store, force),
        ModelsCommand::List => list_cascades(&store),
        ModelsCommand::Path => print_path(&store),
    }
}

fn fetch_cascades(store: &CascadeStore, force: bool) -> Result<()> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .map_err(|e| anyhow::anyhow!("Invalid progress template: {e}"))?,
    );
    pb.set_message("Fetching cascades");

    if force {
        store.refresh()?;
    } else {
        store.ensure_with_progress(|name, bytes| {
            pb.println(format!("Downloaded {name} ({bytes} bytes)"));
            pb.tick();
        })?;
    }

    pb.finish_with_message("All cascades installed");
    Ok(())
}

#[allow(clippy::unnecessary_wraps)]
fn list_cascades(store: &CascadeStore) -> Result<()> {
    let cascades = store.list();

    println!("Cascades directory: {}", store.dir().display());
    println!();

    for (name, installed) in &cascades {
        let status = if *installed { "✓" } else { "✗" };
        let info = CASCADES.iter().find(|c| c.name == name);
        let filename = info.map_or("unknown", |c| c.filename);
        println!("  {status} {name} ({filename})");
    }

    println!();
    let installed_count = cascades.iter().filter(|(_, installed)| *installed).count();
    println!("{}/{} cascades installed", installed_count, cascades.len());

    Ok(())
}

#[allow(clippy::unnecessary_wraps)]
fn print_path(store: &CascadeStore) -> Result<()> {
    println!("{}", store.dir().display());
    Ok(())
}
