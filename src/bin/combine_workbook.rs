use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tourstat::{config::Config, export::write_raw_workbook, logging, process::load_datasets};
use tracing::{info, warn};

/// Collect every source workbook into one file, one worksheet per dataset.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Defaults to the configured workbook under the output directory.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if !config.data_dir.is_dir() {
        bail!("data directory not found: {}", config.data_dir.display());
    }
    let output = args.output.unwrap_or_else(|| config.workbook_path());

    let raw = load_datasets(&config.data_dir, &config.sources);
    if raw.is_empty() {
        warn!("no readable workbooks in {}, nothing written", config.data_dir.display());
        return Ok(());
    }
    write_raw_workbook(&raw, &output)?;
    info!("{} sheets → {}", raw.len(), output.display());
    Ok(())
}
