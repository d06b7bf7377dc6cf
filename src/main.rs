use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tourstat::{
    analysis::Analysis,
    config::Config,
    export, logging,
    process::{self, indicator::IndicatorCatalog, load_workbook},
    render::{ChartOutput, ChartStyle},
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about = "Tourism and GDP statistics: reshape, export and chart")]
struct Args {
    /// YAML configuration; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    logging::init();
    info!("startup");

    // ─── 2) configuration ────────────────────────────────────────────
    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if !config.data_dir.is_dir() {
        bail!("data directory not found: {}", config.data_dir.display());
    }

    // ─── 3) load & reshape ───────────────────────────────────────────
    let raw = process::load_datasets(&config.data_dir, &config.sources);
    info!("{} datasets loaded", raw.len());
    let tables = process::reshape_all(&raw);
    info!("{} datasets reshaped", tables.len());

    // ─── 4) exports ──────────────────────────────────────────────────
    if let Err(e) = export::write_raw_workbook(&raw, &config.workbook_path()) {
        warn!("combined workbook not written: {:#}", e);
    }
    if config.export_parquet {
        match export::write_parquet_snapshots(&tables, &config.parquet_dir()) {
            Ok(n) => info!("{} parquet snapshots written", n),
            Err(e) => warn!("parquet snapshots not written: {:#}", e),
        }
    }

    // ─── 5) charts ───────────────────────────────────────────────────
    let catalog = IndicatorCatalog::default().with_overrides(&config.indicators);
    let style = ChartStyle::from_config(&config.render);
    let mut out = ChartOutput::new(&config.charts_dir(), style)?;

    let monthly_path = config.data_dir.join(&config.monthly_file);
    let monthly = match load_workbook(&monthly_path) {
        Ok(table) => Some(table),
        Err(e) => {
            warn!("monthly table unavailable: {}", e);
            None
        }
    };

    let mut analysis = Analysis::new(&tables, &catalog, &config.analysis, &mut out);
    if let Some(table) = &monthly {
        analysis = analysis.with_monthly(table);
    }
    let written = analysis.run();

    info!("done: {} charts in {}", written, config.charts_dir().display());
    Ok(())
}
