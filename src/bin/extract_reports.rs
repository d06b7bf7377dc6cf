use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tourstat::{
    logging,
    report::{read_reports, write_reports_workbook},
};
use tracing::{info, warn};

/// Extract month, visitor and revenue figures from tagged monthly bulletins.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(short, long, default_value = "shuj.txt")]
    input: PathBuf,
    #[arg(short, long, default_value = "旅游统计数据.xlsx")]
    output: PathBuf,
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    if !args.input.is_file() {
        bail!("bulletin file not found: {}", args.input.display());
    }
    let reports = read_reports(&args.input)?;
    if reports.is_empty() {
        warn!("no figures extracted, workbook not written");
        return Ok(());
    }
    let path = write_reports_workbook(&reports, &args.output)?;
    info!("{} months → {}", reports.len(), path.display());
    Ok(())
}
