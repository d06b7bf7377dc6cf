//! Files written alongside the charts: the combined raw workbook and
//! optional Parquet snapshots of the long tables.

pub mod snapshot;
pub mod workbook;

use std::{collections::BTreeMap, path::Path};

use anyhow::{Context, Result};
use tracing::warn;

use crate::process::LongTable;

pub use snapshot::write_long_parquet;
pub use workbook::write_raw_workbook;

/// One `<key>.parquet` per non-empty long table under `dir`; returns how many were written.
pub fn write_parquet_snapshots(tables: &BTreeMap<String, LongTable>, dir: &Path) -> Result<usize> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating parquet directory {}", dir.display()))?;
    let mut written = 0;
    for (key, table) in tables.iter().filter(|(_, t)| !t.is_empty()) {
        let path = dir.join(format!("{}.parquet", key));
        match write_long_parquet(table, &path) {
            Ok(()) => written += 1,
            Err(e) => warn!("parquet snapshot for {} failed: {:#}", key, e),
        }
    }
    Ok(written)
}
