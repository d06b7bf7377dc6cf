pub mod convert;
pub mod date_parser;
pub mod indicator;
pub mod province;
pub mod raw_table;
pub mod schema;
pub mod trimming;
pub mod utils;

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use calamine::{open_workbook_auto, Data, Reader};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use convert::{reshape, LongRecord, LongTable};
pub use raw_table::{Cell, RawTable};
pub use schema::{EntityKind, ReshapeError};

/// The nine annual source workbooks, by file name.
pub const SOURCE_FILES: [&str; 9] = [
    "地区生产总值分省年度数据.xlsx",
    "国际旅游外汇收入（百万美元）分省年度数据.xlsx",
    "国内旅游情况年度数据.xlsx",
    "国内生成总值年度数据.xlsx",
    "接待国外游客分省年度数据.xlsx",
    "接待外国人游客分省年度数据.xlsx",
    "居民消费水平年度数据.xlsx",
    "旅游业发展情况年度数据.xlsx",
    "全国居民人均收入情况年度数据.xlsx",
];

/// Boilerplate removed from a file name to form its dataset key.
const KEY_NOISE: [&str; 4] = [".xlsx", "年度数据", "情况", "（百万美元）"];

/// Dataset key for a source file name:
/// `国际旅游外汇收入（百万美元）分省年度数据.xlsx` → `国际旅游外汇收入分省`.
pub fn dataset_key(file_name: &str) -> String {
    let mut key = file_name.to_string();
    for noise in KEY_NOISE {
        key = key.replace(noise, "");
    }
    key.trim().to_string()
}

/// Which files in the data directory to load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSelection {
    Files(Vec<String>),
    Glob(String),
}

impl Default for SourceSelection {
    fn default() -> Self {
        SourceSelection::Files(SOURCE_FILES.iter().map(|s| s.to_string()).collect())
    }
}

impl SourceSelection {
    /// Candidate paths under `dir`. Fixed lists keep their order; glob matches are sorted.
    pub fn resolve(&self, dir: &Path) -> Vec<PathBuf> {
        match self {
            SourceSelection::Files(names) => names.iter().map(|n| dir.join(n)).collect(),
            SourceSelection::Glob(pattern) => {
                let full = dir.join(pattern);
                let pattern = full.to_string_lossy();
                match glob::glob(&pattern) {
                    Ok(paths) => {
                        let mut found: Vec<PathBuf> = paths
                            .filter_map(|p| match p {
                                Ok(path) => Some(path),
                                Err(e) => {
                                    warn!("glob entry unreadable: {}", e);
                                    None
                                }
                            })
                            .filter(|p| p.is_file())
                            .collect();
                        found.sort();
                        found
                    }
                    Err(e) => {
                        warn!(pattern = %pattern, "invalid glob pattern: {}", e);
                        Vec::new()
                    }
                }
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {0}")]
    Missing(PathBuf),
    #[error("cannot open workbook {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
    #[error("workbook {0} has no worksheets")]
    NoSheets(PathBuf),
    #[error("cannot read worksheet `{sheet}` of {path}: {source}")]
    Sheet {
        path: PathBuf,
        sheet: String,
        #[source]
        source: calamine::Error,
    },
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        _ => Cell::Empty,
    }
}

/// Read the first worksheet of `path`; its first row is the header.
#[tracing::instrument(level = "debug", skip(path), fields(path = %path.display()))]
pub fn load_workbook(path: &Path) -> Result<RawTable, LoadError> {
    if !path.is_file() {
        return Err(LoadError::Missing(path.to_path_buf()));
    }
    let mut workbook = open_workbook_auto(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| LoadError::NoSheets(path.to_path_buf()))?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|source| LoadError::Sheet {
            path: path.to_path_buf(),
            sheet: sheet.clone(),
            source,
        })?;

    let mut rows = range.rows();
    let headers: Vec<Cell> = rows
        .next()
        .map(|r| r.iter().map(to_cell).collect())
        .unwrap_or_default();
    let body: Vec<Vec<Cell>> = rows.map(|r| r.iter().map(to_cell).collect()).collect();
    debug!(sheet = %sheet, columns = headers.len(), rows = body.len(), "worksheet read");

    Ok(RawTable::new(headers, body))
}

/// Load every selected workbook under `dir`, keyed by [`dataset_key`].
///
/// Unreadable or absent files are logged and skipped.
#[tracing::instrument(level = "info", skip_all, fields(dir = %dir.display()))]
pub fn load_datasets(dir: &Path, selection: &SourceSelection) -> BTreeMap<String, RawTable> {
    let mut out = BTreeMap::new();
    for path in selection.resolve(dir) {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
            continue;
        };
        let key = dataset_key(&name);
        match load_workbook(&path) {
            Ok(table) => {
                info!(key = %key, rows = table.height(), "loaded {}", name);
                out.insert(key, table);
            }
            Err(LoadError::Missing(p)) => warn!("source file missing, skipped: {}", p.display()),
            Err(e) => warn!("source file skipped: {}", e),
        }
    }
    info!("{} datasets loaded", out.len());
    out
}

/// Normalize and reshape every loaded table, skipping the malformed ones.
pub fn reshape_all(raw: &BTreeMap<String, RawTable>) -> BTreeMap<String, LongTable> {
    raw.iter()
        .filter_map(|(key, table)| {
            let normalized = trimming::normalize_table(table);
            match reshape(key, &normalized) {
                Ok(long) => Some((key.clone(), long)),
                Err(e) => {
                    warn!("{}", e);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    use rust_xlsxwriter::Workbook;
    use tracing_subscriber::{fmt, EnvFilter};

    pub fn init_test_logging() {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(EnvFilter::new("debug"))
            .with_test_writer()
            .try_init();
    }

    /// Write a one-sheet workbook with a text header row and numeric body.
    pub fn write_fixture(
        path: &Path,
        headers: &[&str],
        rows: &[(&str, Vec<f64>)],
    ) -> anyhow::Result<()> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, h) in headers.iter().enumerate() {
            sheet.write_string(0, col as u16, *h)?;
        }
        for (r, (label, values)) in rows.iter().enumerate() {
            let row = r as u32 + 1;
            sheet.write_string(row, 0, *label)?;
            for (c, v) in values.iter().enumerate() {
                sheet.write_number(row, c as u16 + 1, *v)?;
            }
        }
        workbook.save(path)?;
        Ok(())
    }
}
