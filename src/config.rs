//! Run configuration, read from YAML. Every field has a default, so an empty
//! or absent file is a valid configuration.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::process::indicator::{Indicator, IndicatorSource};
use crate::process::SourceSelection;
use crate::render::RenderConfig;

pub const DEFAULT_KEY_PROVINCES: [&str; 8] =
    ["广东", "江苏", "山东", "浙江", "河南", "四川", "北京", "上海"];
pub const DEFAULT_GROWTH_PROVINCES: [&str; 6] = ["广东", "江苏", "上海", "北京", "四川", "湖北"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Bars in latest-year rankings.
    pub top_n: usize,
    /// Bars in averaged and decade-comparison rankings.
    pub wide_top_n: usize,
    /// Years between the compared snapshots ("latest" vs "latest - span").
    pub span_years: i32,
    pub key_provinces: Vec<String>,
    pub growth_provinces: Vec<String>,
    /// Relative tolerance when comparing the two foreign-visitor tables.
    pub overlap_rtol: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            wide_top_n: 15,
            span_years: 10,
            key_provinces: DEFAULT_KEY_PROVINCES.iter().map(|s| s.to_string()).collect(),
            growth_provinces: DEFAULT_GROWTH_PROVINCES.iter().map(|s| s.to_string()).collect(),
            overlap_rtol: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    /// File name of the combined raw workbook, written under `output_dir`.
    pub workbook_name: String,
    /// `sources: {files: [...]}` or `sources: {glob: "*.xlsx"}`.
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub sources: SourceSelection,
    /// Monthly provincial table in `data_dir`; skipped when absent.
    pub monthly_file: String,
    pub render: RenderConfig,
    pub analysis: AnalysisConfig,
    /// Replacements for entries of the default indicator catalog.
    pub indicators: BTreeMap<Indicator, IndicatorSource>,
    pub export_parquet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            workbook_name: "所有原始数据（多工作表）.xlsx".to_string(),
            sources: SourceSelection::default(),
            monthly_file: "海南旅游统计数据.xlsx".to_string(),
            render: RenderConfig::default(),
            analysis: AnalysisConfig::default(),
            indicators: BTreeMap::new(),
            export_parquet: false,
        }
    }
}

impl Config {
    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_yaml(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        info!("config loaded from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn workbook_path(&self) -> PathBuf {
        self.output_dir.join(&self.workbook_name)
    }

    pub fn charts_dir(&self) -> PathBuf {
        self.output_dir.join("charts")
    }

    pub fn parquet_dir(&self) -> PathBuf {
        self.output_dir.join("parquet")
    }
}
