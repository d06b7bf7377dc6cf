//! The fixed catalogue of analyses run over the reshaped datasets.
//!
//! Each section pulls what it needs from [`Analysis`], skips with a warning
//! when an input is missing, and hands prepared data to the renderer. A
//! failed chart never stops the run.

pub mod monthly;
pub mod national;
pub mod regional;
pub mod tourism;

use std::{collections::BTreeMap, path::PathBuf};

use anyhow::Result;
use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::process::indicator::{Indicator, IndicatorCatalog, IndicatorSeries};
use crate::process::{LongTable, RawTable};
use crate::render::ChartOutput;

pub const REGIONAL_GDP: &str = "地区生产总值分省";
pub const REGIONAL_FX: &str = "国际旅游外汇收入分省";
/// Used by the national foreign-visitor series and the provincial rankings.
pub const FOREIGN_VISITORS: &str = "接待国外游客分省";
/// Used by the provincial cross-sections and maps.
pub const FOREIGNERS: &str = "接待外国人游客分省";
pub const TOURISM_DEV: &str = "旅游业发展";

pub struct Analysis<'a> {
    tables: &'a BTreeMap<String, LongTable>,
    catalog: &'a IndicatorCatalog,
    settings: &'a AnalysisConfig,
    out: &'a mut ChartOutput,
    monthly: Option<&'a RawTable>,
    failed: usize,
}

impl<'a> Analysis<'a> {
    pub fn new(
        tables: &'a BTreeMap<String, LongTable>,
        catalog: &'a IndicatorCatalog,
        settings: &'a AnalysisConfig,
        out: &'a mut ChartOutput,
    ) -> Self {
        Self {
            tables,
            catalog,
            settings,
            out,
            monthly: None,
            failed: 0,
        }
    }

    /// Also chart this monthly provincial table.
    pub fn with_monthly(mut self, table: &'a RawTable) -> Self {
        self.monthly = Some(table);
        self
    }

    pub fn settings(&self) -> &'a AnalysisConfig {
        self.settings
    }

    /// A non-empty dataset, or a warning naming what is skipped.
    pub fn table(&self, key: &str, skipping: &str) -> Option<&'a LongTable> {
        match self.tables.get(key) {
            Some(t) if !t.is_empty() => Some(t),
            _ => {
                warn!(dataset = key, "dataset unavailable, skipping {}", skipping);
                None
            }
        }
    }

    pub fn indicator(&self, indicator: Indicator) -> Option<IndicatorSeries> {
        self.catalog.resolve(indicator, self.tables)
    }

    /// Run one render call; failures are logged and counted.
    pub fn draw<F>(&mut self, render: F)
    where
        F: FnOnce(&mut ChartOutput) -> Result<Option<PathBuf>>,
    {
        if let Err(e) = render(&mut *self.out) {
            self.failed += 1;
            warn!("chart failed: {:#}", e);
        }
    }

    /// Every section in order; returns the number of files written.
    pub fn run(mut self) -> usize {
        national::run(&mut self);
        regional::run(&mut self);
        tourism::run(&mut self);
        if let Some(table) = self.monthly {
            monthly::run(&mut self, table);
        }
        let written = self.out.written().len();
        info!(written, failed = self.failed, "analysis finished");
        written
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::EntityKind;
    use crate::render::{ChartStyle, RenderConfig};
    use tempfile::tempdir;

    #[test]
    fn test_missing_datasets_write_nothing() -> Result<()> {
        crate::process::test_support::init_test_logging();
        let dir = tempdir()?;
        let style = ChartStyle::with_font(&RenderConfig::default(), "sans-serif".into());
        let mut out = ChartOutput::new(dir.path(), style)?;
        let tables = BTreeMap::new();
        let catalog = IndicatorCatalog::default();
        let settings = AnalysisConfig::default();

        let written = Analysis::new(&tables, &catalog, &settings, &mut out).run();
        assert_eq!(written, 0);
        assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }

    #[test]
    fn test_populated_tables_write_numbered_charts() -> Result<()> {
        let dir = tempdir()?;
        let mut out = crate::render::test_support::small_output(dir.path())?;
        let mut tables = BTreeMap::new();
        tables.insert(
            "国内生成总值".to_string(),
            test_support::long_table(
                "国内生成总值",
                EntityKind::Indicator,
                &[
                    ("国内生产总值(亿元)", 2019, 986515.2),
                    ("国内生产总值(亿元)", 2020, 1013567.0),
                    ("国内生产总值(亿元)", 2021, 1149237.0),
                ],
            ),
        );
        tables.insert(
            REGIONAL_GDP.to_string(),
            test_support::long_table(
                REGIONAL_GDP,
                EntityKind::Province,
                &[
                    ("广东", 2020, 110760.9),
                    ("江苏", 2020, 102719.0),
                    ("广东", 2021, 124369.7),
                    ("江苏", 2021, 116364.2),
                ],
            ),
        );
        let catalog = IndicatorCatalog::default();
        let settings = AnalysisConfig::default();

        let written = Analysis::new(&tables, &catalog, &settings, &mut out).run();
        assert!(written > 0);
        let files = out.written();
        assert_eq!(files.len(), written);
        assert_eq!(files[0], dir.path().join("中国GDP总量年度趋势_1.png"));
        let mut last = 0;
        for path in files {
            assert!(path.exists(), "{} missing", path.display());
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            let n: usize = stem.rsplit('_').next().unwrap_or_default().parse()?;
            assert!(n > last, "{} is out of sequence", path.display());
            last = n;
        }
        Ok(())
    }

    #[test]
    fn test_empty_table_counts_as_missing() -> Result<()> {
        let dir = tempdir()?;
        let style = ChartStyle::with_font(&RenderConfig::default(), "sans-serif".into());
        let mut out = ChartOutput::new(dir.path(), style)?;
        let mut tables = BTreeMap::new();
        tables.insert(
            REGIONAL_GDP.to_string(),
            test_support::long_table(REGIONAL_GDP, EntityKind::Province, &[]),
        );
        let catalog = IndicatorCatalog::default();
        let settings = AnalysisConfig::default();
        let analysis = Analysis::new(&tables, &catalog, &settings, &mut out);
        assert!(analysis.table(REGIONAL_GDP, "test").is_none());
        assert!(analysis.table("absent", "test").is_none());
        Ok(())
    }
}
