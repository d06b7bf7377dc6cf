//! Monthly tourism bulletins.
//!
//! Bulletins arrive as one plain-text file of `<文本>…</文本>` blocks. Each
//! block yields a month, the visitor total (万人次) and the tourism revenue
//! (亿元) when the corresponding phrase is present.

pub mod series;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_xlsxwriter::{Format, Workbook};
use tracing::{debug, info, warn};

use crate::process::date_parser::{parse_month_label, year_month};

pub use series::{monthly_series, MonthlyPoint};

/// Column headers of the extracted-report workbook.
pub const REPORT_COLUMNS: [&str; 3] = ["月份", "接待游客总人数（万人次）", "旅游总收入（亿元）"];

/// Label written for a block whose month could not be read.
const UNKNOWN_MONTH: &str = "N/A";

static BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<文本>(.*?)</文本>").expect("bulletin block pattern"));

static BULLETIN_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4}年\d{1,2}月)旅游统计").expect("bulletin date pattern"));

static VISITORS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"一、接待(?:游客总人数(?:（万人次）)?|旅游者总计|过夜旅游者总计(?:（万人次）)?|过夜人数合计(?:（万人次）)?)\s*(\d+\.?\d*)",
    )
    .expect("visitor total pattern")
});

static REVENUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[二三四]、(?:游客总花费|旅游(?:总)?收入)（亿元）\s*(\d+\.?\d*)")
        .expect("revenue pattern")
});

/// Figures extracted from one bulletin.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyReport {
    /// Month as written in the bulletin, e.g. `2023年5月`.
    pub label: Option<String>,
    pub month: Option<NaiveDate>,
    pub visitors: Option<f64>,
    pub revenue: Option<f64>,
}

impl MonthlyReport {
    /// Digits of the label, so `2023年13月` still sorts after `2023年12月`.
    fn sort_key(&self) -> (i32, u32) {
        self.label.as_deref().and_then(year_month).unwrap_or((0, 0))
    }
}

fn capture_number(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn parse_block(block: &str) -> Option<MonthlyReport> {
    let label = BULLETIN_DATE
        .captures(block)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    let visitors = capture_number(&VISITORS, block);
    let revenue = capture_number(&REVENUE, block);
    if label.is_none() && visitors.is_none() && revenue.is_none() {
        return None;
    }
    Some(MonthlyReport {
        month: label.as_deref().and_then(parse_month_label),
        label,
        visitors,
        revenue,
    })
}

/// Every bulletin in `text` with at least one recognised field, in month order.
/// Bulletins without a month label sort first.
pub fn extract_reports(text: &str) -> Vec<MonthlyReport> {
    let blocks: Vec<&str> = BLOCK
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .collect();
    if blocks.is_empty() {
        warn!("no <文本> blocks found");
        return Vec::new();
    }

    let mut reports: Vec<MonthlyReport> = blocks.iter().filter_map(|b| parse_block(b)).collect();
    debug!(blocks = blocks.len(), kept = reports.len(), "bulletins parsed");
    reports.sort_by_key(MonthlyReport::sort_key);
    reports
}

#[tracing::instrument(level = "info", skip(path), fields(path = %path.display()))]
pub fn read_reports(path: &Path) -> Result<Vec<MonthlyReport>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading bulletin file {}", path.display()))?;
    let reports = extract_reports(&text);
    info!(reports = reports.len(), "bulletins extracted");
    Ok(reports)
}

/// Write the month/visitors/revenue table; absent figures are left blank.
pub fn write_reports_workbook(reports: &[MonthlyReport], path: &Path) -> Result<PathBuf> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();

    for (col, header) in REPORT_COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }
    for (i, report) in reports.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, report.label.as_deref().unwrap_or(UNKNOWN_MONTH))?;
        if let Some(v) = report.visitors {
            sheet.write_number(row, 1, v)?;
        }
        if let Some(v) = report.revenue {
            sheet.write_number(row, 2, v)?;
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("saving report workbook {}", path.display()))?;
    info!(rows = reports.len(), "report workbook written: {}", path.display());
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{load_workbook, Cell};
    use tempfile::tempdir;

    const BULLETINS: &str = "\
<文本>2023年5月旅游统计
一、接待游客总人数（万人次）  812.35
二、游客总花费（亿元） 103.2
</文本>
<文本>2023年1月旅游统计
一、接待过夜旅游者总计（万人次）540.1
三、旅游总收入（亿元）88
</文本>
<文本>2022年12月旅游统计
一、接待旅游者总计 600
四、旅游收入（亿元） 70.5
</文本>
<文本>一、接待过夜人数合计（万人次）12.5</文本>
<文本>与统计无关的说明文字</文本>";

    #[test]
    fn test_extract_each_phrasing() {
        let reports = extract_reports(BULLETINS);
        assert_eq!(reports.len(), 4);

        // unreadable month sorts first
        assert_eq!(reports[0].label, None);
        assert_eq!(reports[0].visitors, Some(12.5));
        assert_eq!(reports[0].revenue, None);

        assert_eq!(reports[1].label.as_deref(), Some("2022年12月"));
        assert_eq!(reports[1].visitors, Some(600.0));
        assert_eq!(reports[1].revenue, Some(70.5));

        assert_eq!(reports[2].month, NaiveDate::from_ymd_opt(2023, 1, 1));
        assert_eq!(reports[2].visitors, Some(540.1));
        assert_eq!(reports[2].revenue, Some(88.0));

        assert_eq!(reports[3].visitors, Some(812.35));
        assert_eq!(reports[3].revenue, Some(103.2));
    }

    #[test]
    fn test_invalid_month_keeps_its_place() {
        let text = "\
<文本>2023年13月旅游统计
一、接待游客总人数（万人次） 900
</文本>
<文本>2023年2月旅游统计
一、接待游客总人数（万人次） 450
</文本>
<文本>一、接待旅游者总计 10</文本>";
        let reports = extract_reports(text);
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].label, None);
        assert_eq!(reports[1].label.as_deref(), Some("2023年2月"));
        assert_eq!(reports[2].label.as_deref(), Some("2023年13月"));
        assert_eq!(reports[2].month, None);
        assert_eq!(reports[2].visitors, Some(900.0));
    }

    #[test]
    fn test_no_blocks() {
        assert!(extract_reports("plain text without tags").is_empty());
    }

    #[test]
    fn test_reports_workbook() -> Result<()> {
        let dir = tempdir()?;
        let input = dir.path().join("shuj.txt");
        fs::write(&input, BULLETINS)?;
        let reports = read_reports(&input)?;

        let out = dir.path().join("旅游统计数据.xlsx");
        write_reports_workbook(&reports, &out)?;
        let table = load_workbook(&out)?;
        assert_eq!(table.header_labels(), REPORT_COLUMNS.to_vec());
        assert_eq!(table.height(), 4);
        assert_eq!(table.cell(0, 0), &Cell::text(UNKNOWN_MONTH));
        assert!(table.cell(0, 2).is_empty());
        assert_eq!(table.cell(3, 0), &Cell::text("2023年5月"));
        assert_eq!(table.cell(3, 1), &Cell::Number(812.35));
        Ok(())
    }

    #[test]
    fn test_missing_bulletin_file() {
        let dir = tempdir().expect("tempdir");
        assert!(read_reports(&dir.path().join("absent.txt")).is_err());
    }
}
