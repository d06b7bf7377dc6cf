//! National tourism-development indicators.

use tracing::{info, warn};

use crate::analysis::{Analysis, TOURISM_DEV};
use crate::frame::stats::correlation_matrix;
use crate::frame::{pivot, YearFrame};
use crate::process::indicator::Indicator;
use crate::render::heatmap::{render_heatmap, ColorMap};
use crate::render::line::{render_panels, LineChart, Series};

/// Indicators charted when present; matched as substrings of the source label.
pub const DEV_KEYWORDS: [&str; 4] = ["入境游客", "入境过夜游客", "国内居民出境人数", "旅游从业人员"];

/// Columns charted when no keyword matches.
const FALLBACK_COLUMNS: usize = 5;

const FACILITIES: [Indicator; 3] = [
    Indicator::StarHotels,
    Indicator::TravelAgencies,
    Indicator::ScenicSpots,
];

/// Columns whose label contains any keyword, in column order; else the first few columns.
pub fn dev_columns(frame: &YearFrame, keywords: &[&str]) -> Vec<String> {
    let matched: Vec<String> = frame
        .columns
        .iter()
        .filter(|c| keywords.iter().any(|k| c.contains(k)))
        .cloned()
        .collect();
    if !matched.is_empty() {
        return matched;
    }
    frame.columns.iter().take(FALLBACK_COLUMNS).cloned().collect()
}

fn panel_for(label: &str, points: &[(i32, f64)]) -> LineChart {
    LineChart::new(&format!("中国{}年度趋势", label), "年份", label)
        .with_series(Series::yearly(label, points))
}

pub fn run(a: &mut Analysis<'_>) {
    info!("tourism development analyses");
    let Some(dev) = a.table(TOURISM_DEV, "tourism development analyses") else {
        return;
    };
    let wide = pivot(&dev.records);

    let columns = dev_columns(&wide, &DEV_KEYWORDS);
    let panels: Vec<LineChart> = columns
        .iter()
        .map(|c| panel_for(c, &wide.column(c)))
        .collect();
    a.draw(|out| render_panels(out, "旅游业发展主要指标趋势", &panels));

    if wide.columns.len() > 1 {
        let matrix = correlation_matrix(&wide);
        a.draw(|out| render_heatmap(out, "旅游业发展指标相关性热力图", &matrix, ColorMap::Viridis));
    } else {
        warn!("fewer than two tourism development indicators, correlation skipped");
    }

    let facilities: Vec<LineChart> = FACILITIES
        .iter()
        .filter_map(|i| a.indicator(*i))
        .map(|s| panel_for(&s.label, &s.points))
        .collect();
    if facilities.is_empty() {
        warn!("no facility indicators found, facility trends skipped");
        return;
    }
    a.draw(|out| render_panels(out, "旅游业主要设施数量趋势", &facilities));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dev_columns_keyword_then_fallback() {
        let mut wide = YearFrame::new(Vec::new());
        for name in [
            "入境游客(万人次)",
            "星级饭店数(家)",
            "入境过夜游客(万人次)",
            "旅游从业人员数(人)",
        ] {
            wide.set(2020, name, Some(1.0));
        }
        assert_eq!(
            dev_columns(&wide, &DEV_KEYWORDS),
            vec!["入境游客(万人次)", "入境过夜游客(万人次)", "旅游从业人员数(人)"]
        );

        let mut other = YearFrame::new(Vec::new());
        for i in 0..7 {
            other.set(2020, &format!("指标{}", i), Some(i as f64));
        }
        let fallback = dev_columns(&other, &DEV_KEYWORDS);
        assert_eq!(fallback.len(), 5);
        assert_eq!(fallback[0], "指标0");
    }
}
