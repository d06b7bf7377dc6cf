//! Country-level trends, growth rates and cross-indicator relationships.

use tracing::{info, warn};

use crate::analysis::{Analysis, FOREIGNERS, FOREIGN_VISITORS, REGIONAL_FX};
use crate::frame::stats::{correlation_matrix, growth_series, national_totals, sums_close};
use crate::frame::{join_all, year_series, JoinKind, YearFrame};
use crate::process::indicator::Indicator;
use crate::process::LongTable;
use crate::render::area::render_stacked_area;
use crate::render::heatmap::{render_heatmap, ColorMap};
use crate::render::line::{render_line, LineChart, Series};
use crate::render::scatter::{render_scatter, ScatterChart, ScatterPoint};

pub const FX_TOTAL: &str = "国际旅游外汇收入";
pub const VISITORS_TOTAL: &str = "接待国外游客人次";

type Points = Vec<(i32, f64)>;

/// National series, resolved once per run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NationalData {
    pub gdp: Points,
    pub income: Points,
    pub consumption: Points,
    pub domestic_visitors: Points,
    pub domestic_spending: Points,
    /// Sum of the provincial foreign-exchange table.
    pub fx: Points,
    /// Sum of the provincial foreign-visitor table.
    pub foreign_visitors: Points,
}

impl NationalData {
    pub fn collect(a: &Analysis<'_>) -> Self {
        let points = |i: Indicator| a.indicator(i).map(|s| s.points).unwrap_or_default();
        let totals = |key: &str| {
            a.table(key, "national totals")
                .map(national_totals)
                .unwrap_or_default()
        };
        Self {
            gdp: points(Indicator::Gdp),
            income: points(Indicator::PerCapitaIncome),
            consumption: points(Indicator::ConsumptionLevel),
            domestic_visitors: points(Indicator::DomesticVisitors),
            domestic_spending: points(Indicator::DomesticSpending),
            fx: totals(REGIONAL_FX),
            foreign_visitors: totals(FOREIGN_VISITORS),
        }
    }

    pub fn economy(&self) -> Option<YearFrame> {
        inner_pair(
            (Indicator::PerCapitaIncome.display_name(), &self.income),
            (Indicator::ConsumptionLevel.display_name(), &self.consumption),
        )
    }

    pub fn domestic(&self) -> Option<YearFrame> {
        inner_pair(
            (Indicator::DomesticVisitors.display_name(), &self.domestic_visitors),
            (Indicator::DomesticSpending.display_name(), &self.domestic_spending),
        )
    }

    pub fn international(&self) -> Option<YearFrame> {
        inner_pair((FX_TOTAL, &self.fx), (VISITORS_TOTAL, &self.foreign_visitors))
    }

    /// Outer join of every available national block.
    pub fn combined(&self) -> Option<YearFrame> {
        let mut blocks = Vec::new();
        if !self.gdp.is_empty() {
            blocks.push(year_series(Indicator::Gdp.display_name(), &self.gdp));
        }
        blocks.extend(self.economy());
        blocks.extend(self.domestic());
        blocks.extend(self.international());
        join_all(&blocks, JoinKind::Outer).filter(|f| !f.is_empty())
    }
}

/// Inner join of two named series; `None` when they share no year.
fn inner_pair(a: (&str, &[(i32, f64)]), b: (&str, &[(i32, f64)])) -> Option<YearFrame> {
    if a.1.is_empty() || b.1.is_empty() {
        return None;
    }
    let joined = year_series(a.0, a.1).join(&year_series(b.0, b.1), JoinKind::Inner);
    (!joined.is_empty()).then_some(joined)
}

/// Whether two provincial tables agree in their all-years national sum.
pub fn same_source(a: &LongTable, b: &LongTable, rtol: f64) -> bool {
    let sum = |t: &LongTable| national_totals(t).iter().map(|(_, v)| v).sum::<f64>();
    sums_close(sum(a), sum(b), rtol)
}

fn log_overlap(a: &Analysis<'_>) {
    let (Some(foreign), Some(foreigners)) = (
        a.table(FOREIGN_VISITORS, "overlap check"),
        a.table(FOREIGNERS, "overlap check"),
    ) else {
        return;
    };
    let rtol = a.settings().overlap_rtol;
    if same_source(foreign, foreigners, rtol) {
        info!(
            rtol,
            "{} and {} agree nationally; national analyses use {}",
            FOREIGNERS, FOREIGN_VISITORS, FOREIGN_VISITORS
        );
    } else {
        info!(
            rtol,
            "{} and {} differ nationally; national analyses use {}",
            FOREIGNERS, FOREIGN_VISITORS, FOREIGN_VISITORS
        );
    }
}

fn col_series(frame: &YearFrame, name: &str) -> Series {
    Series::yearly(name, &frame.column(name))
}

fn scatter(frame: &YearFrame, title: &str, x: &str, y: &str) -> Option<ScatterChart> {
    if frame.column_index(x).is_none() || frame.column_index(y).is_none() {
        warn!(title, "columns missing from national frame, chart skipped");
        return None;
    }
    let points = frame
        .pairs(x, y)
        .into_iter()
        .map(|(_, x, y)| ScatterPoint::new(x, y))
        .collect();
    Some(ScatterChart::new(title, x, y, points).with_fit())
}

pub fn run(a: &mut Analysis<'_>) {
    info!("national analyses");
    log_overlap(a);
    let data = NationalData::collect(a);
    let gdp = Indicator::Gdp.display_name();

    if !data.gdp.is_empty() {
        let trend = LineChart::new("中国GDP总量年度趋势", "年份", "GDP (亿元)")
            .with_series(Series::yearly(gdp, &data.gdp));
        a.draw(|out| render_line(out, &trend));

        let growth = LineChart::new("中国GDP年度增长率", "年份", "增长率 (%)")
            .with_series(Series::yearly("GDP增长率", &growth_series(&data.gdp)))
            .with_zero_line();
        a.draw(|out| render_line(out, &growth));
    }

    if let Some(economy) = data.economy() {
        let income = Indicator::PerCapitaIncome.display_name();
        let consumption = Indicator::ConsumptionLevel.display_name();
        let chart = LineChart::new("中国居民收入与消费趋势", "年份", "人均可支配收入 (元)")
            .with_series(col_series(&economy, income))
            .with_secondary("居民消费水平 (元)", col_series(&economy, consumption));
        a.draw(|out| render_line(out, &chart));
    } else {
        warn!("income or consumption series missing, skipping income/consumption trend");
    }

    if let Some(domestic) = data.domestic() {
        let visitors = Indicator::DomesticVisitors.display_name();
        let spending = Indicator::DomesticSpending.display_name();
        let chart = LineChart::new("国内旅游人次与收入趋势", "年份", "国内旅游人次")
            .with_series(col_series(&domestic, visitors))
            .with_secondary("国内旅游收入 (亿元)", col_series(&domestic, spending));
        a.draw(|out| render_line(out, &chart));
    } else {
        warn!("domestic tourism series missing, skipping domestic trend");
    }

    let international = data.international();
    if let Some(intl) = &international {
        let chart = LineChart::new("国际旅游收入与游客趋势", "年份", "国际旅游外汇收入 (百万美元)")
            .with_series(col_series(intl, FX_TOTAL))
            .with_secondary("接待国外游客人次 (万人次)", col_series(intl, VISITORS_TOTAL));
        a.draw(|out| render_line(out, &chart));

        for (title, column, label) in [
            ("国际旅游外汇收入增长率", FX_TOTAL, "外汇收入增长率"),
            ("接待国外游客增长率", VISITORS_TOTAL, "游客增长率"),
        ] {
            let growth = growth_series(&intl.column(column));
            let chart = LineChart::new(title, "年份", "增长率 (%)")
                .with_series(Series::yearly(label, &growth))
                .with_zero_line();
            a.draw(|out| render_line(out, &chart));
        }
    } else {
        warn!("national foreign-exchange or visitor totals missing, skipping international trend");
    }

    match data.combined() {
        Some(all) if all.columns.len() > 1 => {
            let matrix = correlation_matrix(&all);
            a.draw(|out| {
                render_heatmap(out, "国家宏观经济与旅游指标相关性热力图", &matrix, ColorMap::CoolWarm)
            });

            let income = Indicator::PerCapitaIncome.display_name();
            let visitors = Indicator::DomesticVisitors.display_name();
            let spending = Indicator::DomesticSpending.display_name();
            let scatters = [
                ("GDP与国际旅游外汇收入散点图", gdp, FX_TOTAL),
                ("人均收入与国内旅游收入散点图", income, spending),
                ("GDP与国内旅游人次散点图", gdp, visitors),
                ("国际旅游收入与游客散点图", VISITORS_TOTAL, FX_TOTAL),
            ];
            for (title, x, y) in scatters {
                if let Some(chart) = scatter(&all, title, x, y) {
                    a.draw(|out| render_scatter(out, &chart));
                }
            }
        }
        _ => warn!("too few national indicators for correlation analysis"),
    }

    revenue_mix(a, &data);
    dev_comparisons(a);
}

/// Domestic revenue against foreign-exchange revenue; units differ, so only the shape is comparable.
fn revenue_mix(a: &mut Analysis<'_>, data: &NationalData) {
    let spending = Indicator::DomesticSpending.display_name();
    let Some(mix) = inner_pair((spending, &data.domestic_spending), (FX_TOTAL, &data.fx)) else {
        warn!("domestic revenue or foreign-exchange totals missing, skipping revenue mix");
        return;
    };
    a.draw(|out| render_stacked_area(out, "旅游总收入构成_堆叠面积图", "收入 (单位不统一)", &mix));
}

/// Side-by-side national lines of paired tourism indicators.
fn dev_comparisons(a: &mut Analysis<'_>) {
    let pairs = [
        (
            "全国历年国内外旅游收入对比",
            "收入金额",
            [Indicator::TourismFxRevenue, Indicator::DomesticSpending],
        ),
        (
            "全国历年国内外游客数量对比",
            "游客 (万人次)",
            [Indicator::InboundVisitors, Indicator::DomesticVisitors],
        ),
    ];
    for (title, y_label, indicators) in pairs {
        let mut chart = LineChart::new(title, "年份", y_label);
        for indicator in indicators {
            if let Some(series) = a.indicator(indicator) {
                chart = chart.with_series(Series::yearly(series.label, &series.points));
            }
        }
        a.draw(|out| render_line(out, &chart));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::long_table;
    use crate::config::AnalysisConfig;
    use crate::process::indicator::IndicatorCatalog;
    use crate::process::EntityKind;
    use crate::render::{ChartOutput, ChartStyle, RenderConfig};
    use anyhow::Result;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn tables() -> BTreeMap<String, LongTable> {
        let mut t = BTreeMap::new();
        t.insert(
            "国内生成总值".to_string(),
            long_table(
                "国内生成总值",
                EntityKind::Indicator,
                &[
                    ("国内生产总值(亿元)", 2019, 100.0),
                    ("国内生产总值(亿元)", 2020, 110.0),
                    ("国内生产总值(亿元)", 2021, 121.0),
                ],
            ),
        );
        t.insert(
            REGIONAL_FX.to_string(),
            long_table(
                REGIONAL_FX,
                EntityKind::Province,
                &[("广东", 2020, 10.0), ("北京", 2020, 5.0), ("广东", 2021, 12.0)],
            ),
        );
        t.insert(
            FOREIGN_VISITORS.to_string(),
            long_table(
                FOREIGN_VISITORS,
                EntityKind::Province,
                &[("广东", 2021, 3.0), ("广东", 2022, 4.0)],
            ),
        );
        t
    }

    #[test]
    fn test_national_data_blocks() -> Result<()> {
        let dir = tempdir()?;
        let style = ChartStyle::with_font(&RenderConfig::default(), "sans-serif".into());
        let mut out = ChartOutput::new(dir.path(), style)?;
        let tables = tables();
        let catalog = IndicatorCatalog::default();
        let settings = AnalysisConfig::default();
        let a = Analysis::new(&tables, &catalog, &settings, &mut out);

        let data = NationalData::collect(&a);
        assert_eq!(data.gdp.len(), 3);
        assert_eq!(data.fx, vec![(2020, 15.0), (2021, 12.0)]);
        assert!(data.economy().is_none());

        let intl = data.international().expect("shared year 2021");
        assert_eq!(intl.keys(), vec![2021]);
        assert_eq!(intl.get(&2021, VISITORS_TOTAL), Some(3.0));

        let all = data.combined().expect("gdp and international blocks");
        assert_eq!(all.columns, vec!["国内生产总值", FX_TOTAL, VISITORS_TOTAL]);
        assert_eq!(all.keys(), vec![2019, 2020, 2021]);
        assert_eq!(all.get(&2020, FX_TOTAL), None);
        Ok(())
    }

    #[test]
    fn test_same_source_tolerance() {
        let a = long_table(FOREIGN_VISITORS, EntityKind::Province, &[("广东", 2020, 100.0)]);
        let close = long_table(FOREIGNERS, EntityKind::Province, &[("广东", 2020, 100.5)]);
        let far = long_table(FOREIGNERS, EntityKind::Province, &[("广东", 2020, 120.0)]);
        assert!(same_source(&a, &close, 0.01));
        assert!(!same_source(&a, &far, 0.01));
    }
}
