//! Provincial rankings, distributions, trends, cross-sections and maps.

use std::collections::BTreeSet;

use plotters::style::RGBColor;
use tracing::{info, warn};

use crate::analysis::{Analysis, FOREIGNERS, FOREIGN_VISITORS, REGIONAL_FX, REGIONAL_GDP};
use crate::config::AnalysisConfig;
use crate::frame::stats::{
    correlation_matrix, entity_means, growth_series, mean_growth, span_growth, top_n,
};
use crate::frame::{join_all, panel, JoinKind, PanelFrame};
use crate::process::LongTable;
use crate::render::bar::{render_bar, BarChart};
use crate::render::boxplot::render_box;
use crate::render::choropleth::{render_choropleth, Choropleth};
use crate::render::heatmap::{render_heatmap, ColorMap};
use crate::render::line::{render_line, LineChart, Series};
use crate::render::scatter::{render_scatter, ScatterChart, ScatterPoint};

pub const GDP_COL: &str = "GDP (亿元)";
pub const FX_COL: &str = "外汇收入 (百万美元)";
pub const VISITORS_COL: &str = "接待国外游客 (万人次)";
pub const FOREIGNERS_COL: &str = "接待外国人 (万人次)";

const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
const LIGHT_GREEN: RGBColor = RGBColor(144, 238, 144);

/// Points labelled in the GDP/visitor scatter, per axis.
const LABELLED_PER_AXIS: usize = 5;

/// One provincial dataset and how it is described on charts.
struct Subject {
    key: &'static str,
    name: &'static str,
    column: &'static str,
}

const GDP: Subject = Subject {
    key: REGIONAL_GDP,
    name: "GDP",
    column: GDP_COL,
};
const FX: Subject = Subject {
    key: REGIONAL_FX,
    name: "国际旅游外汇收入",
    column: FX_COL,
};
const VISITORS: Subject = Subject {
    key: FOREIGN_VISITORS,
    name: "接待国外游客",
    column: VISITORS_COL,
};
const FOREIGN_GUESTS: Subject = Subject {
    key: FOREIGNERS,
    name: "接待外国游客",
    column: FOREIGNERS_COL,
};

/// Yearly series for each configured province present in `table`, in configured order.
pub fn province_series(table: &LongTable, provinces: &[String]) -> Vec<Series> {
    provinces
        .iter()
        .filter_map(|p| {
            let points = table.series(p);
            (!points.is_empty()).then(|| Series::yearly(p.as_str(), &points))
        })
        .collect()
}

/// Inner (province, year) join of several provincial tables.
pub fn provincial_panel(tables: &[(&LongTable, &str)]) -> Option<PanelFrame> {
    let frames: Vec<PanelFrame> = tables.iter().map(|(t, name)| panel(t, name)).collect();
    join_all(&frames, JoinKind::Inner).filter(|f| !f.is_empty())
}

/// Rows of the latest year present in `frame`, with that year.
pub fn latest_cross_section(frame: &PanelFrame) -> Option<(i32, PanelFrame)> {
    let latest = frame.rows.keys().map(|(_, y)| *y).max()?;
    Some((latest, frame.filter_keys(|(_, y)| *y == latest)))
}

/// Scatter points labelling the provinces ranked highest on either axis.
pub fn labelled_points(pairs: &[(String, f64, f64)], per_axis: usize) -> Vec<ScatterPoint> {
    let top_by = |key: fn(&(String, f64, f64)) -> f64| {
        let mut sorted: Vec<&(String, f64, f64)> = pairs.iter().collect();
        sorted.sort_by(|a, b| key(b).total_cmp(&key(a)));
        sorted
            .into_iter()
            .take(per_axis)
            .map(|(p, _, _)| p.clone())
            .collect::<Vec<String>>()
    };
    let mut labelled: BTreeSet<String> = top_by(|p| p.2).into_iter().collect();
    labelled.extend(top_by(|p| p.1));

    pairs
        .iter()
        .map(|(p, x, y)| {
            if labelled.contains(p) {
                ScatterPoint::labelled(p.as_str(), *x, *y)
            } else {
                ScatterPoint::new(*x, *y)
            }
        })
        .collect()
}

fn ranking(
    a: &mut Analysis<'_>,
    table: &LongTable,
    subject: &Subject,
    year: i32,
    n: usize,
    suffix: &str,
) {
    let bars = top_n(table, year, n);
    let title = format!("{}年各省{}排名{}", year, subject.name, suffix);
    let chart = BarChart::new(&title, subject.column, bars);
    a.draw(|out| render_bar(out, &chart));
}

fn trends(a: &mut Analysis<'_>, table: &LongTable, subject: &Subject, provinces: &[String]) {
    let series = province_series(table, provinces);
    if series.is_empty() {
        warn!(dataset = subject.key, "none of the key provinces present, trend skipped");
        return;
    }
    let title = format!("重点省份{}年度趋势", subject.name);
    let mut chart = LineChart::new(&title, "年份", subject.column);
    for s in series {
        chart = chart.with_series(s);
    }
    a.draw(|out| render_line(out, &chart));
}

fn distribution(a: &mut Analysis<'_>, table: &LongTable, subject: &Subject, color: RGBColor) {
    let values: Vec<f64> = table.records.iter().map(|r| r.value).collect();
    let title = format!("各省{}分布箱线图", subject.name);
    a.draw(|out| render_box(out, &title, subject.column, &values, color));
}

fn maps(a: &mut Analysis<'_>, table: &LongTable, subject: &Subject, years: &[i32]) {
    for &year in years {
        let values: Vec<(String, f64)> = table
            .for_year(year)
            .into_iter()
            .map(|r| (r.entity.clone(), r.value))
            .collect();
        let title = format!("{}年各省{}分布", year, subject.name);
        let map = Choropleth::new(&title, subject.column, values);
        a.draw(|out| render_choropleth(out, &map));
    }
}

/// Latest year and the year `span` before it.
fn compared_years(table: &LongTable, settings: &AnalysisConfig) -> Vec<i32> {
    match table.latest_year() {
        Some(latest) => vec![latest, latest - settings.span_years],
        None => Vec::new(),
    }
}

pub fn run(a: &mut Analysis<'_>) {
    info!("regional analyses");
    let settings = a.settings();
    let gdp = a.table(GDP.key, "provincial GDP analyses");
    let fx = a.table(FX.key, "provincial foreign-exchange analyses");
    let visitors = a.table(VISITORS.key, "provincial visitor analyses");
    let foreigners = a.table(FOREIGN_GUESTS.key, "provincial foreigner analyses");

    if let Some(t) = gdp {
        if let Some(latest) = t.latest_year() {
            ranking(a, t, &GDP, latest, settings.top_n, "");
        }
        trends(a, t, &GDP, &settings.key_provinces);
        growth_trends(a, t, &settings.growth_provinces);
    }
    if let Some(t) = fx {
        if let Some(latest) = t.latest_year() {
            ranking(a, t, &FX, latest, settings.top_n, "");
        }
        distribution(a, t, &FX, SKY_BLUE);
        trends(a, t, &FX, &settings.key_provinces);

        let title = format!("各省平均{} (所有年份均值, Top {})", FX.name, settings.wide_top_n);
        let mut means = entity_means(t, None);
        means.truncate(settings.wide_top_n);
        let chart = BarChart::new(&title, FX.column, means);
        a.draw(|out| render_bar(out, &chart));
    }
    if let Some(t) = visitors {
        if let Some(latest) = t.latest_year() {
            ranking(a, t, &VISITORS, latest, settings.top_n, "");
        }
        distribution(a, t, &VISITORS, LIGHT_GREEN);

        let title = format!("各省{}平均增长率 (Top {})", VISITORS.name, settings.wide_top_n);
        let mut growth = mean_growth(t);
        growth.truncate(settings.wide_top_n);
        let chart = BarChart::new(&title, "平均增长率 (%)", growth);
        a.draw(|out| render_bar(out, &chart));
    }
    if let (Some(g), Some(v)) = (gdp, visitors) {
        gdp_visitor_scatter(a, g, v);
    }

    decade_comparison(a, &[(gdp, &GDP), (fx, &FX), (foreigners, &FOREIGN_GUESTS)]);

    if let (Some(g), Some(f), Some(fo)) = (gdp, fx, foreigners) {
        cross_section(a, g, f, fo);
    }
    if let Some(t) = gdp {
        if let Some(latest) = t.latest_year() {
            let from = latest - settings.span_years;
            let mut growth = span_growth(t, from, latest);
            growth.truncate(settings.wide_top_n);
            if growth.is_empty() {
                warn!(from, to = latest, "no province has GDP for both years, growth ranking skipped");
            } else {
                let title = format!("{}年到{}年各省GDP增长率排名", from, latest);
                let chart = BarChart::new(&title, "GDP增长率 (%)", growth);
                a.draw(|out| render_bar(out, &chart));
            }
        }
    }
}

fn growth_trends(a: &mut Analysis<'_>, gdp: &LongTable, provinces: &[String]) {
    let mut chart = LineChart::new("重点省份GDP增长率趋势", "年份", "增长率 (%)").with_zero_line();
    for province in provinces {
        let growth = growth_series(&gdp.series(province));
        if !growth.is_empty() {
            chart = chart.with_series(Series::yearly(province.as_str(), &growth));
        }
    }
    a.draw(|out| render_line(out, &chart));
}

/// Provincial GDP against foreign visitors in the latest year both tables cover.
fn gdp_visitor_scatter(a: &mut Analysis<'_>, gdp: &LongTable, visitors: &LongTable) {
    let Some((year, section)) = provincial_panel(&[(gdp, GDP_COL), (visitors, VISITORS_COL)])
        .as_ref()
        .and_then(latest_cross_section)
    else {
        warn!("GDP and visitor tables share no year, scatter skipped");
        return;
    };
    let pairs: Vec<(String, f64, f64)> = section
        .pairs(GDP_COL, VISITORS_COL)
        .into_iter()
        .map(|((p, _), x, y)| (p, x, y))
        .collect();
    let chart = ScatterChart::new(
        &format!("{}年各省GDP与接待国外游客散点图", year),
        &format!("GDP ({}年, 亿元)", year),
        &format!("接待国外游客人次 ({}年, 万人次)", year),
        labelled_points(&pairs, LABELLED_PER_AXIS),
    );
    a.draw(|out| render_scatter(out, &chart));
}

/// Rankings and maps for the latest year and `span_years` earlier.
fn decade_comparison(a: &mut Analysis<'_>, subjects: &[(Option<&LongTable>, &Subject)]) {
    let settings = a.settings();
    for (table, subject) in subjects {
        let Some(t) = table else { continue };
        let years = compared_years(t, settings);
        for &year in &years {
            let suffix = format!(" (Top {})", settings.wide_top_n);
            ranking(a, t, subject, year, settings.wide_top_n, &suffix);
        }
        maps(a, t, subject, &years);
    }
}

/// Latest-year provincial cross-section of GDP, foreign exchange and foreign guests.
fn cross_section(a: &mut Analysis<'_>, gdp: &LongTable, fx: &LongTable, foreigners: &LongTable) {
    let merged = provincial_panel(&[
        (gdp, GDP_COL),
        (fx, FX_COL),
        (foreigners, FOREIGNERS_COL),
    ]);
    let Some((year, section)) = merged.as_ref().and_then(latest_cross_section) else {
        warn!("no province-year present in all three tables, cross-section skipped");
        return;
    };

    for (y_col, what) in [(FX_COL, "旅游外汇收入"), (FOREIGNERS_COL, "接待外国游客")] {
        let points = section
            .pairs(GDP_COL, y_col)
            .into_iter()
            .map(|((p, _), x, y)| ScatterPoint::labelled(p, x, y))
            .collect();
        let title = format!("{}年GDP与{}关联性", year, what);
        let chart = ScatterChart::new(&title, GDP_COL, y_col, points).with_fit();
        a.draw(|out| render_scatter(out, &chart));
    }

    let matrix = correlation_matrix(&section);
    let title = format!("{}年省级GDP与旅游指标相关性热力图", year);
    a.draw(|out| render_heatmap(out, &title, &matrix, ColorMap::CoolWarm));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::long_table;
    use crate::process::EntityKind;

    #[test]
    fn test_province_series_keeps_configured_order() {
        let t = long_table(
            REGIONAL_GDP,
            EntityKind::Province,
            &[("江苏", 2020, 2.0), ("广东", 2020, 1.0), ("广东", 2021, 3.0)],
        );
        let wanted = vec!["广东".to_string(), "西藏".to_string(), "江苏".to_string()];
        let series = province_series(&t, &wanted);
        let names: Vec<&str> = series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["广东", "江苏"]);
        assert_eq!(series[0].points, vec![(2020.0, 1.0), (2021.0, 3.0)]);
    }

    #[test]
    fn test_latest_common_cross_section() {
        let gdp = long_table(
            REGIONAL_GDP,
            EntityKind::Province,
            &[("广东", 2020, 1.0), ("广东", 2021, 2.0), ("江苏", 2021, 3.0), ("江苏", 2022, 4.0)],
        );
        let fx = long_table(
            REGIONAL_FX,
            EntityKind::Province,
            &[("广东", 2020, 10.0), ("广东", 2021, 20.0), ("江苏", 2020, 30.0)],
        );
        let merged = provincial_panel(&[(&gdp, GDP_COL), (&fx, FX_COL)]).expect("shared rows");
        let (year, section) = latest_cross_section(&merged).expect("non-empty");
        assert_eq!(year, 2021);
        assert_eq!(section.keys(), vec![("广东".to_string(), 2021)]);
        assert_eq!(section.get(&("广东".to_string(), 2021), FX_COL), Some(20.0));

        let disjoint = long_table(FOREIGNERS, EntityKind::Province, &[("西藏", 2019, 1.0)]);
        assert!(provincial_panel(&[(&gdp, GDP_COL), (&disjoint, FOREIGNERS_COL)]).is_none());
    }

    #[test]
    fn test_labelled_points_union_of_leaders() {
        let pairs = vec![
            ("a".to_string(), 10.0, 1.0),
            ("b".to_string(), 1.0, 10.0),
            ("c".to_string(), 5.0, 5.0),
            ("d".to_string(), 0.0, 0.0),
        ];
        let points = labelled_points(&pairs, 1);
        let labels: Vec<Option<&str>> = points.iter().map(|p| p.label.as_deref()).collect();
        assert_eq!(labels, vec![Some("a"), Some("b"), None, None]);
    }

    #[test]
    fn test_compared_years() {
        let t = long_table(REGIONAL_GDP, EntityKind::Province, &[("广东", 2022, 1.0)]);
        assert_eq!(compared_years(&t, &AnalysisConfig::default()), vec![2022, 2012]);
    }
}
