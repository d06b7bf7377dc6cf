use std::path::PathBuf;

use anyhow::Result;
use plotters::prelude::*;
use tracing::warn;

use crate::render::{padded_range, palette, plain_number, ChartOutput};

/// Horizontal bar chart; the first entry is drawn at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub value_label: String,
    pub category_label: String,
    pub bars: Vec<(String, f64)>,
}

impl BarChart {
    pub fn new(title: &str, value_label: &str, bars: Vec<(String, f64)>) -> Self {
        Self {
            title: title.to_string(),
            value_label: value_label.to_string(),
            category_label: "省份".to_string(),
            bars,
        }
    }
}

pub fn render_bar(out: &mut ChartOutput, chart: &BarChart) -> Result<Option<PathBuf>> {
    if chart.bars.is_empty() {
        warn!(title = %chart.title, "no data, chart skipped");
        return Ok(None);
    }
    let path = out.render_png(&chart.title, |path, style| {
        let n = chart.bars.len();
        // row 0 is the bottom of the plot
        let rows: Vec<&(String, f64)> = chart.bars.iter().rev().collect();
        let x_range = padded_range(rows.iter().map(|(_, v)| *v), true);

        let root = BitMapBackend::new(path, style.size).into_drawing_area();
        root.fill(&WHITE)?;
        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, style.title_font())
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(120)
            .build_cartesian_2d(x_range, (0..n).into_segmented())?;

        let category = |v: &SegmentValue<usize>| match v {
            SegmentValue::CenterOf(i) => rows.get(*i).map(|(l, _)| l.clone()).unwrap_or_default(),
            _ => String::new(),
        };
        ctx.configure_mesh()
            .disable_y_mesh()
            .y_labels(n)
            .y_label_formatter(&category)
            .x_label_formatter(&|x: &f64| plain_number(*x))
            .x_desc(chart.value_label.as_str())
            .y_desc(chart.category_label.as_str())
            .label_style(style.small_font())
            .axis_desc_style(style.label_font())
            .draw()?;

        ctx.draw_series(rows.iter().enumerate().map(|(i, (_, v))| {
            let mut bar = Rectangle::new(
                [(0.0, SegmentValue::Exact(i)), (*v, SegmentValue::Exact(i + 1))],
                palette(n - 1 - i).mix(0.85).filled(),
            );
            bar.set_margin(4, 4, 0, 0);
            bar
        }))?;

        let font = style.small_font();
        ctx.draw_series(rows.iter().enumerate().map(|(i, (_, v))| {
            Text::new(plain_number(*v), (*v, SegmentValue::CenterOf(i)), font.clone())
        }))?;

        root.present()?;
        Ok(())
    })?;
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{ChartStyle, RenderConfig};
    use tempfile::tempdir;

    #[test]
    fn test_ranking_bars_are_drawn() -> Result<()> {
        let dir = tempdir()?;
        let mut out = crate::render::test_support::small_output(dir.path())?;
        let chart = BarChart::new(
            "2022年各省GDP排名",
            "GDP (亿元)",
            vec![
                ("广东".to_string(), 129118.6),
                ("江苏".to_string(), 122875.6),
                ("山东".to_string(), 87435.0),
            ],
        );
        let path = render_bar(&mut out, &chart)?.expect("bars drawn");
        assert_eq!(path, dir.path().join("2022年各省GDP排名_1.png"));
        crate::render::test_support::assert_png(&path)?;
        Ok(())
    }

    #[test]
    fn test_empty_bar_chart_is_skipped() -> Result<()> {
        let dir = tempdir()?;
        let style = ChartStyle::with_font(&RenderConfig::default(), "sans-serif".into());
        let mut out = ChartOutput::new(dir.path(), style)?;
        let chart = BarChart::new("2030年各省GDP排名", "GDP (亿元)", Vec::new());
        assert_eq!(render_bar(&mut out, &chart)?, None);
        assert!(out.written().is_empty());
        Ok(())
    }
}
