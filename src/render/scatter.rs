use std::path::PathBuf;

use anyhow::Result;
use plotters::prelude::*;
use tracing::{debug, warn};

use crate::frame::stats::linear_fit;
use crate::render::{padded_range, palette, plain_number, ChartOutput};

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub label: Option<String>,
    pub x: f64,
    pub y: f64,
}

impl ScatterPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { label: None, x, y }
    }

    pub fn labelled(label: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            label: Some(label.into()),
            x,
            y,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<ScatterPoint>,
    /// Overlay a least-squares line.
    pub fit: bool,
}

impl ScatterChart {
    pub fn new(title: &str, x_label: &str, y_label: &str, points: Vec<ScatterPoint>) -> Self {
        Self {
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            points,
            fit: false,
        }
    }

    pub fn with_fit(mut self) -> Self {
        self.fit = true;
        self
    }
}

pub fn render_scatter(out: &mut ChartOutput, chart: &ScatterChart) -> Result<Option<PathBuf>> {
    if chart.points.is_empty() {
        warn!(title = %chart.title, "no data, chart skipped");
        return Ok(None);
    }
    let path = out.render_png(&chart.title, |path, style| {
        let x_range = padded_range(chart.points.iter().map(|p| p.x), false);
        let y_range = padded_range(chart.points.iter().map(|p| p.y), false);

        let root = BitMapBackend::new(path, style.size).into_drawing_area();
        root.fill(&WHITE)?;
        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, style.title_font())
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(90)
            .build_cartesian_2d(x_range.clone(), y_range)?;

        ctx.configure_mesh()
            .x_desc(chart.x_label.as_str())
            .y_desc(chart.y_label.as_str())
            .x_label_formatter(&|x: &f64| plain_number(*x))
            .y_label_formatter(&|y: &f64| plain_number(*y))
            .label_style(style.small_font())
            .axis_desc_style(style.label_font())
            .draw()?;

        let color = palette(0);
        ctx.draw_series(
            chart
                .points
                .iter()
                .map(|p| Circle::new((p.x, p.y), 6, color.mix(0.7).filled())),
        )?;

        let font = style.small_font();
        ctx.draw_series(chart.points.iter().filter_map(|p| {
            p.label
                .as_ref()
                .map(|l| Text::new(l.clone(), (p.x, p.y), font.clone()))
        }))?;

        if chart.fit {
            let pairs: Vec<(f64, f64)> = chart.points.iter().map(|p| (p.x, p.y)).collect();
            match linear_fit(&pairs) {
                Some(fit) => {
                    ctx.draw_series(LineSeries::new(
                        vec![
                            (x_range.start, fit.at(x_range.start)),
                            (x_range.end, fit.at(x_range.end)),
                        ],
                        palette(3).stroke_width(style.line_width),
                    ))?;
                }
                None => debug!(title = %chart.title, "regression line undefined"),
            }
        }

        root.present()?;
        Ok(())
    })?;
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::test_support::{assert_png, small_output};
    use tempfile::tempdir;

    #[test]
    fn test_builders() {
        let chart = ScatterChart::new(
            "GDP与国际旅游外汇收入关系",
            "GDP (亿元)",
            "外汇收入 (百万美元)",
            vec![ScatterPoint::new(1.0, 2.0), ScatterPoint::labelled("广东", 3.0, 4.0)],
        )
        .with_fit();
        assert!(chart.fit);
        assert_eq!(chart.points[0].label, None);
        assert_eq!(chart.points[1].label.as_deref(), Some("广东"));
    }

    #[test]
    fn test_scatter_with_fit_is_drawn() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let mut out = small_output(dir.path())?;
        let chart = ScatterChart::new(
            "2022年GDP与旅游外汇收入关联性",
            "GDP (亿元)",
            "外汇收入 (百万美元)",
            vec![
                ScatterPoint::labelled("广东", 129118.6, 4120.0),
                ScatterPoint::labelled("上海", 44652.8, 3580.0),
                ScatterPoint::new(23000.0, 300.0),
            ],
        )
        .with_fit();
        let path = render_scatter(&mut out, &chart)?.expect("scatter drawn");
        assert!(path.ends_with("2022年GDP与旅游外汇收入关联性_1.png"));
        assert_png(&path)?;
        Ok(())
    }
}
