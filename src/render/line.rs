use std::path::PathBuf;

use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::warn;

use crate::render::{padded_range, palette, plain_number, ChartOutput, ChartStyle, DrawResult};

/// How x values are encoded and labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XAxis {
    Year,
    /// `year * 12 + (month - 1)`
    Month,
}

impl XAxis {
    pub fn format(&self, x: f64) -> String {
        match self {
            XAxis::Year => format!("{:.0}", x),
            XAxis::Month => {
                let idx = x.round() as i64;
                format!("{}-{:02}", idx.div_euclid(12), idx.rem_euclid(12) + 1)
            }
        }
    }
}

pub fn month_index(year: i32, month: u32) -> f64 {
    (year as i64 * 12 + month as i64 - 1) as f64
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

impl Series {
    pub fn new(name: impl Into<String>, points: Vec<(f64, f64)>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    /// Series over integer years.
    pub fn yearly(name: impl Into<String>, points: &[(i32, f64)]) -> Self {
        Self::new(name, points.iter().map(|(y, v)| (*y as f64, *v)).collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_axis: XAxis,
    pub series: Vec<Series>,
    /// Drawn against a right-hand axis.
    pub secondary: Option<(String, Series)>,
    /// Horizontal reference line at y = 0.
    pub zero_line: bool,
}

impl LineChart {
    pub fn new(title: &str, x_label: &str, y_label: &str) -> Self {
        Self {
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            x_axis: XAxis::Year,
            series: Vec::new(),
            secondary: None,
            zero_line: false,
        }
    }

    pub fn with_series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    pub fn with_secondary(mut self, y_label: &str, series: Series) -> Self {
        self.secondary = Some((y_label.to_string(), series));
        self
    }

    pub fn with_zero_line(mut self) -> Self {
        self.zero_line = true;
        self
    }

    pub fn with_x_axis(mut self, x_axis: XAxis) -> Self {
        self.x_axis = x_axis;
        self
    }

    fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.points.is_empty())
            && self
                .secondary
                .as_ref()
                .map_or(true, |(_, s)| s.points.is_empty())
    }
}

/// Line chart with markers; a secondary series gets its own right-hand axis.
pub fn render_line(out: &mut ChartOutput, chart: &LineChart) -> Result<Option<PathBuf>> {
    if chart.is_empty() {
        warn!(title = %chart.title, "no data, chart skipped");
        return Ok(None);
    }
    let path = out.render_png(&chart.title, |path, style| {
        let root = BitMapBackend::new(path, style.size).into_drawing_area();
        root.fill(&WHITE)?;
        match &chart.secondary {
            Some(_) => draw_dual(&root, chart, style)?,
            None => draw_on(&root, chart, style, true)?,
        }
        root.present()?;
        Ok(())
    })?;
    Ok(Some(path))
}

/// One single-axis panel per chart, stacked vertically under a shared title.
pub fn render_panels(
    out: &mut ChartOutput,
    title: &str,
    panels: &[LineChart],
) -> Result<Option<PathBuf>> {
    let panels: Vec<&LineChart> = panels.iter().filter(|p| !p.is_empty()).collect();
    if panels.is_empty() {
        warn!(title, "no panel has data, chart skipped");
        return Ok(None);
    }
    let path = out.render_png(title, |path, style| {
        let height = style.panel_height * panels.len() as u32 + 60;
        let root = BitMapBackend::new(path, (style.size.0, height)).into_drawing_area();
        root.fill(&WHITE)?;
        let body = root.titled(title, style.title_font())?;
        let areas = body.split_evenly((panels.len(), 1));
        for (area, panel) in areas.iter().zip(&panels) {
            draw_on(area, panel, style, false)?;
        }
        root.present()?;
        Ok(())
    })?;
    Ok(Some(path))
}

fn x_range(chart: &LineChart) -> std::ops::Range<f64> {
    let xs = chart
        .series
        .iter()
        .chain(chart.secondary.iter().map(|(_, s)| s))
        .flat_map(|s| s.points.iter().map(|p| p.0));
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for x in xs {
        lo = lo.min(x);
        hi = hi.max(x);
    }
    if lo == hi {
        (lo - 1.0)..(hi + 1.0)
    } else {
        lo..hi
    }
}

fn draw_on(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    chart: &LineChart,
    style: &ChartStyle,
    standalone: bool,
) -> DrawResult {
    let x_range = x_range(chart);
    let y_range = padded_range(
        chart
            .series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.1))
            .chain(chart.zero_line.then_some(0.0)),
        false,
    );

    let caption_font = if standalone {
        style.title_font()
    } else {
        style.label_font()
    };
    let mut ctx = ChartBuilder::on(area)
        .caption(&chart.title, caption_font)
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(90)
        .build_cartesian_2d(x_range.clone(), y_range)?;

    let x_fmt = |x: &f64| chart.x_axis.format(*x);
    ctx.configure_mesh()
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&|y: &f64| plain_number(*y))
        .label_style(style.small_font())
        .axis_desc_style(style.label_font())
        .draw()?;

    if chart.zero_line {
        ctx.draw_series(LineSeries::new(
            vec![(x_range.start, 0.0), (x_range.end, 0.0)],
            BLACK.mix(0.4).stroke_width(1),
        ))?;
    }

    for (i, series) in chart.series.iter().enumerate() {
        let color = palette(i);
        let width = style.line_width;
        ctx.draw_series(LineSeries::new(
            series.points.iter().copied(),
            color.stroke_width(width),
        ))?
        .label(series.name.as_str())
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(width)));
        ctx.draw_series(
            series
                .points
                .iter()
                .map(|p| Circle::new(*p, 4, color.filled())),
        )?;
    }

    if standalone && chart.series.len() > 1 {
        ctx.configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font(style.small_font())
            .draw()?;
    }
    Ok(())
}

fn draw_dual(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    chart: &LineChart,
    style: &ChartStyle,
) -> DrawResult {
    let Some((right_label, right)) = &chart.secondary else {
        return draw_on(area, chart, style, true);
    };
    let x_range = x_range(chart);
    let left_range = padded_range(
        chart
            .series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.1)),
        false,
    );
    let right_range = padded_range(right.points.iter().map(|p| p.1), false);

    let mut ctx = ChartBuilder::on(area)
        .caption(&chart.title, style.title_font())
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(90)
        .right_y_label_area_size(90)
        .build_cartesian_2d(x_range.clone(), left_range)?
        .set_secondary_coord(x_range, right_range);

    let x_fmt = |x: &f64| chart.x_axis.format(*x);
    ctx.configure_mesh()
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&|y: &f64| plain_number(*y))
        .label_style(style.small_font())
        .axis_desc_style(style.label_font())
        .draw()?;
    ctx.configure_secondary_axes()
        .y_desc(right_label.as_str())
        .y_label_formatter(&|y: &f64| plain_number(*y))
        .label_style(style.small_font())
        .axis_desc_style(style.label_font())
        .draw()?;

    let width = style.line_width;
    for (i, series) in chart.series.iter().enumerate() {
        let color = palette(i);
        ctx.draw_series(LineSeries::new(
            series.points.iter().copied(),
            color.stroke_width(width),
        ))?
        .label(series.name.as_str())
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(width)));
        ctx.draw_series(
            series
                .points
                .iter()
                .map(|p| Circle::new(*p, 4, color.filled())),
        )?;
    }

    let color = palette(chart.series.len());
    ctx.draw_secondary_series(LineSeries::new(
        right.points.iter().copied(),
        color.stroke_width(width),
    ))?
    .label(right.name.as_str())
    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(width)));
    ctx.draw_secondary_series(
        right
            .points
            .iter()
            .map(|p| TriangleMarker::new(*p, 6, color.filled())),
    )?;

    ctx.configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(style.small_font())
        .draw()?;
    Ok(())
}
