use std::path::PathBuf;

use anyhow::Result;
use plotters::prelude::*;
use tracing::warn;

use crate::frame::stats::box_stats;
use crate::render::{padded_range, plain_number, ChartOutput};

/// Box-and-whisker plot of one distribution.
pub fn render_box(
    out: &mut ChartOutput,
    title: &str,
    y_label: &str,
    values: &[f64],
    color: RGBColor,
) -> Result<Option<PathBuf>> {
    let Some(stats) = box_stats(values) else {
        warn!(title, "no data, chart skipped");
        return Ok(None);
    };
    let path = out.render_png(title, |path, style| {
        let y_range = padded_range(values.iter().copied(), false);
        let (w, h) = style.size;
        let root = BitMapBackend::new(path, (w.min(900), h)).into_drawing_area();
        root.fill(&WHITE)?;
        let mut ctx = ChartBuilder::on(&root)
            .caption(title, style.title_font())
            .margin(20)
            .x_label_area_size(20)
            .y_label_area_size(90)
            .build_cartesian_2d(0.0..2.0, y_range)?;

        ctx.configure_mesh()
            .disable_x_mesh()
            .disable_x_axis()
            .y_desc(y_label)
            .y_label_formatter(&|y: &f64| plain_number(*y))
            .label_style(style.small_font())
            .axis_desc_style(style.label_font())
            .draw()?;

        let (left, right) = (0.6, 1.4);
        let edge = BLACK.stroke_width(style.line_width);
        ctx.draw_series(std::iter::once(Rectangle::new(
            [(left, stats.q3), (right, stats.q1)],
            color.mix(0.8).filled(),
        )))?;
        ctx.draw_series(std::iter::once(Rectangle::new(
            [(left, stats.q3), (right, stats.q1)],
            edge,
        )))?;
        let segments = vec![
            vec![(left, stats.median), (right, stats.median)],
            vec![(1.0, stats.q3), (1.0, stats.whisker_high)],
            vec![(1.0, stats.q1), (1.0, stats.whisker_low)],
            vec![(0.8, stats.whisker_high), (1.2, stats.whisker_high)],
            vec![(0.8, stats.whisker_low), (1.2, stats.whisker_low)],
        ];
        ctx.draw_series(segments.into_iter().map(|s| PathElement::new(s, edge)))?;
        ctx.draw_series(
            stats
                .outliers
                .iter()
                .map(|v| Circle::new((1.0, *v), 4, BLACK.stroke_width(1))),
        )?;

        root.present()?;
        Ok(())
    })?;
    Ok(Some(path))
}
