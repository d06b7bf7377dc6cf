use std::path::PathBuf;

use anyhow::Result;
use plotters::prelude::*;
use tracing::warn;

use crate::frame::YearFrame;
use crate::render::{padded_range, palette, plain_number, ChartOutput};

/// Cumulative layer tops for every year with a value in each column.
fn stack(frame: &YearFrame) -> Vec<(i32, Vec<f64>)> {
    frame
        .rows
        .iter()
        .filter(|(_, row)| row.iter().all(Option::is_some))
        .map(|(year, row)| {
            let mut acc = 0.0;
            let tops = row
                .iter()
                .map(|v| {
                    acc += v.unwrap_or_default();
                    acc
                })
                .collect();
            (*year, tops)
        })
        .collect()
}

/// Stacked area chart, one layer per column of `frame`, bottom layer first.
pub fn render_stacked_area(
    out: &mut ChartOutput,
    title: &str,
    y_label: &str,
    frame: &YearFrame,
) -> Result<Option<PathBuf>> {
    let stacked = stack(frame);
    if stacked.is_empty() || frame.columns.is_empty() {
        warn!(title, "no complete rows, chart skipped");
        return Ok(None);
    }
    let path = out.render_png(title, |path, style| {
        let first = stacked[0].0 as f64;
        let last = stacked[stacked.len() - 1].0 as f64;
        let x_range = if first == last { (first - 1.0)..(last + 1.0) } else { first..last };
        let y_range = padded_range(
            stacked.iter().flat_map(|(_, tops)| tops.last().copied()),
            true,
        );

        let root = BitMapBackend::new(path, style.size).into_drawing_area();
        root.fill(&WHITE)?;
        let mut ctx = ChartBuilder::on(&root)
            .caption(title, style.title_font())
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(90)
            .build_cartesian_2d(x_range, y_range)?;

        ctx.configure_mesh()
            .x_desc("年份")
            .y_desc(y_label)
            .x_label_formatter(&|x: &f64| format!("{:.0}", x))
            .y_label_formatter(&|y: &f64| plain_number(*y))
            .label_style(style.small_font())
            .axis_desc_style(style.label_font())
            .draw()?;

        // top layer first so lower layers paint over it
        for (i, name) in frame.columns.iter().enumerate().rev() {
            let color = palette(i);
            ctx.draw_series(AreaSeries::new(
                stacked.iter().map(|(year, tops)| (*year as f64, tops[i])),
                0.0,
                color.mix(0.7),
            ))?
            .label(name.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.mix(0.7).filled()));
        }

        ctx.configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font(style.small_font())
            .draw()?;

        root.present()?;
        Ok(())
    })?;
    Ok(Some(path))
}
