use std::path::PathBuf;

use anyhow::Result;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::warn;

use crate::frame::stats::CorrelationMatrix;
use crate::render::{coolwarm, viridis, ChartOutput};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMap {
    /// Diverging; -1 is blue, +1 is red.
    CoolWarm,
    Viridis,
}

impl ColorMap {
    pub fn color(&self, r: f64) -> RGBColor {
        let t = (r + 1.0) / 2.0;
        match self {
            ColorMap::CoolWarm => coolwarm(t),
            ColorMap::Viridis => viridis(t),
        }
    }
}

const MISSING: RGBColor = RGBColor(200, 200, 200);

/// Annotated correlation heatmap; row 0 is drawn at the top.
pub fn render_heatmap(
    out: &mut ChartOutput,
    title: &str,
    matrix: &CorrelationMatrix,
    cmap: ColorMap,
) -> Result<Option<PathBuf>> {
    if matrix.labels.len() < 2 {
        warn!(title, columns = matrix.labels.len(), "too few columns for a correlation heatmap");
        return Ok(None);
    }
    let path = out.render_png(title, |path, style| {
        let n = matrix.labels.len();
        let labels = &matrix.labels;
        // plot row r shows matrix row n - 1 - r
        let row_of = |r: usize| n - 1 - r;

        let side = style.size.1.max(600);
        let root = BitMapBackend::new(path, (side + 200, side)).into_drawing_area();
        root.fill(&WHITE)?;
        let mut ctx = ChartBuilder::on(&root)
            .caption(title, style.title_font())
            .margin(20)
            .x_label_area_size(120)
            .y_label_area_size(180)
            .build_cartesian_2d((0..n).into_segmented(), (0..n).into_segmented())?;

        let x_fmt = |v: &SegmentValue<usize>| match v {
            SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
            _ => String::new(),
        };
        let y_fmt = |v: &SegmentValue<usize>| match v {
            SegmentValue::CenterOf(i) if *i < n => labels[row_of(*i)].clone(),
            _ => String::new(),
        };
        ctx.configure_mesh()
            .disable_mesh()
            .x_labels(n)
            .y_labels(n)
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt)
            .label_style(style.small_font())
            .draw()?;

        let cells: Vec<(usize, usize, Option<f64>)> = (0..n)
            .flat_map(|r| (0..n).map(move |c| (r, c)))
            .map(|(r, c)| (r, c, matrix.values[row_of(r)][c]))
            .collect();

        ctx.draw_series(cells.iter().map(|(r, c, v)| {
            let fill = v.map_or(MISSING, |v| cmap.color(v));
            Rectangle::new(
                [
                    (SegmentValue::Exact(*c), SegmentValue::Exact(*r)),
                    (SegmentValue::Exact(c + 1), SegmentValue::Exact(r + 1)),
                ],
                fill.filled(),
            )
        }))?;

        let centered = TextStyle::from(style.small_font()).pos(Pos::new(HPos::Center, VPos::Center));
        ctx.draw_series(cells.iter().filter_map(|(r, c, v)| {
            v.map(|v| {
                Text::new(
                    format!("{:.2}", v),
                    (SegmentValue::CenterOf(*c), SegmentValue::CenterOf(*r)),
                    centered.clone(),
                )
            })
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
    fn test_colormap_endpoints() {
        assert_eq!(ColorMap::CoolWarm.color(-1.0), RGBColor(59, 76, 192));
        assert_eq!(ColorMap::CoolWarm.color(1.0), RGBColor(180, 4, 38));
        assert_eq!(ColorMap::Viridis.color(1.0), RGBColor(253, 231, 37));
    }

    #[test]
    fn test_heatmap_is_drawn() -> Result<()> {
        let dir = tempdir()?;
        let mut out = crate::render::test_support::small_output(dir.path())?;
        let matrix = CorrelationMatrix {
            labels: vec!["GDP".into(), "外汇收入".into(), "游客".into()],
            values: vec![
                vec![Some(1.0), Some(0.82), None],
                vec![Some(0.82), Some(1.0), Some(-0.3)],
                vec![None, Some(-0.3), Some(1.0)],
            ],
        };
        let path = render_heatmap(&mut out, "相关性热力图", &matrix, ColorMap::Viridis)?
            .expect("heatmap drawn");
        assert!(path.ends_with("相关性热力图_1.png"));
        crate::render::test_support::assert_png(&path)?;
        Ok(())
    }

    #[test]
    fn test_single_column_is_skipped() -> Result<()> {
        let dir = tempdir()?;
        let style = ChartStyle::with_font(&RenderConfig::default(), "sans-serif".into());
        let mut out = ChartOutput::new(dir.path(), style)?;
        let matrix = CorrelationMatrix {
            labels: vec!["GDP".into()],
            values: vec![vec![Some(1.0)]],
        };
        assert!(render_heatmap(&mut out, "相关性", &matrix, ColorMap::CoolWarm)?.is_none());
        Ok(())
    }
}
