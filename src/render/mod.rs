//! PNG charts (plotters) and HTML choropleth maps.
//!
//! Every chart is written through a [`ChartOutput`], which owns the output
//! directory, the resolved drawing style and the [`ChartSequence`] that
//! numbers file names.

pub mod area;
pub mod bar;
pub mod boxplot;
pub mod choropleth;
pub mod heatmap;
pub mod line;
pub mod scatter;

use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use font_kit::source::SystemSource;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub type DrawResult = Result<(), Box<dyn std::error::Error>>;

const MAX_TITLE_CHARS: usize = 50;

/// Default CJK-capable font families, tried in order.
pub const DEFAULT_FONTS: [&str; 4] = [
    "Microsoft YaHei",
    "SimHei",
    "Noto Sans CJK SC",
    "WenQuanYi Micro Hei",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub image_size: (u32, u32),
    /// Height of one panel in stacked multi-panel charts.
    pub panel_height: u32,
    pub font_candidates: Vec<String>,
    pub title_font_size: f64,
    pub label_font_size: f64,
    pub line_thickness: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            image_size: (1200, 700),
            panel_height: 400,
            font_candidates: DEFAULT_FONTS.iter().map(|f| f.to_string()).collect(),
            title_font_size: 28.0,
            label_font_size: 16.0,
            line_thickness: 2,
        }
    }
}

/// Fallback family when no candidate is installed with CJK coverage.
pub const FALLBACK_FONT: &str = "sans-serif";

/// Whether `name` is an installed family whose regular face has a glyph for `中`.
pub fn has_cjk_family(source: &SystemSource, name: &str) -> Result<bool> {
    let family = source
        .select_family_by_name(name)
        .map_err(|e| anyhow!("family {} not found: {}", name, e))?;
    let Some(handle) = family.fonts().first() else {
        return Ok(false);
    };
    let font = handle
        .load()
        .map_err(|e| anyhow!("cannot load a face of {}: {}", name, e))?;
    Ok(font.glyph_for_char('中').is_some())
}

/// Pick the first installed candidate family that covers CJK text.
pub fn resolve_font(candidates: &[String]) -> String {
    let source = SystemSource::new();
    for name in candidates {
        match has_cjk_family(&source, name) {
            Ok(true) => {
                info!(font = %name, "chart font selected");
                return name.clone();
            }
            Ok(false) => debug!(font = %name, "font has no CJK glyphs"),
            Err(e) => debug!(font = %name, "font unavailable: {:#}", e),
        }
    }
    warn!("no CJK font candidate available, falling back to {}", FALLBACK_FONT);
    FALLBACK_FONT.to_string()
}

/// Resolved drawing parameters shared by every chart of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    pub size: (u32, u32),
    pub panel_height: u32,
    pub font: String,
    pub title_size: f64,
    pub label_size: f64,
    pub line_width: u32,
}

impl ChartStyle {
    /// Resolves the font once; call at start-up.
    pub fn from_config(config: &RenderConfig) -> Self {
        Self::with_font(config, resolve_font(&config.font_candidates))
    }

    pub fn with_font(config: &RenderConfig, font: String) -> Self {
        Self {
            size: config.image_size,
            panel_height: config.panel_height,
            font,
            title_size: config.title_font_size,
            label_size: config.label_font_size,
            line_width: config.line_thickness,
        }
    }

    pub fn title_font(&self) -> FontDesc<'_> {
        (self.font.as_str(), self.title_size).into_font()
    }

    pub fn label_font(&self) -> FontDesc<'_> {
        (self.font.as_str(), self.label_size).into_font()
    }

    pub fn small_font(&self) -> FontDesc<'_> {
        (self.font.as_str(), self.label_size * 0.8).into_font()
    }
}

/// Reduce a chart title to a file-name stem: alphanumerics (CJK included),
/// space, `_` and `-` survive; at most 50 characters, then `...`.
pub fn sanitize_title(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();
    let kept = kept.trim();
    if kept.chars().count() > MAX_TITLE_CHARS {
        let cut: String = kept.chars().take(MAX_TITLE_CHARS).collect();
        format!("{}...", cut)
    } else {
        kept.to_string()
    }
}

/// Numbers chart files `<title>_<n>.<ext>`, starting at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSequence {
    next: usize,
}

impl Default for ChartSequence {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl ChartSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Charts named so far.
    pub fn count(&self) -> usize {
        self.next - 1
    }

    pub fn next_file_name(&mut self, title: &str, ext: &str) -> String {
        let n = self.next;
        self.next += 1;
        let mut stem = sanitize_title(title);
        if stem.is_empty() {
            stem = format!("plot_{}", n);
        }
        format!("{}_{}.{}", stem, n, ext)
    }
}

/// Destination for every chart of one run.
#[derive(Debug)]
pub struct ChartOutput {
    dir: PathBuf,
    style: ChartStyle,
    seq: ChartSequence,
    written: Vec<PathBuf>,
}

impl ChartOutput {
    pub fn new(dir: &Path, style: ChartStyle) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating chart directory {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            style,
            seq: ChartSequence::new(),
            written: Vec::new(),
        })
    }

    pub fn style(&self) -> &ChartStyle {
        &self.style
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files written so far, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Next numbered path for `title`.
    pub fn reserve(&mut self, title: &str, ext: &str) -> PathBuf {
        self.dir.join(self.seq.next_file_name(title, ext))
    }

    pub(crate) fn record(&mut self, path: PathBuf) {
        info!("chart saved: {}", path.display());
        self.written.push(path);
    }

    /// Reserve a PNG path for `title` and run `draw` against it.
    pub(crate) fn render_png<F>(&mut self, title: &str, draw: F) -> Result<PathBuf>
    where
        F: FnOnce(&Path, &ChartStyle) -> DrawResult,
    {
        let path = self.reserve(title, "png");
        draw(&path, &self.style)
            .map_err(|e| anyhow!("cannot draw chart {}: {}", path.display(), e))?;
        self.record(path.clone());
        Ok(path)
    }
}

/// tab10
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

pub fn palette(i: usize) -> RGBColor {
    PALETTE[i % PALETTE.len()]
}

/// Diverging blue-white-red scale for `t` in [0, 1].
pub fn coolwarm(t: f64) -> RGBColor {
    const STOPS: [(f64, (f64, f64, f64)); 3] = [
        (0.0, (59.0, 76.0, 192.0)),
        (0.5, (221.0, 221.0, 221.0)),
        (1.0, (180.0, 4.0, 38.0)),
    ];
    interpolate(&STOPS, t)
}

/// Sequential purple-green-yellow scale for `t` in [0, 1].
pub fn viridis(t: f64) -> RGBColor {
    const STOPS: [(f64, (f64, f64, f64)); 5] = [
        (0.0, (68.0, 1.0, 84.0)),
        (0.25, (59.0, 82.0, 139.0)),
        (0.5, (33.0, 145.0, 140.0)),
        (0.75, (94.0, 201.0, 98.0)),
        (1.0, (253.0, 231.0, 37.0)),
    ];
    interpolate(&STOPS, t)
}

fn interpolate(stops: &[(f64, (f64, f64, f64))], t: f64) -> RGBColor {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.5 };
    for pair in stops.windows(2) {
        let (t0, c0) = pair[0];
        let (t1, c1) = pair[1];
        if t <= t1 {
            let f = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
            let mix = |a: f64, b: f64| (a + (b - a) * f).round() as u8;
            return RGBColor(mix(c0.0, c1.0), mix(c0.1, c1.1), mix(c0.2, c1.2));
        }
    }
    let (_, c) = stops[stops.len() - 1];
    RGBColor(c.0 as u8, c.1 as u8, c.2 as u8)
}

/// Axis range covering `values` with 5% headroom; degenerate inputs get a unit span.
pub fn padded_range(values: impl IntoIterator<Item = f64>, include_zero: bool) -> Range<f64> {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in values.into_iter().filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !lo.is_finite() {
        return 0.0..1.0;
    }
    if include_zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }
    let span = hi - lo;
    if span == 0.0 {
        let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
        return (lo - pad)..(hi + pad);
    }
    let pad = span * 0.05;
    let lo = if include_zero && lo == 0.0 { 0.0 } else { lo - pad };
    let hi = if include_zero && hi == 0.0 { 0.0 } else { hi + pad };
    lo..hi
}

/// Plain (non-scientific) tick label.
pub fn plain_number(v: f64) -> String {
    if v.abs() >= 100.0 || v.fract() == 0.0 {
        format!("{:.0}", v)
    } else {
        format!("{:.1}", v)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    use anyhow::Result;

    use super::{resolve_font, ChartOutput, ChartStyle, RenderConfig};

    /// Small charts with whatever font this host resolves.
    pub fn small_output(dir: &Path) -> Result<ChartOutput> {
        let config = RenderConfig {
            image_size: (480, 360),
            panel_height: 220,
            ..RenderConfig::default()
        };
        let font = resolve_font(&config.font_candidates);
        ChartOutput::new(dir, ChartStyle::with_font(&config, font))
    }

    /// The file exists and starts with the PNG signature.
    pub fn assert_png(path: &Path) -> Result<()> {
        let bytes = std::fs::read(path)?;
        assert!(bytes.starts_with(b"\x89PNG"), "{} is not a PNG", path.display());
        Ok(())
    }
}
