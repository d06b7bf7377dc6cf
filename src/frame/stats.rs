use std::collections::BTreeMap;

use crate::frame::Frame;
use crate::process::LongTable;

/// Year-over-year growth in percent for a key-ordered series.
///
/// The first element, any element with a missing neighbour, and any element
/// whose predecessor is zero are `None`.
pub fn growth_rates(values: &[Option<f64>]) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, cur)| {
            if i == 0 {
                return None;
            }
            match (values[i - 1], *cur) {
                (Some(prev), Some(cur)) if prev != 0.0 => Some((cur / prev - 1.0) * 100.0),
                _ => None,
            }
        })
        .collect()
}

/// Growth rates of a (year, value) series, dropping the undefined points.
pub fn growth_series(points: &[(i32, f64)]) -> Vec<(i32, f64)> {
    let values: Vec<Option<f64>> = points.iter().map(|(_, v)| Some(*v)).collect();
    points
        .iter()
        .zip(growth_rates(&values))
        .filter_map(|((year, _), g)| g.map(|g| (*year, g)))
        .collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Pearson correlation of paired observations. `None` below two points or
/// when either side has zero variance.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some(sxy / (sxx * syy).sqrt())
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    /// Row-major; `values[i][j]` correlates `labels[i]` with `labels[j]`.
    pub values: Vec<Vec<Option<f64>>>,
}

/// Pairwise-complete Pearson correlation between every column of `frame`.
pub fn correlation_matrix<K: Ord + Clone>(frame: &Frame<K>) -> CorrelationMatrix {
    let n = frame.columns.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        for j in i..n {
            let pairs: Vec<(f64, f64)> = frame
                .pairs(&frame.columns[i], &frame.columns[j])
                .into_iter()
                .map(|(_, a, b)| (a, b))
                .collect();
            let r = if i == j && pairs.len() >= 2 {
                Some(1.0)
            } else {
                pearson(&pairs)
            };
            values[i][j] = r;
            values[j][i] = r;
        }
    }
    CorrelationMatrix {
        labels: frame.columns.clone(),
        values,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Ordinary least squares `y = slope * x + intercept`.
pub fn linear_fit(points: &[(f64, f64)]) -> Option<LinearFit> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mx = points.iter().map(|p| p.0).sum::<f64>() / n;
    let my = points.iter().map(|p| p.1).sum::<f64>() / n;
    let sxx: f64 = points.iter().map(|(x, _)| (x - mx).powi(2)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = points.iter().map(|(x, y)| (x - mx) * (y - my)).sum();
    let slope = sxy / sxx;
    Some(LinearFit {
        slope,
        intercept: my - slope * mx,
    })
}

/// Quantile with linear interpolation between closest ranks; `sorted` must be ascending.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Most extreme observations within 1.5 IQR of the box.
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let q1 = quantile(&sorted, 0.25)?;
    let median = quantile(&sorted, 0.5)?;
    let q3 = quantile(&sorted, 0.75)?;
    let iqr = q3 - q1;
    let (lo_fence, hi_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

    let inside: Vec<f64> = sorted
        .iter()
        .copied()
        .filter(|v| *v >= lo_fence && *v <= hi_fence)
        .collect();
    let outliers = sorted
        .iter()
        .copied()
        .filter(|v| *v < lo_fence || *v > hi_fence)
        .collect();

    Some(BoxStats {
        q1,
        median,
        q3,
        whisker_low: inside.first().copied().unwrap_or(q1),
        whisker_high: inside.last().copied().unwrap_or(q3),
        outliers,
    })
}

/// Sum of every entity's value per year.
pub fn national_totals(table: &LongTable) -> Vec<(i32, f64)> {
    let mut totals: BTreeMap<i32, f64> = BTreeMap::new();
    for r in &table.records {
        *totals.entry(r.year).or_insert(0.0) += r.value;
    }
    totals.into_iter().collect()
}

/// Mean value per entity over `years` (all years when `None`), descending by mean.
pub fn entity_means(table: &LongTable, years: Option<(i32, i32)>) -> Vec<(String, f64)> {
    let mut acc: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for r in &table.records {
        if let Some((from, to)) = years {
            if r.year < from || r.year > to {
                continue;
            }
        }
        let slot = acc.entry(r.entity.as_str()).or_insert((0.0, 0));
        slot.0 += r.value;
        slot.1 += 1;
    }
    let mut out: Vec<(String, f64)> = acc
        .into_iter()
        .map(|(e, (sum, n))| (e.to_string(), sum / n as f64))
        .collect();
    out.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

/// Values for `year`, descending, truncated to `n`.
pub fn top_n(table: &LongTable, year: i32, n: usize) -> Vec<(String, f64)> {
    let mut rows: Vec<(String, f64)> = table
        .for_year(year)
        .into_iter()
        .map(|r| (r.entity.clone(), r.value))
        .collect();
    rows.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows.truncate(n);
    rows
}

/// Mean of each entity's growth rates, descending.
pub fn mean_growth(table: &LongTable) -> Vec<(String, f64)> {
    let mut out: Vec<(String, f64)> = table
        .entities()
        .into_iter()
        .filter_map(|entity| {
            let rates: Vec<f64> = growth_series(&table.series(&entity))
                .into_iter()
                .map(|(_, g)| g)
                .collect();
            mean(&rates).map(|m| (entity, m))
        })
        .collect();
    out.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

/// Percentage change of each entity between two years, descending.
pub fn span_growth(table: &LongTable, from: i32, to: i32) -> Vec<(String, f64)> {
    let mut out: Vec<(String, f64)> = table
        .entities()
        .into_iter()
        .filter_map(|entity| {
            let start = table.value(&entity, from)?;
            let end = table.value(&entity, to)?;
            if start == 0.0 {
                return None;
            }
            Some((entity, (end / start - 1.0) * 100.0))
        })
        .collect();
    out.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

/// Whether two values agree within a relative tolerance of the larger magnitude.
pub fn sums_close(a: f64, b: f64, rtol: f64) -> bool {
    (a - b).abs() <= rtol * a.abs().max(b.abs())
}
