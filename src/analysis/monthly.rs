//! Monthly visitor and revenue trends of one province.

use chrono::Datelike;
use tracing::{info, warn};

use crate::analysis::Analysis;
use crate::process::RawTable;
use crate::render::line::{month_index, render_line, LineChart, Series, XAxis};
use crate::report::{monthly_series, MonthlyPoint};

fn month_points(
    points: &[MonthlyPoint],
    value: fn(&MonthlyPoint) -> Option<f64>,
) -> Vec<(f64, f64)> {
    points
        .iter()
        .filter_map(|p| value(p).map(|v| (month_index(p.month.year(), p.month.month()), v)))
        .collect()
}

pub fn run(a: &mut Analysis<'_>, table: &RawTable) {
    info!("monthly analyses");
    let points = monthly_series(table);
    if points.is_empty() {
        warn!("monthly table has no readable months, monthly charts skipped");
        return;
    }

    let charts = [
        (
            "海南省历月接待游客数量趋势",
            "接待人数 (万人次)",
            month_points(&points, |p| p.visitors),
        ),
        (
            "海南省历月旅游总收入趋势",
            "总收入 (亿元)",
            month_points(&points, |p| p.revenue),
        ),
    ];
    for (title, y_label, series) in charts {
        let chart = LineChart::new(title, "月份", y_label)
            .with_x_axis(XAxis::Month)
            .with_series(Series::new(y_label, series));
        a.draw(|out| render_line(out, &chart));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_month_points_skip_gaps() {
        let points = vec![
            MonthlyPoint {
                month: NaiveDate::from_ymd_opt(2023, 1, 1).expect("date"),
                visitors: Some(500.0),
                revenue: None,
            },
            MonthlyPoint {
                month: NaiveDate::from_ymd_opt(2023, 2, 1).expect("date"),
                visitors: Some(600.0),
                revenue: Some(80.0),
            },
        ];
        let visitors = month_points(&points, |p| p.visitors);
        assert_eq!(visitors, vec![(month_index(2023, 1), 500.0), (month_index(2023, 2), 600.0)]);
        let revenue = month_points(&points, |p| p.revenue);
        assert_eq!(revenue, vec![(month_index(2023, 2), 80.0)]);
        assert_eq!(XAxis::Month.format(revenue[0].0), "2023-02");
    }
}
