use chrono::NaiveDate;
use tracing::warn;

use crate::process::date_parser::cell_month;
use crate::process::trimming::normalize_table;
use crate::process::utils::coerce_value;
use crate::process::RawTable;

/// One month of a provincial monthly tourism table.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyPoint {
    pub month: NaiveDate,
    pub visitors: Option<f64>,
    pub revenue: Option<f64>,
}

/// Read a monthly table: the month column is `月份` (else the first column);
/// visitors and revenue are the first two other columns whatever their headers say.
/// Rows whose month cannot be read are dropped.
pub fn monthly_series(table: &RawTable) -> Vec<MonthlyPoint> {
    if table.width() < 3 {
        warn!(
            columns = ?table.header_labels(),
            "monthly table needs a month, visitor and revenue column"
        );
        return Vec::new();
    }
    let table = normalize_table(table);
    let month_col = table.column_index("月份").unwrap_or(0);
    let mut values = (0..table.width()).filter(|&c| c != month_col);
    let (Some(visitors_col), Some(revenue_col)) = (values.next(), values.next()) else {
        return Vec::new();
    };
    let mut points: Vec<MonthlyPoint> = (0..table.height())
        .filter_map(|row| {
            let month = cell_month(table.cell(row, month_col))?;
            Some(MonthlyPoint {
                month,
                visitors: coerce_value(table.cell(row, visitors_col)),
                revenue: coerce_value(table.cell(row, revenue_col)),
            })
        })
        .collect();
    points.sort_by_key(|p| p.month);
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Cell;

    #[test]
    fn test_monthly_series_by_position() {
        let table = RawTable::new(
            vec![
                Cell::text("月份"),
                Cell::text("接待游客总人数 （万人次）"),
                Cell::text("旅游总收入\n（亿元）"),
            ],
            vec![
                vec![Cell::text("2023年2月"), Cell::Number(700.0), Cell::text("95.1")],
                vec![Cell::text("合计"), Cell::Number(1.0), Cell::Number(1.0)],
                vec![Cell::text("2023年1月"), Cell::text("-"), Cell::Number(88.0)],
            ],
        );
        let points = monthly_series(&table);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].month, NaiveDate::from_ymd_opt(2023, 1, 1).expect("date"));
        assert_eq!(points[0].visitors, None);
        assert_eq!(points[0].revenue, Some(88.0));
        assert_eq!(points[1].visitors, Some(700.0));
        assert_eq!(points[1].revenue, Some(95.1));
    }

    #[test]
    fn test_month_header_found_after_normalizing() {
        let table = RawTable::new(
            vec![Cell::text("接待游客总人数"), Cell::text(" 月份 "), Cell::text("旅游总收入")],
            vec![
                vec![Cell::Number(812.0), Cell::text("2023年 5月"), Cell::Number(103.2)],
                vec![Cell::Number(640.0), Cell::text("2023年4月"), Cell::Number(90.0)],
            ],
        );
        let points = monthly_series(&table);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].month, NaiveDate::from_ymd_opt(2023, 4, 1).expect("date"));
        assert_eq!(points[0].visitors, Some(640.0));
        assert_eq!(points[0].revenue, Some(90.0));
        assert_eq!(points[1].visitors, Some(812.0));
        assert_eq!(points[1].revenue, Some(103.2));
    }

    #[test]
    fn test_narrow_table_yields_nothing() {
        let table = RawTable::new(vec![Cell::text("月份")], vec![vec![Cell::text("2023年1月")]]);
        assert!(monthly_series(&table).is_empty());
    }
}
