use chrono::{Datelike, Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::process::raw_table::Cell;

/// Inclusive range of plausible statistical years.
pub const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=2050;

static YEAR_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})\s*年\s*(\d{1,2})\s*月").expect("year-month pattern"));

static ISO_YEAR_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})[-/.](\d{1,2})").expect("iso year-month pattern"));

/// Parse a year-column header: `2020`, `"2020"` or `"2020年"`.
///
/// Bare numbers must fall in [`YEAR_RANGE`]; the `年`-suffixed form is accepted
/// as long as the prefix is all digits.
pub fn header_year(cell: &Cell) -> Option<i32> {
    match cell {
        Cell::Number(n) => {
            if n.fract() != 0.0 {
                return None;
            }
            let year = *n as i64;
            i32::try_from(year).ok().filter(|y| YEAR_RANGE.contains(y))
        }
        Cell::Text(s) => parse_year_label(s),
        Cell::Empty => None,
    }
}

pub fn parse_year_label(raw: &str) -> Option<i32> {
    let s = raw.trim();
    if let Some(digits) = s.strip_suffix('年') {
        let digits = digits.trim();
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            return digits.parse().ok();
        }
        return None;
    }
    if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
        return s.parse().ok().filter(|y| YEAR_RANGE.contains(y));
    }
    None
}

/// Parse a month label such as `2023年5月` (or `2023-05`) into the first day of that month.
pub fn parse_month_label(raw: &str) -> Option<NaiveDate> {
    let (year, month) = year_month(raw)?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// The `(year, month)` digits of a month label, not checked against the calendar.
pub fn year_month(raw: &str) -> Option<(i32, u32)> {
    let caps = YEAR_MONTH
        .captures(raw)
        .or_else(|| ISO_YEAR_MONTH.captures(raw.trim()))?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

/// Month cells may arrive as text or, when Excel recognised them, as a date serial.
pub fn cell_month(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Text(s) => parse_month_label(s),
        Cell::Number(serial) => excel_serial_to_month(*serial),
        Cell::Empty => None,
    }
}

fn excel_serial_to_month(serial: f64) -> Option<NaiveDate> {
    // 1900 date system; serial 60 is the phantom 1900-02-29
    if !(61.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let day = epoch.checked_add_signed(Duration::days(serial.trunc() as i64))?;
    NaiveDate::from_ymd_opt(day.year(), day.month(), 1)
}
