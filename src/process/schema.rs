use serde::Serialize;
use thiserror::Error;

use crate::process::date_parser::header_year;
use crate::process::raw_table::{Cell, RawTable};
use crate::process::utils::normalize_label;

/// Header aliases for the entity column, checked in order.
const PROVINCE_HEADERS: [&str; 4] = ["地区", "省份", "region", "province"];
const INDICATOR_HEADERS: [&str; 2] = ["指标", "indicator"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntityKind {
    Province,
    Indicator,
}

impl EntityKind {
    pub fn column_name(&self) -> &'static str {
        match self {
            EntityKind::Province => "province",
            EntityKind::Indicator => "indicator",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReshapeError {
    #[error("dataset `{key}` has no identifier column (地区/指标); columns: {columns:?}")]
    NoIdentifierColumn { key: String, columns: Vec<String> },
    #[error("dataset `{key}` has no year columns; columns: {columns:?}")]
    NoYearColumns { key: String, columns: Vec<String> },
}

/// Where the entity labels and the year values live in a wide table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout {
    pub entity_column: usize,
    pub entity_kind: EntityKind,
    /// (column index, year), ascending by year.
    pub year_columns: Vec<(usize, i32)>,
}

/// Find the identifier column and every year column of a wide table.
pub fn analyze_layout(key: &str, table: &RawTable) -> Result<TableLayout, ReshapeError> {
    let labels: Vec<Option<String>> = table
        .headers
        .iter()
        .map(|h| match h {
            Cell::Text(s) => Some(normalize_label(s).to_lowercase()),
            _ => None,
        })
        .collect();

    let (entity_column, entity_kind) = match find_header(&labels, &PROVINCE_HEADERS) {
        Some(idx) => (idx, EntityKind::Province),
        None => match find_header(&labels, &INDICATOR_HEADERS) {
            Some(idx) => (idx, EntityKind::Indicator),
            None => {
                return Err(ReshapeError::NoIdentifierColumn {
                    key: key.to_string(),
                    columns: table.header_labels(),
                })
            }
        },
    };

    let mut year_columns: Vec<(usize, i32)> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != entity_column)
        .filter_map(|(idx, h)| header_year(h).map(|y| (idx, y)))
        .collect();
    if year_columns.is_empty() {
        return Err(ReshapeError::NoYearColumns {
            key: key.to_string(),
            columns: table.header_labels(),
        });
    }
    year_columns.sort_by_key(|(idx, year)| (*year, *idx));

    Ok(TableLayout {
        entity_column,
        entity_kind,
        year_columns,
    })
}

fn find_header(labels: &[Option<String>], aliases: &[&str]) -> Option<usize> {
    labels
        .iter()
        .position(|l| l.as_deref().is_some_and(|l| aliases.contains(&l)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cells: Vec<Cell>) -> RawTable {
        RawTable::new(cells, Vec::new())
    }

    #[test]
    fn test_layout_orders_years_ascending() {
        let table = headers(vec![
            Cell::text("指标"),
            Cell::text("2023年"),
            Cell::text("2021年"),
            Cell::Number(2022.0),
            Cell::text("备注"),
        ]);
        let layout = analyze_layout("t", &table).unwrap();
        assert_eq!(layout.entity_column, 0);
        assert_eq!(layout.entity_kind, EntityKind::Indicator);
        assert_eq!(layout.year_columns, vec![(2, 2021), (3, 2022), (1, 2023)]);
    }

    #[test]
    fn test_province_alias_wins_over_indicator() {
        let table = headers(vec![
            Cell::text("指标"),
            Cell::text(" 地区 "),
            Cell::text("2020"),
        ]);
        let layout = analyze_layout("t", &table).unwrap();
        assert_eq!(layout.entity_column, 1);
        assert_eq!(layout.entity_kind, EntityKind::Province);
    }

    #[test]
    fn test_rejects_tables_without_keys_or_years() {
        let no_id = headers(vec![Cell::text("名称"), Cell::text("2020年")]);
        assert!(matches!(
            analyze_layout("a", &no_id),
            Err(ReshapeError::NoIdentifierColumn { .. })
        ));

        let no_year = headers(vec![Cell::text("地区"), Cell::text("备注")]);
        let err = analyze_layout("b", &no_year).unwrap_err();
        assert!(matches!(err, ReshapeError::NoYearColumns { ref key, .. } if key == "b"));
        assert!(err.to_string().contains("no year columns"));
    }
}
