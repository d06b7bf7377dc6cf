use std::{collections::BTreeMap, collections::BTreeSet, path::Path};

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::{debug, info};

use crate::process::{Cell, RawTable};

const MAX_SHEET_NAME: usize = 31;
const FORBIDDEN: [char; 7] = ['*', ':', '?', '/', '\\', '[', ']'];

/// Make `name` a legal worksheet name not already in `taken`.
pub fn sheet_name(name: &str, taken: &BTreeSet<String>) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'');
    let base: String = if cleaned.is_empty() {
        "Sheet".to_string()
    } else {
        cleaned.chars().take(MAX_SHEET_NAME).collect()
    };
    if !taken.contains(&base) {
        return base;
    }
    (2..)
        .map(|n| {
            let suffix = format!("_{}", n);
            let keep = MAX_SHEET_NAME - suffix.chars().count();
            format!("{}{}", base.chars().take(keep).collect::<String>(), suffix)
        })
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or(base)
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    format: Option<&Format>,
) -> Result<()> {
    match (cell, format) {
        (Cell::Empty, _) => {}
        (Cell::Text(s), Some(f)) => {
            sheet.write_string_with_format(row, col, s, f)?;
        }
        (Cell::Text(s), None) => {
            sheet.write_string(row, col, s)?;
        }
        (Cell::Number(n), Some(f)) => {
            sheet.write_number_with_format(row, col, *n, f)?;
        }
        (Cell::Number(n), None) => {
            sheet.write_number(row, col, *n)?;
        }
    }
    Ok(())
}

/// Write every raw table to its own worksheet of one workbook, in key order.
pub fn write_raw_workbook(tables: &BTreeMap<String, RawTable>, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }

    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let mut taken = BTreeSet::new();

    for (key, table) in tables {
        let name = sheet_name(key, &taken);
        taken.insert(name.clone());
        let sheet = workbook
            .add_worksheet()
            .set_name(&name)
            .with_context(|| format!("naming worksheet {}", name))?;

        for (col, cell) in table.headers.iter().enumerate() {
            write_cell(sheet, 0, col as u16, cell, Some(&bold))?;
        }
        for (r, row) in table.rows.iter().enumerate() {
            for (col, cell) in row.iter().enumerate() {
                write_cell(sheet, r as u32 + 1, col as u16, cell, None)?;
            }
        }
        debug!(sheet = %name, rows = table.height(), "worksheet written");
    }

    if tables.is_empty() {
        workbook.add_worksheet();
    }
    workbook
        .save(path)
        .with_context(|| format!("saving workbook {}", path.display()))?;
    info!(sheets = tables.len(), "combined workbook written: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::load_workbook;
    use tempfile::tempdir;

    #[test]
    fn test_sheet_name_rules() {
        let mut taken = BTreeSet::new();
        assert_eq!(sheet_name("国内旅游", &taken), "国内旅游");
        assert_eq!(sheet_name("a/b[c]:d", &taken), "a_b_c__d");
        let long = "x".repeat(40);
        assert_eq!(sheet_name(&long, &taken).chars().count(), 31);

        taken.insert("国内旅游".to_string());
        assert_eq!(sheet_name("国内旅游", &taken), "国内旅游_2");
        assert_eq!(sheet_name("", &BTreeSet::new()), "Sheet");
    }

    #[test]
    fn test_workbook_round_trips_through_loader() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out").join("所有原始数据（多工作表）.xlsx");

        let table = RawTable::new(
            vec![Cell::text("地区"), Cell::text("2022年"), Cell::text("2021年")],
            vec![
                vec![Cell::text("广东省"), Cell::Number(129118.6), Cell::Number(124369.7)],
                vec![Cell::text("全国"), Cell::Empty, Cell::Number(1.0)],
            ],
        );
        let mut tables = BTreeMap::new();
        tables.insert("地区生产总值分省".to_string(), table.clone());
        write_raw_workbook(&tables, &path)?;

        let loaded = load_workbook(&path)?;
        assert_eq!(loaded.headers, table.headers);
        assert_eq!(loaded.rows[0], table.rows[0]);
        assert_eq!(loaded.cell(1, 2), &Cell::Number(1.0));
        assert!(loaded.cell(1, 1).is_empty());
        Ok(())
    }
}
