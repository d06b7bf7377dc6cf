use crate::process::raw_table::{Cell, RawTable};
use crate::process::utils::normalize_label;

/// Normalize the text of every header and text cell. Numbers and empties pass
/// through; text that normalizes to nothing becomes empty.
pub fn normalize_table(table: &RawTable) -> RawTable {
    RawTable {
        headers: table.headers.iter().map(normalize_cell).collect(),
        rows: table
            .rows
            .iter()
            .map(|row| row.iter().map(normalize_cell).collect())
            .collect(),
    }
}

fn normalize_cell(cell: &Cell) -> Cell {
    match cell {
        Cell::Text(s) => {
            let cleaned = normalize_label(s);
            if cleaned.is_empty() {
                Cell::Empty
            } else {
                Cell::Text(cleaned)
            }
        }
        other => other.clone(),
    }
}
