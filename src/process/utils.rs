use crate::process::raw_table::Cell;

/// Collapse whitespace runs, trim, and attach unit annotations to their label
/// ("国内游客 (万人次)" → "国内游客(万人次)"). Idempotent.
pub fn normalize_label(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.replace(" (", "(").replace(" （", "（")
}

/// Keep only the characters that can belong to a number.
pub fn strip_non_numeric(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect()
}

/// Coerce a cell to a float. Text is stripped of units and separators first;
/// anything that still does not parse is missing.
pub fn coerce_value(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Number(_) | Cell::Empty => None,
        Cell::Text(s) => {
            let cleaned = strip_non_numeric(s);
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
        }
    }
}

/// Text of a label cell after normalization; numbers render as their display form.
pub fn label_text(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Empty => None,
        Cell::Text(s) => Some(normalize_label(s)),
        Cell::Number(_) => Some(cell.to_string()),
    }
}
