use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::process::province::{canonical_province, is_aggregate};
use crate::process::raw_table::RawTable;
use crate::process::schema::{analyze_layout, EntityKind, ReshapeError};
use crate::process::utils::{coerce_value, label_text};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongRecord {
    pub entity: String,
    pub year: i32,
    pub value: f64,
}

/// A reshaped dataset: one record per (entity, year), sorted by (year, entity).
#[derive(Debug, Clone, PartialEq)]
pub struct LongTable {
    pub key: String,
    pub entity_kind: EntityKind,
    pub records: Vec<LongRecord>,
}

impl LongTable {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Distinct entities, in first-seen order.
    pub fn entities(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter(|r| seen.insert(r.entity.as_str()))
            .map(|r| r.entity.clone())
            .collect()
    }

    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.records.iter().map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    pub fn latest_year(&self) -> Option<i32> {
        self.records.iter().map(|r| r.year).max()
    }

    /// Records for one year, in entity order.
    pub fn for_year(&self, year: i32) -> Vec<&LongRecord> {
        self.records.iter().filter(|r| r.year == year).collect()
    }

    /// (year, value) pairs for one entity, ascending by year.
    pub fn series(&self, entity: &str) -> Vec<(i32, f64)> {
        self.records
            .iter()
            .filter(|r| r.entity == entity)
            .map(|r| (r.year, r.value))
            .collect()
    }

    pub fn value(&self, entity: &str, year: i32) -> Option<f64> {
        self.records
            .iter()
            .find(|r| r.year == year && r.entity == entity)
            .map(|r| r.value)
    }
}

/// Reshape a wide year-column table into long records.
///
/// Rows with a missing label or an unparseable value are dropped. Province
/// labels are canonicalized and aggregate rows removed. Duplicate
/// (entity, year) pairs keep their first occurrence.
pub fn reshape(key: &str, table: &RawTable) -> Result<LongTable, ReshapeError> {
    let layout = analyze_layout(key, table)?;

    let mut seen: HashSet<(String, i32)> = HashSet::new();
    let mut records = Vec::with_capacity(table.height() * layout.year_columns.len());
    let mut dropped_values = 0usize;
    let mut dropped_labels = 0usize;
    let mut duplicates = 0usize;

    for row in 0..table.height() {
        let Some(label) = label_text(table.cell(row, layout.entity_column)) else {
            dropped_labels += 1;
            continue;
        };
        let entity = match layout.entity_kind {
            EntityKind::Province => {
                let short = canonical_province(&label);
                if is_aggregate(&short) {
                    dropped_labels += 1;
                    continue;
                }
                short
            }
            EntityKind::Indicator => label,
        };

        for &(col, year) in &layout.year_columns {
            let Some(value) = coerce_value(table.cell(row, col)) else {
                dropped_values += 1;
                continue;
            };
            if !seen.insert((entity.clone(), year)) {
                duplicates += 1;
                continue;
            }
            records.push(LongRecord {
                entity: entity.clone(),
                year,
                value,
            });
        }
    }

    // stable sort keeps row order among equal keys
    records.sort_by(|a, b| a.year.cmp(&b.year).then_with(|| a.entity.cmp(&b.entity)));

    debug!(
        key,
        records = records.len(),
        dropped_values,
        dropped_labels,
        duplicates,
        "reshaped"
    );

    Ok(LongTable {
        key: key.to_string(),
        entity_kind: layout.entity_kind,
        records,
    })
}
