//! Keyed numeric frames used to join reshaped datasets.
//!
//! A frame is an ordered map from a key (a year, or a province-year pair) to
//! one optional value per named column. Joins never mutate their inputs.

pub mod stats;

use std::collections::{BTreeMap, HashSet};

use crate::process::{LongRecord, LongTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Keys present in every input.
    Inner,
    /// Every key; absent cells are `None`.
    Outer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame<K: Ord + Clone> {
    pub columns: Vec<String>,
    pub rows: BTreeMap<K, Vec<Option<f64>>>,
}

pub type YearFrame = Frame<i32>;
pub type PanelFrame = Frame<(String, i32)>;

impl<K: Ord + Clone> Frame<K> {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: BTreeMap::new(),
        }
    }

    /// Single-column frame from (key, value) pairs. Later duplicates overwrite earlier ones.
    pub fn from_series(name: &str, points: impl IntoIterator<Item = (K, f64)>) -> Self {
        let rows = points.into_iter().map(|(k, v)| (k, vec![Some(v)])).collect();
        Self {
            columns: vec![name.to_string()],
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn keys(&self) -> Vec<K> {
        self.rows.keys().cloned().collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn get(&self, key: &K, column: &str) -> Option<f64> {
        let idx = self.column_index(column)?;
        self.rows.get(key).and_then(|r| r[idx])
    }

    /// Set one cell, adding the row if needed.
    pub fn set(&mut self, key: K, column: &str, value: Option<f64>) {
        let idx = match self.column_index(column) {
            Some(idx) => idx,
            None => {
                self.columns.push(column.to_string());
                for row in self.rows.values_mut() {
                    row.push(None);
                }
                self.columns.len() - 1
            }
        };
        let width = self.columns.len();
        let row = self.rows.entry(key).or_insert_with(|| vec![None; width]);
        row[idx] = value;
    }

    /// Present values of one column, in key order.
    pub fn column(&self, name: &str) -> Vec<(K, f64)> {
        let Some(idx) = self.column_index(name) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .filter_map(|(k, row)| row[idx].map(|v| (k.clone(), v)))
            .collect()
    }

    /// Every value of one column including gaps, in key order.
    pub fn column_with_gaps(&self, name: &str) -> Vec<(K, Option<f64>)> {
        let Some(idx) = self.column_index(name) else {
            return Vec::new();
        };
        self.rows.iter().map(|(k, row)| (k.clone(), row[idx])).collect()
    }

    /// Rows where both columns are present.
    pub fn pairs(&self, x: &str, y: &str) -> Vec<(K, f64, f64)> {
        let (Some(xi), Some(yi)) = (self.column_index(x), self.column_index(y)) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .filter_map(|(k, row)| match (row[xi], row[yi]) {
                (Some(a), Some(b)) => Some((k.clone(), a, b)),
                _ => None,
            })
            .collect()
    }

    /// Subset of columns, in the order given. Unknown names are ignored.
    pub fn select(&self, names: &[&str]) -> Self {
        let picked: Vec<usize> = names.iter().filter_map(|n| self.column_index(n)).collect();
        Self {
            columns: picked.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|(k, row)| (k.clone(), picked.iter().map(|&i| row[i]).collect()))
                .collect(),
        }
    }

    /// Keep rows whose key satisfies `keep`.
    pub fn filter_keys(&self, keep: impl Fn(&K) -> bool) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|(k, _)| keep(*k))
                .map(|(k, r)| (k.clone(), r.clone()))
                .collect(),
        }
    }

    /// Join on key. Column names that collide with ours get a `_right` suffix.
    pub fn join(&self, other: &Frame<K>, kind: JoinKind) -> Frame<K> {
        let mut columns = self.columns.clone();
        for name in &other.columns {
            let mut candidate = name.clone();
            while columns.contains(&candidate) {
                candidate.push_str("_right");
            }
            columns.push(candidate);
        }

        let left_width = self.columns.len();
        let right_width = other.columns.len();
        let keys: Vec<&K> = match kind {
            JoinKind::Inner => self
                .rows
                .keys()
                .filter(|k| other.rows.contains_key(*k))
                .collect(),
            JoinKind::Outer => {
                let mut all: Vec<&K> = self.rows.keys().chain(other.rows.keys()).collect();
                all.sort();
                all.dedup();
                all
            }
        };

        let rows = keys
            .into_iter()
            .map(|k| {
                let mut row = Vec::with_capacity(left_width + right_width);
                match self.rows.get(k) {
                    Some(left) => row.extend_from_slice(left),
                    None => row.extend(std::iter::repeat(None).take(left_width)),
                }
                match other.rows.get(k) {
                    Some(right) => row.extend_from_slice(right),
                    None => row.extend(std::iter::repeat(None).take(right_width)),
                }
                (k.clone(), row)
            })
            .collect();

        Frame { columns, rows }
    }
}

/// Fold a join across every frame. `None` when `frames` is empty.
pub fn join_all<K: Ord + Clone>(frames: &[Frame<K>], kind: JoinKind) -> Option<Frame<K>> {
    let (first, rest) = frames.split_first()?;
    Some(rest.iter().fold(first.clone(), |acc, f| acc.join(f, kind)))
}

/// Wide year × entity frame from long records; columns in first-seen entity order.
pub fn pivot(records: &[LongRecord]) -> YearFrame {
    let mut seen = HashSet::new();
    let columns: Vec<String> = records
        .iter()
        .filter(|r| seen.insert(r.entity.as_str()))
        .map(|r| r.entity.clone())
        .collect();
    let mut frame = Frame::new(columns);
    for r in records {
        frame.set(r.year, &r.entity, Some(r.value));
    }
    frame
}

/// Long records from a wide year frame, skipping gaps; sorted by (year, entity).
pub fn to_long(frame: &YearFrame) -> Vec<LongRecord> {
    let mut out: Vec<LongRecord> = frame
        .rows
        .iter()
        .flat_map(|(year, row)| {
            frame.columns.iter().zip(row).filter_map(move |(name, v)| {
                v.map(|value| LongRecord {
                    entity: name.clone(),
                    year: *year,
                    value,
                })
            })
        })
        .collect();
    out.sort_by(|a, b| a.year.cmp(&b.year).then_with(|| a.entity.cmp(&b.entity)));
    out
}

/// (province, year) frame holding one long table as the column `name`.
pub fn panel(table: &LongTable, name: &str) -> PanelFrame {
    Frame::from_series(
        name,
        table
            .records
            .iter()
            .map(|r| ((r.entity.clone(), r.year), r.value)),
    )
}

/// Year frame holding one series as the column `name`.
pub fn year_series(name: &str, points: &[(i32, f64)]) -> YearFrame {
    Frame::from_series(name, points.iter().copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::raw_table::{Cell, RawTable};
    use crate::process::reshape;

    #[test]
    fn test_inner_and_outer_join() {
        let gdp = year_series("gdp", &[(2019, 1.0), (2020, 2.0), (2021, 3.0)]);
        let visitors = year_series("visitors", &[(2020, 20.0), (2021, 30.0), (2022, 40.0)]);

        let inner = gdp.join(&visitors, JoinKind::Inner);
        assert_eq!(inner.keys(), vec![2020, 2021]);
        assert_eq!(inner.get(&2021, "visitors"), Some(30.0));

        let outer = gdp.join(&visitors, JoinKind::Outer);
        assert_eq!(outer.keys(), vec![2019, 2020, 2021, 2022]);
        assert_eq!(outer.get(&2019, "visitors"), None);
        assert_eq!(outer.get(&2022, "gdp"), None);
        assert_eq!(outer.get(&2022, "visitors"), Some(40.0));
        assert_eq!(outer.pairs("gdp", "visitors").len(), 2);
    }

    #[test]
    fn test_join_all_and_collisions() {
        let a = year_series("v", &[(2020, 1.0)]);
        let b = year_series("v", &[(2020, 2.0)]);
        let c = year_series("w", &[(2020, 3.0), (2021, 4.0)]);
        let joined = join_all(&[a, b, c], JoinKind::Inner).unwrap();
        assert_eq!(joined.columns, vec!["v", "v_right", "w"]);
        assert_eq!(joined.rows[&2020], vec![Some(1.0), Some(2.0), Some(3.0)]);
        assert!(join_all::<i32>(&[], JoinKind::Outer).is_none());
    }

    #[test]
    fn test_panel_join_on_province_year() {
        let mut gdp = PanelFrame::new(vec!["gdp".into()]);
        gdp.set(("广东".into(), 2020), "gdp", Some(11.0));
        gdp.set(("海南".into(), 2020), "gdp", Some(0.5));
        let mut fx = PanelFrame::new(vec!["fx".into()]);
        fx.set(("广东".into(), 2020), "fx", Some(7.0));

        let merged = gdp.join(&fx, JoinKind::Inner);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged.get(&("广东".into(), 2020), "fx"), Some(7.0));
    }

    #[test]
    fn test_wide_long_wide_round_trip() {
        let table = RawTable::new(
            vec![Cell::text("地区"), Cell::text("2020年"), Cell::text("2021年")],
            vec![
                vec![Cell::text("全国"), Cell::Number(100.0), Cell::Number(110.0)],
                vec![Cell::text("北京市"), Cell::Number(1.0), Cell::Number(2.0)],
                vec![Cell::text("上海市"), Cell::Number(3.0), Cell::text("无")],
                vec![Cell::text("北京"), Cell::Number(9.0), Cell::Number(9.0)],
            ],
        );
        let long = reshape("t", &table).unwrap();
        let wide = pivot(&long.records);

        assert_eq!(wide.keys(), vec![2020, 2021]);
        assert_eq!(wide.get(&2020, "北京"), Some(1.0));
        assert_eq!(wide.get(&2021, "北京"), Some(2.0));
        assert_eq!(wide.get(&2020, "上海"), Some(3.0));
        assert_eq!(wide.get(&2021, "上海"), None);
        assert!(wide.column_index("全国").is_none());

        assert_eq!(to_long(&wide), long.records);
    }

    #[test]
    fn test_select_and_filter() {
        let frame = year_series("a", &[(2000, 1.0), (2010, 2.0)])
            .join(&year_series("b", &[(2000, 3.0)]), JoinKind::Outer);
        let only_b = frame.select(&["b", "missing"]);
        assert_eq!(only_b.columns, vec!["b"]);
        assert_eq!(only_b.column("b"), vec![(2000, 3.0)]);
        assert_eq!(
            frame.column_with_gaps("b"),
            vec![(2000, Some(3.0)), (2010, None)]
        );
        let recent = frame.filter_keys(|y| *y >= 2005);
        assert_eq!(recent.keys(), vec![2010]);
    }
}
