//! Picking named series out of indicator-keyed datasets.
//!
//! The pipeline goes through [`IndicatorCatalog`], an explicit mapping from each
//! canonical indicator to the dataset and source labels that carry it.
//! [`select_by_keywords`] keeps the older substring heuristic for ad-hoc lookups.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::frame::{pivot, YearFrame};
use crate::process::convert::LongTable;
use crate::process::utils::normalize_label;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    Gdp,
    PerCapitaIncome,
    ConsumptionLevel,
    DomesticVisitors,
    DomesticSpending,
    InboundVisitors,
    InboundOvernightVisitors,
    OutboundResidents,
    TourismFxRevenue,
    TourismEmployees,
    StarHotels,
    TravelAgencies,
    ScenicSpots,
}

impl Indicator {
    pub const ALL: [Indicator; 13] = [
        Indicator::Gdp,
        Indicator::PerCapitaIncome,
        Indicator::ConsumptionLevel,
        Indicator::DomesticVisitors,
        Indicator::DomesticSpending,
        Indicator::InboundVisitors,
        Indicator::InboundOvernightVisitors,
        Indicator::OutboundResidents,
        Indicator::TourismFxRevenue,
        Indicator::TourismEmployees,
        Indicator::StarHotels,
        Indicator::TravelAgencies,
        Indicator::ScenicSpots,
    ];

    /// Column name used in merged frames and chart legends.
    pub fn display_name(&self) -> &'static str {
        match self {
            Indicator::Gdp => "国内生产总值",
            Indicator::PerCapitaIncome => "居民人均可支配收入",
            Indicator::ConsumptionLevel => "居民消费水平",
            Indicator::DomesticVisitors => "国内旅游人次",
            Indicator::DomesticSpending => "国内旅游收入",
            Indicator::InboundVisitors => "入境游客",
            Indicator::InboundOvernightVisitors => "入境过夜游客",
            Indicator::OutboundResidents => "国内居民出境人数",
            Indicator::TourismFxRevenue => "国际旅游外汇收入",
            Indicator::TourismEmployees => "旅游从业人员",
            Indicator::StarHotels => "星级饭店数",
            Indicator::TravelAgencies => "旅行社数",
            Indicator::ScenicSpots => "A级旅游景区数",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Where one indicator lives: a dataset key and the accepted source labels, in preference order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSource {
    pub dataset: String,
    pub labels: Vec<String>,
}

impl IndicatorSource {
    fn new(dataset: &str, labels: &[&str]) -> Self {
        Self {
            dataset: dataset.to_string(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }
}

/// A resolved indicator series.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator: Indicator,
    /// The source label that matched.
    pub label: String,
    /// (year, value), ascending by year.
    pub points: Vec<(i32, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorCatalog {
    pub sources: BTreeMap<Indicator, IndicatorSource>,
}

impl Default for IndicatorCatalog {
    fn default() -> Self {
        let dev = "旅游业发展";
        let sources = BTreeMap::from([
            (
                Indicator::Gdp,
                IndicatorSource::new("国内生成总值", &["国内生产总值(亿元)", "国内生产总值", "GDP"]),
            ),
            (
                Indicator::PerCapitaIncome,
                IndicatorSource::new(
                    "全国居民人均收入",
                    &["居民人均可支配收入(元)", "全国居民人均可支配收入", "居民人均收入"],
                ),
            ),
            (
                Indicator::ConsumptionLevel,
                IndicatorSource::new(
                    "居民消费水平",
                    &["居民消费水平(元)", "居民人均消费支出", "居民消费水平"],
                ),
            ),
            (
                Indicator::DomesticVisitors,
                IndicatorSource::new(
                    "国内旅游",
                    &["国内游客(百万人次)", "国内游客(万人次)", "国内旅游人数", "国内游客"],
                ),
            ),
            (
                Indicator::DomesticSpending,
                IndicatorSource::new("国内旅游", &["国内旅游总花费(亿元)", "国内旅游收入"]),
            ),
            (
                Indicator::InboundVisitors,
                IndicatorSource::new(dev, &["入境游客(万人次)", "入境游客"]),
            ),
            (
                Indicator::InboundOvernightVisitors,
                IndicatorSource::new(dev, &["入境过夜游客(万人次)", "入境过夜游客"]),
            ),
            (
                Indicator::OutboundResidents,
                IndicatorSource::new(dev, &["国内居民出境人数(万人次)", "国内居民出境人数"]),
            ),
            (
                Indicator::TourismFxRevenue,
                IndicatorSource::new(dev, &["国际旅游外汇收入(百万美元)", "国际旅游外汇收入"]),
            ),
            (
                Indicator::TourismEmployees,
                IndicatorSource::new(dev, &["旅游从业人员数(人)", "旅游从业人员(万人)", "旅游从业人员"]),
            ),
            (
                Indicator::StarHotels,
                IndicatorSource::new(dev, &["星级饭店数(家)", "星级饭店数"]),
            ),
            (
                Indicator::TravelAgencies,
                IndicatorSource::new(dev, &["旅行社数(家)", "旅行社数"]),
            ),
            (
                Indicator::ScenicSpots,
                IndicatorSource::new(dev, &["A级旅游景区数(个)", "A级旅游景区数"]),
            ),
        ]);
        Self { sources }
    }
}

impl IndicatorCatalog {
    /// Replace the entries named in `overrides`, keeping the rest.
    pub fn with_overrides(mut self, overrides: &BTreeMap<Indicator, IndicatorSource>) -> Self {
        for (indicator, source) in overrides {
            self.sources.insert(*indicator, source.clone());
        }
        self
    }

    /// First configured label present in the indicator's dataset, compared after
    /// normalization on both sides.
    pub fn resolve(
        &self,
        indicator: Indicator,
        tables: &BTreeMap<String, LongTable>,
    ) -> Option<IndicatorSeries> {
        let source = self.sources.get(&indicator)?;
        let Some(table) = tables.get(&source.dataset) else {
            warn!(%indicator, dataset = %source.dataset, "dataset not loaded");
            return None;
        };

        for wanted in &source.labels {
            let wanted = normalize_label(wanted);
            let points: Vec<(i32, f64)> = table
                .records
                .iter()
                .filter(|r| normalize_label(&r.entity) == wanted)
                .map(|r| (r.year, r.value))
                .collect();
            if !points.is_empty() {
                debug!(%indicator, label = %wanted, points = points.len(), "indicator resolved");
                return Some(IndicatorSeries {
                    indicator,
                    label: wanted,
                    points,
                });
            }
        }

        warn!(
            %indicator,
            dataset = %source.dataset,
            available = ?table.entities(),
            "no configured label found"
        );
        None
    }
}

/// Priority used to disambiguate keyword matches: exact matches first, then substrings.
pub const DEFAULT_PRIORITY: [&str; 16] = [
    "国内生产总值(亿元)",
    "国内生产总值",
    "人均国内生产总值",
    "居民人均可支配收入(元)",
    "居民人均可支配收入",
    "居民消费水平(元)",
    "居民消费水平",
    "国内游客(百万人次)",
    "国内旅游人数",
    "国内游客",
    "国内旅游总花费(亿元)",
    "国内旅游收入",
    "入境游客(万人次)",
    "入境过夜游客(万人次)",
    "国民总收入(亿元)",
    "总",
];

/// Outcome of a keyword lookup; callers must handle every case.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Series { label: String, points: Vec<(i32, f64)> },
    /// Several matches and no priority entry applies: one column per indicator.
    Pivoted(YearFrame),
    NotFound,
}

/// Select indicator rows whose label contains any of `keywords`.
pub fn select_by_keywords(table: &LongTable, keywords: &[&str], priority: &[&str]) -> Selection {
    let matched: Vec<_> = table
        .records
        .iter()
        .filter(|r| keywords.iter().any(|k| r.entity.contains(k)))
        .cloned()
        .collect();

    let series_of = |label: &str| Selection::Series {
        label: label.to_string(),
        points: table.series(label),
    };

    if matched.is_empty() {
        let entities = table.entities();
        return match entities.as_slice() {
            // a single-indicator table is taken as the target
            [only] => series_of(only.as_str()),
            _ => Selection::NotFound,
        };
    }

    let mut seen = HashSet::new();
    let labels: Vec<&str> = matched
        .iter()
        .map(|r| r.entity.as_str())
        .filter(|l| seen.insert(*l))
        .collect();
    if let [only] = labels.as_slice() {
        return series_of(*only);
    }

    let exact = priority
        .iter()
        .find_map(|p| labels.iter().find(|l| *l == p).copied());
    let chosen = exact.or_else(|| {
        priority
            .iter()
            .find_map(|p| labels.iter().find(|l| l.contains(p)).copied())
    });
    match chosen {
        Some(label) => series_of(label),
        None => Selection::Pivoted(pivot(&matched)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::convert::LongRecord;
    use crate::process::EntityKind;

    fn indicator_table(key: &str, rows: &[(&str, i32, f64)]) -> LongTable {
        LongTable {
            key: key.into(),
            entity_kind: EntityKind::Indicator,
            records: rows
                .iter()
                .map(|(e, y, v)| LongRecord {
                    entity: e.to_string(),
                    year: *y,
                    value: *v,
                })
                .collect(),
        }
    }

    #[test]
    fn test_catalog_prefers_earlier_labels() {
        let gdp = indicator_table(
            "国内生成总值",
            &[
                ("国内生产总值", 2020, 1.0),
                ("国内生产总值(亿元)", 2020, 1015986.0),
                ("国内生产总值(亿元)", 2021, 1143670.0),
            ],
        );
        let tables = BTreeMap::from([("国内生成总值".to_string(), gdp)]);
        let series = IndicatorCatalog::default()
            .resolve(Indicator::Gdp, &tables)
            .unwrap();
        assert_eq!(series.label, "国内生产总值(亿元)");
        assert_eq!(series.points, vec![(2020, 1015986.0), (2021, 1143670.0)]);
    }

    #[test]
    fn test_catalog_normalizes_labels_and_overrides() {
        let dev = indicator_table("旅游业发展", &[("入境游客 (万人次)", 2019, 14531.0)]);
        let tables = BTreeMap::from([("旅游业发展".to_string(), dev)]);
        let catalog = IndicatorCatalog::default();
        let inbound = catalog.resolve(Indicator::InboundVisitors, &tables).unwrap();
        assert_eq!(inbound.points, vec![(2019, 14531.0)]);
        assert!(catalog.resolve(Indicator::Gdp, &tables).is_none());

        let overrides = BTreeMap::from([(
            Indicator::Gdp,
            IndicatorSource::new("旅游业发展", &["入境游客(万人次)"]),
        )]);
        let catalog = catalog.with_overrides(&overrides);
        assert!(catalog.resolve(Indicator::Gdp, &tables).is_some());
        assert_eq!(catalog.sources.len(), Indicator::ALL.len());
    }

    #[test]
    fn test_keyword_selection_single_and_implicit() {
        let t = indicator_table("t", &[("国内生产总值(亿元)", 2020, 5.0)]);
        assert_eq!(
            select_by_keywords(&t, &["国内生产总值"], &DEFAULT_PRIORITY),
            Selection::Series {
                label: "国内生产总值(亿元)".into(),
                points: vec![(2020, 5.0)]
            }
        );
        // no match, but only one indicator in the table
        assert!(matches!(
            select_by_keywords(&t, &["GDP"], &DEFAULT_PRIORITY),
            Selection::Series { .. }
        ));

        let two = indicator_table("t", &[("a", 2020, 1.0), ("b", 2020, 2.0)]);
        assert_eq!(
            select_by_keywords(&two, &["zzz"], &DEFAULT_PRIORITY),
            Selection::NotFound
        );
    }

    #[test]
    fn test_keyword_selection_priority_and_pivot() {
        let t = indicator_table(
            "t",
            &[
                ("人均国内生产总值(元)", 2020, 72000.0),
                ("国内生产总值(亿元)", 2020, 1015986.0),
            ],
        );
        match select_by_keywords(&t, &["生产总值"], &DEFAULT_PRIORITY) {
            Selection::Series { label, .. } => assert_eq!(label, "国内生产总值(亿元)"),
            other => panic!("unexpected {:?}", other),
        }

        let t = indicator_table("t", &[("甲指标", 2020, 1.0), ("乙指标", 2020, 2.0)]);
        match select_by_keywords(&t, &["指标"], &DEFAULT_PRIORITY) {
            Selection::Pivoted(frame) => {
                assert_eq!(frame.columns.len(), 2);
                assert_eq!(frame.get(&2020, "乙指标"), Some(2.0));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
