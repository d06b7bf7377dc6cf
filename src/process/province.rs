//! Province label canonicalization.
//!
//! Source files spell the same region differently ("新疆维吾尔自治区", "新疆",
//! "北京市"). Every provincial label is reduced to the short form used by the
//! ECharts China map so tables join on a single key.

use once_cell::sync::Lazy;
use regex::Regex;

/// First-level administrative regions, by the short name the choropleth expects.
pub const PROVINCES: [&str; 34] = [
    "北京", "天津", "河北", "山西", "内蒙古", "辽宁", "吉林", "黑龙江", "上海", "江苏", "浙江",
    "安徽", "福建", "江西", "山东", "河南", "湖北", "湖南", "广东", "广西", "海南", "重庆",
    "四川", "贵州", "云南", "西藏", "陕西", "甘肃", "青海", "宁夏", "新疆", "台湾", "香港",
    "澳门",
];

/// Country-level rollups that must never mix with provincial rows.
pub const AGGREGATE_LABELS: [&str; 6] = ["全国", "合计", "全部", "总计", "港澳台地区", ""];

static ADMIN_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(特别行政区|自治区|自治州|省|市|壮族|回族|维吾尔|藏族)+$")
        .expect("admin suffix pattern")
});

/// Reduce a province label to its canonical short name.
///
/// Known provinces are matched by prefix; anything else has trailing
/// administrative and ethnic qualifiers removed.
pub fn canonical_province(raw: &str) -> String {
    let label: String = raw.split_whitespace().collect();
    if let Some(short) = PROVINCES.iter().find(|p| label.starts_with(*p)) {
        return (*short).to_string();
    }
    ADMIN_SUFFIX.replace(&label, "").trim().to_string()
}

pub fn is_aggregate(label: &str) -> bool {
    AGGREGATE_LABELS.contains(&label.trim())
}

pub fn is_known_province(label: &str) -> bool {
    PROVINCES.contains(&label)
}

/// Name to hand to the choropleth for a (possibly long-form) label.
pub fn map_name(label: &str) -> String {
    canonical_province(label)
}
