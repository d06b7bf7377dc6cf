use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tracing::warn;

use crate::process::province::map_name;
use crate::render::ChartOutput;

const ECHARTS_JS: &str = "https://cdn.jsdelivr.net/npm/echarts@5/dist/echarts.min.js";
const CHINA_MAP_JS: &str = "https://assets.pyecharts.org/assets/v5/maps/china.js";

/// Provincial values for one year on the ECharts China map.
#[derive(Debug, Clone, PartialEq)]
pub struct Choropleth {
    pub title: String,
    pub series_name: String,
    pub values: Vec<(String, f64)>,
}

impl Choropleth {
    pub fn new(title: &str, series_name: &str, values: Vec<(String, f64)>) -> Self {
        Self {
            title: title.to_string(),
            series_name: series_name.to_string(),
            values,
        }
    }

    /// ECharts option object; the piecewise scale tops out at the data maximum.
    pub fn option(&self) -> Value {
        let max = self
            .values
            .iter()
            .map(|(_, v)| *v)
            .fold(f64::NEG_INFINITY, f64::max);
        let max = if max.is_finite() { max } else { 0.0 };
        let data: Vec<Value> = self
            .values
            .iter()
            .map(|(name, v)| json!({ "name": map_name(name), "value": v }))
            .collect();
        json!({
            "title": { "text": self.title },
            "tooltip": { "trigger": "item" },
            "visualMap": {
                "type": "piecewise",
                "min": 0,
                "max": max,
                "splitNumber": 5,
                "left": "left",
                "bottom": "bottom"
            },
            "series": [{
                "name": self.series_name,
                "type": "map",
                "map": "china",
                "roam": true,
                "label": { "show": false },
                "data": data
            }]
        })
    }

    pub fn to_html(&self) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<title>{title}</title>
<script src="{echarts}"></script>
<script src="{china}"></script>
</head>
<body>
<div id="chart" style="width:1200px;height:800px;"></div>
<script>
var chart = echarts.init(document.getElementById('chart'));
chart.setOption({option});
</script>
</body>
</html>
"#,
            title = html_escape(&self.title),
            echarts = ECHARTS_JS,
            china = CHINA_MAP_JS,
            option = self.option(),
        )
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn render_choropleth(out: &mut ChartOutput, map: &Choropleth) -> Result<Option<PathBuf>> {
    if map.values.is_empty() {
        warn!(title = %map.title, "no map data, choropleth skipped");
        return Ok(None);
    }
    let path = out.reserve(&map.title, "html");
    std::fs::write(&path, map.to_html())
        .with_context(|| format!("writing choropleth {}", path.display()))?;
    out.record(path.clone());
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{ChartStyle, RenderConfig};
    use tempfile::tempdir;

    #[test]
    fn test_choropleth_html() -> Result<()> {
        let dir = tempdir()?;
        let style = ChartStyle::with_font(&RenderConfig::default(), "sans-serif".into());
        let mut out = ChartOutput::new(dir.path(), style)?;
        let map = Choropleth::new(
            "2022年各省GDP",
            "GDP (亿元)",
            vec![
                ("新疆维吾尔自治区".to_string(), 17741.3),
                ("广东".to_string(), 129118.6),
            ],
        );

        let option = map.option();
        assert_eq!(option["visualMap"]["max"], json!(129118.6));
        assert_eq!(option["visualMap"]["type"], json!("piecewise"));
        assert_eq!(option["series"][0]["data"][0]["name"], json!("新疆"));

        let path = render_choropleth(&mut out, &map)?.expect("map written");
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("2022年各省GDP_1.html"));
        let html = std::fs::read_to_string(&path)?;
        assert!(html.contains("echarts.init"));
        assert!(html.contains("\"map\":\"china\""));
        assert_eq!(out.written(), &[path]);

        let empty = Choropleth::new("空", "GDP", Vec::new());
        assert!(render_choropleth(&mut out, &empty)?.is_none());
        Ok(())
    }
}
