use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::SchemaError;

/// The six supported chart kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
    Scatter,
    Heatmap,
    Area,
}

impl ChartKind {
    pub const ALL: [ChartKind; 6] = [
        Self::Line,
        Self::Bar,
        Self::Pie,
        Self::Scatter,
        Self::Heatmap,
        Self::Area,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Bar => "bar",
            Self::Pie => "pie",
            Self::Scatter => "scatter",
            Self::Heatmap => "heatmap",
            Self::Area => "area",
        }
    }

    /// Keys that must be present (and non-null) in `data` for this kind.
    pub fn required_keys(&self) -> &'static [&'static str] {
        match self {
            Self::Line | Self::Bar | Self::Scatter | Self::Area => &["x", "y"],
            Self::Pie => &["labels", "values"],
            Self::Heatmap => &["matrix"],
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| SchemaError::UnsupportedChartType(s.to_string()))
    }
}

/// A category label or a numeric coordinate; models emit both for `x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisValue {
    Number(f64),
    Text(String),
}

impl AxisValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for AxisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Line and area data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesData {
    pub x: Vec<AxisValue>,
    pub y: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarData {
    pub x: Vec<AxisValue>,
    pub y: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieData {
    pub labels: Vec<AxisValue>,
    pub values: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explode: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
}

/// Default wedge offset, as a fraction of the radius.
pub const DEFAULT_EXPLODE: f64 = 0.05;

impl PieData {
    /// Per-wedge explode offsets, one per label.
    pub fn explode_values(&self) -> Vec<f64> {
        match &self.explode {
            Some(explode) => (0..self.labels.len())
                .map(|i| explode.get(i).copied().unwrap_or(DEFAULT_EXPLODE))
                .collect(),
            None => vec![DEFAULT_EXPLODE; self.labels.len()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterData {
    pub x: Vec<AxisValue>,
    pub y: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<Vec<f64>>,
    /// Values placed on the continuous color scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<f64>>,
}

/// Default marker area (points squared).
pub const DEFAULT_MARKER_SIZE: f64 = 100.0;

impl ScatterData {
    pub fn sizes_or_default(&self) -> Vec<f64> {
        match &self.sizes {
            Some(sizes) => (0..self.x.len())
                .map(|i| sizes.get(i).copied().unwrap_or(DEFAULT_MARKER_SIZE))
                .collect(),
            None => vec![DEFAULT_MARKER_SIZE; self.x.len()],
        }
    }

    /// Color-scale values; the point index when none were given.
    pub fn color_values(&self) -> Vec<f64> {
        match &self.colors {
            Some(colors) if colors.len() == self.x.len() => colors.clone(),
            _ => (0..self.x.len()).map(|i| i as f64).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapData {
    pub matrix: Vec<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xlabels: Option<Vec<AxisValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ylabels: Option<Vec<AxisValue>>,
}

/// Chart data, one variant per kind, each carrying only its own fields.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Line(SeriesData),
    Bar(BarData),
    Pie(PieData),
    Scatter(ScatterData),
    Heatmap(HeatmapData),
    Area(SeriesData),
}

impl ChartData {
    pub fn kind(&self) -> ChartKind {
        match self {
            Self::Line(_) => ChartKind::Line,
            Self::Bar(_) => ChartKind::Bar,
            Self::Pie(_) => ChartKind::Pie,
            Self::Scatter(_) => ChartKind::Scatter,
            Self::Heatmap(_) => ChartKind::Heatmap,
            Self::Area(_) => ChartKind::Area,
        }
    }

    fn to_value(&self) -> Value {
        let value = match self {
            Self::Line(d) | Self::Area(d) => serde_json::to_value(d),
            Self::Bar(d) => serde_json::to_value(d),
            Self::Pie(d) => serde_json::to_value(d),
            Self::Scatter(d) => serde_json::to_value(d),
            Self::Heatmap(d) => serde_json::to_value(d),
        };
        value.unwrap_or(Value::Null)
    }

    fn from_value(kind: ChartKind, data: &Value) -> Result<Self, SchemaError> {
        let object = data.as_object().ok_or_else(|| SchemaError::InvalidField {
            key: "data".into(),
            reason: "expected an object".into(),
        })?;

        for key in kind.required_keys() {
            if object.get(*key).map_or(true, Value::is_null) {
                return Err(SchemaError::MissingKey {
                    chart_type: kind.as_str(),
                    key: *key,
                });
            }
        }

        let invalid = |e: serde_json::Error| SchemaError::InvalidField {
            key: "data".into(),
            reason: e.to_string(),
        };

        Ok(match kind {
            ChartKind::Line => Self::Line(SeriesData::deserialize(data).map_err(invalid)?),
            ChartKind::Bar => Self::Bar(BarData::deserialize(data).map_err(invalid)?),
            ChartKind::Pie => Self::Pie(PieData::deserialize(data).map_err(invalid)?),
            ChartKind::Scatter => Self::Scatter(ScatterData::deserialize(data).map_err(invalid)?),
            ChartKind::Heatmap => Self::Heatmap(HeatmapData::deserialize(data).map_err(invalid)?),
            ChartKind::Area => Self::Area(SeriesData::deserialize(data).map_err(invalid)?),
        })
    }
}

/// A validated chart description, ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub xlabel: Option<String>,
    pub ylabel: Option<String>,
    pub data: ChartData,
}

impl ChartSpec {
    pub fn kind(&self) -> ChartKind {
        self.data.kind()
    }

    /// Validate a wire config against its chart type's schema.
    pub fn from_config(config: &ChartConfig) -> Result<Self, SchemaError> {
        let kind: ChartKind = config.chart_type.parse()?;
        let data = ChartData::from_value(kind, &config.data)?;
        Ok(Self {
            title: config.title.clone(),
            xlabel: non_empty(config.xlabel.as_deref()),
            ylabel: non_empty(config.ylabel.as_deref()),
            data,
        })
    }

    /// Wire form of this spec, without recommendation metadata.
    pub fn to_config(&self) -> ChartConfig {
        ChartConfig {
            chart_type: self.kind().as_str().to_string(),
            title: self.title.clone(),
            xlabel: self.xlabel.clone(),
            ylabel: self.ylabel.clone(),
            data: self.data.to_value(),
            priority: None,
            description: None,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Chart spec as it crosses the wire: loosely typed, not yet validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    pub chart_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xlabel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ylabel: Option<String>,
    #[serde(default)]
    pub data: Value,
    /// Priority of the recommendation this chart came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: Value) -> ChartConfig {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn chart_kind_parses_case_insensitively() {
        assert_eq!("Bar".parse::<ChartKind>().unwrap(), ChartKind::Bar);
        assert_eq!(" heatmap ".parse::<ChartKind>().unwrap(), ChartKind::Heatmap);
        assert!(matches!(
            "radar".parse::<ChartKind>(),
            Err(SchemaError::UnsupportedChartType(t)) if t == "radar"
        ));
    }

    #[test]
    fn line_config_validates() {
        let spec = ChartSpec::from_config(&config(json!({
            "chart_type": "line",
            "title": "Revenue",
            "xlabel": "Quarter",
            "ylabel": "",
            "data": {"x": ["Q1", "Q2"], "y": [100, 120], "label": "Revenue"}
        })))
        .unwrap();

        assert_eq!(spec.kind(), ChartKind::Line);
        assert_eq!(spec.xlabel.as_deref(), Some("Quarter"));
        assert!(spec.ylabel.is_none());
        match spec.data {
            ChartData::Line(d) => {
                assert_eq!(d.x, vec![AxisValue::Text("Q1".into()), AxisValue::Text("Q2".into())]);
                assert_eq!(d.y, vec![100.0, 120.0]);
                assert_eq!(d.label.as_deref(), Some("Revenue"));
            }
            other => panic!("unexpected data {other:?}"),
        }
    }

    #[test]
    fn missing_required_key_is_reported() {
        let err = ChartSpec::from_config(&config(json!({
            "chart_type": "pie",
            "title": "Share",
            "data": {"labels": ["A", "B"]}
        })))
        .unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingKey {
                chart_type: "pie",
                key: "values"
            }
        );
    }

    #[test]
    fn null_required_key_counts_as_missing() {
        let err = ChartSpec::from_config(&config(json!({
            "chart_type": "heatmap",
            "data": {"matrix": null}
        })))
        .unwrap_err();
        assert!(matches!(err, SchemaError::MissingKey { key: "matrix", .. }));
    }

    #[test]
    fn wrong_value_types_are_invalid() {
        let err = ChartSpec::from_config(&config(json!({
            "chart_type": "bar",
            "data": {"x": ["A"], "y": ["lots"]}
        })))
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidField { .. }));
    }

    #[test]
    fn non_object_data_is_invalid() {
        let err = ChartSpec::from_config(&config(json!({
            "chart_type": "bar",
            "data": [1, 2, 3]
        })))
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidField { key, .. } if key == "data"));
    }

    #[test]
    fn unsupported_type_is_rejected_before_data() {
        let err = ChartSpec::from_config(&config(json!({
            "chart_type": "candlestick",
            "data": {}
        })))
        .unwrap_err();
        assert_eq!(err, SchemaError::UnsupportedChartType("candlestick".into()));
    }

    #[test]
    fn pie_explode_defaults_per_label() {
        let pie = PieData {
            labels: ["A", "B", "C", "D"].iter().map(|s| AxisValue::Text(s.to_string())).collect(),
            values: vec![1.0, 2.0, 3.0, 4.0],
            explode: None,
            colors: None,
        };
        assert_eq!(pie.explode_values(), vec![0.05; 4]);

        let partial = PieData {
            explode: Some(vec![0.2]),
            ..pie
        };
        assert_eq!(partial.explode_values(), vec![0.2, 0.05, 0.05, 0.05]);
    }

    #[test]
    fn scatter_defaults() {
        let scatter = ScatterData {
            x: vec![AxisValue::Number(1.0), AxisValue::Number(2.0), AxisValue::Number(3.0)],
            y: vec![1.0, 2.0, 3.0],
            sizes: None,
            colors: None,
        };
        assert_eq!(scatter.sizes_or_default(), vec![100.0; 3]);
        assert_eq!(scatter.color_values(), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn to_config_keeps_type_and_data() {
        let spec = ChartSpec {
            title: "Assets".into(),
            xlabel: None,
            ylabel: Some("VND bn".into()),
            data: ChartData::Bar(BarData {
                x: vec![AxisValue::Text("2023".into()), AxisValue::Text("2024".into())],
                y: vec![800.0, 850.0],
                colors: None,
            }),
        };
        let wire = spec.to_config();
        assert_eq!(wire.chart_type, "bar");
        assert_eq!(wire.data, json!({"x": ["2023", "2024"], "y": [800.0, 850.0]}));
        assert_eq!(ChartSpec::from_config(&wire).unwrap(), spec);
    }

    #[test]
    fn axis_value_display() {
        assert_eq!(AxisValue::Number(3.0).to_string(), "3");
        assert_eq!(AxisValue::Number(2.5).to_string(), "2.5");
        assert_eq!(AxisValue::Text("Q1".into()).to_string(), "Q1");
    }
}
