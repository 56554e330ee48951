use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::chart::{AxisValue, ChartConfig, ChartKind, ChartSpec};

/// One named numeric series pulled out of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Period or category labels, one per value.
    #[serde(alias = "labels", deserialize_with = "labels_as_strings")]
    pub periods: Vec<String>,
    pub values: Vec<f64>,
    #[serde(default)]
    pub unit: String,
}

impl Series {
    pub fn is_consistent(&self) -> bool {
        self.periods.len() == self.values.len()
    }
}

/// Models write years and quarters as numbers as often as strings.
fn labels_as_strings<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let raw = Vec::<AxisValue>::deserialize(deserializer)?;
    Ok(raw.iter().map(ToString::to_string).collect())
}

/// Series name ("revenue", "profit", ...) to series.
pub type FinancialDataset = BTreeMap<String, Series>;

/// A model-proposed chart, before it becomes a full spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRecommendation {
    pub title: String,
    #[serde(rename = "type")]
    pub chart_type: ChartKind,
    pub data_source: String,
    /// 1 is most important.
    pub priority: u32,
    pub description: String,
}

impl ChartRecommendation {
    /// Request handed to spec synthesis for this recommendation.
    pub fn synthesis_request(&self) -> String {
        format!("Create a {} chart: {}", self.chart_type, self.title)
    }
}

/// Result of the extraction stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionOutcome {
    pub dataset: FinancialDataset,
    /// In the order the model listed them.
    pub recommendations: Vec<ChartRecommendation>,
    pub tokens_used: u64,
}

/// A synthesized spec plus the metadata of the recommendation it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedChart {
    pub spec: ChartSpec,
    pub priority: Option<u32>,
    pub description: Option<String>,
}

impl SynthesizedChart {
    pub fn to_config(&self) -> ChartConfig {
        ChartConfig {
            priority: self.priority,
            description: self.description.clone(),
            ..self.spec.to_config()
        }
    }
}

/// A chart that could not be produced, attributed to its item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartFailure {
    /// Position in the batch or recommendation list (0-based).
    pub index: usize,
    pub title: String,
    pub reason: String,
}

/// Aggregate result of one orchestrator run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRun {
    pub run_id: Uuid,
    pub dataset: FinancialDataset,
    pub recommendations: Vec<ChartRecommendation>,
    pub charts: Vec<SynthesizedChart>,
    pub failures: Vec<ChartFailure>,
    /// Set when extraction failed and the chart phase was skipped.
    pub extraction_error: Option<String>,
    pub tokens_used: u64,
}

impl PipelineRun {
    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    pub fn chart_specs(&self) -> Vec<ChartSpec> {
        self.charts.iter().map(|c| c.spec.clone()).collect()
    }
}
