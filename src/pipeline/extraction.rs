use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use super::llm::{CompletionRequest, SharedLlmClient};
use super::normalize::parse_json;
use super::prompt::{build_extraction_prompt, EXTRACTION_SYSTEM_PROMPT};
use super::types::{ChartRecommendation, ExtractionOutcome, FinancialDataset, Series};
use super::{excerpt, ExtractionError};
use crate::chart::ChartKind;
use crate::config::{EXTRACTION_MAX_TOKENS, EXTRACTION_TEMPERATURE};

/// Pulls numeric series and chart recommendations out of report text.
pub struct ExtractionStage {
    llm: SharedLlmClient,
    timeout: Option<Duration>,
}

impl ExtractionStage {
    pub fn new(llm: SharedLlmClient) -> Self {
        Self { llm, timeout: None }
    }

    /// Bound each model call; `None` keeps the client default.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn extract(&self, report_text: &str) -> Result<ExtractionOutcome, ExtractionError> {
        self.extract_metered(report_text).0
    }

    /// Like [`extract`](Self::extract), also returning the tokens spent
    /// whether or not the response was usable.
    pub fn extract_metered(
        &self,
        report_text: &str,
    ) -> (Result<ExtractionOutcome, ExtractionError>, u64) {
        let _span = tracing::info_span!("extract", report_chars = report_text.len()).entered();

        if report_text.trim().is_empty() {
            return (Err(ExtractionError::InputEmpty), 0);
        }

        let prompt = build_extraction_prompt(report_text);
        let request = CompletionRequest::new(&prompt)
            .system(EXTRACTION_SYSTEM_PROMPT)
            .temperature(EXTRACTION_TEMPERATURE)
            .max_tokens(EXTRACTION_MAX_TOKENS)
            .timeout(self.timeout);

        let completion = match self.llm.complete(&request) {
            Ok(c) => c,
            Err(e) => return (Err(e.into()), 0),
        };
        let tokens = completion.tokens_used;

        let result = parse_extraction_response(&completion.text).map(|(dataset, recommendations)| {
            tracing::info!(
                series = dataset.len(),
                recommendations = recommendations.len(),
                tokens,
                "Extraction complete"
            );
            ExtractionOutcome {
                dataset,
                recommendations,
                tokens_used: tokens,
            }
        });
        (result, tokens)
    }
}

#[derive(Deserialize)]
struct RawRecommendation {
    #[serde(default)]
    title: String,
    #[serde(rename = "type", alias = "chart_type", default)]
    chart_type: String,
    #[serde(default)]
    data_source: String,
    #[serde(default)]
    priority: Option<u32>,
    #[serde(default)]
    description: Option<String>,
}

/// Parse a raw extraction completion. Malformed series and recommendations
/// are dropped individually; only an unusable response as a whole is an error.
pub fn parse_extraction_response(
    raw: &str,
) -> Result<(FinancialDataset, Vec<ChartRecommendation>), ExtractionError> {
    let root: Value = parse_json(raw).map_err(|e| {
        tracing::warn!(error = %e, response = %excerpt(raw, 200), "Extraction response is not JSON");
        ExtractionError::JsonParsing(e.to_string())
    })?;
    if !root.is_object() {
        return Err(ExtractionError::JsonParsing("expected a JSON object".into()));
    }

    let dataset = parse_dataset(root.get("extracted_data"));
    if dataset.is_empty() {
        return Err(ExtractionError::EmptyDataset);
    }

    let recommendations = parse_recommendations(
        root.get("recommended_charts")
            .and_then(Value::as_array)
            .map(Vec::as_slice),
    );
    Ok((dataset, recommendations))
}

fn parse_dataset(value: Option<&Value>) -> FinancialDataset {
    let Some(entries) = value.and_then(Value::as_object) else {
        return FinancialDataset::new();
    };

    entries
        .iter()
        .filter_map(|(name, raw)| match serde_json::from_value::<Series>(raw.clone()) {
            Ok(series) if series.is_consistent() && !series.values.is_empty() => {
                Some((name.clone(), series))
            }
            Ok(series) => {
                tracing::warn!(
                    series = %name,
                    labels = series.periods.len(),
                    values = series.values.len(),
                    "Dropping series with mismatched or empty labels and values"
                );
                None
            }
            Err(e) => {
                tracing::warn!(series = %name, error = %e, "Dropping malformed series");
                None
            }
        })
        .collect()
}

fn parse_recommendations(items: Option<&[Value]>) -> Vec<ChartRecommendation> {
    let Some(items) = items else {
        return vec![];
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let raw: RawRecommendation = match serde_json::from_value(item.clone()) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(index = i, error = %e, "Dropping malformed recommendation");
                    return None;
                }
            };
            let chart_type = match raw.chart_type.parse::<ChartKind>() {
                Ok(kind) => kind,
                Err(e) => {
                    tracing::warn!(title = %raw.title, error = %e, "Dropping recommendation");
                    return None;
                }
            };
            Some(ChartRecommendation {
                title: raw.title,
                chart_type,
                data_source: raw.data_source,
                priority: raw.priority.unwrap_or(i as u32 + 1),
                description: raw.description.unwrap_or_default(),
            })
        })
        .collect()
}
