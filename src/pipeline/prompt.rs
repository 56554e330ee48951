//! System instructions and prompt builders for every model call the pipeline makes.

use super::types::FinancialDataset;

pub const EXTRACTION_SYSTEM_PROMPT: &str =
    "You are a financial report analyst and data visualization expert. Reply with valid JSON only.";

pub const SYNTHESIS_SYSTEM_PROMPT: &str =
    "You are a data visualization expert. Reply with valid JSON only, no extra text.";

pub const ANALYSIS_SYSTEM_PROMPT: &str =
    "You are a financial report analyst. Answer in the language of the report.";

/// Build the data-extraction prompt for a report.
pub fn build_extraction_prompt(report_text: &str) -> String {
    format!(
        r#"TASK: Extract ALL numeric data from the financial report below and propose the charts that matter most.

RULES:
1. Find every numeric table and financial metric.
2. Copy numbers EXACTLY and keep their original units (million, billion, tỷ, %, ...).
3. Group values by category: revenue, profit, assets, liabilities, ratios, ...
4. Propose 3-5 charts, priority 1 being the most important.

OUTPUT FORMAT (JSON):
{{
  "extracted_data": {{
    "revenue": {{
      "periods": ["Q1 2024", "Q2 2024"],
      "values": [100, 120],
      "unit": "tỷ VNĐ"
    }}
  }},
  "recommended_charts": [
    {{
      "title": "Chart title",
      "type": "line|bar|pie|area|scatter|heatmap",
      "data_source": "revenue",
      "priority": 1,
      "description": "Why this chart is useful"
    }}
  ]
}}

<report>
{report_text}
</report>"#
    )
}

/// Build the spec-synthesis prompt for a dataset and a chart request.
pub fn build_synthesis_prompt(dataset: &FinancialDataset, request: &str) -> String {
    let data = serde_json::to_string_pretty(dataset).unwrap_or_else(|_| "{}".to_string());
    format!(
        r#"TASK: Produce a chart configuration that can be drawn immediately.

EXTRACTED DATA:
{data}

CHART REQUEST: {request}

{SPEC_FORMAT}

Numbers MUST come exactly from the extracted data."#
    )
}

/// Build a spec prompt from a free-text description, with optional report context.
pub fn build_description_prompt(description: &str, report_context: Option<&str>) -> String {
    let context = report_context
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("none");
    format!(
        r#"TASK: Read the chart request below, derive its data and pick the most suitable chart type.

REQUEST: {description}

CONTEXT: {context}

{SPEC_FORMAT}"#
    )
}

const SPEC_FORMAT: &str = r#"OUTPUT FORMAT (JSON only, no extra text):
{
  "chart_type": "line|bar|pie|scatter|heatmap|area",
  "title": "Specific chart title",
  "xlabel": "X axis label (optional)",
  "ylabel": "Y axis label (optional)",
  "data": {
    // line/bar/area: {"x": [...], "y": [...], "label": "..."}
    // pie: {"labels": [...], "values": [...]}
    // scatter: {"x": [...], "y": [...], "sizes": [...]}
    // heatmap: {"matrix": [[...]], "xlabels": [...], "ylabels": [...]}
  }
}"#;

/// Build a narrative analysis prompt.
pub fn build_analysis_prompt(instruction: &str, report_text: &str) -> String {
    format!("{instruction}\n\nREPORT:\n{report_text}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::Series;

    #[test]
    fn extraction_prompt_embeds_report() {
        let prompt = build_extraction_prompt("Q1: 100 tỷ");
        assert!(prompt.contains("<report>\nQ1: 100 tỷ\n</report>"));
        assert!(prompt.contains("\"recommended_charts\""));
    }

    #[test]
    fn synthesis_prompt_embeds_dataset_and_request() {
        let mut dataset = FinancialDataset::new();
        dataset.insert(
            "revenue".into(),
            Series {
                periods: vec!["Q1".into()],
                values: vec![100.0],
                unit: "tỷ".into(),
            },
        );
        let prompt = build_synthesis_prompt(&dataset, "Create a bar chart: Revenue");
        assert!(prompt.contains("\"revenue\""));
        assert!(prompt.contains("CHART REQUEST: Create a bar chart: Revenue"));
        assert!(prompt.contains("\"chart_type\""));
    }

    #[test]
    fn description_prompt_marks_missing_context() {
        let prompt = build_description_prompt("pie of market share", Some("  "));
        assert!(prompt.contains("CONTEXT: none"));
        let prompt = build_description_prompt("pie of market share", Some("VTC 35%"));
        assert!(prompt.contains("CONTEXT: VTC 35%"));
    }
}
