use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::llm::{CompletionRequest, SharedLlmClient};
use super::prompt::{build_analysis_prompt, ANALYSIS_SYSTEM_PROMPT};
use super::AnalysisError;
use crate::config::{ANALYSIS_MAX_TOKENS, ANALYSIS_TEMPERATURE};

/// Shape of the narrative analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisFormat {
    Summary,
    #[default]
    Detailed,
    Insights,
    Json,
}

impl AnalysisFormat {
    fn instruction(&self) -> &'static str {
        match self {
            Self::Summary => {
                "Write a short executive summary: key points, headline figures, trends and recommendations."
            }
            Self::Detailed => {
                "Analyze the financial report in full detail: categories, data, qualitative assessment, \
                 correlations and conclusions."
            }
            Self::Insights => {
                "Surface the important insights: patterns, anomalies, likely developments and \
                 actionable strategic recommendations."
            }
            Self::Json => {
                "Extract the key information as JSON with the fields report_type, period, \
                 key_metrics, summary, trends and recommendations."
            }
        }
    }
}

impl fmt::Display for AnalysisFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Summary => write!(f, "summary"),
            Self::Detailed => write!(f, "detailed"),
            Self::Insights => write!(f, "insights"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl FromStr for AnalysisFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "summary" => Ok(Self::Summary),
            "detailed" => Ok(Self::Detailed),
            "insights" => Ok(Self::Insights),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown analysis format: {other}")),
        }
    }
}

/// Narrative analysis of a report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportAnalysis {
    pub format: AnalysisFormat,
    pub text: String,
    pub tokens_used: u64,
}

/// Writes a narrative analysis of report text; independent of the chart phase.
pub struct ReportAnalyzer {
    llm: SharedLlmClient,
    timeout: Option<Duration>,
}

impl ReportAnalyzer {
    pub fn new(llm: SharedLlmClient) -> Self {
        Self { llm, timeout: None }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn analyze(
        &self,
        report_text: &str,
        format: AnalysisFormat,
    ) -> Result<ReportAnalysis, AnalysisError> {
        let _span = tracing::info_span!("analyze", %format).entered();

        if report_text.trim().is_empty() {
            return Err(AnalysisError::InputEmpty);
        }

        let prompt = build_analysis_prompt(format.instruction(), report_text);
        let request = CompletionRequest::new(&prompt)
            .system(ANALYSIS_SYSTEM_PROMPT)
            .temperature(ANALYSIS_TEMPERATURE)
            .max_tokens(ANALYSIS_MAX_TOKENS)
            .timeout(self.timeout);
        let completion = self.llm.complete(&request)?;

        tracing::info!(tokens = completion.tokens_used, "Analysis complete");
        Ok(ReportAnalysis {
            format,
            text: completion.text,
            tokens_used: completion.tokens_used,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::pipeline::llm::{LlmError, MockLlmClient, ScriptedLlmClient};

    #[test]
    fn format_parses_and_defaults_to_detailed() {
        assert_eq!("Insights".parse::<AnalysisFormat>().unwrap(), AnalysisFormat::Insights);
        assert!("qa".parse::<AnalysisFormat>().is_err());
        assert_eq!(AnalysisFormat::default(), AnalysisFormat::Detailed);
        assert_eq!(AnalysisFormat::Json.to_string(), "json");
    }

    #[test]
    fn analysis_returns_model_text() {
        let analyzer = ReportAnalyzer::new(Arc::new(MockLlmClient::new("Revenue grew.").with_tokens(9)));
        let analysis = analyzer.analyze("report", AnalysisFormat::Summary).unwrap();
        assert_eq!(analysis.text, "Revenue grew.");
        assert_eq!(analysis.tokens_used, 9);
        assert_eq!(analysis.format, AnalysisFormat::Summary);
    }

    #[test]
    fn prompt_uses_format_instruction() {
        let scripted = Arc::new(ScriptedLlmClient::new().then("ok", 1));
        ReportAnalyzer::new(scripted.clone())
            .analyze("Q1: 100", AnalysisFormat::Json)
            .unwrap();
        let prompt = &scripted.prompts()[0];
        assert!(prompt.starts_with("Extract the key information as JSON"));
        assert!(prompt.ends_with("REPORT:\nQ1: 100"));
    }

    #[test]
    fn empty_input_and_llm_failures_are_errors() {
        let analyzer = ReportAnalyzer::new(Arc::new(
            ScriptedLlmClient::new().then_fail(LlmError::EmptyCompletion),
        ));
        assert!(matches!(
            analyzer.analyze(" ", AnalysisFormat::Summary),
            Err(AnalysisError::InputEmpty)
        ));
        assert!(matches!(
            analyzer.analyze("text", AnalysisFormat::Summary),
            Err(AnalysisError::Llm(LlmError::EmptyCompletion))
        ));
    }
}
