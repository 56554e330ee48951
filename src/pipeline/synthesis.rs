use std::time::Duration;

use super::llm::{CompletionRequest, SharedLlmClient};
use super::normalize::parse_json;
use super::prompt::{build_description_prompt, build_synthesis_prompt, SYNTHESIS_SYSTEM_PROMPT};
use super::types::FinancialDataset;
use super::{excerpt, SpecGenerationError};
use crate::chart::{ChartConfig, ChartSpec};
use crate::config::{SYNTHESIS_MAX_TOKENS, SYNTHESIS_TEMPERATURE};

/// Turns a dataset plus a natural-language request into one validated chart spec.
pub struct ChartSpecStage {
    llm: SharedLlmClient,
    timeout: Option<Duration>,
}

impl ChartSpecStage {
    pub fn new(llm: SharedLlmClient) -> Self {
        Self { llm, timeout: None }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn synthesize(
        &self,
        dataset: &FinancialDataset,
        request: &str,
    ) -> Result<ChartSpec, SpecGenerationError> {
        self.synthesize_metered(dataset, request).0
    }

    /// Like [`synthesize`](Self::synthesize), also returning tokens spent.
    pub fn synthesize_metered(
        &self,
        dataset: &FinancialDataset,
        request: &str,
    ) -> (Result<ChartSpec, SpecGenerationError>, u64) {
        let _span = tracing::info_span!("synthesize", request = %request).entered();
        self.run(&build_synthesis_prompt(dataset, request))
    }

    /// Build a spec straight from a description, without an extracted dataset.
    pub fn synthesize_from_description(
        &self,
        description: &str,
        report_context: Option<&str>,
    ) -> (Result<ChartSpec, SpecGenerationError>, u64) {
        let _span = tracing::info_span!("synthesize_from_description").entered();
        self.run(&build_description_prompt(description, report_context))
    }

    fn run(&self, prompt: &str) -> (Result<ChartSpec, SpecGenerationError>, u64) {
        let request = CompletionRequest::new(prompt)
            .system(SYNTHESIS_SYSTEM_PROMPT)
            .temperature(SYNTHESIS_TEMPERATURE)
            .max_tokens(SYNTHESIS_MAX_TOKENS)
            .timeout(self.timeout);

        match self.llm.complete(&request) {
            Ok(completion) => (parse_spec_response(&completion.text), completion.tokens_used),
            Err(e) => (Err(e.into()), 0),
        }
    }
}

/// Parse and validate a raw spec completion.
pub fn parse_spec_response(raw: &str) -> Result<ChartSpec, SpecGenerationError> {
    let config: ChartConfig = parse_json(raw).map_err(|e| {
        tracing::warn!(error = %e, response = %excerpt(raw, 200), "Spec response is not valid JSON");
        SpecGenerationError::JsonParsing(e.to_string())
    })?;
    let spec = ChartSpec::from_config(&config)?;
    tracing::debug!(chart_type = %spec.kind(), title = %spec.title, "Spec validated");
    Ok(spec)
}
