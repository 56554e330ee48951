//! Report-to-chart pipeline: extraction, spec synthesis, orchestration and
//! the narrative analysis that runs alongside it.

pub mod analysis;
pub mod extraction;
pub mod llm;
pub mod normalize;
pub mod orchestrator;
pub mod prompt;
pub mod synthesis;
pub mod types;

pub use analysis::*;
pub use extraction::*;
pub use orchestrator::*;
pub use synthesis::*;
pub use types::*;

use thiserror::Error;

use crate::chart::SchemaError;
use llm::LlmError;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Language model call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Report text is empty")]
    InputEmpty,

    #[error("Extraction response is not valid JSON: {0}")]
    JsonParsing(String),

    #[error("No usable data series in extraction response")]
    EmptyDataset,
}

#[derive(Error, Debug)]
pub enum SpecGenerationError {
    #[error("Language model call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Chart spec response is not valid JSON: {0}")]
    JsonParsing(String),

    #[error("Chart spec failed validation: {0}")]
    Schema(#[from] SchemaError),
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Language model call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Report text is empty")]
    InputEmpty,
}

/// Shorten model output for log and error messages.
pub(crate) fn excerpt(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
