//! Text-completion clients.
//!
//! The pipeline only depends on [`LlmClient`]: a prompt plus an optional system
//! instruction in, completion text plus token usage out. Retries and backoff are
//! the caller's concern.

pub mod mock;
pub mod ollama;
pub mod openai;

pub use mock::*;
pub use ollama::*;
pub use openai::*;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::{LlmProvider, LlmSettings};

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Language model service is not reachable at {0}")]
    Connection(String),

    #[error("Language model service returned error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Completion contained no choices")]
    EmptyCompletion,

    #[error("Scripted client has no response left for this call")]
    ScriptExhausted,
}

/// One completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub prompt: &'a str,
    pub system: Option<&'a str>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Overrides the client's default timeout for this call only.
    pub timeout: Option<Duration>,
}

impl<'a> CompletionRequest<'a> {
    pub fn new(prompt: &'a str) -> Self {
        Self {
            prompt,
            system: None,
            temperature: 0.7,
            max_tokens: 2000,
            timeout: None,
        }
    }

    pub fn system(mut self, system: &'a str) -> Self {
        self.system = Some(system);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Completion text and the tokens the service billed for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub tokens_used: u64,
}

/// Opaque text-completion service.
pub trait LlmClient {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<Completion, LlmError>;
}

/// Client handle shared by every stage of one orchestrator.
pub type SharedLlmClient = Arc<dyn LlmClient + Send + Sync>;

/// Build the configured client.
pub fn client_from_settings(
    settings: &LlmSettings,
) -> Result<Box<dyn LlmClient + Send + Sync>, LlmError> {
    match settings.provider {
        LlmProvider::OpenAi => Ok(Box::new(OpenAiClient::new(
            &settings.base_url,
            settings.api_key.clone(),
            &settings.model,
            settings.timeout,
        )?)),
        LlmProvider::Ollama => Ok(Box::new(OllamaClient::new(
            &settings.base_url,
            &settings.model,
            settings.timeout,
        )?)),
    }
}

/// Map a reqwest transport error onto the client error taxonomy.
pub(crate) fn map_transport_error(e: reqwest::Error, base_url: &str, timeout: Duration) -> LlmError {
    if e.is_connect() {
        LlmError::Connection(base_url.to_string())
    } else if e.is_timeout() {
        LlmError::Timeout(timeout)
    } else {
        LlmError::HttpClient(e.to_string())
    }
}
