use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{map_transport_error, Completion, CompletionRequest, LlmClient, LlmError};

/// Ollama HTTP client for local LLM inference.
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl OllamaClient {
    /// Create a new OllamaClient pointing at an Ollama instance.
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout,
        })
    }

    /// Names of the models the instance has pulled.
    pub fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| map_transport_error(e, &self.base_url, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaTagsResponse = response
            .json()
            .map_err(|e| LlmError::ResponseParsing(e.to_string()))?;

        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
    #[serde(default)]
    prompt_eval_count: u64,
    #[serde(default)]
    eval_count: u64,
}

/// Response body from Ollama /api/tags
#[derive(Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

impl LlmClient for OllamaClient {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<Completion, LlmError> {
        let url = format!("{}/api/generate", self.base_url);
        let timeout = request.timeout.unwrap_or(self.timeout);
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt: request.prompt,
            system: request.system,
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .timeout(timeout)
            .send()
            .map_err(|e| map_transport_error(e, &self.base_url, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| LlmError::ResponseParsing(e.to_string()))?;

        Ok(Completion {
            text: parsed.response,
            tokens_used: parsed.prompt_eval_count + parsed.eval_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ollama_client_constructor() {
        let client =
            OllamaClient::new("http://localhost:11434", "llama3", Duration::from_secs(120))
                .unwrap();
        assert_eq!(client.base_url, "http://localhost:11434");
        assert_eq!(client.model, "llama3");
        assert_eq!(client.timeout, Duration::from_secs(120));
    }

    #[test]
    fn ollama_client_trims_trailing_slash() {
        let client =
            OllamaClient::new("http://localhost:11434/", "llama3", Duration::from_secs(60))
                .unwrap();
        assert_eq!(client.base_url, "http://localhost:11434");
    }

    #[test]
    fn generate_request_omits_missing_system() {
        let body = OllamaGenerateRequest {
            model: "llama3",
            prompt: "hi",
            system: None,
            stream: false,
            options: OllamaOptions {
                temperature: 0.2,
                num_predict: 10,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("system").is_none());
        assert_eq!(json["options"]["num_predict"], 10);
    }

    #[test]
    fn token_counts_default_to_zero() {
        let parsed: OllamaGenerateResponse =
            serde_json::from_str(r#"{"response":"ok"}"#).unwrap();
        assert_eq!(parsed.prompt_eval_count + parsed.eval_count, 0);
    }
}
