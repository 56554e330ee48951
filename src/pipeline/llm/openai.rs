use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{map_transport_error, Completion, CompletionRequest, LlmClient, LlmError};

/// Blocking client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
            client,
            timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    total_tokens: u64,
}

fn build_messages<'a>(request: &CompletionRequest<'a>) -> Vec<ChatMessage<'a>> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = request.system {
        messages.push(ChatMessage {
            role: "system",
            content: system,
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: request.prompt,
    });
    messages
}

impl LlmClient for OpenAiClient {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<Completion, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let timeout = request.timeout.unwrap_or(self.timeout);
        let body = ChatRequest {
            model: &self.model,
            messages: build_messages(request),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let mut builder = self.client.post(&url).json(&body).timeout(timeout);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
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

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| LlmError::ResponseParsing(e.to_string()))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(LlmError::EmptyCompletion)?;

        Ok(Completion {
            text,
            tokens_used: parsed.usage.map(|u| u.total_tokens).unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_trims_trailing_slash() {
        let client = OpenAiClient::new(
            "https://api.openai.com/v1/",
            None,
            "gpt-4o",
            Duration::from_secs(60),
        )
        .unwrap();
        assert_eq!(client.base_url, "https://api.openai.com/v1");
        assert_eq!(client.model(), "gpt-4o");
        assert_eq!(client.timeout, Duration::from_secs(60));
    }

    #[test]
    fn system_message_comes_first() {
        let request = CompletionRequest::new("user text").system("be precise");
        let messages = build_messages(&request);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "user text");
    }

    #[test]
    fn no_system_message_when_absent() {
        let request = CompletionRequest::new("user text");
        let messages = build_messages(&request);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
    }

    #[test]
    fn response_without_usage_parses() {
        let raw = r#"{"choices":[{"message":{"content":"{}"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.usage.is_none());
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("{}"));
    }
}
