use std::collections::VecDeque;
use std::sync::Mutex;

use super::{Completion, CompletionRequest, LlmClient, LlmError};

/// Mock LLM client for testing — returns a configurable response.
pub struct MockLlmClient {
    response: String,
    tokens_per_call: u64,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            tokens_per_call: 0,
        }
    }

    pub fn with_tokens(mut self, tokens: u64) -> Self {
        self.tokens_per_call = tokens;
        self
    }
}

impl LlmClient for MockLlmClient {
    fn complete(&self, _request: &CompletionRequest<'_>) -> Result<Completion, LlmError> {
        Ok(Completion {
            text: self.response.clone(),
            tokens_used: self.tokens_per_call,
        })
    }
}

/// Mock client that answers calls in order from a queue and records every prompt.
pub struct ScriptedLlmClient {
    responses: Mutex<VecDeque<Result<Completion, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlmClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful completion.
    pub fn then(self, text: &str, tokens_used: u64) -> Self {
        self.push(Ok(Completion {
            text: text.to_string(),
            tokens_used,
        }));
        self
    }

    /// Queue a failed call.
    pub fn then_fail(self, error: LlmError) -> Self {
        self.push(Err(error));
        self
    }

    fn push(&self, item: Result<Completion, LlmError>) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(item);
        }
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

impl Default for ScriptedLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmClient for ScriptedLlmClient {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<Completion, LlmError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.prompt.to_string());
        }
        self.responses
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .unwrap_or(Err(LlmError::ScriptExhausted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_client_returns_configured_response() {
        let client = MockLlmClient::new("test response").with_tokens(7);
        let result = client.complete(&CompletionRequest::new("prompt")).unwrap();
        assert_eq!(result.text, "test response");
        assert_eq!(result.tokens_used, 7);
    }

    #[test]
    fn scripted_client_answers_in_order() {
        let client = ScriptedLlmClient::new()
            .then("first", 1)
            .then_fail(LlmError::EmptyCompletion)
            .then("third", 3);

        assert_eq!(client.complete(&CompletionRequest::new("a")).unwrap().text, "first");
        assert!(client.complete(&CompletionRequest::new("b")).is_err());
        assert_eq!(client.complete(&CompletionRequest::new("c")).unwrap().text, "third");
        assert!(matches!(
            client.complete(&CompletionRequest::new("d")),
            Err(LlmError::ScriptExhausted)
        ));
        assert_eq!(client.prompts(), vec!["a", "b", "c", "d"]);
        assert_eq!(client.call_count(), 4);
    }
}
