//! Mock LLM client for testing
//!
//! Returns scripted responses without any network access. Replies are
//! consumed in order; once the script runs out the default response is
//! returned. Every prompt is recorded so tests can assert on what the
//! pipeline actually sent.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let client = MockClient::new()
//!     .with_response("explanation X")
//!     .with_response("SELECT 1;");
//!
//! let text = client.generate("prompt", &GenerationParams::default()).await?;
//! assert_eq!(client.prompts().len(), 1);
//! ```
//!
//! ## Simulating Failures
//!
//! ```rust,ignore
//! let client = MockClient::new().with_failure("connection reset");
//! assert!(client.generate("prompt", &params).await.is_err());
//! ```

use crate::client::{or_fallback, LlmClient, LlmError};
use sqlround_core::GenerationParams;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Failure(String),
}

/// Scripted client
pub struct MockClient {
    /// Pending replies, consumed front to back
    script: Arc<Mutex<VecDeque<Reply>>>,

    /// Prompts received, in call order
    prompts: Arc<Mutex<Vec<String>>>,

    /// Parameters received, in call order
    params: Arc<Mutex<Vec<GenerationParams>>>,

    /// Reply once the script is exhausted
    default_response: String,
}

impl MockClient {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            params: Arc::new(Mutex::new(Vec::new())),
            default_response: "Generated response".to_string(),
        }
    }

    /// Queue a successful reply
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.push(Reply::Text(text.into()));
        self
    }

    /// Queue a backend failure
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.push(Reply::Failure(message.into()));
        self
    }

    /// Reply used when the script is empty
    pub fn with_default_response(mut self, text: impl Into<String>) -> Self {
        self.default_response = text.into();
        self
    }

    /// Queue a reply on an existing (possibly shared) client
    pub fn push_response(&self, text: impl Into<String>) {
        self.push(Reply::Text(text.into()));
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Parameters received so far
    pub fn received_params(&self) -> Vec<GenerationParams> {
        self.params.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }

    fn push(&self, reply: Reply) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(reply);
        }
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MockClient {
    fn clone(&self) -> Self {
        Self {
            script: Arc::clone(&self.script),
            prompts: Arc::clone(&self.prompts),
            params: Arc::clone(&self.params),
            default_response: self.default_response.clone(),
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for MockClient {
    fn provider_name(&self) -> &'static str {
        "mock"
    }

    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, LlmError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if let Ok(mut received) = self.params.lock() {
            received.push(params.clone());
        }

        let reply = self.script.lock().ok().and_then(|mut script| script.pop_front());

        match reply {
            Some(Reply::Text(text)) => Ok(or_fallback(Some(text))),
            Some(Reply::Failure(message)) => Err(LlmError::generation_failed(self.provider_name(), message)),
            None => Ok(self.default_response.clone()),
        }
    }
}
