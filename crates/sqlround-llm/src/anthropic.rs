//! Anthropic messages backend
//!
//! Reference: https://docs.anthropic.com/en/api/messages

use crate::client::{normalize_base_url, or_fallback, send_json, HttpSettings, LlmClient, LlmError};
use serde::{Deserialize, Serialize};
use sqlround_core::{GenerationParams, Provider};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const API_VERSION: &str = "2023-06-01";

const DEFAULT_TEMPERATURE: f32 = 0.1;
const DEFAULT_MAX_TOKENS: u32 = 8192;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// Request body for `POST /messages`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

/// Anthropic Claude backend
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>, settings: &HttpSettings) -> Result<Self, LlmError> {
        Ok(Self {
            http: settings.build_client()?,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }

    pub fn build_request(prompt: &str, params: &GenerationParams) -> MessagesRequest {
        MessagesRequest {
            model: params
                .model
                .clone()
                .unwrap_or_else(|| Provider::Claude.default_model().to_string()),
            max_tokens: params.max_output_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: params.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            top_p: params.top_p,
            top_k: params.top_k,
        }
    }

    /// Text of the first text block
    pub fn extract_text(response: MessagesResponse) -> String {
        or_fallback(
            response
                .content
                .into_iter()
                .find(|block| block.kind == "text")
                .and_then(|block| block.text),
        )
    }
}

#[async_trait::async_trait]
impl LlmClient for AnthropicClient {
    fn provider_name(&self) -> &'static str {
        "claude"
    }

    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, LlmError> {
        let body = Self::build_request(prompt, params);
        tracing::debug!(model = %body.model, "Sending prompt to Anthropic");

        let request = self
            .http
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body);

        let response: MessagesResponse = send_json(request)
            .await
            .map_err(|e| LlmError::generation_failed(self.provider_name(), e))?;

        Ok(Self::extract_text(response))
    }
}
