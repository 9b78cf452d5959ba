//! OpenAI chat completions backend
//!
//! Reference: https://platform.openai.com/docs/api-reference/chat

use crate::client::{normalize_base_url, or_fallback, send_json, HttpSettings, LlmClient, LlmError};
use serde::{Deserialize, Serialize};
use sqlround_core::{GenerationParams, Provider};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const DEFAULT_TEMPERATURE: f32 = 0.1;
const DEFAULT_MAX_TOKENS: u32 = 8192;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Request body for `POST /chat/completions`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// OpenAI backend
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, settings: &HttpSettings) -> Result<Self, LlmError> {
        Ok(Self {
            http: settings.build_client()?,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point at a compatible endpoint (proxy, Azure gateway, local server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }

    pub fn build_request(prompt: &str, params: &GenerationParams) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: params
                .model
                .clone()
                .unwrap_or_else(|| Provider::OpenAi.default_model().to_string()),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: params.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: params.max_output_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            top_p: params.top_p,
            frequency_penalty: params.frequency_penalty,
        }
    }

    /// Text of the first choice
    pub fn extract_text(response: ChatCompletionResponse) -> String {
        or_fallback(
            response
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content),
        )
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider_name(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, LlmError> {
        let body = Self::build_request(prompt, params);
        tracing::debug!(model = %body.model, "Sending prompt to OpenAI");

        let request = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body);

        let response: ChatCompletionResponse = send_json(request)
            .await
            .map_err(|e| LlmError::generation_failed(self.provider_name(), e))?;

        Ok(Self::extract_text(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::NO_RESPONSE_FALLBACK;

    #[test]
    fn request_uses_defaults() {
        let request = OpenAiClient::build_request("Explain this", &GenerationParams::default());
        assert_eq!(request.model, "gpt-4");
        assert_eq!(request.temperature, 0.1);
        assert_eq!(request.max_tokens, 8192);
        assert_eq!(request.messages[0].role, "user");
        assert_eq!(request.messages[0].content, "Explain this");

        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("top_p").is_none());
    }

    #[test]
    fn request_maps_params() {
        let params = GenerationParams {
            model: Some("gpt-4o".to_string()),
            temperature: Some(0.7),
            max_output_tokens: Some(256),
            top_p: Some(0.9),
            ..GenerationParams::default()
        };
        let json = serde_json::to_value(OpenAiClient::build_request("p", &params)).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["max_tokens"], 256);
        assert!(json.get("top_p").is_some());
    }

    #[test]
    fn extracts_first_choice() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"SELECT 1;"}},{"message":{"content":"other"}}]}"#,
        )
        .unwrap();
        assert_eq!(OpenAiClient::extract_text(response), "SELECT 1;");
    }

    #[test]
    fn null_content_becomes_fallback() {
        let response: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#).unwrap();
        assert_eq!(OpenAiClient::extract_text(response), NO_RESPONSE_FALLBACK);

        let response: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(OpenAiClient::extract_text(response), NO_RESPONSE_FALLBACK);
    }
}
