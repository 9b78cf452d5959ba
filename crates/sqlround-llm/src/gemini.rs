//! Google Gemini backend
//!
//! Reference: https://ai.google.dev/api/generate-content

use crate::client::{normalize_base_url, or_fallback, send_json, HttpSettings, LlmClient, LlmError};
use serde::{Deserialize, Serialize};
use sqlround_core::{GenerationParams, Provider};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const DEFAULT_TEMPERATURE: f32 = 0.1;
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

/// Request body for `POST /models/{model}:generateContent`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

/// Gemini backend
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
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

    /// Model name and request body
    pub fn build_request(prompt: &str, params: &GenerationParams) -> (String, GenerateContentRequest) {
        let model = params
            .model
            .clone()
            .unwrap_or_else(|| Provider::Gemini.default_model().to_string());

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: params.temperature.unwrap_or(DEFAULT_TEMPERATURE),
                max_output_tokens: params.max_output_tokens.unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
                top_p: params.top_p,
                top_k: params.top_k,
            },
        };

        (model, request)
    }

    /// Concatenated text parts of the first candidate
    pub fn extract_text(response: GenerateContentResponse) -> String {
        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            });

        or_fallback(text)
    }
}

#[async_trait::async_trait]
impl LlmClient for GeminiClient {
    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, LlmError> {
        let (model, body) = Self::build_request(prompt, params);
        tracing::debug!(model = %model, "Sending prompt to Gemini");

        let request = self
            .http
            .post(format!("{}/models/{}:generateContent", self.base_url, model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body);

        let response: GenerateContentResponse = send_json(request)
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
    fn request_uses_camel_case_config() {
        let params = GenerationParams {
            temperature: Some(0.3),
            max_output_tokens: Some(1024),
            ..GenerationParams::default()
        };
        let (model, request) = GeminiClient::build_request("Explain this", &params);
        assert_eq!(model, "gemini-2.0-flash");

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 1024);
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Explain this");
        assert!(json["generationConfig"].get("topK").is_none());
    }

    #[test]
    fn joins_text_parts_of_first_candidate() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"SELECT id "},{"text":"FROM users;"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(GeminiClient::extract_text(response), "SELECT id FROM users;");
    }

    #[test]
    fn blocked_or_empty_response_becomes_fallback() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert_eq!(GeminiClient::extract_text(response), NO_RESPONSE_FALLBACK);

        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[]}}]}"#).unwrap();
        assert_eq!(GeminiClient::extract_text(response), NO_RESPONSE_FALLBACK);
    }
}
