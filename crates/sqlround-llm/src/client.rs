//! LLM client trait and shared error type

use serde::de::DeserializeOwned;
use sqlround_core::{GenerationParams, OptimizerConfig, Provider};
use std::time::Duration;

/// Returned in place of an empty completion
pub const NO_RESPONSE_FALLBACK: &str = "No response from the AI model";

/// Boxed cause carried by [`LlmError::GenerationFailed`]
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by the client layer
///
/// Backend failures of any kind (network, auth, rate limit, bad payload)
/// arrive as `GenerationFailed` so callers handle a single shape.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API key required for {provider}. Set it via parameter, config, or the {env_var} environment variable")]
    MissingCredential {
        provider: Provider,
        env_var: &'static str,
    },

    #[error(transparent)]
    UnsupportedProvider(#[from] sqlround_core::UnsupportedProvider),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Error generating {provider} response: {source}")]
    GenerationFailed {
        provider: &'static str,
        #[source]
        source: BoxError,
    },
}

impl LlmError {
    /// Wrap and log a backend failure
    pub fn generation_failed(provider: &'static str, source: impl Into<BoxError>) -> Self {
        let source = source.into();
        tracing::error!(provider, error = %source, "LLM generation failed");
        Self::GenerationFailed { provider, source }
    }
}

/// Non-success HTTP status returned by a backend
#[derive(Debug, thiserror::Error)]
#[error("HTTP {status}: {body}")]
pub struct HttpStatusError {
    pub status: u16,
    pub body: String,
}

/// Generative-text backend
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider identifier (e.g. "openai")
    fn provider_name(&self) -> &'static str;

    /// Run one prompt and return the generated text
    ///
    /// An empty completion yields [`NO_RESPONSE_FALLBACK`], not an error.
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, LlmError>;
}

/// Transport settings applied once when a backend is constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    /// Whole-request timeout
    pub request_timeout: Duration,

    /// TCP/TLS connect timeout
    pub connect_timeout: Duration,
}

impl HttpSettings {
    pub fn from_config(config: &OptimizerConfig) -> Self {
        Self {
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        }
    }

    /// Build the HTTP client a backend keeps for its lifetime
    pub fn build_client(&self) -> Result<reqwest::Client, LlmError> {
        reqwest::Client::builder()
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(|e| LlmError::ConfigError(format!("Failed to build HTTP client: {}", e)))
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(240),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Send a request and decode a JSON body, mapping non-2xx to [`HttpStatusError`]
pub(crate) async fn send_json<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T, BoxError> {
    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Box::new(HttpStatusError {
            status: status.as_u16(),
            body,
        }));
    }

    Ok(response.json::<T>().await?)
}

/// Apply the empty-completion fallback
pub(crate) fn or_fallback(text: Option<String>) -> String {
    match text {
        Some(text) if !text.is_empty() => text,
        _ => NO_RESPONSE_FALLBACK.to_string(),
    }
}

/// Trim a base URL so paths can be appended with a single `/`
pub(crate) fn normalize_base_url(url: impl Into<String>) -> String {
    url.into().trim_end_matches('/').to_string()
}
