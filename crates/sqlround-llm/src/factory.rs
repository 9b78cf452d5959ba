//! Client factory and credential resolution

use crate::anthropic::AnthropicClient;
use crate::client::{HttpSettings, LlmClient, LlmError};
use crate::gemini::GeminiClient;
use crate::oci::OciGenAiClient;
use crate::openai::OpenAiClient;
use sqlround_core::{OptimizerConfig, Provider};
use std::path::Path;
use std::sync::Arc;

/// Resolve a credential for `provider`
///
/// Priority: explicit parameter, then config, then the provider's
/// environment variable (read through `env`).
pub fn resolve_credential_with<F>(
    provider: Provider,
    explicit: Option<&str>,
    configured: Option<&str>,
    env: F,
) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |value: &str| !value.trim().is_empty();

    if let Some(key) = explicit.filter(|k| non_empty(k)) {
        return Some(key.to_string());
    }

    if let Some(key) = configured.filter(|k| non_empty(k)) {
        return Some(key.to_string());
    }

    let env_var = provider.env_var();
    match env(env_var).filter(|k| non_empty(k)) {
        Some(key) => {
            tracing::info!("Using API key from environment variable: {}", env_var);
            Some(key)
        }
        None => {
            tracing::warn!("No API key found for {}", provider);
            None
        }
    }
}

/// Resolve a credential from parameter, config, or process environment
pub fn resolve_api_key(provider: Provider, explicit: Option<&str>, configured: Option<&str>) -> Option<String> {
    resolve_credential_with(provider, explicit, configured, |name| std::env::var(name).ok())
}

/// Create the client selected by `config.provider`
pub fn create_client(config: &OptimizerConfig, api_key: Option<&str>) -> Result<Arc<dyn LlmClient>, LlmError> {
    let provider = config.provider;
    let credential = resolve_api_key(provider, api_key, config.api_key.as_deref()).ok_or(
        LlmError::MissingCredential {
            provider,
            env_var: provider.env_var(),
        },
    )?;

    build_client(provider, &credential, config)
}

/// Create a client from a provider tag such as `"openai"`
///
/// Unknown tags fail before any credential lookup or network activity.
pub fn create_client_for_tag(
    tag: &str,
    config: &OptimizerConfig,
    api_key: Option<&str>,
) -> Result<Arc<dyn LlmClient>, LlmError> {
    let provider: Provider = tag.parse()?;
    let config = OptimizerConfig {
        provider,
        ..config.clone()
    };
    create_client(&config, api_key)
}

fn build_client(provider: Provider, credential: &str, config: &OptimizerConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    let http = HttpSettings::from_config(config);

    tracing::debug!(%provider, model = config.effective_model(), "Creating LLM client");

    let client: Arc<dyn LlmClient> = match provider {
        Provider::Gemini => Arc::new(GeminiClient::new(credential, &http)?),
        Provider::OpenAi => Arc::new(OpenAiClient::new(credential, &http)?),
        Provider::Claude => Arc::new(AnthropicClient::new(credential, &http)?),
        Provider::Oci => {
            let settings = config.oci.clone().unwrap_or_default();
            Arc::new(OciGenAiClient::from_config_file(Path::new(credential), &settings, &http)?)
        }
    };

    Ok(client)
}
