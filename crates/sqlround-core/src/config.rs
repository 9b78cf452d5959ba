//! Configuration schema (sqlround.toml)

use crate::types::DatabaseType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "sqlround.toml";

/// LLM provider selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Google Gemini
    Gemini,

    /// OpenAI chat completions
    OpenAi,

    /// Anthropic Claude
    Claude,

    /// Oracle Cloud Infrastructure Generative AI
    Oci,
}

impl Provider {
    pub const ALL: [Provider; 4] = [Provider::Gemini, Provider::OpenAi, Provider::Claude, Provider::Oci];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::Claude => "claude",
            Self::Oci => "oci",
        }
    }

    /// Environment variable consulted when no key is supplied
    ///
    /// For OCI the "key" is the path of an OCI CLI config file.
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::Gemini => "GOOGLE_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Claude => "ANTHROPIC_API_KEY",
            Self::Oci => "OCI_CONFIG_FILE",
        }
    }

    /// Model used when the config does not name one
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.0-flash",
            Self::OpenAi => "gpt-4",
            Self::Claude => "claude-3-5-sonnet-20241022",
            Self::Oci => "cohere.command-r-plus",
        }
    }
}

impl Default for Provider {
    fn default() -> Self {
        Self::Gemini
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a provider tag is not recognized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported LLM provider: '{0}'. Supported: gemini, openai, claude, oci")]
pub struct UnsupportedProvider(pub String);

impl FromStr for Provider {
    type Err = UnsupportedProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAi),
            "claude" | "anthropic" => Ok(Self::Claude),
            "oci" => Ok(Self::Oci),
            _ => Err(UnsupportedProvider(s.to_string())),
        }
    }
}

/// Per-call generation parameters
///
/// Every field is optional; backends substitute their own defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Model identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum output tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    /// Nucleus sampling, where the backend supports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Top-k sampling, where the backend supports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    /// Frequency penalty, where the backend supports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
}

/// OCI Generative AI settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OciSettings {
    /// Profile inside the OCI config file
    pub profile: String,

    /// Compartment OCID the requests are billed to
    pub compartment_id: Option<String>,

    /// Region override (otherwise taken from the profile)
    pub region: Option<String>,

    /// Full service endpoint override
    pub endpoint: Option<String>,
}

impl Default for OciSettings {
    fn default() -> Self {
        Self {
            profile: "DEFAULT".to_string(),
            compartment_id: None,
            region: None,
            endpoint: None,
        }
    }
}

/// Main optimizer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// LLM provider
    pub provider: Provider,

    /// Model name (provider default when absent)
    pub model_name: Option<String>,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum output tokens per call
    pub max_output_tokens: u32,

    /// Target dialect
    pub database_type: DatabaseType,

    /// API key; environment variables are consulted when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Whole-request timeout for backend calls
    pub request_timeout_secs: u64,

    /// Connect timeout for backend calls
    pub connect_timeout_secs: u64,

    /// Location of the metadata store document
    pub metadata_path: PathBuf,

    /// OCI-specific settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oci: Option<OciSettings>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model_name: None,
            temperature: 0.1,
            max_output_tokens: 8192,
            database_type: DatabaseType::default(),
            api_key: None,
            request_timeout_secs: 240,
            connect_timeout_secs: 10,
            metadata_path: PathBuf::from("optimization_metadata.json"),
            oci: None,
        }
    }
}

impl OptimizerConfig {
    /// Default config for a provider
    pub fn for_provider(provider: Provider) -> Self {
        Self {
            provider,
            ..Self::default()
        }
    }

    /// Model to request: explicit name or the provider default
    pub fn effective_model(&self) -> &str {
        self.model_name
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Parameters sent with every stage call
    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            model: Some(self.effective_model().to_string()),
            temperature: Some(self.temperature),
            max_output_tokens: Some(self.max_output_tokens),
            ..GenerationParams::default()
        }
    }

    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let mut config = Self::from_toml(&contents)?;

        // Relative metadata paths are resolved against the config file location
        if config.metadata_path.is_relative() {
            if let Some(parent) = path.parent() {
                config.metadata_path = parent.join(&config.metadata_path);
            }
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load `path` if given, else `sqlround.toml` if present, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Serialize to a TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
