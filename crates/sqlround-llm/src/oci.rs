//! OCI Generative AI backend
//!
//! Calls the `actions/chat` endpoint of the Generative AI inference service
//! with a Cohere-format chat request. Requests are signed with the OCI HTTP
//! signature scheme (RSA-SHA256) using the API key of an OCI CLI profile.
//!
//! ## Configuration
//!
//! The credential is the path of an OCI config file (`~/.oci/config`
//! layout). The selected profile must provide `user`, `fingerprint`,
//! `tenancy`, `region` and `key_file`; keys missing from a named profile
//! fall back to `[DEFAULT]`.
//!
//! Reference: https://docs.oracle.com/en-us/iaas/Content/API/Concepts/signingrequests.htm

use crate::client::{or_fallback, send_json, HttpSettings, LlmClient, LlmError};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlround_core::{GenerationParams, OciSettings, Provider};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// API version path of the inference service
pub const CHAT_PATH: &str = "/20231130/actions/chat";

/// Headers covered by the request signature, in signing order
pub const SIGNED_HEADERS: &str = "date (request-target) host content-length content-type x-content-sha256";

const DEFAULT_MAX_TOKENS: u32 = 600;
const DEFAULT_TEMPERATURE: f32 = 1.0;
const DEFAULT_FREQUENCY_PENALTY: f32 = 0.0;
const DEFAULT_TOP_P: f32 = 0.75;
const DEFAULT_TOP_K: u32 = 0;

/// One profile of an OCI config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OciProfile {
    pub user: String,
    pub fingerprint: String,
    pub tenancy: String,
    pub region: String,
    pub key_file: PathBuf,
}

impl OciProfile {
    /// Read `profile` from an OCI config file
    pub fn from_file(path: &Path, profile: &str) -> Result<Self, LlmError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            LlmError::ConfigError(format!("Failed to read OCI config {}: {}", path.display(), e))
        })?;

        Self::parse(&contents, profile)
    }

    /// Parse an INI-style OCI config
    pub fn parse(contents: &str, profile: &str) -> Result<Self, LlmError> {
        let sections = parse_sections(contents);

        if !sections.contains_key(profile) {
            return Err(LlmError::ConfigError(format!("OCI profile '{}' not found", profile)));
        }

        let lookup = |key: &str| -> Result<String, LlmError> {
            sections
                .get(profile)
                .and_then(|section| section.get(key))
                .or_else(|| sections.get("DEFAULT").and_then(|section| section.get(key)))
                .cloned()
                .ok_or_else(|| {
                    LlmError::ConfigError(format!("OCI profile '{}' is missing '{}'", profile, key))
                })
        };

        Ok(Self {
            user: lookup("user")?,
            fingerprint: lookup("fingerprint")?,
            tenancy: lookup("tenancy")?,
            region: lookup("region")?,
            key_file: expand_home(&lookup("key_file")?),
        })
    }

    /// `keyId` of the signature: `<tenancy>/<user>/<fingerprint>`
    pub fn key_id(&self) -> String {
        format!("{}/{}/{}", self.tenancy, self.user, self.fingerprint)
    }
}

fn parse_sections(contents: &str) -> HashMap<String, HashMap<String, String>> {
    let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut current: Option<String> = None;

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            let name = name.trim().to_string();
            sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }

        if let (Some(section), Some((key, value))) = (&current, line.split_once('=')) {
            sections
                .entry(section.clone())
                .or_default()
                .insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    sections
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

/// Base64 SHA-256 of a request body (`x-content-sha256`)
pub fn content_sha256(body: &[u8]) -> String {
    BASE64.encode(Sha256::digest(body))
}

/// String signed for a request, one `name: value` line per signed header
pub fn signing_string(
    date: &str,
    method: &str,
    path: &str,
    host: &str,
    content_length: usize,
    content_type: &str,
    content_sha256: &str,
) -> String {
    [
        format!("date: {}", date),
        format!("(request-target): {} {}", method.to_lowercase(), path),
        format!("host: {}", host),
        format!("content-length: {}", content_length),
        format!("content-type: {}", content_type),
        format!("x-content-sha256: {}", content_sha256),
    ]
    .join("\n")
}

/// Value of the `authorization` header
pub fn authorization_header(key_id: &str, signature: &str) -> String {
    format!(
        "Signature version=\"1\",keyId=\"{}\",algorithm=\"rsa-sha256\",headers=\"{}\",signature=\"{}\"",
        key_id, SIGNED_HEADERS, signature
    )
}

/// Signs requests with a profile's RSA key
struct RequestSigner {
    key_id: String,
    signing_key: SigningKey<Sha256>,
}

impl RequestSigner {
    fn from_profile(profile: &OciProfile) -> Result<Self, LlmError> {
        let pem = std::fs::read_to_string(&profile.key_file).map_err(|e| {
            LlmError::ConfigError(format!(
                "Failed to read OCI key file {}: {}",
                profile.key_file.display(),
                e
            ))
        })?;

        let private_key = RsaPrivateKey::from_pkcs8_pem(&pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(&pem))
            .map_err(|e| LlmError::ConfigError(format!("Invalid OCI private key: {}", e)))?;

        Ok(Self {
            key_id: profile.key_id(),
            signing_key: SigningKey::<Sha256>::new(private_key),
        })
    }

    fn sign(&self, signing_string: &str) -> String {
        let signature = self.signing_key.sign(signing_string.as_bytes());
        authorization_header(&self.key_id, &BASE64.encode(signature.to_bytes()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServingMode {
    pub serving_type: String,
    pub model_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CohereChatRequest {
    pub api_format: String,
    pub message: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub frequency_penalty: f32,
    pub top_p: f32,
    pub top_k: u32,
}

/// Request body for `POST /20231130/actions/chat`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatDetails {
    pub compartment_id: String,
    pub serving_mode: ServingMode,
    pub chat_request: CohereChatRequest,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResult {
    #[serde(default)]
    pub chat_response: Option<CohereChatResponse>,
}

#[derive(Debug, Deserialize)]
pub struct CohereChatResponse {
    #[serde(default)]
    pub text: Option<String>,
}

/// OCI Generative AI backend
pub struct OciGenAiClient {
    http: reqwest::Client,
    signer: RequestSigner,
    endpoint: String,
    host: String,
    compartment_id: String,
}

impl OciGenAiClient {
    /// Build from an OCI config file and optimizer settings
    pub fn from_config_file(config_file: &Path, settings: &OciSettings, http: &HttpSettings) -> Result<Self, LlmError> {
        let profile = OciProfile::from_file(config_file, &settings.profile)?;
        Self::from_profile(&profile, settings, http)
    }

    pub fn from_profile(profile: &OciProfile, settings: &OciSettings, http: &HttpSettings) -> Result<Self, LlmError> {
        let compartment_id = settings
            .compartment_id
            .clone()
            .ok_or_else(|| LlmError::ConfigError("OCI requires 'compartment_id' in [oci] settings".to_string()))?;

        let region = settings.region.as_deref().unwrap_or(&profile.region);
        let endpoint = settings
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://inference.generativeai.{}.oci.oraclecloud.com", region));
        let endpoint = endpoint.trim_end_matches('/').to_string();

        let url = reqwest::Url::parse(&endpoint)
            .map_err(|e| LlmError::ConfigError(format!("Invalid OCI endpoint '{}': {}", endpoint, e)))?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(LlmError::ConfigError(format!("OCI endpoint '{}' has no host", endpoint)));
            }
        };

        Ok(Self {
            http: http.build_client()?,
            signer: RequestSigner::from_profile(profile)?,
            endpoint,
            host,
            compartment_id,
        })
    }

    pub fn build_request(compartment_id: &str, prompt: &str, params: &GenerationParams) -> ChatDetails {
        ChatDetails {
            compartment_id: compartment_id.to_string(),
            serving_mode: ServingMode {
                serving_type: "ON_DEMAND".to_string(),
                model_id: params
                    .model
                    .clone()
                    .unwrap_or_else(|| Provider::Oci.default_model().to_string()),
            },
            chat_request: CohereChatRequest {
                api_format: "COHERE".to_string(),
                message: prompt.to_string(),
                max_tokens: params.max_output_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
                temperature: params.temperature.unwrap_or(DEFAULT_TEMPERATURE),
                frequency_penalty: params.frequency_penalty.unwrap_or(DEFAULT_FREQUENCY_PENALTY),
                top_p: params.top_p.unwrap_or(DEFAULT_TOP_P),
                top_k: params.top_k.unwrap_or(DEFAULT_TOP_K),
            },
        }
    }

    /// Chat response text, trimmed
    pub fn extract_text(result: ChatResult) -> String {
        or_fallback(
            result
                .chat_response
                .and_then(|response| response.text)
                .map(|text| text.trim().to_string()),
        )
    }
}

#[async_trait::async_trait]
impl LlmClient for OciGenAiClient {
    fn provider_name(&self) -> &'static str {
        "oci"
    }

    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, LlmError> {
        let details = Self::build_request(&self.compartment_id, prompt, params);
        let body = serde_json::to_vec(&details)
            .map_err(|e| LlmError::generation_failed(self.provider_name(), e))?;

        let date = chrono::Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        let content_type = "application/json";
        let body_sha = content_sha256(&body);
        let to_sign = signing_string(
            &date,
            "POST",
            CHAT_PATH,
            &self.host,
            body.len(),
            content_type,
            &body_sha,
        );

        tracing::info!(model = %details.serving_mode.model_id, "Sending prompt to OCI Generative AI");

        let request = self
            .http
            .post(format!("{}{}", self.endpoint, CHAT_PATH))
            .header("date", &date)
            .header("host", &self.host)
            .header("content-type", content_type)
            .header("content-length", body.len())
            .header("x-content-sha256", &body_sha)
            .header("authorization", self.signer.sign(&to_sign))
            .body(body);

        let result: ChatResult = send_json(request)
            .await
            .map_err(|e| LlmError::generation_failed(self.provider_name(), e))?;

        Ok(Self::extract_text(result))
    }
}
