//! LLM client abstraction
//!
//! A uniform request/response contract over interchangeable generative-text
//! backends. Callers depend on [`LlmClient`] only; [`create_client`] resolves
//! credentials and picks the concrete backend.
//!
//! ## Backends
//!
//! - [`GeminiClient`] - Google Gemini `generateContent`
//! - [`OpenAiClient`] - OpenAI chat completions
//! - [`AnthropicClient`] - Anthropic messages API
//! - [`OciGenAiClient`] - OCI Generative AI chat (request signing)
//! - [`MockClient`] - scripted responses for tests, no network
//!
//! ## Example
//!
//! ```rust,ignore
//! use sqlround_llm::{create_client, LlmClient};
//! use sqlround_core::OptimizerConfig;
//!
//! let client = create_client(&OptimizerConfig::default(), None)?;
//! let text = client.generate("Explain: SELECT 1", &Default::default()).await?;
//! ```

pub mod client;
pub mod gemini;
pub mod openai;
pub mod anthropic;
pub mod oci;
pub mod mock;
pub mod factory;

pub use client::{HttpSettings, LlmClient, LlmError, NO_RESPONSE_FALLBACK};
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;
pub use anthropic::AnthropicClient;
pub use oci::{OciGenAiClient, OciProfile};
pub use mock::MockClient;
pub use factory::{create_client, create_client_for_tag, resolve_api_key};
pub use sqlround_core::GenerationParams;
