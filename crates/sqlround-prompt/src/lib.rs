//! Dialect-specific prompt construction
//!
//! Each supported database has one generator producing the two round-trip
//! prompts. Prompts are plain templates: deterministic, side-effect free,
//! and the input text is embedded verbatim.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sqlround_prompt::create_prompt_generator;
//! use sqlround_core::DatabaseType;
//!
//! let generator = create_prompt_generator(DatabaseType::Sqlite);
//! let prompt = generator.sql_to_natural_prompt("SELECT * FROM users;");
//! ```

pub mod generator;
pub mod oracle;
pub mod sqlite;

pub use generator::{create_prompt_generator, prompt_generator_for_tag, PromptError, PromptGenerator};
pub use oracle::OraclePromptGenerator;
pub use sqlite::SqlitePromptGenerator;
