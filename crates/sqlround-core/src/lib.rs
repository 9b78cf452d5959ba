//! SQLRound Core
//!
//! Domain model shared by every SQLRound crate: metadata records, the
//! identity hash, and optimizer configuration.
//! The JSON field names of `QueryMetadata` are part of the on-disk format.

pub mod types;
pub mod hash;
pub mod config;

pub use types::{
    DatabaseType, MetadataVersion, OptimizationResult, OptimizationStage, QueryMetadata,
    UnsupportedDatabaseType, VersionParseError,
};
pub use hash::{generate_query_hash, QUERY_HASH_LEN};
pub use config::{ConfigError, GenerationParams, OciSettings, OptimizerConfig, Provider, UnsupportedProvider};
