//! Metadata store trait

use sqlround_core::{generate_query_hash, DatabaseType, QueryMetadata};
use std::path::PathBuf;
use std::sync::Arc;

/// Errors persisting metadata
///
/// A failed save is fatal for the run: an unsaved version bump would
/// desynchronize the hash -> version mapping on the next run.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to write metadata store {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize metadata: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Versioned metadata records keyed by identity hash
///
/// Records are immutable once stored: callers check one out, build an
/// updated value, and hand it back through [`MetadataStore::save`].
#[async_trait::async_trait]
pub trait MetadataStore: Send + Sync {
    /// Record for `query_hash`, if any
    async fn get(&self, query_hash: &str) -> Option<Arc<QueryMetadata>>;

    /// Persist `metadata` under `query_hash`
    ///
    /// Returns the shared handle the store now holds.
    async fn save(&self, query_hash: &str, metadata: QueryMetadata) -> Result<Arc<QueryMetadata>, StoreError>;

    /// Identity hash, identical to the one used for lookups
    fn generate_hash(&self, database_type: DatabaseType, query: &str) -> String {
        generate_query_hash(database_type, query)
    }
}
