//! Identity hash for metadata records

use crate::types::DatabaseType;
use sha2::{Digest, Sha256};

/// Length of a query hash in hex characters (64 bits)
pub const QUERY_HASH_LEN: usize = 16;

/// Hash a query for a target dialect
///
/// SHA-256 over `"<dialect>:<query>"`, hex encoded and truncated to
/// [`QUERY_HASH_LEN`] characters. This is a deduplication key, not a
/// security boundary.
pub fn generate_query_hash(database_type: DatabaseType, query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(database_type.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(query.as_bytes());

    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(QUERY_HASH_LEN);
    digest
}
