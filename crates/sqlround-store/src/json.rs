//! JSON-file metadata store
//!
//! The whole store is one JSON document mapping 16-hex-character hashes to
//! metadata records. It is loaded wholesale when the store is opened and
//! rewritten wholesale on every save.
//!
//! ## Failure semantics
//!
//! - Missing or corrupt document: the store starts empty and a warning is
//!   logged. History is lost but fresh optimizations still work.
//! - Failed write: `save` returns [`StoreError`] and neither the file nor
//!   the in-memory map changes.
//!
//! Saves are serialized behind one process-local lock. There is no
//! cross-process coordination. The file write itself runs on the blocking
//! pool so the lock holder never stalls a runtime worker.

use crate::repository::{MetadataStore, StoreError};
use sqlround_core::QueryMetadata;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

type Records = BTreeMap<String, Arc<QueryMetadata>>;

/// Metadata store backed by a JSON file
pub struct JsonMetadataStore {
    /// Backing document
    path: PathBuf,

    /// Loaded records; the write guard is held for the full save
    records: RwLock<Records>,
}

impl JsonMetadataStore {
    /// Open the store at `path`, loading any existing records
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = Self::load(&path);

        Self {
            path,
            records: RwLock::new(records),
        }
    }

    fn load(path: &Path) -> Records {
        if !path.exists() {
            tracing::info!("No metadata store at {}, starting empty", path.display());
            return Records::new();
        }

        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|contents| {
                serde_json::from_str::<BTreeMap<String, QueryMetadata>>(&contents).map_err(|e| e.to_string())
            });

        match parsed {
            Ok(entries) => {
                tracing::info!("Loaded {} metadata entries", entries.len());
                entries
                    .into_iter()
                    .map(|(hash, metadata)| (hash, Arc::new(metadata)))
                    .collect()
            }
            Err(e) => {
                tracing::warn!("Could not load metadata from {}: {}", path.display(), e);
                Records::new()
            }
        }
    }

    /// Number of records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// All hashes currently stored, sorted
    pub async fn hashes(&self) -> Vec<String> {
        self.records.read().await.keys().cloned().collect()
    }

    async fn persist(&self, records: &Records) -> Result<(), StoreError> {
        let document: BTreeMap<&str, &QueryMetadata> = records
            .iter()
            .map(|(hash, metadata)| (hash.as_str(), metadata.as_ref()))
            .collect();
        let json = serde_json::to_string_pretty(&document)?;

        let path = self.path.clone();
        let written = tokio::task::spawn_blocking(move || write_atomic(&path, json.as_bytes()))
            .await
            .unwrap_or_else(|e| Err(std::io::Error::new(std::io::ErrorKind::Other, e)));

        written.map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// Write through a temp file in the target directory, then rename over it
fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut temp = tempfile::NamedTempFile::new_in(&dir)?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

#[async_trait::async_trait]
impl MetadataStore for JsonMetadataStore {
    async fn get(&self, query_hash: &str) -> Option<Arc<QueryMetadata>> {
        self.records.read().await.get(query_hash).cloned()
    }

    async fn save(&self, query_hash: &str, metadata: QueryMetadata) -> Result<Arc<QueryMetadata>, StoreError> {
        let mut records = self.records.write().await;

        let metadata = Arc::new(metadata);
        let mut next = records.clone();
        next.insert(query_hash.to_string(), Arc::clone(&metadata));

        if let Err(e) = self.persist(&next).await {
            tracing::error!("Error saving metadata: {}", e);
            return Err(e);
        }

        *records = next;
        tracing::info!(hash = query_hash, version = %metadata.version, "Metadata saved successfully");

        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sqlround_core::{DatabaseType, MetadataVersion};

    fn sample_metadata() -> QueryMetadata {
        QueryMetadata::new("SELECT * FROM users WHERE age > 18;", DatabaseType::Oracle)
            .with_explanation("This query selects all users older than 18")
    }

    #[tokio::test]
    async fn save_and_get_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonMetadataStore::open(dir.path().join("metadata.json"));
        let metadata = sample_metadata();

        store.save("test_hash_123", metadata.clone()).await.unwrap();
        let retrieved = store.get("test_hash_123").await.unwrap();

        assert_eq!(*retrieved, metadata);
    }

    #[tokio::test]
    async fn get_nonexistent_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonMetadataStore::open(dir.path().join("metadata.json"));
        assert!(store.get("nonexistent_hash").await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn save_returns_the_stored_handle() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonMetadataStore::open(dir.path().join("metadata.json"));

        let saved = store.save("abc", sample_metadata()).await.unwrap();
        let fetched = store.get("abc").await.unwrap();
        assert!(Arc::ptr_eq(&saved, &fetched));
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("metadata.json");

        let mut metadata = sample_metadata();
        metadata.version = MetadataVersion::new(0, 3);
        JsonMetadataStore::open(&path).save("abc", metadata.clone()).await.unwrap();

        let reopened = JsonMetadataStore::open(&path);
        assert_eq!(reopened.len().await, 1);
        assert_eq!(*reopened.get("abc").await.unwrap(), metadata);
    }

    #[tokio::test]
    async fn corrupt_document_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonMetadataStore::open(&path);
        assert!(store.is_empty().await);

        // Still usable, and the next save replaces the corrupt document
        store.save("abc", sample_metadata()).await.unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"abc\""));
    }

    #[tokio::test]
    async fn document_is_pretty_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.json");
        let store = JsonMetadataStore::open(&path);

        store.save("ffff000000000000", sample_metadata()).await.unwrap();
        store.save("0000ffffffffffff", sample_metadata()).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\n  \"0000ffffffffffff\": {"));
        assert!(contents.find("0000ffffffffffff").unwrap() < contents.find("ffff000000000000").unwrap());
    }

    #[tokio::test]
    async fn legacy_timestamps_do_not_discard_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.json");
        std::fs::write(
            &path,
            r#"{
  "0123456789abcdef": {
    "query_sql": "SELECT * FROM users",
    "explanation_text": "Lists users",
    "version": "0.5",
    "last_optimization": "2025-03-01T10:00:00.123456"
  },
  "fedcba9876543210": {
    "query_sql": "SELECT 1",
    "explanation_text": "Selects one",
    "version": "0.1",
    "last_optimization": "2025-03-02T08:30:00Z",
    "database_type": "sqlite"
  }
}"#,
        )
        .unwrap();

        let store = JsonMetadataStore::open(&path);
        assert_eq!(store.len().await, 2);

        let legacy = store.get("0123456789abcdef").await.unwrap();
        assert_eq!(legacy.version, MetadataVersion::new(0, 5));
        assert_eq!(legacy.database_type, DatabaseType::Oracle);

        // A later save keeps the legacy record
        store.save("1111222233334444", sample_metadata()).await.unwrap();
        let reopened = JsonMetadataStore::open(&path);
        assert_eq!(reopened.len().await, 3);
        assert_eq!(
            reopened.get("0123456789abcdef").await.unwrap().version.to_string(),
            "0.5"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn reads_proceed_while_saves_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonMetadataStore::open(dir.path().join("metadata.json")));
        store.save("abc", sample_metadata()).await.unwrap();

        let writer = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                for i in 0..8 {
                    store.save(&format!("key{}", i), sample_metadata()).await.unwrap();
                }
            })
        };
        for _ in 0..8 {
            assert!(store.get("abc").await.is_some());
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();

        assert_eq!(store.len().await, 9);
    }

    #[test]
    fn generate_hash_matches_core() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonMetadataStore::open(dir.path().join("metadata.json"));
        let query = "SELECT * FROM users;";

        let hash = store.generate_hash(DatabaseType::Oracle, query);
        assert_eq!(hash, store.generate_hash(DatabaseType::Oracle, query));
        assert_ne!(hash, store.generate_hash(DatabaseType::Sqlite, query));
        assert_eq!(hash, sqlround_core::generate_query_hash(DatabaseType::Oracle, query));
    }
}
