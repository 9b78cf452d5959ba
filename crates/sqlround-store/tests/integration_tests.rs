//! Integration tests for the JSON metadata store

use sqlround_core::{generate_query_hash, DatabaseType, MetadataVersion, QueryMetadata};
use sqlround_store::{JsonMetadataStore, MetadataStore, StoreError};
use std::sync::Arc;

fn metadata(query: &str, database_type: DatabaseType, minor: u32) -> QueryMetadata {
    let mut metadata = QueryMetadata::new(query, database_type).with_explanation("explanation");
    metadata.version = MetadataVersion::new(0, minor);
    metadata
}

#[tokio::test]
async fn test_failed_save_leaves_store_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    // A directory where the document should be makes every write fail
    let path = dir.path().join("metadata.json");
    std::fs::create_dir(&path).unwrap();

    let store = JsonMetadataStore::open(&path);
    let result = store.save("abc", metadata("SELECT 1", DatabaseType::Oracle, 0)).await;

    assert!(matches!(result, Err(StoreError::Write { .. })));
    assert!(store.get("abc").await.is_none());
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_failed_save_keeps_previous_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store").join("metadata.json");
    let store = JsonMetadataStore::open(&path);

    store
        .save("abc", metadata("SELECT 1", DatabaseType::Oracle, 2))
        .await
        .unwrap();

    // Replace the parent directory with a file so the next write fails
    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path.parent().unwrap(), "blocker").unwrap();

    let result = store.save("abc", metadata("SELECT 1", DatabaseType::Oracle, 3)).await;
    assert!(result.is_err());

    let current = store.get("abc").await.unwrap();
    assert_eq!(current.version, MetadataVersion::new(0, 2));
}

#[tokio::test]
async fn test_concurrent_saves_do_not_interleave() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metadata.json");
    let store = Arc::new(JsonMetadataStore::open(&path));

    let mut handles = Vec::new();
    for i in 0..16 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let database_type = if i % 2 == 0 { DatabaseType::Oracle } else { DatabaseType::Sqlite };
            let query = format!("SELECT {} FROM dual", i);
            let hash = generate_query_hash(database_type, &query);
            store.save(&hash, metadata(&query, database_type, 0)).await.unwrap();
            hash
        }));
    }

    let mut hashes = Vec::new();
    for handle in handles {
        hashes.push(handle.await.unwrap());
    }

    assert_eq!(store.len().await, 16);

    // The document on disk is complete and parseable
    let reopened = JsonMetadataStore::open(&path);
    assert_eq!(reopened.len().await, 16);
    for hash in &hashes {
        assert!(reopened.get(hash).await.is_some());
    }
}

#[tokio::test]
async fn test_same_query_different_dialects_coexist() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonMetadataStore::open(dir.path().join("metadata.json"));
    let query = "SELECT * FROM users WHERE age > 18;";

    let oracle_hash = store.generate_hash(DatabaseType::Oracle, query);
    let sqlite_hash = store.generate_hash(DatabaseType::Sqlite, query);
    assert_ne!(oracle_hash, sqlite_hash);

    store.save(&oracle_hash, metadata(query, DatabaseType::Oracle, 4)).await.unwrap();
    store.save(&sqlite_hash, metadata(query, DatabaseType::Sqlite, 0)).await.unwrap();

    assert_eq!(store.get(&oracle_hash).await.unwrap().version.to_string(), "0.4");
    assert_eq!(store.get(&sqlite_hash).await.unwrap().version.to_string(), "0.0");
    assert_eq!(store.hashes().await.len(), 2);
}
