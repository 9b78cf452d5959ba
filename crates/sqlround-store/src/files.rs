//! SQL source reading and JSON output writing

use sqlround_core::DatabaseType;
use std::path::{Path, PathBuf};

/// File collaborator errors
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("SQL file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Expected .sql file, got: {extension}")]
    WrongExtension { path: PathBuf, extension: String },

    #[error("SQL file is empty: {}", .0.display())]
    Empty(PathBuf),

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize JSON: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// File access used by the optimizer
#[async_trait::async_trait]
pub trait FileHandler: Send + Sync {
    /// Read a `.sql` file, returning its trimmed, non-empty content
    async fn read_sql_file(&self, path: &Path) -> Result<String, FileError>;

    /// Write `data` as indented JSON, creating parent directories
    async fn write_json_file(&self, path: &Path, data: &serde_json::Value) -> Result<(), FileError>;
}

/// Output location for a source file and dialect
///
/// `<source-dir>/<source-stem>_<dialect>_optimization.json`
pub fn output_path_for(source: &Path, database_type: DatabaseType) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = format!("{}_{}_optimization.json", stem, database_type.as_str());

    match source.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Local filesystem implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileHandler;

impl LocalFileHandler {
    pub fn new() -> Self {
        Self
    }

    async fn read_checked(path: &Path) -> Result<String, FileError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(FileError::NotFound(path.to_path_buf()));
        }

        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if extension != "sql" {
            return Err(FileError::WrongExtension {
                path: path.to_path_buf(),
                extension: if extension.is_empty() {
                    "(none)".to_string()
                } else {
                    format!(".{}", extension)
                },
            });
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| FileError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let content = content.trim();
        if content.is_empty() {
            return Err(FileError::Empty(path.to_path_buf()));
        }

        Ok(content.to_string())
    }

    async fn write_checked(path: &Path, data: &serde_json::Value) -> Result<(), FileError> {
        let io_error = |source| FileError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }

        let json = serde_json::to_string_pretty(data)?;
        tokio::fs::write(path, json).await.map_err(io_error)
    }
}

#[async_trait::async_trait]
impl FileHandler for LocalFileHandler {
    async fn read_sql_file(&self, path: &Path) -> Result<String, FileError> {
        match Self::read_checked(path).await {
            Ok(content) => {
                tracing::info!("Successfully read SQL file: {}", path.display());
                Ok(content)
            }
            Err(e) => {
                tracing::error!("Error reading SQL file {}: {}", path.display(), e);
                Err(e)
            }
        }
    }

    async fn write_json_file(&self, path: &Path, data: &serde_json::Value) -> Result<(), FileError> {
        match Self::write_checked(path, data).await {
            Ok(()) => {
                tracing::info!("Successfully wrote JSON file: {}", path.display());
                Ok(())
            }
            Err(e) => {
                tracing::error!("Error writing JSON file {}: {}", path.display(), e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_includes_dialect() {
        let path = output_path_for(Path::new("/work/queries/report.sql"), DatabaseType::Sqlite);
        assert_eq!(path, PathBuf::from("/work/queries/report_sqlite_optimization.json"));

        let path = output_path_for(Path::new("report.sql"), DatabaseType::Oracle);
        assert_eq!(path, PathBuf::from("report_oracle_optimization.json"));
    }

    #[tokio::test]
    async fn read_sql_file_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_query.sql");
        std::fs::write(&path, "\n  SELECT * FROM users WHERE age > 18;  \n").unwrap();

        let content = LocalFileHandler.read_sql_file(&path).await.unwrap();
        assert_eq!(content, "SELECT * FROM users WHERE age > 18;");
    }

    #[tokio::test]
    async fn read_sql_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = LocalFileHandler.read_sql_file(&dir.path().join("missing.sql")).await;
        assert!(matches!(result, Err(FileError::NotFound(_))));
    }

    #[tokio::test]
    async fn read_sql_file_wrong_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.txt");
        std::fs::write(&path, "some content").unwrap();

        let error = LocalFileHandler.read_sql_file(&path).await.unwrap_err();
        assert!(error.to_string().contains("Expected .sql file"));
        assert!(error.to_string().contains(".txt"));
    }

    #[tokio::test]
    async fn extension_check_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("UPPER.SQL");
        std::fs::write(&path, "SELECT 1").unwrap();

        assert_eq!(LocalFileHandler.read_sql_file(&path).await.unwrap(), "SELECT 1");
    }

    #[tokio::test]
    async fn read_sql_file_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.sql");
        std::fs::write(&path, "   \n\t\n").unwrap();

        let result = LocalFileHandler.read_sql_file(&path).await;
        assert!(matches!(result, Err(FileError::Empty(_))));
    }

    #[tokio::test]
    async fn write_json_file_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("result.json");
        let data = serde_json::json!({"key": "value", "number": 42});

        LocalFileHandler.write_json_file(&path, &data).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\n  \"key\": \"value\""));
        let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, data);
    }
}
