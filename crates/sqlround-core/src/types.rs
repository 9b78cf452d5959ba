//! Query metadata records and optimization results
//!
//! `QueryMetadata` is the persisted shape. Its JSON field order is stable:
//! `query_sql`, `explanation_text`, `version`, `last_optimization`,
//! `database_type`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Target database dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// Oracle Database
    Oracle,

    /// SQLite
    Sqlite,
}

impl DatabaseType {
    /// Every supported dialect, in display order
    pub const ALL: [DatabaseType; 2] = [DatabaseType::Oracle, DatabaseType::Sqlite];

    /// Stable lowercase tag, used in hashes and output file names
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Oracle => "oracle",
            Self::Sqlite => "sqlite",
        }
    }

    /// Human-readable name used inside prompts
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Oracle => "Oracle",
            Self::Sqlite => "SQLite",
        }
    }
}

impl Default for DatabaseType {
    fn default() -> Self {
        Self::Oracle
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a dialect tag does not name a supported database
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported database type: '{0}'. Supported: oracle, sqlite")]
pub struct UnsupportedDatabaseType(pub String);

impl FromStr for DatabaseType {
    type Err = UnsupportedDatabaseType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "oracle" => Ok(Self::Oracle),
            "sqlite" => Ok(Self::Sqlite),
            _ => Err(UnsupportedDatabaseType(s.to_string())),
        }
    }
}

/// Stages of the optimization round trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationStage {
    /// Stage 1: SQL to natural-language explanation
    SqlToNatural,

    /// Stage 2: explanation back to SQL
    NaturalToSql,
}

impl OptimizationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SqlToNatural => "sql_to_natural",
            Self::NaturalToSql => "natural_to_sql",
        }
    }
}

/// Dotted metadata version (`"<major>.<minor>"`)
///
/// Only the trailing component moves: every successful re-optimization of
/// the same query bumps `minor` by exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MetadataVersion {
    /// Leading component (never changed by the pipeline)
    pub major: u32,

    /// Trailing component, incremented per optimization
    pub minor: u32,
}

impl MetadataVersion {
    /// Version of a freshly created record
    pub const INITIAL: MetadataVersion = MetadataVersion { major: 0, minor: 0 };

    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Next version: same major, minor + 1
    ///
    /// `None` once `minor` cannot grow any further.
    pub fn bump(self) -> Option<Self> {
        Some(Self {
            major: self.major,
            minor: self.minor.checked_add(1)?,
        })
    }
}

impl Default for MetadataVersion {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl fmt::Display for MetadataVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Error parsing a dotted version string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid metadata version '{0}': expected '<major>.<minor>'")]
pub struct VersionParseError(pub String);

impl FromStr for MetadataVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s
            .split_once('.')
            .ok_or_else(|| VersionParseError(s.to_string()))?;

        let major = major.parse().map_err(|_| VersionParseError(s.to_string()))?;
        let minor = minor.parse().map_err(|_| VersionParseError(s.to_string()))?;

        Ok(Self { major, minor })
    }
}

impl TryFrom<String> for MetadataVersion {
    type Error = VersionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MetadataVersion> for String {
    fn from(version: MetadataVersion) -> Self {
        version.to_string()
    }
}

/// Versioned record for one (dialect, query text) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMetadata {
    /// Raw SQL text as read from the source file
    pub query_sql: String,

    /// Explanation from the latest run (empty before the first one)
    pub explanation_text: String,

    /// Dotted version
    pub version: MetadataVersion,

    /// Timestamp of the last optimization (ISO 8601)
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub last_optimization: DateTime<Utc>,

    /// Dialect this record was optimized for
    #[serde(default)]
    pub database_type: DatabaseType,
}

impl QueryMetadata {
    /// Fresh record: version `0.0`, empty explanation
    pub fn new(query_sql: impl Into<String>, database_type: DatabaseType) -> Self {
        Self {
            query_sql: query_sql.into(),
            explanation_text: String::new(),
            version: MetadataVersion::INITIAL,
            last_optimization: Utc::now(),
            database_type,
        }
    }

    /// Record carrying a new explanation and timestamp, version unchanged
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation_text = explanation.into();
        self.last_optimization = Utc::now();
        self
    }

    /// Serialized payload for output files
    pub fn to_json_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Parse an ISO-8601 timestamp
///
/// RFC 3339 values keep their offset. Values without an offset, such as
/// `2025-03-01T10:00:00.123456`, are read as UTC.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(timestamp) => Ok(timestamp.with_timezone(&Utc)),
        Err(_) => NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|naive| naive.and_utc()),
    }
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{}': {}", raw, e)))
}

/// Outcome of one pipeline run
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Source query, unmodified
    pub original_query: String,

    /// Stage 1 output
    pub explained_query: String,

    /// Stage 2 output
    pub optimized_query: String,

    /// Dialect the run targeted
    pub database_type: DatabaseType,

    /// The record just saved (shared with the metadata store)
    pub metadata: Arc<QueryMetadata>,
}
