//! Persistence for SQLRound
//!
//! - [`MetadataStore`] / [`JsonMetadataStore`]: versioned query metadata
//!   keyed by identity hash, kept in one JSON document
//! - [`FileHandler`] / [`LocalFileHandler`]: SQL source reading and JSON
//!   output writing

pub mod repository;
pub mod json;
pub mod files;

pub use repository::{MetadataStore, StoreError};
pub use json::JsonMetadataStore;
pub use files::{output_path_for, FileError, FileHandler, LocalFileHandler};
