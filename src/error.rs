//! Error types for Docent.

use std::path::PathBuf;
use thiserror::Error;

/// Library-level error type for Docent operations.
#[derive(Error, Debug)]
pub enum DocentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Embedding service error: {0}")]
    Embedding(String),

    #[error("Vector store write failed: {0}")]
    StoreWrite(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Generation service error: {0}")]
    Generation(String),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl DocentError {
    /// Whether this error was caused by the caller's input rather than by the pipeline.
    pub fn is_validation(&self) -> bool {
        matches!(self, DocentError::Validation(_))
    }
}

/// Result type alias for Docent operations.
pub type Result<T> = std::result::Result<T, DocentError>;
