//! Error types for run storage and orchestration.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for run operations.
pub type Result<T> = std::result::Result<T, RunError>;

/// Errors that can occur while gathering inputs, storing or loading runs.
#[derive(Error, Debug)]
pub enum RunError {
    /// Embedding generation or search error.
    #[error("embedding error: {0}")]
    Embedding(#[from] semlookup_embeddings::EmbeddingError),

    /// No stored run with this id.
    #[error("run not found: {0}")]
    RunNotFound(String),

    /// Input file could not be read as text.
    #[error("input file {path} is not valid UTF-8")]
    NonUtf8Input { path: PathBuf },

    /// Configuration file could not be parsed.
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration names a provider that is not registered.
    #[error("configuration error: unknown provider `{0}`")]
    UnknownConfiguredProvider(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
