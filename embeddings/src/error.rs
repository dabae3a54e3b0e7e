//! Error types for embedding generation and similarity search.

use thiserror::Error;

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Errors that can occur while generating or searching embeddings.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// No provider is registered under the given identifier.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// The model is not accepted by the selected provider.
    #[error("model `{model}` is not supported by provider `{provider}`")]
    UnsupportedModel { provider: String, model: String },

    /// Transport failure, timeout, or non-success HTTP status.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// A provider response or persisted vector set did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The search target label is absent from the search space.
    #[error("target `{0}` not found in vector space")]
    TargetNotFound(String),

    /// Degenerate input, such as an empty vector.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::RequestFailed(format!("request timed out: {err}"));
        }
        Self::RequestFailed(err.to_string())
    }
}

impl From<serde_json::Error> for EmbeddingError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}
