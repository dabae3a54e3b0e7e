//! # Embeddings
//!
//! This crate turns short texts into embedding vectors through a choice of
//! remote providers and ranks stored vectors by cosine similarity.
//!
//! ## Features
//!
//! - **Provider Registry**: One immutable descriptor per backend (OpenAI, Ollama, Voyage)
//! - **Embedding Generation**: Batch or per-item requests, results in input order
//! - **Similarity Search**: Top-k nearest labels to a target by cosine similarity
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings System                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  EmbeddingInput ──► EmbeddingClient ──► EmbeddingResponse       │
//! │                          │                     │                │
//! │                          ▼                     ▼                │
//! │                 ProviderDescriptor         top_k ──► cosine     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

pub mod client;
pub mod error;
pub mod provider;
pub mod search;
pub mod similarity;

pub use client::{ClientConfig, EmbeddingBackend, EmbeddingClient};
pub use error::{EmbeddingError, Result};
pub use provider::{Batching, Provider, ProviderDescriptor, ResponseShape, lookup};
pub use search::{SimilarityResult, parse_space, top_k};
pub use similarity::{cosine_similarity, dot_product, norm};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// A labeled text to embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingInput {
    /// Caller-chosen identifier, such as a file name.
    pub label: String,

    /// Raw text to embed.
    pub value: String,
}

impl EmbeddingInput {
    /// Create a new embedding input.
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// An input together with its generated embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    pub label: String,
    pub value: String,
    pub embeddings: Embedding,
}

impl EmbeddingResponse {
    /// Attach an embedding to the input it was generated from.
    pub fn from_input(input: &EmbeddingInput, embeddings: Embedding) -> Self {
        Self {
            label: input.label.clone(),
            value: input.value.clone(),
            embeddings,
        }
    }
}
