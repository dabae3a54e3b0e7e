//! Embedding providers.
//!
//! Every supported backend is described by one immutable
//! [`ProviderDescriptor`] in a process-wide table. The descriptor carries
//! everything the client needs to talk to the backend: endpoint, accepted
//! models, request field names, batching capability and the shape of the
//! response. Adding a provider means adding a [`Provider`] variant and one
//! table row.

use serde::Deserialize;
use serde_json::{Map, Value};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use tracing::debug;

use crate::Embedding;
use crate::error::{EmbeddingError, Result};

/// Identifier of a supported embedding provider.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Provider {
    /// OpenAI embeddings API.
    OpenAi,
    /// Local Ollama server.
    Ollama,
    /// Voyage AI embeddings API.
    Voyage,
}

impl Provider {
    /// Look up the descriptor for this provider.
    pub fn descriptor(self) -> &'static ProviderDescriptor {
        match self {
            Provider::OpenAi => &OPENAI,
            Provider::Ollama => &OLLAMA,
            Provider::Voyage => &VOYAGE,
        }
    }
}

/// How a provider accepts multiple texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Batching {
    /// All texts go into one request as an array.
    Batch,
    /// One request per text.
    Single,
}

/// Where the embedding vectors live in a provider response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `{"data": [{"embedding": [...]}, ...]}`, one item per input.
    WrappedInDataField,
    /// `{"embedding": [...]}`, one vector per response.
    Flat,
}

/// Authentication expected by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    /// No credential is sent.
    None,
    /// `Authorization: Bearer <credential>`.
    Bearer,
}

/// Immutable description of how to talk to one provider.
#[derive(Debug)]
pub struct ProviderDescriptor {
    pub provider: Provider,
    pub endpoint: &'static str,
    pub models: &'static [&'static str],
    pub auth: Auth,
    pub batching: Batching,
    pub prompt_field: &'static str,
    pub model_field: &'static str,
    pub response_shape: ResponseShape,
}

static OPENAI: ProviderDescriptor = ProviderDescriptor {
    provider: Provider::OpenAi,
    endpoint: "https://api.openai.com/v1/embeddings",
    models: &[
        "text-embedding-3-small",
        "text-embedding-3-large",
        "text-embedding-ada-002",
    ],
    auth: Auth::Bearer,
    batching: Batching::Batch,
    prompt_field: "input",
    model_field: "model",
    response_shape: ResponseShape::WrappedInDataField,
};

static OLLAMA: ProviderDescriptor = ProviderDescriptor {
    provider: Provider::Ollama,
    endpoint: "http://localhost:11434/api/embeddings",
    models: &["mxbai-embed-large", "nomic-embed-text", "all-minilm"],
    auth: Auth::None,
    batching: Batching::Single,
    prompt_field: "prompt",
    model_field: "model",
    response_shape: ResponseShape::Flat,
};

static VOYAGE: ProviderDescriptor = ProviderDescriptor {
    provider: Provider::Voyage,
    endpoint: "https://api.voyageai.com/v1/embeddings",
    models: &["voyage-large-2-instruct"],
    auth: Auth::Bearer,
    batching: Batching::Batch,
    prompt_field: "input",
    model_field: "model",
    response_shape: ResponseShape::WrappedInDataField,
};

/// Resolve a provider identifier such as `"openai"` to its descriptor.
pub fn lookup(provider_id: &str) -> Result<&'static ProviderDescriptor> {
    provider_id
        .parse::<Provider>()
        .map(Provider::descriptor)
        .map_err(|_| EmbeddingError::UnknownProvider(provider_id.to_string()))
}

impl ProviderDescriptor {
    /// Reject models outside this provider's accepted set.
    pub fn validate_model(&self, model: &str) -> Result<()> {
        if self.models.contains(&model) {
            return Ok(());
        }
        Err(EmbeddingError::UnsupportedModel {
            provider: self.provider.to_string(),
            model: model.to_string(),
        })
    }

    /// Build the JSON request bodies for `texts`.
    ///
    /// Batch providers get exactly one body holding every text in order;
    /// single-item providers get one body per text, in input order.
    pub fn build_requests(&self, model: &str, texts: &[&str]) -> Vec<Value> {
        match self.batching {
            Batching::Batch => {
                let prompts = texts.iter().map(|t| Value::from(*t)).collect();
                vec![self.request_body(model, Value::Array(prompts))]
            }
            Batching::Single => texts
                .iter()
                .map(|t| self.request_body(model, Value::from(*t)))
                .collect(),
        }
    }

    fn request_body(&self, model: &str, prompt: Value) -> Value {
        let mut body = Map::new();
        body.insert(self.prompt_field.to_string(), prompt);
        body.insert(self.model_field.to_string(), Value::from(model));
        Value::Object(body)
    }

    /// Extract the embedding vectors from one response body.
    ///
    /// For wrapped responses the vectors are returned in input order,
    /// honoring the per-item `index` when every item carries one. Flat
    /// responses always yield exactly one vector.
    pub fn normalize_response(&self, body: Value) -> Result<Vec<Embedding>> {
        match self.response_shape {
            ResponseShape::WrappedInDataField => {
                let envelope: DataEnvelope = serde_json::from_value(body).map_err(|e| {
                    EmbeddingError::MalformedResponse(format!(
                        "{} response: expected `data` array of embeddings: {e}",
                        self.provider
                    ))
                })?;
                order_items(envelope.data)
            }
            ResponseShape::Flat => {
                let item: FlatItem = serde_json::from_value(body).map_err(|e| {
                    EmbeddingError::MalformedResponse(format!(
                        "{} response: expected `embedding` array: {e}",
                        self.provider
                    ))
                })?;
                Ok(vec![item.embedding])
            }
        }
    }

    /// Whether a credential is expected for this provider.
    pub fn requires_auth(&self) -> bool {
        self.auth == Auth::Bearer
    }
}

fn order_items(mut items: Vec<DataItem>) -> Result<Vec<Embedding>> {
    if items.iter().all(|item| item.index.is_some()) {
        items.sort_by_key(|item| item.index);
        for (position, item) in items.iter().enumerate() {
            if item.index != Some(position) {
                return Err(EmbeddingError::MalformedResponse(format!(
                    "embedding indices are not contiguous: expected {position}, got {:?}",
                    item.index
                )));
            }
        }
    } else {
        debug!("Response items carry no index, using positional order");
    }

    Ok(items.into_iter().map(|item| item.embedding).collect())
}

#[derive(Debug, Deserialize)]
struct DataEnvelope {
    data: Vec<DataItem>,
}

#[derive(Debug, Deserialize)]
struct DataItem {
    embedding: Embedding,
    #[serde(default)]
    index: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct FlatItem {
    embedding: Embedding,
}
