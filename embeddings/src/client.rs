//! Embedding generation against a registered provider.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{EmbeddingError, Result};
use crate::provider::{self, Provider, ProviderDescriptor};
use crate::{Embedding, EmbeddingInput, EmbeddingResponse};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of single-item requests allowed in flight at once.
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 8;

/// Something that can turn labeled texts into embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed `inputs` with `model` on the provider named `provider_id`.
    ///
    /// The result has one entry per input, in input order.
    async fn generate(
        &self,
        provider_id: &str,
        model: &str,
        inputs: &[EmbeddingInput],
    ) -> Result<Vec<EmbeddingResponse>>;
}

/// Configuration for [`EmbeddingClient`].
///
/// Credentials are supplied here explicitly; the client never reads the
/// process environment.
#[derive(Clone)]
pub struct ClientConfig {
    /// Bearer credentials per provider.
    pub credentials: HashMap<Provider, String>,

    /// Endpoint overrides per provider.
    pub endpoints: HashMap<Provider, String>,

    /// Timeout applied to each HTTP request.
    pub request_timeout: Duration,

    /// Upper bound on concurrent single-item requests.
    pub max_concurrent_requests: usize,
}

impl ClientConfig {
    /// Create a configuration with default timeouts and no credentials.
    pub fn new() -> Self {
        Self {
            credentials: HashMap::new(),
            endpoints: HashMap::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
        }
    }

    /// Set the bearer credential for a provider.
    pub fn with_credential(mut self, provider: Provider, credential: impl Into<String>) -> Self {
        self.credentials.insert(provider, credential.into());
        self
    }

    /// Send requests for a provider to `url` instead of its registered endpoint.
    pub fn with_endpoint(mut self, provider: Provider, url: impl Into<String>) -> Self {
        self.endpoints.insert(provider, url.into());
        self
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the fan-out concurrency limit.
    pub fn with_max_concurrent_requests(mut self, limit: usize) -> Self {
        self.max_concurrent_requests = limit;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut providers_with_credentials: Vec<&str> =
            self.credentials.keys().map(AsRef::as_ref).collect();
        providers_with_credentials.sort_unstable();

        f.debug_struct("ClientConfig")
            .field("credentials", &providers_with_credentials)
            .field("endpoints", &self.endpoints)
            .field("request_timeout", &self.request_timeout)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .finish()
    }
}

/// HTTP client that generates embeddings through the provider registry.
pub struct EmbeddingClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl EmbeddingClient {
    /// Create a new client.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    /// Generate one embedding per input.
    ///
    /// Provider and model are validated before any request is sent. Batch
    /// providers receive a single request; single-item providers receive one
    /// request per input, issued concurrently. Either way the result is in
    /// input order and has exactly `inputs.len()` entries. The first request
    /// to fail fails the whole call.
    pub async fn generate(
        &self,
        provider_id: &str,
        model: &str,
        inputs: &[EmbeddingInput],
    ) -> Result<Vec<EmbeddingResponse>> {
        let descriptor = provider::lookup(provider_id)?;
        descriptor.validate_model(model)?;

        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let endpoint = self.endpoint(descriptor);
        let credential = self.config.credentials.get(&descriptor.provider);
        if credential.is_none() && descriptor.requires_auth() {
            warn!(
                "No credential configured for {}, sending unauthenticated request",
                descriptor.provider
            );
        }

        let texts: Vec<&str> = inputs.iter().map(|input| input.value.as_str()).collect();
        let bodies = descriptor.build_requests(model, &texts);

        debug!(
            "Generating {} embeddings with {}/{model} in {} request(s)",
            inputs.len(),
            descriptor.provider,
            bodies.len()
        );

        // Responses complete in any order; each lands in the slot of its request.
        let credential = credential.map(String::as_str);
        let mut per_request: Vec<Option<Vec<Embedding>>> = vec![None; bodies.len()];
        let mut pending = stream::iter(bodies.into_iter().enumerate())
            .map(|(position, body)| async move {
                let vectors = self.request(descriptor, endpoint, credential, body).await?;
                Ok::<_, EmbeddingError>((position, vectors))
            })
            .buffer_unordered(self.config.max_concurrent_requests.max(1));

        // The first error to arrive aborts the call and drops in-flight siblings.
        while let Some((position, vectors)) = pending.try_next().await? {
            per_request[position] = Some(vectors);
        }

        let vectors: Vec<Embedding> = per_request.into_iter().flatten().flatten().collect();
        let responses = assemble(inputs, vectors)?;

        info!(
            "Generated {} embeddings with {}/{model}",
            responses.len(),
            descriptor.provider
        );

        Ok(responses)
    }

    fn endpoint(&self, descriptor: &'static ProviderDescriptor) -> &str {
        self.config
            .endpoints
            .get(&descriptor.provider)
            .map_or(descriptor.endpoint, String::as_str)
    }

    async fn request(
        &self,
        descriptor: &'static ProviderDescriptor,
        endpoint: &str,
        credential: Option<&str>,
        body: Value,
    ) -> Result<Vec<Embedding>> {
        let mut request = self
            .http
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(&body);
        if let Some(credential) = credential {
            request = request.bearer_auth(credential);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::RequestFailed(format!(
                "{} API request failed with status {status}: {error_text}",
                descriptor.provider
            )));
        }

        let bytes = response.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes)?;
        descriptor.normalize_response(body)
    }
}

#[async_trait]
impl EmbeddingBackend for EmbeddingClient {
    async fn generate(
        &self,
        provider_id: &str,
        model: &str,
        inputs: &[EmbeddingInput],
    ) -> Result<Vec<EmbeddingResponse>> {
        EmbeddingClient::generate(self, provider_id, model, inputs).await
    }
}

/// Pair vectors with their inputs by position.
fn assemble(inputs: &[EmbeddingInput], vectors: Vec<Embedding>) -> Result<Vec<EmbeddingResponse>> {
    if vectors.len() != inputs.len() {
        return Err(EmbeddingError::MalformedResponse(format!(
            "expected {} embeddings, got {}",
            inputs.len(),
            vectors.len()
        )));
    }

    if let Some(first) = vectors.first() {
        let dimension = first.len();
        if let Some(odd) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(EmbeddingError::MalformedResponse(format!(
                "embeddings have unequal dimensions: {dimension} and {}",
                odd.len()
            )));
        }
    }

    Ok(inputs
        .iter()
        .zip(vectors)
        .map(|(input, embedding)| EmbeddingResponse::from_input(input, embedding))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn inputs(labels: &[&str]) -> Vec<EmbeddingInput> {
        labels
            .iter()
            .map(|label| EmbeddingInput::new(*label, format!("text of {label}")))
            .collect()
    }

    #[test]
    fn test_assemble_keeps_input_order() {
        let responses = assemble(&inputs(&["a", "b"]), vec![vec![1.0], vec![2.0]]).unwrap();
        assert_eq!(responses[0].label, "a");
        assert_eq!(responses[0].value, "text of a");
        assert_eq!(responses[0].embeddings, vec![1.0]);
        assert_eq!(responses[1].label, "b");
        assert_eq!(responses[1].embeddings, vec![2.0]);
    }

    #[test]
    fn test_assemble_rejects_count_mismatch() {
        let result = assemble(&inputs(&["a", "b"]), vec![vec![1.0]]);
        assert!(matches!(result, Err(EmbeddingError::MalformedResponse(_))));
    }

    #[test]
    fn test_assemble_rejects_unequal_dimensions() {
        let result = assemble(&inputs(&["a", "b"]), vec![vec![1.0], vec![1.0, 2.0]]);
        assert!(matches!(result, Err(EmbeddingError::MalformedResponse(_))));
    }

    #[test]
    fn test_config_debug_hides_credentials() {
        let config = ClientConfig::new().with_credential(Provider::OpenAi, "sk-secret");
        let debug = format!("{config:?}");
        assert!(debug.contains("openai"));
        assert!(!debug.contains("sk-secret"));
    }

    #[tokio::test]
    async fn test_unknown_provider_fails_fast() {
        let client = EmbeddingClient::new(ClientConfig::new()).unwrap();
        let result = client.generate("cohere", "embed-v3", &inputs(&["a"])).await;
        assert!(matches!(result, Err(EmbeddingError::UnknownProvider(_))));
    }

    #[tokio::test]
    async fn test_empty_inputs_need_no_requests() {
        let client = EmbeddingClient::new(
            ClientConfig::new().with_endpoint(Provider::Ollama, "http://127.0.0.1:9"),
        )
        .unwrap();
        let responses = client.generate("ollama", "all-minilm", &[]).await.unwrap();
        assert!(responses.is_empty());
    }
}
