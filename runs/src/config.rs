//! Configuration for embedding runs.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use semlookup_embeddings::client::{DEFAULT_MAX_CONCURRENT_REQUESTS, DEFAULT_REQUEST_TIMEOUT};
use semlookup_embeddings::{ClientConfig, Provider};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::error::{Result, RunError};

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "semlookup.toml";

/// Environment variables holding provider credentials, in lookup order.
const CREDENTIAL_VARS: &[(Provider, &[&str])] = &[
    (Provider::OpenAi, &["OPENAI_API_KEY", "OPEN_API_KEY"]),
    (Provider::Voyage, &["VOYAGE_API_KEY"]),
];

/// Application configuration, usually read from `semlookup.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding one sub-directory per run.
    pub history_dir: PathBuf,

    /// Timeout for each provider request, in seconds.
    pub request_timeout_secs: u64,

    /// Maximum concurrent requests for single-item providers.
    pub max_concurrent_requests: usize,

    /// Number of results returned by search when none is requested.
    pub default_top_k: usize,

    /// Endpoint overrides keyed by provider id.
    pub endpoints: BTreeMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            history_dir: PathBuf::from("history"),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            default_top_k: 5,
            endpoints: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a configuration file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;
        debug!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Load `path` if given, else [`DEFAULT_CONFIG_FILE`] if present, else defaults.
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path).await;
        }

        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if fs::try_exists(default_path).await? {
            return Self::load(default_path).await;
        }

        Ok(Self::default())
    }

    /// Build the embedding client configuration.
    pub fn client_config(&self, credentials: &Credentials) -> Result<ClientConfig> {
        let mut config = ClientConfig::new()
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs))
            .with_max_concurrent_requests(self.max_concurrent_requests);

        for (provider_id, url) in &self.endpoints {
            let provider: Provider = provider_id
                .parse()
                .map_err(|_| RunError::UnknownConfiguredProvider(provider_id.clone()))?;
            config = config.with_endpoint(provider, url.clone());
        }

        for (provider, credential) in &credentials.entries {
            config = config.with_credential(*provider, credential.clone());
        }

        Ok(config)
    }
}

/// Provider credentials gathered outside the core.
#[derive(Clone, Default)]
pub struct Credentials {
    entries: HashMap<Provider, String>,
}

impl Credentials {
    /// Read credentials from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut entries = HashMap::new();
        for (provider, names) in CREDENTIAL_VARS {
            let value = names
                .iter()
                .filter_map(|name| lookup(name))
                .find(|value| !value.trim().is_empty());
            if let Some(value) = value {
                entries.insert(*provider, value);
            }
        }
        Self { entries }
    }

    /// Whether a credential is present for `provider`.
    pub fn has(&self, provider: Provider) -> bool {
        self.entries.contains_key(&provider)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut providers: Vec<&str> = self.entries.keys().map(AsRef::as_ref).collect();
        providers.sort_unstable();
        f.debug_struct("Credentials")
            .field("providers", &providers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.default_top_k, 5);
    }

    #[test]
    fn test_partial_config() {
        let config = AppConfig::from_toml_str(
            r#"
            history_dir = "/tmp/runs"
            request_timeout_secs = 5

            [endpoints]
            ollama = "http://gpu-box:11434/api/embeddings"
            "#,
        )
        .unwrap();

        assert_eq!(config.history_dir, PathBuf::from("/tmp/runs"));
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.max_concurrent_requests, DEFAULT_MAX_CONCURRENT_REQUESTS);

        let client = config.client_config(&Credentials::default()).unwrap();
        assert_eq!(client.request_timeout, Duration::from_secs(5));
        assert_eq!(
            client.endpoints.get(&Provider::Ollama).map(String::as_str),
            Some("http://gpu-box:11434/api/embeddings")
        );
    }

    #[test]
    fn test_unknown_endpoint_provider_is_rejected() {
        let config = AppConfig::from_toml_str("[endpoints]\ncohere = \"http://x\"").unwrap();
        assert!(matches!(
            config.client_config(&Credentials::default()),
            Err(RunError::UnknownConfiguredProvider(id)) if id == "cohere"
        ));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        assert!(matches!(
            AppConfig::from_toml_str("request_timeout_secs = \"soon\""),
            Err(RunError::Config(_))
        ));
    }

    #[test]
    fn test_credentials_from_lookup() {
        let credentials = Credentials::from_lookup(|name| match name {
            "OPENAI_API_KEY" => Some(String::new()),
            "OPEN_API_KEY" => Some("sk-legacy".to_string()),
            _ => None,
        });

        assert!(credentials.has(Provider::OpenAi));
        assert!(!credentials.has(Provider::Voyage));
        assert!(!format!("{credentials:?}").contains("sk-legacy"));

        let client = AppConfig::default().client_config(&credentials).unwrap();
        assert_eq!(
            client.credentials.get(&Provider::OpenAi).map(String::as_str),
            Some("sk-legacy")
        );
    }
}
