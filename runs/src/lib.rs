//! # Runs
//!
//! Everything around embedding generation that touches the outside world:
//!
//! - **Inputs**: gather labeled texts from a folder
//! - **Store**: persist each generation as a timestamped run directory
//! - **Config**: `semlookup.toml` settings and credentials from the environment
//! - **Runner**: embed-and-store, then search a stored run
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use semlookup_embeddings::EmbeddingClient;
//! use semlookup_runs::{AppConfig, Credentials, RunStore, Runner, read_inputs_from_dir};
//!
//! let config = AppConfig::load_or_default(None).await?;
//! let client = EmbeddingClient::new(config.client_config(&Credentials::from_env())?)?;
//! let runner = Runner::new(Arc::new(client), RunStore::new(&config.history_dir));
//!
//! let inputs = read_inputs_from_dir("docs").await?;
//! let run = runner.embed("ollama", "all-minilm", &inputs).await?;
//! ```

pub mod config;
pub mod error;
pub mod inputs;
pub mod runner;
pub mod store;

pub use config::{AppConfig, Credentials};
pub use error::{Result, RunError};
pub use inputs::{inputs_from_texts, read_inputs_from_dir};
pub use runner::Runner;
pub use store::{RunManifest, RunRecord, RunStore};
