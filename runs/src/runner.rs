//! Embed-then-query workflow over stored runs.

use std::collections::HashSet;
use std::sync::Arc;

use semlookup_embeddings::{EmbeddingBackend, EmbeddingInput, SimilarityResult, top_k};
use tracing::{info, warn};

use crate::error::Result;
use crate::store::{RunRecord, RunStore};

/// Ties an embedding backend to a run store.
///
/// `embed` generates and persists a run; `search` ranks the entries of a
/// stored run against one of its labels.
pub struct Runner {
    backend: Arc<dyn EmbeddingBackend>,
    store: RunStore,
}

impl Runner {
    /// Create a new runner.
    pub fn new(backend: Arc<dyn EmbeddingBackend>, store: RunStore) -> Self {
        Self { backend, store }
    }

    /// Get the run store.
    pub fn store(&self) -> &RunStore {
        &self.store
    }

    /// Generate embeddings for `inputs` and store them as a new run.
    ///
    /// Nothing is generated or written for an empty input list.
    pub async fn embed(
        &self,
        provider: &str,
        model: &str,
        inputs: &[EmbeddingInput],
    ) -> Result<Option<RunRecord>> {
        if inputs.is_empty() {
            info!("No inputs to embed, skipping run");
            return Ok(None);
        }

        warn_on_duplicate_labels(inputs);

        let outputs = self.backend.generate(provider, model, inputs).await?;
        let record = self
            .store
            .create_run(provider, model, inputs, &outputs)
            .await?;

        Ok(Some(record))
    }

    /// Rank the entries of a stored run by similarity to `target`.
    pub async fn search(
        &self,
        run_id: &str,
        target: &str,
        k: usize,
    ) -> Result<Vec<SimilarityResult>> {
        let space = self.store.load_output(run_id).await?;
        let results = top_k(k, target, &space)?;
        info!(
            "Top {} of {} entries similar to {target} in run {run_id}",
            results.len(),
            space.len()
        );
        Ok(results)
    }
}

fn warn_on_duplicate_labels(inputs: &[EmbeddingInput]) {
    let mut seen = HashSet::new();
    for input in inputs {
        if !seen.insert(input.label.as_str()) {
            warn!(
                "Duplicate label {}: only its first occurrence can be a search target",
                input.label
            );
        }
    }
}
