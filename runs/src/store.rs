//! Storage of embedding runs on disk.
//!
//! Every run lives in its own directory under the history root, named after
//! the millisecond timestamp at which it was stored:
//!
//! ```text
//! history/
//! └── 1718000000000/
//!     ├── input.json    provider, model and inputs
//!     └── output.json   array of embedding responses
//! ```

use std::path::PathBuf;

use chrono::Utc;
use semlookup_embeddings::{EmbeddingInput, EmbeddingResponse, parse_space};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};

use crate::error::{Result, RunError};

const INPUT_FILE: &str = "input.json";
const OUTPUT_FILE: &str = "output.json";

/// Contents of a run's `input.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    /// Millisecond timestamp, also the run id.
    pub timestamp: String,

    /// Provider id used for generation.
    pub provider: String,

    /// Model id used for generation.
    pub model: String,

    /// The inputs, in request order.
    pub input: Vec<EmbeddingInput>,
}

/// A stored run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    /// Run id.
    pub id: String,

    /// Directory holding the run files.
    pub path: PathBuf,
}

/// Filesystem store for runs.
pub struct RunStore {
    root: PathBuf,
}

impl RunStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root.join(run_id)
    }

    /// Store a finished generation as a new run.
    pub async fn create_run(
        &self,
        provider: &str,
        model: &str,
        inputs: &[EmbeddingInput],
        outputs: &[EmbeddingResponse],
    ) -> Result<RunRecord> {
        fs::create_dir_all(&self.root).await?;
        let (id, path) = self.create_run_dir().await?;

        let manifest = RunManifest {
            timestamp: id.clone(),
            provider: provider.to_string(),
            model: model.to_string(),
            input: inputs.to_vec(),
        };
        fs::write(path.join(INPUT_FILE), serde_json::to_vec(&manifest)?).await?;
        fs::write(path.join(OUTPUT_FILE), serde_json::to_vec(outputs)?).await?;

        info!("Stored run {id} with {} embeddings", outputs.len());
        Ok(RunRecord { id, path })
    }

    /// Create a fresh run directory, stepping the timestamp past existing runs.
    async fn create_run_dir(&self) -> Result<(String, PathBuf)> {
        let mut millis = Utc::now().timestamp_millis();
        loop {
            let id = millis.to_string();
            let path = self.run_dir(&id);
            match fs::create_dir(&path).await {
                Ok(()) => return Ok((id, path)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!("Run directory {id} already exists, trying the next timestamp");
                    millis += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Load the embedding responses of a run.
    pub async fn load_output(&self, run_id: &str) -> Result<Vec<EmbeddingResponse>> {
        let content = self.read_run_file(run_id, OUTPUT_FILE).await?;
        Ok(parse_space(&content)?)
    }

    /// Load the manifest of a run.
    pub async fn load_manifest(&self, run_id: &str) -> Result<RunManifest> {
        let content = self.read_run_file(run_id, INPUT_FILE).await?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn read_run_file(&self, run_id: &str, file: &str) -> Result<String> {
        let path = self.run_dir(run_id).join(file);
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RunError::RunNotFound(run_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// List stored run ids, oldest first.
    pub async fn list_runs(&self) -> Result<Vec<String>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut runs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Ok(millis) = name.parse::<i64>() {
                runs.push((millis, name));
            }
        }

        runs.sort();
        Ok(runs.into_iter().map(|(_, name)| name).collect())
    }
}
