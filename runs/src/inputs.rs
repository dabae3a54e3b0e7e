//! Gathering embedding inputs from the filesystem.

use std::path::Path;

use semlookup_embeddings::EmbeddingInput;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::{Result, RunError};

/// Read every regular file directly inside `dir` as one input.
///
/// The file name becomes the label and the file content the value. Inputs
/// are sorted by label; sub-directories are skipped and symlinks are
/// followed.
pub async fn read_inputs_from_dir(dir: impl AsRef<Path>) -> Result<Vec<EmbeddingInput>> {
    let dir = dir.as_ref();
    let mut entries = fs::read_dir(dir).await?;
    let mut inputs = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        // Symlinks count as the file they point to.
        match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => {}
            Ok(_) => {
                debug!("Skipping non-file entry {}", path.display());
                continue;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Skipping dangling link {}", path.display());
                continue;
            }
            Err(e) => return Err(e.into()),
        }

        let bytes = fs::read(&path).await?;
        let value = String::from_utf8(bytes).map_err(|_| RunError::NonUtf8Input { path })?;
        let label = entry.file_name().to_string_lossy().into_owned();
        inputs.push(EmbeddingInput { label, value });
    }

    inputs.sort_by(|a, b| a.label.cmp(&b.label));
    info!("Read {} inputs from {}", inputs.len(), dir.display());
    Ok(inputs)
}

/// Label free-text inputs by their position, starting at zero.
pub fn inputs_from_texts<I, S>(texts: I) -> Vec<EmbeddingInput>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    texts
        .into_iter()
        .enumerate()
        .map(|(position, text)| EmbeddingInput::new(position.to_string(), text))
        .collect()
}
