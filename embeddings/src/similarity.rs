//! Vector math for embeddings.

use crate::error::{EmbeddingError, Result};

/// Compute the euclidean norm of an embedding.
///
/// The norm of an empty vector is undefined and rejected with
/// [`EmbeddingError::InvalidInput`]. The zero vector has norm `0.0`.
pub fn norm(v: &[f32]) -> Result<f32> {
    if v.is_empty() {
        return Err(EmbeddingError::InvalidInput(
            "norm of an empty vector is undefined".to_string(),
        ));
    }

    Ok(v.iter().map(|x| x * x).sum::<f32>().sqrt())
}

/// Compute the dot product between two embeddings.
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    ensure_same_dimension(a, b)?;

    Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
}

/// Compute the cosine similarity between two embeddings.
///
/// Returns a value between -1.0 and 1.0, where:
/// - 1.0 means identical direction
/// - 0.0 means orthogonal vectors
/// - -1.0 means opposite vectors
///
/// If either vector has zero magnitude the angle is undefined and the
/// similarity is reported as `0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    let dot = dot_product(a, b)?;
    let magnitude_a = norm(a)?;
    let magnitude_b = norm(b)?;

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (magnitude_a * magnitude_b))
}

fn ensure_same_dimension(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(())
}
