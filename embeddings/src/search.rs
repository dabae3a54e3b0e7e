//! Top-k similarity search over a labeled vector set.
//!
//! Every query is a full linear scan; nothing is indexed between calls.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::EmbeddingResponse;
use crate::error::{EmbeddingError, Result};
use crate::similarity::cosine_similarity;

/// A similarity search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// Label of the matched item.
    pub label: String,

    /// Cosine similarity to the target.
    pub score: f32,
}

impl SimilarityResult {
    /// Create a new similarity result.
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Find the `k` entries of `space` most similar to the one labeled `target_label`.
///
/// The first entry carrying `target_label` is the target and is excluded
/// from the candidates; any later entry with the same label is scored like
/// any other candidate. Results are sorted by descending score, and equal
/// scores keep their order from `space`.
pub fn top_k(
    k: usize,
    target_label: &str,
    space: &[EmbeddingResponse],
) -> Result<Vec<SimilarityResult>> {
    let target_position = space
        .iter()
        .position(|entry| entry.label == target_label)
        .ok_or_else(|| EmbeddingError::TargetNotFound(target_label.to_string()))?;
    let target = &space[target_position];

    if k == 0 {
        return Ok(Vec::new());
    }

    let mut scores: Vec<(OrderedFloat<f32>, &str)> = Vec::with_capacity(space.len() - 1);
    for (position, candidate) in space.iter().enumerate() {
        if position == target_position {
            continue;
        }
        let score = cosine_similarity(&target.embeddings, &candidate.embeddings)?;
        scores.push((OrderedFloat(score), candidate.label.as_str()));
    }

    // Stable sort, descending by score
    scores.sort_by(|a, b| b.0.cmp(&a.0));

    debug!(
        "Ranked {} candidates against {target_label}, keeping {}",
        scores.len(),
        k.min(scores.len())
    );

    Ok(scores
        .into_iter()
        .take(k)
        .map(|(score, label)| SimilarityResult::new(label, score.0))
        .collect())
}

/// Parse a persisted vector set: a JSON array of embedding responses.
pub fn parse_space(json: &str) -> Result<Vec<EmbeddingResponse>> {
    serde_json::from_str(json).map_err(|e| {
        EmbeddingError::MalformedResponse(format!("invalid embedding set: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(label: &str, embeddings: Vec<f32>) -> EmbeddingResponse {
        EmbeddingResponse {
            label: label.to_string(),
            value: format!("value of {label}"),
            embeddings,
        }
    }

    fn space() -> Vec<EmbeddingResponse> {
        vec![
            entry("L1", vec![1.0, 0.0]),
            entry("L2", vec![1.0, 0.0]),
            entry("L3", vec![0.0, 1.0]),
            entry("L4", vec![-1.0, 0.0]),
        ]
    }

    #[test]
    fn test_top_k_ranks_by_cosine() {
        let results = top_k(2, "L1", &space()).unwrap();
        assert_eq!(
            results,
            vec![SimilarityResult::new("L2", 1.0), SimilarityResult::new("L3", 0.0)]
        );
    }

    #[test]
    fn test_top_k_excludes_target_and_caps_at_candidates() {
        let results = top_k(10, "L1", &space()).unwrap();
        let labels: Vec<&str> = results.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["L2", "L3", "L4"]);
        assert_eq!(results[2].score, -1.0);
    }

    #[test]
    fn test_top_k_zero() {
        assert!(top_k(0, "L1", &space()).unwrap().is_empty());
    }

    #[test]
    fn test_top_k_target_not_found() {
        assert!(matches!(
            top_k(3, "missing", &space()),
            Err(EmbeddingError::TargetNotFound(label)) if label == "missing"
        ));
    }

    #[test]
    fn test_top_k_zero_still_requires_target() {
        assert!(matches!(
            top_k(0, "missing", &space()),
            Err(EmbeddingError::TargetNotFound(_))
        ));
    }

    #[test]
    fn test_top_k_ties_keep_input_order() {
        let space = vec![
            entry("t", vec![1.0, 0.0]),
            entry("c", vec![0.0, 2.0]),
            entry("a", vec![0.0, 1.0]),
            entry("b", vec![2.0, 0.0]),
            entry("d", vec![0.0, -3.0]),
            entry("e", vec![0.0, 5.0]),
        ];
        let results = top_k(5, "t", &space).unwrap();
        let labels: Vec<&str> = results.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["b", "c", "a", "d", "e"]);
    }

    #[test]
    fn test_top_k_duplicate_labels() {
        let space = vec![
            entry("Y", vec![0.0, 1.0]),
            entry("X", vec![1.0, 0.0]),
            entry("X", vec![1.0, 1.0]),
        ];
        let results = top_k(5, "X", &space).unwrap();
        let labels: Vec<&str> = results.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["X", "Y"]);
        assert!((results[0].score - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn test_top_k_dimension_mismatch() {
        let space = vec![entry("a", vec![1.0, 0.0]), entry("b", vec![1.0, 0.0, 0.0])];
        assert!(matches!(
            top_k(1, "a", &space),
            Err(EmbeddingError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_parse_space() {
        let json = r#"[
            {"label": "a.txt", "value": "alpha", "embeddings": [0.5, 0.5]},
            {"label": "b.txt", "value": "beta", "embeddings": [1, 0]}
        ]"#;
        let space = parse_space(json).unwrap();
        assert_eq!(space.len(), 2);
        assert_eq!(space[1].embeddings, vec![1.0, 0.0]);
    }

    #[test]
    fn test_parse_space_rejects_malformed_entries() {
        let json = r#"[{"label": "a.txt", "value": "alpha", "embeddings": "nope"}]"#;
        assert!(matches!(
            parse_space(json),
            Err(EmbeddingError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_space(r#"{"label": "a"}"#),
            Err(EmbeddingError::MalformedResponse(_))
        ));
    }
}
