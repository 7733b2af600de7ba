//! Similarity scoring and ranking for embeddings.

use std::cmp::Reverse;

use ordered_float::OrderedFloat;
use tracing::warn;

use crate::error::{EmbeddingError, Result};
use crate::Embedding;

/// Compute the cosine similarity between two embeddings.
///
/// Returns a value between -1.0 and 1.0, where:
/// - 1.0 means identical vectors
/// - 0.0 means orthogonal vectors
/// - -1.0 means opposite vectors
///
/// A zero-magnitude input yields 0.0 rather than NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot_product / (magnitude_a * magnitude_b))
}

/// A stored unit scored against a query.
///
/// Scores are request-scoped: ranking allocates a fresh `ScoredUnit` list per
/// call and never writes back to the shared store, so concurrent queries
/// cannot trample each other's scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredUnit {
    /// Position of the unit in the store (corpus order).
    pub index: usize,

    /// Similarity score against the query.
    pub score: f32,
}

/// Rank stored embeddings against one or more query vectors.
///
/// Each candidate is scored with the maximum cosine similarity across all
/// query vectors. One query vector gives plain similarity search; several
/// (paraphrases, a hypothetical answer) are fused by max without a separate
/// code path.
///
/// The result is sorted by score descending; the sort is stable, so equal
/// scores keep corpus order. A candidate whose dimensionality does not match
/// a query vector is skipped with a warning and the rest keep ranking.
pub fn rank(candidates: &[impl AsRef<[f32]>], query_vectors: &[Embedding]) -> Vec<ScoredUnit> {
    let mut scored: Vec<ScoredUnit> = Vec::with_capacity(candidates.len());

    'units: for (index, candidate) in candidates.iter().enumerate() {
        let mut best: Option<f32> = None;
        for query in query_vectors {
            match cosine_similarity(candidate.as_ref(), query) {
                Ok(score) => {
                    best = Some(best.map_or(score, |b| b.max(score)));
                }
                Err(err) => {
                    warn!("skipping unit {index} during ranking: {err}");
                    continue 'units;
                }
            }
        }
        if let Some(score) = best {
            scored.push(ScoredUnit { index, score });
        }
    }

    scored.sort_by_key(|s| Reverse(OrderedFloat(s.score)));
    scored
}

/// Select the final matches from a ranked list.
///
/// Takes the first `k` entries, then drops any whose score is at or below
/// `threshold_min`, preserving relative order.
pub fn select_top_k(ranked: Vec<ScoredUnit>, k: usize, threshold_min: f32) -> Vec<ScoredUnit> {
    ranked
        .into_iter()
        .take(k)
        .filter(|s| s.score > threshold_min)
        .collect()
}
