//! Cosine similarity and distance helpers.
//!
//! All embeddings handled by the engine are assumed unit-normalized, so
//! cosine similarity reduces to the dot product and cosine distance is
//! `1 - dot(a, b)` (smaller = more similar). Every relevance comparison in
//! the crate — MMR scoring, context extension, final ranking — goes through
//! these two functions so the sign convention cannot drift between call
//! sites.

use crate::error::{Result, RetrievalError};

/// Dot product of two vectors.
///
/// Vectors of unequal length are compared over their common prefix; the
/// engine never produces such pairs, but truncating matches how the zip
/// behaves and avoids a panic in the degenerate case.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Cosine similarity between two unit-normalized vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    dot(a, b)
}

/// Cosine distance between two unit-normalized vectors: `1 - dot(a, b)`.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - dot(a, b)
}

/// L2-normalize a vector, returning a new allocation.
///
/// # Errors
///
/// Returns [`RetrievalError::ZeroNormEmbedding`] if the vector has zero
/// magnitude. For a merged embedding this means the two source embeddings
/// were exact opposites, an input assumption violation.
pub fn l2_normalize(v: &[f32]) -> Result<Vec<f32>> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm <= f32::EPSILON {
        return Err(RetrievalError::ZeroNormEmbedding);
    }
    Ok(v.iter().map(|x| x / norm).collect())
}
