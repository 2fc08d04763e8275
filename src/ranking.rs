//! Cosine scoring and top-K selection over index chunks.
//!
//! Ranking is a brute-force scan: score every candidate, stable-sort descending,
//! truncate. At knowledge-base scale this beats maintaining an ANN structure, and
//! the stable sort keeps tie order deterministic (candidate order wins).

use std::cmp::Ordering;

use crate::index::Chunk;

/// A candidate chunk paired with its unrounded similarity score.
#[derive(Debug, Clone, Copy)]
pub struct Scored<'a> {
    /// The scored chunk.
    pub chunk: &'a Chunk,
    /// Raw cosine similarity against the query vector.
    pub score: f32,
}

/// Cosine similarity between two vectors.
///
/// A zero denominator (either vector all zeros) is treated as 1, so degenerate
/// vectors score 0 instead of producing NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denominator = norm_a.sqrt() * norm_b.sqrt();
    let denominator = if denominator == 0.0 { 1.0 } else { denominator };
    dot / denominator
}

/// Score every candidate and return the top `top_k` in stable descending order.
///
/// `top_k` beyond the candidate count is clamped; zero yields an empty vector.
/// Ordering is decided on unrounded scores; presentation rounding happens later
/// via [`round_score`].
pub fn rank<'a, I>(candidates: I, query: &[f32], top_k: usize) -> Vec<Scored<'a>>
where
    I: IntoIterator<Item = &'a Chunk>,
{
    if top_k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<Scored<'a>> = candidates
        .into_iter()
        .map(|chunk| Scored {
            chunk,
            score: cosine_similarity(&chunk.embedding, query),
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(top_k);
    scored
}

/// Round a similarity to four decimal places for presentation.
pub fn round_score(score: f32) -> f64 {
    (f64::from(score) * 10_000.0).round() / 10_000.0
}
