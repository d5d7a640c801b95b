//! Maximal marginal relevance diversification.
//!
//! Nearest-neighbor search over a chunked book returns many near-duplicate
//! fragments (adjacent sentences or paragraphs with heavily overlapping
//! text). MMR greedily re-selects from the oversampled pool, trading query
//! relevance against redundancy with the fragments already selected, so the
//! downstream pipeline works on a diverse candidate set.

use crate::fragment::Fragment;
use crate::similarity::cosine_similarity;

/// Select up to `k` diverse candidates from `pool`, returning their indices
/// in selection order.
///
/// The first pick is the single most query-similar candidate. Each
/// subsequent pick maximizes
/// `lambda * sim(query, c) - (1 - lambda) * max_selected sim(c, s)`.
/// Ties break toward the earlier pool index (stable, strict `>` compare).
/// If the pool holds fewer than `k` candidates, all of them are selected.
pub fn maximal_marginal_relevance(
    query_embedding: &[f32],
    pool: &[Fragment],
    lambda: f32,
    k: usize,
) -> Vec<usize> {
    let target = k.min(pool.len());
    if target == 0 {
        return Vec::new();
    }

    let query_similarity: Vec<f32> = pool
        .iter()
        .map(|fragment| cosine_similarity(query_embedding, &fragment.embedding))
        .collect();

    let mut best = 0;
    for (idx, &sim) in query_similarity.iter().enumerate().skip(1) {
        if sim > query_similarity[best] {
            best = idx;
        }
    }

    let mut selected = vec![best];
    // Highest similarity to any already-selected candidate, per pool index.
    // Updated incrementally so each round is O(pool) instead of O(pool * selected).
    let mut redundancy: Vec<f32> = pool
        .iter()
        .map(|fragment| cosine_similarity(&fragment.embedding, &pool[best].embedding))
        .collect();

    while selected.len() < target {
        let mut best_idx = None;
        let mut best_score = f32::NEG_INFINITY;
        for idx in 0..pool.len() {
            if selected.contains(&idx) {
                continue;
            }
            let score = lambda * query_similarity[idx] - (1.0 - lambda) * redundancy[idx];
            if score > best_score {
                best_score = score;
                best_idx = Some(idx);
            }
        }

        // target <= pool.len() guarantees an unselected candidate remains.
        let picked = match best_idx {
            Some(idx) => idx,
            None => break,
        };
        selected.push(picked);
        for (idx, fragment) in pool.iter().enumerate() {
            let sim = cosine_similarity(&fragment.embedding, &pool[picked].embedding);
            if sim > redundancy[idx] {
                redundancy[idx] = sim;
            }
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{FragmentId, Level};

    fn fragment(part: u32, embedding: Vec<f32>) -> Fragment {
        let mut f = Fragment::new(
            FragmentId::single(Level::Paragraph, 0, part, 10),
            format!("p{part}"),
        );
        f.embedding = embedding;
        f
    }

    #[test]
    fn first_pick_is_most_query_similar() {
        let pool = vec![
            fragment(1, vec![0.6, 0.8]),
            fragment(2, vec![1.0, 0.0]),
            fragment(3, vec![0.0, 1.0]),
        ];
        let selected = maximal_marginal_relevance(&[1.0, 0.0], &pool, 0.5, 2);
        assert_eq!(selected[0], 1);
    }

    #[test]
    fn prefers_diverse_over_near_duplicate() {
        // Candidate 1 nearly duplicates candidate 0; candidate 2 is less
        // relevant but diverse, so it wins the second slot.
        let pool = vec![
            fragment(1, vec![0.95, 0.31225, 0.0]),
            fragment(2, vec![0.9493, 0.3142, 0.0]),
            fragment(3, vec![0.6, 0.0, 0.8]),
        ];
        let selected = maximal_marginal_relevance(&[1.0, 0.0, 0.0], &pool, 0.5, 2);
        assert_eq!(selected, vec![0, 2]);
    }

    #[test]
    fn short_pool_returns_everything() {
        let pool = vec![fragment(1, vec![1.0, 0.0]), fragment(2, vec![0.0, 1.0])];
        let selected = maximal_marginal_relevance(&[1.0, 0.0], &pool, 0.5, 5);
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn ties_break_toward_earlier_pool_index() {
        let pool = vec![
            fragment(1, vec![1.0, 0.0]),
            fragment(2, vec![1.0, 0.0]),
            fragment(3, vec![1.0, 0.0]),
        ];
        let selected = maximal_marginal_relevance(&[1.0, 0.0], &pool, 0.5, 2);
        assert_eq!(selected, vec![0, 1]);
    }
}
