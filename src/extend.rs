//! Context extension: grow a fragment along the adjacency chain while it
//! improves query relevance.
//!
//! Fixed-size chunking may truncate the sentence that actually answers the
//! query. Extension reconstructs complete context around the best-matching
//! fragment, guided purely by whether a merge with a neighbor reduces the
//! cosine distance to the query. There is no hard length limit in the
//! algorithm itself; [`RetrieverConfig::max_extension_steps`] exists as a
//! runtime bound, not a correctness requirement.
//!
//! [`RetrieverConfig::max_extension_steps`]: crate::config::RetrieverConfig::max_extension_steps

use tracing::debug;

use crate::error::{Result, RetrievalError};
use crate::fragment::{Fragment, FragmentId};
use crate::index::VectorIndex;
use crate::similarity::cosine_distance;

/// Grow `fragment` to its local relevance fixed point.
///
/// Each step compares the current fragment against its merge with the
/// previous and next chain neighbors (fetched by id from the index) and
/// keeps the candidate with minimum cosine distance to the query, in stable
/// order `[current, prev-merge, next-merge]` so exact ties keep the current
/// fragment. The loop stops when the winner is the current fragment itself,
/// or after `max_steps` iterations when a bound is set.
///
/// Terminates in at most chain-length steps: every non-terminating step
/// replaces the fragment with a strictly larger merge, and the chain is
/// finite.
///
/// # Errors
///
/// Propagates index lookup failures (a missing neighbor is fatal chain
/// corruption) and merge failures.
pub async fn extend_context(
    index: &dyn VectorIndex,
    query_embedding: &[f32],
    fragment: Fragment,
    max_steps: Option<usize>,
) -> Result<Fragment> {
    let mut current = fragment;
    let mut steps = 0usize;

    loop {
        if max_steps.is_some_and(|bound| steps >= bound) {
            debug!(id = %current.id, steps, "extension stopped at step bound");
            return Ok(current);
        }

        let best = extend_step(index, query_embedding, &current).await?;
        if best.id == current.id {
            debug!(
                id = %current.id,
                steps,
                span = current.metadata.merged_ids.len(),
                "extension reached fixed point"
            );
            return Ok(current);
        }
        current = best;
        steps += 1;
    }
}

/// One extension step: pick the best of the fragment and its two neighbor
/// merges.
async fn extend_step(
    index: &dyn VectorIndex,
    query_embedding: &[f32],
    fragment: &Fragment,
) -> Result<Fragment> {
    let mut candidates = vec![fragment.clone()];

    if let Some(prev_id) = &fragment.metadata.prev_id {
        let prev = fetch_one(index, prev_id).await?;
        candidates.push(prev.merge(fragment)?);
    }
    if let Some(next_id) = &fragment.metadata.next_id {
        let next = fetch_one(index, next_id).await?;
        candidates.push(fragment.merge(&next)?);
    }

    // Stable argmin: strict `<` keeps the earliest candidate on exact ties,
    // so a tie with a neighbor merge terminates the extension.
    let mut best = 0;
    let mut best_distance = cosine_distance(query_embedding, &candidates[0].embedding);
    for (idx, candidate) in candidates.iter().enumerate().skip(1) {
        let distance = cosine_distance(query_embedding, &candidate.embedding);
        if distance < best_distance {
            best_distance = distance;
            best = idx;
        }
    }

    Ok(candidates.swap_remove(best))
}

/// Fetch a single chain neighbor by id.
///
/// The [`VectorIndex::get`] contract makes an absent id an error, but an
/// implementation returning an empty list is mapped to the same failure
/// rather than trusted.
async fn fetch_one(index: &dyn VectorIndex, id: &FragmentId) -> Result<Fragment> {
    index
        .get(std::slice::from_ref(id))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| RetrievalError::MissingAdjacentFragment { id: id.clone() })
}
