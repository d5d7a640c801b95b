//! In-memory vector index using cosine distance.
//!
//! This module provides [`InMemoryIndex`], a zero-dependency index backed by
//! a `HashMap` protected by a `tokio::sync::RwLock`. It is suitable for
//! development, testing, and books small enough to rescan per query.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Result, RetrievalError};
use crate::fragment::{Fragment, FragmentId};
use crate::index::VectorIndex;
use crate::similarity::cosine_distance;

/// An in-memory [`VectorIndex`] keyed by fragment id.
///
/// Search is a full scan ordered by ascending cosine distance. All
/// operations are async-safe via `tokio::sync::RwLock`, so concurrent
/// `retrieve` calls can share one index.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    fragments: RwLock<HashMap<FragmentId, Fragment>>,
}

impl InMemoryIndex {
    /// Create a new empty in-memory index.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn query_by_embedding(&self, embedding: &[f32], n: usize) -> Result<Vec<Fragment>> {
        let fragments = self.fragments.read().await;

        let mut scored: Vec<(f32, &Fragment)> = fragments
            .values()
            .map(|fragment| (cosine_distance(&fragment.embedding, embedding), fragment))
            .collect();

        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(n);
        Ok(scored.into_iter().map(|(_, fragment)| fragment.clone()).collect())
    }

    async fn get(&self, ids: &[FragmentId]) -> Result<Vec<Fragment>> {
        let fragments = self.fragments.read().await;
        ids.iter()
            .map(|id| {
                fragments.get(id).cloned().ok_or_else(|| {
                    RetrievalError::MissingAdjacentFragment { id: id.clone() }
                })
            })
            .collect()
    }

    async fn put(&self, new: &[Fragment]) -> Result<()> {
        let mut fragments = self.fragments.write().await;
        for fragment in new {
            fragments.insert(fragment.id.clone(), fragment.clone());
        }
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        self.fragments.write().await.clear();
        Ok(())
    }

    async fn exists(&self) -> Result<bool> {
        Ok(!self.fragments.read().await.is_empty())
    }
}
