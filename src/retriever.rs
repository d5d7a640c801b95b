//! Contextual retrieval pipeline.
//!
//! [`ContextualRetriever`] turns a raw nearest-neighbor search into a small,
//! diverse, context-complete, non-redundant set of passages:
//! embed → oversample → diversify (MMR) → extend context → eliminate
//! redundancy → rank by distance → truncate.
//!
//! # Example
//!
//! ```rust,ignore
//! use librarian_rag::{ContextualRetriever, InMemoryIndex, RetrieverConfig};
//!
//! let retriever = ContextualRetriever::builder()
//!     .config(RetrieverConfig::default())
//!     .embedder(Arc::new(my_embedder))
//!     .index(Arc::new(InMemoryIndex::new()))
//!     .build()?;
//!
//! let passages = retriever.retrieve("who killed the albatross?", 4).await?;
//! ```

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::RetrieverConfig;
use crate::dedup::eliminate_redundant;
use crate::embedding::Embedder;
use crate::error::{Result, RetrievalError};
use crate::extend::extend_context;
use crate::fragment::Fragment;
use crate::index::VectorIndex;
use crate::mmr::maximal_marginal_relevance;
use crate::similarity::cosine_distance;

/// Retrieves the most relevant book passages for a query.
///
/// Each [`retrieve`](ContextualRetriever::retrieve) call is a pure,
/// sequential pipeline over one query: no shared state is mutated, so
/// concurrent calls against the same index are safe as long as the index's
/// read operations are. Construct one via
/// [`ContextualRetriever::builder()`].
pub struct ContextualRetriever {
    config: RetrieverConfig,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl ContextualRetriever {
    /// Create a new [`ContextualRetrieverBuilder`].
    pub fn builder() -> ContextualRetrieverBuilder {
        ContextualRetrieverBuilder::default()
    }

    /// Return a reference to the retriever configuration.
    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// Retrieve the `k` most relevant passages for `query`.
    ///
    /// Returns at most `k` fragments ordered by ascending cosine distance
    /// to the query, each grown to its locally relevance-maximal context
    /// and free of fragments contained in another result.
    ///
    /// # Errors
    ///
    /// - [`RetrievalError::ConfigError`] if `k` is zero
    /// - [`RetrievalError::EmptyCorpus`] if the similarity search returns
    ///   nothing
    /// - embedding, index, and merge failures propagate unchanged
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Fragment>> {
        if k == 0 {
            return Err(RetrievalError::ConfigError(
                "k must be greater than zero".to_string(),
            ));
        }

        let query_embedding = self.embedder.embed(query).await?;

        // Oversample so MMR has near-duplicates to discard.
        let pool = self
            .index
            .query_by_embedding(&query_embedding, k * self.config.oversample_factor)
            .await?;
        if pool.is_empty() {
            return Err(RetrievalError::EmptyCorpus);
        }
        debug!(pool_size = pool.len(), "oversampled candidate pool");

        let selected = maximal_marginal_relevance(
            &query_embedding,
            &pool,
            self.config.mmr_lambda,
            k * self.config.diversify_factor,
        );
        debug!(selected = selected.len(), "diversified candidates");

        let mut extended = Vec::with_capacity(selected.len());
        for idx in selected {
            let fragment = extend_context(
                self.index.as_ref(),
                &query_embedding,
                pool[idx].clone(),
                self.config.max_extension_steps,
            )
            .await?;
            extended.push(fragment);
        }

        let mut survivors = eliminate_redundant(extended);

        survivors.sort_by(|a, b| {
            let da = cosine_distance(&query_embedding, &a.embedding);
            let db = cosine_distance(&query_embedding, &b.embedding);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        });
        survivors.truncate(k);

        info!(query_len = query.len(), k, result_count = survivors.len(), "retrieval completed");
        Ok(survivors)
    }
}

/// Builder for constructing a [`ContextualRetriever`].
///
/// The embedder and index are required; the config defaults to
/// [`RetrieverConfig::default()`].
#[derive(Default)]
pub struct ContextualRetrieverBuilder {
    config: Option<RetrieverConfig>,
    embedder: Option<Arc<dyn Embedder>>,
    index: Option<Arc<dyn VectorIndex>>,
}

impl ContextualRetrieverBuilder {
    /// Set the retriever configuration.
    pub fn config(mut self, config: RetrieverConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the vector index.
    pub fn index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Build the [`ContextualRetriever`], validating that all required
    /// fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::ConfigError`] if the embedder or index is
    /// missing.
    pub fn build(self) -> Result<ContextualRetriever> {
        let embedder = self
            .embedder
            .ok_or_else(|| RetrievalError::ConfigError("embedder is required".to_string()))?;
        let index = self
            .index
            .ok_or_else(|| RetrievalError::ConfigError("index is required".to_string()))?;

        Ok(ContextualRetriever {
            config: self.config.unwrap_or_default(),
            embedder,
            index,
        })
    }
}
