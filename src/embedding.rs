//! Embedder trait for generating vector embeddings from text.

use async_trait::async_trait;

use crate::error::Result;
use crate::fragment::Fragment;

/// A provider that generates unit-normalized vector embeddings from text.
///
/// Implementations wrap specific embedding backends behind a unified async
/// interface. The engine compares embeddings with `1 - dot(a, b)`, so
/// implementations must return L2-normalized vectors. The default
/// [`embed_batch`](Embedder::embed_batch) implementation calls
/// [`embed`](Embedder::embed) sequentially; backends with native batching
/// should override it.
///
/// External failures (rate limits etc.) surface as errors unchanged; retry
/// policy, if any, belongs to the implementation, not the engine.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs,
    /// order-preserving.
    ///
    /// The default implementation calls [`embed`](Embedder::embed)
    /// sequentially for each input.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Embed a batch of fragments in place, attaching each embedding to its
    /// fragment.
    async fn embed_fragments(&self, fragments: &mut [Fragment]) -> Result<()> {
        let texts: Vec<&str> = fragments.iter().map(|f| f.content.as_str()).collect();
        let embeddings = self.embed_batch(&texts).await?;
        for (fragment, embedding) in fragments.iter_mut().zip(embeddings) {
            fragment.embedding = embedding;
        }
        Ok(())
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}
