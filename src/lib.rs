//! Contextual retrieval engine for question answering over books.
//!
//! Given a query and an indexed book, the engine returns a small, diverse,
//! context-complete, non-redundant set of passages suitable for prompting a
//! language model:
//!
//! 1. embed the query
//! 2. oversample candidates by vector similarity (`k * 5`)
//! 3. diversify with maximal marginal relevance (`k * 2`)
//! 4. extend each survivor along the adjacency chain while relevance improves
//! 5. eliminate fragments contained in another result
//! 6. rank by cosine distance and truncate to `k`
//!
//! The external collaborators — embedding generation, the vector index, book
//! parsing — sit behind the [`Embedder`] and [`VectorIndex`] traits.
//! [`InMemoryIndex`] is provided for development and testing, and the
//! `openai` feature adds a reqwest-backed [`Embedder`].

pub mod config;
pub mod dedup;
pub mod embedding;
pub mod error;
pub mod extend;
pub mod fragment;
pub mod index;
pub mod indexer;
pub mod inmemory;
pub mod mmr;
#[cfg(feature = "openai")]
pub mod openai;
pub mod retriever;
pub mod similarity;

pub use config::{RetrieverConfig, RetrieverConfigBuilder};
pub use embedding::Embedder;
pub use error::{Result, RetrievalError};
pub use fragment::{Fragment, FragmentId, FragmentMetadata, Level};
pub use index::VectorIndex;
pub use indexer::{ChapterParts, Indexer};
pub use inmemory::InMemoryIndex;
#[cfg(feature = "openai")]
pub use openai::OpenAiEmbedder;
pub use retriever::{ContextualRetriever, ContextualRetrieverBuilder};
