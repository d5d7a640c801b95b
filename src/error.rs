//! Error types for the `librarian-rag` crate.

use thiserror::Error;

use crate::fragment::FragmentId;

/// Errors that can occur during retrieval or indexing.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The similarity search returned zero fragments.
    ///
    /// Raised by [`retrieve`](crate::retriever::ContextualRetriever::retrieve)
    /// when the oversampling step finds nothing; callers should report
    /// "no relevant content" rather than retry.
    #[error("the index returned no fragments for the query")]
    EmptyCorpus,

    /// An adjacency link (`prev_id`/`next_id`) points at a fragment the
    /// index does not hold.
    ///
    /// Ids are derived from the adjacency chain built at indexing time, so
    /// a miss means the index and the chain disagree. Treated as fatal
    /// rather than skipped, since skipping would hide the corruption.
    #[error("adjacent fragment '{id}' is missing from the index")]
    MissingAdjacentFragment {
        /// The id that the adjacency chain asserts exists.
        id: FragmentId,
    },

    /// A merge attempted to combine fragments of different levels.
    ///
    /// Merges only ever combine adjacent same-level fragments, so this is
    /// a programming error, never a data condition.
    #[error("cannot merge fragments of different levels ({a} vs {b})")]
    LevelMismatch {
        /// Level of the earlier fragment.
        a: String,
        /// Level of the later fragment.
        b: String,
    },

    /// A merged embedding summed to the zero vector.
    ///
    /// Only possible when the two source embeddings are exact opposites,
    /// which violates the unit-vector input assumption; surfaced instead
    /// of masked.
    #[error("merged embedding has zero norm and cannot be normalized")]
    ZeroNormEmbedding,

    /// A fragment id string does not have the `level:chapters:parts/total` shape.
    #[error("invalid fragment id '{id}': {message}")]
    InvalidFragmentId {
        /// The offending id string.
        id: String,
        /// What failed to parse.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector index backend.
    #[error("index error ({backend}): {message}")]
    IndexError {
        /// The index backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;
