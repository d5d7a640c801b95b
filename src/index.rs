//! Vector index trait for storing and searching fragments of a single book.

use async_trait::async_trait;

use crate::error::Result;
use crate::fragment::{Fragment, FragmentId};

/// A nearest-neighbor index over the fragments of one book.
///
/// The retrieval engine only uses the two read operations
/// ([`query_by_embedding`](VectorIndex::query_by_embedding) and
/// [`get`](VectorIndex::get)); the write operations exist for the indexing
/// pipeline. Read operations must be safe for concurrent readers — the
/// engine issues no writes during retrieval.
///
/// The backing search may be approximate; callers get no exact
/// nearest-neighbor guarantee.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `n` fragments nearest to `embedding` by cosine distance.
    ///
    /// Returned fragments must have their embeddings populated. The result
    /// order is backend-defined; callers must not assume it is sorted by
    /// distance.
    async fn query_by_embedding(&self, embedding: &[f32], n: usize) -> Result<Vec<Fragment>>;

    /// Look up fragments by id, in the order given.
    ///
    /// # Errors
    ///
    /// Fails the whole call with
    /// [`RetrievalError::MissingAdjacentFragment`](crate::error::RetrievalError::MissingAdjacentFragment)
    /// if any id is absent. Ids are derived from the adjacency chain built
    /// alongside the index, so a miss is an internal-consistency violation,
    /// not a recoverable condition.
    async fn get(&self, ids: &[FragmentId]) -> Result<Vec<Fragment>>;

    /// Store fragments. Indexing-time only; not part of the retrieval path.
    async fn put(&self, fragments: &[Fragment]) -> Result<()>;

    /// Delete all fragments. Indexing-time only.
    async fn reset(&self) -> Result<()>;

    /// Whether the index holds any fragments.
    async fn exists(&self) -> Result<bool>;
}
