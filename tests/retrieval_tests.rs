//! End-to-end retrieval scenarios over an in-memory index.

use std::sync::Arc;

use async_trait::async_trait;
use librarian_rag::error::{Result, RetrievalError};
use librarian_rag::extend::extend_context;
use librarian_rag::fragment::{Fragment, FragmentId, Level};
use librarian_rag::index::VectorIndex;
use librarian_rag::indexer::{build_chain, ChapterParts};
use librarian_rag::inmemory::InMemoryIndex;
use librarian_rag::retriever::ContextualRetriever;
use librarian_rag::similarity::cosine_distance;
use librarian_rag::Embedder;

/// Embedder that returns one fixed vector for every input. Retrieval only
/// embeds the query, so this pins the query embedding for a scenario.
struct FixedEmbedder(Vec<f32>);

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(self.0.clone())
    }

    fn dimensions(&self) -> usize {
        self.0.len()
    }
}

/// Unit vector at the given angle in degrees.
fn unit(degrees: f32) -> Vec<f32> {
    let radians = degrees.to_radians();
    vec![radians.cos(), radians.sin()]
}

/// Build a single-chapter paragraph chain with one embedding per part.
fn chain_with_angles(angles: &[f32]) -> Vec<Fragment> {
    let parts: Vec<String> = (0..angles.len()).map(|i| format!("part {i} text. ")).collect();
    let mut fragments = build_chain(
        Level::Paragraph,
        &[ChapterParts { chapter: 0, title: Some("Chapter".to_string()), parts }],
    );
    for (fragment, &angle) in fragments.iter_mut().zip(angles) {
        fragment.embedding = unit(angle);
    }
    fragments
}

async fn indexed(fragments: &[Fragment]) -> Arc<InMemoryIndex> {
    let index = Arc::new(InMemoryIndex::new());
    index.put(fragments).await.unwrap();
    index
}

fn retriever(index: Arc<InMemoryIndex>, query_embedding: Vec<f32>) -> ContextualRetriever {
    ContextualRetriever::builder()
        .embedder(Arc::new(FixedEmbedder(query_embedding)))
        .index(index)
        .build()
        .unwrap()
}

fn part_id(part: u32, total: u32) -> FragmentId {
    FragmentId::single(Level::Paragraph, 0, part, total)
}

#[tokio::test(flavor = "multi_thread")]
async fn best_fragment_is_extended_around_and_ranked_first() {
    // Ten paragraphs; part 5 (8 degrees off the query) is the closest, and
    // its left neighbor sits on the other side of the query so the merge
    // lands nearly on top of it.
    let angles = [-80.0, -60.0, -35.0, -10.0, 8.0, 40.0, 60.0, 70.0, 80.0, 85.0];
    let fragments = chain_with_angles(&angles);
    let index = indexed(&fragments).await;
    let query = unit(0.0);

    let results = retriever(index, query.clone()).retrieve("q", 1).await.unwrap();

    assert_eq!(results.len(), 1);
    let best = &results[0];
    assert!(best.metadata.merged_ids.contains(&part_id(5, 10)));

    let part5 = &fragments[4];
    let extended_distance = cosine_distance(&query, &best.embedding);
    let original_distance = cosine_distance(&query, &part5.embedding);
    assert!(extended_distance <= original_distance + 1e-6);
}

#[tokio::test(flavor = "multi_thread")]
async fn overlapping_extensions_are_deduplicated() {
    // Both diversified candidates extend to the same [part1, part2] span,
    // so the eliminator must retain exactly one fragment.
    let angles = [-20.0, 12.0, 25.0];
    let fragments = chain_with_angles(&angles);
    let index = indexed(&fragments).await;
    let query = unit(0.0);

    let results = retriever(index, query.clone()).retrieve("q", 1).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(
        results[0].metadata.merged_ids,
        vec![part_id(1, 3), part_id(2, 3)]
    );
    assert_eq!(results[0].content, "part 0 text. part 1 text. ");
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_corpus_is_an_error() {
    let index = Arc::new(InMemoryIndex::new());
    let result = retriever(index, unit(0.0)).retrieve("q", 3).await;
    assert!(matches!(result, Err(RetrievalError::EmptyCorpus)));
}

#[tokio::test(flavor = "multi_thread")]
async fn zero_k_is_rejected() {
    let fragments = chain_with_angles(&[0.0]);
    let index = indexed(&fragments).await;
    let result = retriever(index, unit(0.0)).retrieve("q", 0).await;
    assert!(matches!(result, Err(RetrievalError::ConfigError(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn results_are_ordered_by_ascending_distance_and_truncated() {
    let angles = [-75.0, -45.0, -15.0, 20.0, 50.0, 80.0];
    let fragments = chain_with_angles(&angles);
    let index = indexed(&fragments).await;
    let query = unit(0.0);

    let results = retriever(index, query.clone()).retrieve("q", 2).await.unwrap();

    assert!(results.len() <= 2);
    for window in results.windows(2) {
        let da = cosine_distance(&query, &window[0].embedding);
        let db = cosine_distance(&query, &window[1].embedding);
        assert!(da <= db, "results not in ascending distance order: {da} > {db}");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn extension_stops_at_fixed_point_when_growth_does_not_help() {
    // The closest fragment's neighbors both point away from the query, so
    // any merge increases distance and extension returns the input as-is.
    let angles = [60.0, 5.0, -60.0];
    let fragments = chain_with_angles(&angles);
    let index = indexed(&fragments).await;
    let query = unit(5.0);

    let extended = extend_context(index.as_ref(), &query, fragments[1].clone(), None)
        .await
        .unwrap();
    assert_eq!(extended.id, fragments[1].id);
    assert_eq!(extended.metadata.merged_ids.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn extension_respects_step_bound() {
    // Neighbors zig-zag across the query so each merge keeps improving;
    // unbounded extension grows to three parts, a one-step bound stops at
    // two.
    let angles = [-2.0, -8.0, 10.0, 170.0, 170.0];
    let fragments = chain_with_angles(&angles);
    let index = indexed(&fragments).await;
    let query = unit(0.0);

    let unbounded = extend_context(index.as_ref(), &query, fragments[2].clone(), None)
        .await
        .unwrap();
    assert_eq!(unbounded.metadata.merged_ids.len(), 3);

    let bounded = extend_context(index.as_ref(), &query, fragments[2].clone(), Some(1))
        .await
        .unwrap();
    assert_eq!(bounded.metadata.merged_ids.len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_chain_neighbor_is_fatal() {
    let mut fragments = chain_with_angles(&[10.0, 5.0, -10.0]);
    // Simulate index/chain corruption: drop the middle fragment's neighbor
    // from the index while its link remains.
    let corrupted: Vec<Fragment> =
        fragments.drain(..).filter(|f| f.id != part_id(1, 3)).collect();
    let index = indexed(&corrupted).await;
    let query = unit(0.0);

    let result = extend_context(index.as_ref(), &query, corrupted[0].clone(), None).await;
    assert!(matches!(
        result,
        Err(RetrievalError::MissingAdjacentFragment { .. })
    ));
}
