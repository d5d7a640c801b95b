//! Indexing pipeline: build the adjacency chain and ingest fragments.
//!
//! Book parsing and text splitting live with the caller; this module takes
//! already-split chapter texts, derives fragment ids, links the adjacency
//! chain, and runs embed → store. The chain is built once here and is
//! immutable afterwards — retrieval only reads it.

use std::sync::Arc;

use tracing::info;

use crate::embedding::Embedder;
use crate::error::Result;
use crate::fragment::{Fragment, FragmentId, Level};
use crate::index::VectorIndex;

/// The split parts of one chapter at one level, in reading order.
#[derive(Debug, Clone)]
pub struct ChapterParts {
    /// Zero-based chapter index within the book.
    pub chapter: u32,
    /// Chapter title, preserved into fragment metadata.
    pub title: Option<String>,
    /// The chapter's text split into parts at the target level.
    pub parts: Vec<String>,
}

/// Build the doubly linked fragment chain for one level of a book.
///
/// Ids take the form `level:chapter:part/total` with 1-based parts, `total`
/// being the chapter's split count. `prev_id`/`next_id` link consecutive
/// fragments across chapter boundaries, `None` only at the book boundaries.
pub fn build_chain(level: Level, chapters: &[ChapterParts]) -> Vec<Fragment> {
    let mut fragments: Vec<Fragment> = Vec::new();

    for chapter in chapters {
        let total = chapter.parts.len() as u32;
        for (part_no, text) in chapter.parts.iter().enumerate() {
            let id = FragmentId::single(level, chapter.chapter, part_no as u32 + 1, total);
            let mut fragment = Fragment::new(id, text.clone());
            fragment
                .metadata
                .extra
                .insert("chapter_index".to_string(), chapter.chapter.to_string());
            if let Some(title) = &chapter.title {
                fragment
                    .metadata
                    .extra
                    .insert("chapter_title".to_string(), title.clone());
            }
            fragments.push(fragment);
        }
    }

    for i in 1..fragments.len() {
        fragments[i].metadata.prev_id = Some(fragments[i - 1].id.clone());
    }
    for i in 0..fragments.len().saturating_sub(1) {
        fragments[i].metadata.next_id = Some(fragments[i + 1].id.clone());
    }

    fragments
}

/// Embeds fragment chains and stores them in a vector index.
pub struct Indexer {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl Indexer {
    /// Create an indexer over the given embedder and index.
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Index one level of a book: build the chain, embed, store.
    ///
    /// Returns the number of fragments stored. Call once per level;
    /// levels coexist in the same index under their level-tagged ids.
    pub async fn index_level(&self, level: Level, chapters: &[ChapterParts]) -> Result<usize> {
        let mut fragments = build_chain(level, chapters);
        if fragments.is_empty() {
            return Ok(0);
        }

        self.embedder.embed_fragments(&mut fragments).await?;
        self.index.put(&fragments).await?;

        info!(level = %level, count = fragments.len(), "indexed fragment chain");
        Ok(fragments.len())
    }

    /// Clear the index before a re-index.
    pub async fn reset(&self) -> Result<()> {
        self.index.reset().await
    }

    /// Whether the index already holds fragments.
    pub async fn indexed(&self) -> Result<bool> {
        self.index.exists().await
    }
}
