//! Data types for fragments, their structured ids, and the merge algebra.
//!
//! A [`Fragment`] is the atomic retrieval unit: a chunk of book text with a
//! derived [`FragmentId`], adjacency metadata, and (once embedded) a
//! unit-normalized embedding. Fragments are created once at indexing time;
//! merged fragments only exist as ephemeral values inside a single retrieval
//! call and are never persisted.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RetrievalError};
use crate::similarity::l2_normalize;

/// Granularity of a fragment, fixed at indexing time.
///
/// Fragments only ever merge with same-level neighbors, so the level of a
/// merged fragment is always the level of its constituents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Sentence-sized chunks.
    Sentence,
    /// Paragraph-sized chunks.
    Paragraph,
    /// Chapter-sized chunks.
    Chapter,
}

impl Level {
    /// The lowercase string form used inside fragment ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Sentence => "sentence",
            Level::Paragraph => "paragraph",
            Level::Chapter => "chapter",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "sentence" => Ok(Level::Sentence),
            "paragraph" => Ok(Level::Paragraph),
            "chapter" => Ok(Level::Chapter),
            other => Err(format!("unknown level '{other}'")),
        }
    }
}

/// A structured fragment key: `level:chapter-range:part-range/total`.
///
/// The chapter range is a single chapter index or an inclusive `a-b` span;
/// the part range locates the chunk within its chapter's split, with `total`
/// the split count of the *first* constituent chapter segment. Ids are
/// derived — assigned by the indexer for originals and recomputed by
/// [`Fragment::merge`] for merged fragments — never chosen arbitrarily.
///
/// Single-index ranges render without the `-`, so an unmerged paragraph
/// looks like `paragraph:3:2/10` and a merge spanning two chapters like
/// `paragraph:3-4:9-1/10`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct FragmentId {
    /// Granularity of the fragment.
    pub level: Level,
    /// First chapter covered (inclusive).
    pub chapter_start: u32,
    /// Last chapter covered (inclusive).
    pub chapter_end: u32,
    /// First part covered within `chapter_start`'s split (1-based).
    pub part_start: u32,
    /// Last part covered within `chapter_end`'s split (1-based).
    pub part_end: u32,
    /// Split count of the first constituent chapter segment.
    pub total: u32,
}

impl FragmentId {
    /// Build the id of an unmerged fragment: one chapter, one part.
    pub fn single(level: Level, chapter: u32, part: u32, total: u32) -> Self {
        Self {
            level,
            chapter_start: chapter,
            chapter_end: chapter,
            part_start: part,
            part_end: part,
            total,
        }
    }

    /// Recompute the id of a span from the ids of its first and last
    /// constituents.
    ///
    /// The chapter range takes its start from `first` and its end from
    /// `last`, likewise the part range; `total` is carried from `first`.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::LevelMismatch`] if the two ids are not the
    /// same level. That can only happen through a programming error, since
    /// merges combine adjacent same-level fragments.
    pub fn spanning(first: &FragmentId, last: &FragmentId) -> Result<FragmentId> {
        if first.level != last.level {
            return Err(RetrievalError::LevelMismatch {
                a: first.level.to_string(),
                b: last.level.to_string(),
            });
        }
        Ok(FragmentId {
            level: first.level,
            chapter_start: first.chapter_start,
            chapter_end: last.chapter_end,
            part_start: first.part_start,
            part_end: last.part_end,
            total: first.total,
        })
    }
}

/// Render a range, collapsing `a-a` to `a`.
fn fmt_range(f: &mut fmt::Formatter<'_>, start: u32, end: u32) -> fmt::Result {
    if start == end {
        write!(f, "{start}")
    } else {
        write!(f, "{start}-{end}")
    }
}

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.level)?;
        fmt_range(f, self.chapter_start, self.chapter_end)?;
        f.write_str(":")?;
        fmt_range(f, self.part_start, self.part_end)?;
        write!(f, "/{}", self.total)
    }
}

/// Parse `a` or `a-b` into an inclusive range.
fn parse_range(s: &str) -> std::result::Result<(u32, u32), String> {
    match s.split_once('-') {
        Some((a, b)) => {
            let start = a.parse().map_err(|_| format!("bad range start '{a}'"))?;
            let end = b.parse().map_err(|_| format!("bad range end '{b}'"))?;
            Ok((start, end))
        }
        None => {
            let single = s.parse().map_err(|_| format!("bad index '{s}'"))?;
            Ok((single, single))
        }
    }
}

impl FromStr for FragmentId {
    type Err = RetrievalError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |message: String| RetrievalError::InvalidFragmentId {
            id: s.to_string(),
            message,
        };

        let mut fields = s.splitn(3, ':');
        let (level, chapters, parts) = match (fields.next(), fields.next(), fields.next()) {
            (Some(l), Some(c), Some(p)) => (l, c, p),
            _ => return Err(invalid("expected three ':'-separated fields".into())),
        };

        let level = Level::from_str(level).map_err(&invalid)?;
        let (chapter_start, chapter_end) = parse_range(chapters).map_err(&invalid)?;
        let (parts, total) = parts
            .split_once('/')
            .ok_or_else(|| invalid("missing '/total' suffix".into()))?;
        let (part_start, part_end) = parse_range(parts).map_err(&invalid)?;
        let total = total
            .parse()
            .map_err(|_| invalid(format!("bad total '{total}'")))?;

        Ok(FragmentId {
            level,
            chapter_start,
            chapter_end,
            part_start,
            part_end,
            total,
        })
    }
}

impl From<FragmentId> for String {
    fn from(id: FragmentId) -> String {
        id.to_string()
    }
}

impl TryFrom<String> for FragmentId {
    type Error = RetrievalError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// Adjacency and provenance metadata attached to every fragment.
///
/// `prev_id`/`next_id` form a doubly linked chain over same-level fragments
/// spanning the whole book, `None` only at the book boundaries. The chain is
/// built once at indexing time and never mutated; merged fragments splice
/// over their constituents by taking the earlier fragment's `prev_id` and
/// the later fragment's `next_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FragmentMetadata {
    /// Id of the preceding same-level fragment, `None` at the book start.
    pub prev_id: Option<FragmentId>,
    /// Id of the following same-level fragment, `None` at the book end.
    pub next_id: Option<FragmentId>,
    /// Ordered ids of the original fragments combined into this one;
    /// a single-element list for unmerged fragments.
    pub merged_ids: Vec<FragmentId>,
    /// Open key/value metadata preserved from indexing (chapter title etc.).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, String>,
}

/// The atomic retrieval unit: a chunk of book text with identity, adjacency
/// metadata, and an optional embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Derived structured key, unique within a book.
    pub id: FragmentId,
    /// The fragment's text, concatenation order preserved across merges.
    pub content: String,
    /// Adjacency and provenance metadata.
    pub metadata: FragmentMetadata,
    /// Unit-normalized embedding; empty until the fragment is embedded.
    pub embedding: Vec<f32>,
}

impl Fragment {
    /// Create an unembedded, unmerged fragment.
    ///
    /// `merged_ids` is initialized to the fragment's own id; adjacency links
    /// start out empty and are filled in by the chain builder.
    pub fn new(id: FragmentId, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: FragmentMetadata {
                merged_ids: vec![id.clone()],
                ..FragmentMetadata::default()
            },
            embedding: Vec::new(),
            id,
        }
    }

    /// Merge this fragment (earlier) with an adjacent later one, producing
    /// a new ephemeral fragment.
    ///
    /// - content is concatenated with no separator
    /// - the chain links skip over both constituents
    /// - `merged_ids` is the concatenation of both constituents' lists
    /// - the embedding is the normalized sum of both embeddings
    /// - the id is recomputed from the first and last merged ids
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::LevelMismatch`] if the fragments are not
    /// the same level, and [`RetrievalError::ZeroNormEmbedding`] if the
    /// summed embedding cannot be normalized.
    pub fn merge(&self, later: &Fragment) -> Result<Fragment> {
        let mut merged_ids = self.metadata.merged_ids.clone();
        merged_ids.extend(later.metadata.merged_ids.iter().cloned());

        // merged_ids is never empty: Fragment::new seeds it with [id].
        let id = FragmentId::spanning(
            &merged_ids[0],
            &merged_ids[merged_ids.len() - 1],
        )?;

        let embedding = if self.embedding.is_empty() || later.embedding.is_empty() {
            Vec::new()
        } else {
            let summed: Vec<f32> = self
                .embedding
                .iter()
                .zip(later.embedding.iter())
                .map(|(x, y)| x + y)
                .collect();
            l2_normalize(&summed)?
        };

        let mut extra = self.metadata.extra.clone();
        extra.extend(later.metadata.extra.iter().map(|(k, v)| (k.clone(), v.clone())));

        Ok(Fragment {
            id,
            content: format!("{}{}", self.content, later.content),
            metadata: FragmentMetadata {
                prev_id: self.metadata.prev_id.clone(),
                next_id: later.metadata.next_id.clone(),
                merged_ids,
                extra,
            },
            embedding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> FragmentId {
        s.parse().unwrap()
    }

    #[test]
    fn id_roundtrips_through_display() {
        for s in ["paragraph:3:2/10", "sentence:0:1/1", "chapter:2-4:9-1/12"] {
            assert_eq!(id(s).to_string(), s);
        }
    }

    #[test]
    fn id_parse_rejects_malformed_strings() {
        for s in ["paragraph:3", "word:3:2/10", "paragraph:3:2", "paragraph:x:2/10"] {
            assert!(matches!(
                s.parse::<FragmentId>(),
                Err(RetrievalError::InvalidFragmentId { .. })
            ));
        }
    }

    #[test]
    fn spanning_takes_total_from_first() {
        let merged = FragmentId::spanning(&id("paragraph:3:9/10"), &id("paragraph:4:1/7")).unwrap();
        assert_eq!(merged.to_string(), "paragraph:3-4:9-1/10");
    }

    #[test]
    fn spanning_rejects_level_mismatch() {
        let result = FragmentId::spanning(&id("paragraph:3:9/10"), &id("sentence:3:10/40"));
        assert!(matches!(result, Err(RetrievalError::LevelMismatch { .. })));
    }

    #[test]
    fn singleton_spanning_is_identity() {
        let original = id("paragraph:5:3/8");
        assert_eq!(FragmentId::spanning(&original, &original).unwrap(), original);
    }

    #[test]
    fn merge_concatenates_and_splices_chain() {
        let mut a = Fragment::new(id("paragraph:1:2/5"), "foo ");
        a.metadata.prev_id = Some(id("paragraph:1:1/5"));
        a.metadata.next_id = Some(id("paragraph:1:3/5"));
        a.embedding = vec![1.0, 0.0];
        let mut b = Fragment::new(id("paragraph:1:3/5"), "bar");
        b.metadata.prev_id = Some(id("paragraph:1:2/5"));
        b.metadata.next_id = Some(id("paragraph:1:4/5"));
        b.embedding = vec![0.0, 1.0];

        let c = a.merge(&b).unwrap();
        assert_eq!(c.id.to_string(), "paragraph:1:2-3/5");
        assert_eq!(c.content, "foo bar");
        assert_eq!(c.metadata.prev_id, Some(id("paragraph:1:1/5")));
        assert_eq!(c.metadata.next_id, Some(id("paragraph:1:4/5")));
        assert_eq!(
            c.metadata.merged_ids,
            vec![id("paragraph:1:2/5"), id("paragraph:1:3/5")]
        );
        let expected = std::f32::consts::FRAC_1_SQRT_2;
        assert!((c.embedding[0] - expected).abs() < 1e-6);
        assert!((c.embedding[1] - expected).abs() < 1e-6);
    }

    #[test]
    fn merge_id_is_associative_over_contiguous_chain() {
        let a = Fragment::new(id("paragraph:1:1/3"), "a");
        let b = Fragment::new(id("paragraph:1:2/3"), "b");
        let c = Fragment::new(id("paragraph:1:3/3"), "c");

        let left = a.merge(&b).unwrap().merge(&c).unwrap();
        let right = a.merge(&b.merge(&c).unwrap()).unwrap();
        assert_eq!(left.id, right.id);
        assert_eq!(left.content, right.content);
        assert_eq!(left.metadata.merged_ids, right.metadata.merged_ids);
    }

    #[test]
    fn merge_of_opposite_embeddings_is_fatal() {
        let mut a = Fragment::new(id("paragraph:1:1/2"), "a");
        a.embedding = vec![1.0, 0.0];
        let mut b = Fragment::new(id("paragraph:1:2/2"), "b");
        b.embedding = vec![-1.0, 0.0];
        assert!(matches!(a.merge(&b), Err(RetrievalError::ZeroNormEmbedding)));
    }

    #[test]
    fn id_serializes_as_string() {
        let json = serde_json::to_string(&id("sentence:2:5/9")).unwrap();
        assert_eq!(json, "\"sentence:2:5/9\"");
        let back: FragmentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id("sentence:2:5/9"));
    }
}
