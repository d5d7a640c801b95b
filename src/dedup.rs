//! Redundancy elimination after context extension.
//!
//! Two diversified fragments can extend into the same neighbors and end up
//! overlapping or fully containing one another. This filter keeps a fragment
//! only if no already-kept fragment contains it.

use std::collections::HashSet;

use tracing::debug;

use crate::fragment::Fragment;

/// Drop fragments contained in an earlier-kept fragment.
///
/// Ordered greedy filter over the input order: the first fragment is always
/// kept, and each subsequent fragment is tested against the currently kept
/// set only. O(n²) over the small post-diversification set.
pub fn eliminate_redundant(fragments: Vec<Fragment>) -> Vec<Fragment> {
    let mut kept: Vec<Fragment> = Vec::with_capacity(fragments.len());

    for candidate in fragments {
        if kept.iter().any(|keeper| contains(keeper, &candidate)) {
            debug!(id = %candidate.id, "dropping contained fragment");
            continue;
        }
        kept.push(candidate);
    }

    kept
}

/// Whether `a` subsumes `b`.
///
/// Holds if `b`'s merged ids are a subset of `a`'s, or if `b`'s content with
/// all whitespace removed is a substring of `a`'s content with whitespace
/// removed. The content test catches the same text duplicated across split
/// levels that share no ids. Containment is reflexive.
pub fn contains(a: &Fragment, b: &Fragment) -> bool {
    let a_ids: HashSet<_> = a.metadata.merged_ids.iter().collect();
    if b.metadata.merged_ids.iter().all(|id| a_ids.contains(id)) {
        return true;
    }

    squash(&a.content).contains(&squash(&b.content))
}

/// Remove all whitespace characters from a string.
fn squash(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{FragmentId, Level};

    fn fragment(parts: &[u32], content: &str) -> Fragment {
        let ids: Vec<FragmentId> = parts
            .iter()
            .map(|&p| FragmentId::single(Level::Paragraph, 0, p, 10))
            .collect();
        let mut f = Fragment::new(ids[0].clone(), content);
        f.metadata.merged_ids = ids;
        f
    }

    #[test]
    fn containment_is_reflexive() {
        let f = fragment(&[3], "some text");
        assert!(contains(&f, &f));
    }

    #[test]
    fn merged_id_subset_implies_containment_regardless_of_content() {
        let big = fragment(&[2, 3, 4], "abc");
        let small = fragment(&[3], "completely different text");
        assert!(contains(&big, &small));
        assert!(!contains(&small, &big));
    }

    #[test]
    fn whitespace_insensitive_content_containment() {
        let a = fragment(&[1], "The quick brown fox jumps");
        let b = fragment(&[9], "quick\n brown   fox");
        assert!(contains(&a, &b));
    }

    #[test]
    fn keeps_first_of_two_overlapping_extensions() {
        let first = fragment(&[4, 5, 6], "middle of chapter");
        let second = fragment(&[5, 6], "of chapter");
        let kept = eliminate_redundant(vec![first.clone(), second]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, first.id);
    }

    #[test]
    fn unrelated_fragments_all_survive() {
        let kept = eliminate_redundant(vec![
            fragment(&[1], "alpha"),
            fragment(&[5], "beta"),
            fragment(&[9], "gamma"),
        ]);
        assert_eq!(kept.len(), 3);
    }
}
