//! Collection filter
//!
//! Restricts the raw edge set to edges whose endpoints are both
//! members of the working collection, the id set derived from the
//! original export rather than transitively-discovered references.
//! Pure set intersection plus ordered-pair deduplication; filtering
//! twice yields the same set.

use crate::extract::RawEdge;
use crate::report::{reason, StageSummary};
use citegraph_common::PaperId;
use std::collections::{BTreeSet, HashSet};

/// Keep edges with both endpoints in the collection, deduplicated
pub fn filter_edges(
    raw: &[RawEdge],
    collection: &BTreeSet<PaperId>,
) -> (Vec<RawEdge>, StageSummary) {
    let mut summary = StageSummary::new("filter");
    summary.processed = raw.len();

    let mut seen: HashSet<(&PaperId, &PaperId)> = HashSet::new();
    let mut kept = Vec::new();
    for edge in raw {
        if !collection.contains(&edge.source) || !collection.contains(&edge.target) {
            summary.exclude(reason::OUTSIDE_COLLECTION);
            continue;
        }
        if !seen.insert((&edge.source, &edge.target)) {
            summary.exclude(reason::DUPLICATE);
            continue;
        }
        kept.push(edge.clone());
    }

    summary.succeeded = kept.len();
    (kept, summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> PaperId {
        PaperId::from_doi(s).unwrap()
    }

    fn edge(source: &str, target: &str) -> RawEdge {
        RawEdge {
            source: id(source),
            target: id(target),
        }
    }

    fn collection(ids: &[&str]) -> BTreeSet<PaperId> {
        ids.iter().map(|s| id(s)).collect()
    }

    #[test]
    fn test_soundness_both_endpoints_in_collection() {
        let coll = collection(&["10.1/a", "10.1/b"]);
        let raw = vec![
            edge("10.1/a", "10.1/b"),
            edge("10.1/a", "10.1/x"),
            edge("10.1/x", "10.1/b"),
        ];
        let (kept, summary) = filter_edges(&raw, &coll);
        assert_eq!(kept, vec![edge("10.1/a", "10.1/b")]);
        assert!(kept
            .iter()
            .all(|e| coll.contains(&e.source) && coll.contains(&e.target)));
        assert_eq!(summary.excluded.get(reason::OUTSIDE_COLLECTION), Some(&2));
    }

    #[test]
    fn test_filter_is_idempotent() {
        let coll = collection(&["10.1/a", "10.1/b", "10.1/c"]);
        let raw = vec![
            edge("10.1/a", "10.1/b"),
            edge("10.1/a", "10.1/b"),
            edge("10.1/b", "10.1/c"),
            edge("10.1/a", "10.1/x"),
        ];
        let (once, _) = filter_edges(&raw, &coll);
        let (twice, _) = filter_edges(&once, &coll);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_duplicates_collapse_to_one() {
        let coll = collection(&["10.1/a", "10.1/b"]);
        let raw = vec![edge("10.1/a", "10.1/b"), edge("10.1/a", "10.1/b")];
        let (kept, summary) = filter_edges(&raw, &coll);
        assert_eq!(kept.len(), 1);
        assert_eq!(summary.excluded.get(reason::DUPLICATE), Some(&1));
    }

    #[test]
    fn test_empty_collection_filters_everything() {
        let (kept, _) = filter_edges(&[edge("10.1/a", "10.1/b")], &BTreeSet::new());
        assert!(kept.is_empty());
    }
}
