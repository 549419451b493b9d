//! Node merge stage
//!
//! Left-joins fetched metadata with tallies into the authoritative
//! per-node attribute set. Total over every fetched paper: a missing
//! tally substitutes zero counts instead of failing, and merging is
//! order-independent across nodes.

use citegraph_common::models::{MergedNode, PaperRecord, TallyRecord};
use citegraph_common::PaperId;
use std::collections::BTreeMap;

/// Merge every fetched paper with its tallies, if any
pub fn merge_nodes(
    papers: &BTreeMap<PaperId, PaperRecord>,
    tallies: &BTreeMap<PaperId, TallyRecord>,
) -> BTreeMap<PaperId, MergedNode> {
    papers
        .iter()
        .map(|(id, paper)| (id.clone(), MergedNode::merge(paper, tallies.get(id))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(doi: &str) -> PaperRecord {
        PaperRecord {
            id: PaperId::from_doi(doi).unwrap(),
            title: Some(doi.to_string()),
            authors: vec!["Someone".into()],
            year: Some(2019),
            abstract_text: None,
            provider_id: None,
            references: vec![],
        }
    }

    #[test]
    fn test_totality_without_tallies() {
        let mut papers = BTreeMap::new();
        papers.insert(paper("10.1/a").id.clone(), paper("10.1/a"));
        let merged = merge_nodes(&papers, &BTreeMap::new());
        assert_eq!(merged.len(), 1);
        let node = &merged[&PaperId::from_doi("10.1/a").unwrap()];
        assert_eq!(node.supporting, 0);
        assert_eq!(node.title.as_deref(), Some("10.1/a"));
    }

    #[test]
    fn test_tallies_attach_by_id() {
        let a = paper("10.1/a");
        let b = paper("10.1/b");
        let mut papers = BTreeMap::new();
        papers.insert(a.id.clone(), a.clone());
        papers.insert(b.id.clone(), b);

        let mut tallies = BTreeMap::new();
        tallies.insert(
            a.id.clone(),
            TallyRecord {
                contradicting: 4,
                ..TallyRecord::empty(a.id.clone())
            },
        );

        let merged = merge_nodes(&papers, &tallies);
        assert_eq!(merged[&a.id].contradicting, 4);
        assert_eq!(
            merged[&PaperId::from_doi("10.1/b").unwrap()].contradicting,
            0
        );
    }

    #[test]
    fn test_every_paper_gets_exactly_one_node() {
        let mut papers = BTreeMap::new();
        for doi in ["10.1/a", "10.1/b", "10.1/c"] {
            papers.insert(paper(doi).id.clone(), paper(doi));
        }
        let merged = merge_nodes(&papers, &BTreeMap::new());
        assert_eq!(merged.len(), papers.len());
        assert!(papers.keys().all(|id| merged.contains_key(id)));
    }
}
