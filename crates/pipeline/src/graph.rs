//! Graph assembly stage
//!
//! Builds the final [`CitationGraph`]: one node per merged record,
//! then each filtered edge after re-checking both endpoints against
//! the *final* node set. Collection membership was checked earlier,
//! but a node can still fall out between filtering and assembly (a
//! failed metadata fetch), so edges with a missing endpoint are
//! dropped here with a warning rather than raising a consistency
//! error. `validate` afterwards guards the invariant the assembler is
//! supposed to guarantee; a violation there is fatal.

use crate::extract::RawEdge;
use crate::report::{reason, StageSummary};
use citegraph_common::errors::Result;
use citegraph_common::models::{CitationGraph, Edge, MergedNode};
use citegraph_common::PaperId;
use std::collections::BTreeMap;
use tracing::warn;

/// Assemble the citation graph from merged nodes and filtered edges
pub fn assemble_graph(
    nodes: BTreeMap<PaperId, MergedNode>,
    edges: &[RawEdge],
) -> Result<(CitationGraph, StageSummary)> {
    let mut summary = StageSummary::new("assemble");
    summary.processed = edges.len();

    let mut graph = CitationGraph::new();
    for node in nodes.into_values() {
        graph.insert_node(node);
    }

    for edge in edges {
        if !graph.contains_node(&edge.source) || !graph.contains_node(&edge.target) {
            warn!(
                source = %edge.source,
                target = %edge.target,
                "Edge endpoint missing from final node set, dropping edge"
            );
            summary.exclude(reason::ENDPOINT_MISSING);
            continue;
        }
        if graph.insert_edge(Edge::new(edge.source.clone(), edge.target.clone())) {
            summary.succeeded += 1;
        } else {
            summary.exclude(reason::DUPLICATE);
        }
    }

    // Must hold by construction; a failure here is an assembler defect
    // and halts the pipeline.
    graph.validate()?;

    Ok((graph, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use citegraph_common::models::PaperRecord;

    fn id(s: &str) -> PaperId {
        PaperId::from_doi(s).unwrap()
    }

    fn node(s: &str) -> (PaperId, MergedNode) {
        let paper = PaperRecord {
            id: id(s),
            title: Some(s.to_string()),
            authors: vec![],
            year: None,
            abstract_text: None,
            provider_id: None,
            references: vec![],
        };
        (id(s), MergedNode::merge(&paper, None))
    }

    fn edge(source: &str, target: &str) -> RawEdge {
        RawEdge {
            source: id(source),
            target: id(target),
        }
    }

    #[test]
    fn test_assembly_inserts_nodes_and_edges() {
        let nodes: BTreeMap<_, _> = [node("10.1/a"), node("10.1/b")].into_iter().collect();
        let (graph, summary) =
            assemble_graph(nodes, &[edge("10.1/a", "10.1/b")]).unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(summary.succeeded, 1);
    }

    #[test]
    fn test_missing_endpoint_drops_edge_without_fatal_error() {
        // B survived fetching but C did not; the (B -> C) edge passed
        // the collection filter and must be dropped quietly here.
        let nodes: BTreeMap<_, _> = [node("10.1/a"), node("10.1/b")].into_iter().collect();
        let (graph, summary) = assemble_graph(
            nodes,
            &[edge("10.1/a", "10.1/b"), edge("10.1/b", "10.1/c")],
        )
        .unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(summary.excluded.get(reason::ENDPOINT_MISSING), Some(&1));
    }

    #[test]
    fn test_duplicate_pairs_collapse() {
        let nodes: BTreeMap<_, _> = [node("10.1/a"), node("10.1/b")].into_iter().collect();
        let (graph, summary) = assemble_graph(
            nodes,
            &[edge("10.1/a", "10.1/b"), edge("10.1/a", "10.1/b")],
        )
        .unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(summary.excluded.get(reason::DUPLICATE), Some(&1));
    }

    #[test]
    fn test_empty_input_yields_empty_graph() {
        let (graph, summary) = assemble_graph(BTreeMap::new(), &[]).unwrap();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(summary.processed, 0);
    }
}
