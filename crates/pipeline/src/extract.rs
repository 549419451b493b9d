//! Citation edge extraction
//!
//! Derives raw directed edges from each fetched paper's reference
//! list. References are normalized with the same rule the identity
//! resolver uses; references that match a fetched paper's
//! provider-native id are remapped to that paper's canonical id so the
//! collection filter sees one identity scheme. Self-references and
//! unnormalizable references are dropped silently; they are expected
//! noise from upstream metadata, not pipeline errors.

use citegraph_common::models::PaperRecord;
use citegraph_common::PaperId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Directed citation candidate: source cites target
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawEdge {
    pub source: PaperId,
    pub target: PaperId,
}

/// Extract the raw edge set, including edges pointing outside the
/// working collection
pub fn extract_edges(papers: &BTreeMap<PaperId, PaperRecord>) -> Vec<RawEdge> {
    // Provider id -> canonical id, so reference lists expressed in
    // provider ids join up with DOI-keyed papers.
    let provider_index: HashMap<String, PaperId> = papers
        .values()
        .filter_map(|p| {
            p.provider_id
                .as_ref()
                .map(|pid| (pid.trim().to_ascii_lowercase(), p.id.clone()))
        })
        .collect();

    let mut edges = Vec::new();
    for paper in papers.values() {
        for raw in &paper.references {
            let Some(target) = normalize_reference(raw, &provider_index) else {
                debug!(source = %paper.id, reference = raw, "Dropping unnormalizable reference");
                continue;
            };
            if target == paper.id {
                debug!(source = %paper.id, "Dropping self-reference");
                continue;
            }
            edges.push(RawEdge {
                source: paper.id.clone(),
                target,
            });
        }
    }
    edges
}

fn normalize_reference(raw: &str, provider_index: &HashMap<String, PaperId>) -> Option<PaperId> {
    if let Some(doi) = PaperId::from_doi(raw) {
        return Some(doi);
    }
    let provider = PaperId::from_provider(raw)?;
    Some(
        provider_index
            .get(provider.as_str())
            .cloned()
            .unwrap_or(provider),
    )
}
