//! Citation graph representation
//!
//! The graph is an explicit owned aggregate: a node table keyed by
//! `PaperId` and a deduplicated edge list. Only the assembler stage
//! inserts nodes and edges; after assembly the classifier stage may
//! update edge roles through [`CitationGraph::set_role`], nothing else
//! mutates the structure.

use crate::errors::{PipelineError, Result};
use crate::ids::PaperId;
use crate::models::{PaperRecord, TallyRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use tracing::warn;

/// Rhetorical role of a citation edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CitationRole {
    Support,
    Dispute,
    Background,
    Method,
    Unknown,
}

impl CitationRole {
    /// Parse a classifier-returned label
    ///
    /// Out-of-vocabulary labels collapse to `Background`, the neutral
    /// role; `Unknown` is reserved for classification failures.
    pub fn from_label(label: &str) -> CitationRole {
        match label.trim().to_ascii_uppercase().as_str() {
            "SUPPORT" => CitationRole::Support,
            "DISPUTE" => CitationRole::Dispute,
            "METHOD" => CitationRole::Method,
            _ => CitationRole::Background,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CitationRole::Support => "SUPPORT",
            CitationRole::Dispute => "DISPUTE",
            CitationRole::Background => "BACKGROUND",
            CitationRole::Method => "METHOD",
            CitationRole::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for CitationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified per-node attribute record: paper metadata plus tallies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedNode {
    pub id: PaperId,
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub abstract_text: Option<String>,
    pub provider_id: Option<String>,
    pub supporting: u32,
    pub contradicting: u32,
    pub mentioning: u32,
    pub unclassified: u32,
    pub total: u32,
    pub citing_publications: u32,
}

impl MergedNode {
    /// Join a paper record with its tallies
    ///
    /// Total over any paper: an absent tally substitutes zero counts
    /// rather than failing the merge.
    pub fn merge(paper: &PaperRecord, tally: Option<&TallyRecord>) -> MergedNode {
        let zero = TallyRecord::empty(paper.id.clone());
        let t = tally.unwrap_or(&zero);
        MergedNode {
            id: paper.id.clone(),
            title: paper.title.clone(),
            authors: paper.authors.clone(),
            year: paper.year,
            abstract_text: paper.abstract_text.clone(),
            provider_id: paper.provider_id.clone(),
            supporting: t.supporting,
            contradicting: t.contradicting,
            mentioning: t.mentioning,
            unclassified: t.unclassified,
            total: t.total,
            citing_publications: t.citing_publications,
        }
    }
}

/// Directed citation edge: source cites target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: PaperId,
    pub target: PaperId,
    pub role: CitationRole,
    pub confidence: Option<f32>,
}

impl Edge {
    pub fn new(source: PaperId, target: PaperId) -> Edge {
        Edge {
            source,
            target,
            role: CitationRole::Unknown,
            confidence: None,
        }
    }
}

/// The final owned citation graph aggregate
#[derive(Debug, Default)]
pub struct CitationGraph {
    /// Node table, ordered for stable artifacts
    nodes: BTreeMap<PaperId, MergedNode>,

    /// Edge list, one entry per ordered endpoint pair
    edges: Vec<Edge>,

    /// Dedup index over ordered endpoint pairs
    edge_index: HashMap<(PaperId, PaperId), usize>,
}

impl CitationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, keyed by its PaperId
    pub fn insert_node(&mut self, node: MergedNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Insert an edge after deduplication
    ///
    /// Returns false (and keeps the existing edge) when the ordered
    /// pair is already present.
    pub fn insert_edge(&mut self, edge: Edge) -> bool {
        let key = (edge.source.clone(), edge.target.clone());
        if self.edge_index.contains_key(&key) {
            return false;
        }
        self.edge_index.insert(key, self.edges.len());
        self.edges.push(edge);
        true
    }

    /// Update role and confidence on an existing edge
    ///
    /// The only mutation permitted after assembly. A conflicting
    /// overwrite favors the most recently computed value with a logged
    /// warning. Returns false when the pair is not in the graph.
    pub fn set_role(
        &mut self,
        source: &PaperId,
        target: &PaperId,
        role: CitationRole,
        confidence: Option<f32>,
    ) -> bool {
        let key = (source.clone(), target.clone());
        match self.edge_index.get(&key) {
            Some(&idx) => {
                let edge = &mut self.edges[idx];
                if edge.role != CitationRole::Unknown && edge.role != role {
                    warn!(
                        source = %source,
                        target = %target,
                        old = %edge.role,
                        new = %role,
                        "Overwriting conflicting edge role with newer value"
                    );
                }
                edge.role = role;
                edge.confidence = confidence;
                true
            }
            None => false,
        }
    }

    pub fn contains_node(&self, id: &PaperId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &PaperId) -> Option<&MergedNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &MergedNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Ordered endpoint pairs, for stages that iterate over edges
    /// while the graph itself stays borrowed elsewhere
    pub fn edge_pairs(&self) -> Vec<(PaperId, PaperId)> {
        self.edges
            .iter()
            .map(|e| (e.source.clone(), e.target.clone()))
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Check internal consistency: every edge endpoint must exist in
    /// the node table
    ///
    /// A violation indicates an upstream filter defect and is fatal;
    /// it must never be silently patched.
    pub fn validate(&self) -> Result<()> {
        let mut seen: HashSet<(&PaperId, &PaperId)> = HashSet::new();
        for edge in &self.edges {
            if !self.nodes.contains_key(&edge.source) {
                return Err(PipelineError::Consistency {
                    message: format!("edge source {} missing from node set", edge.source),
                });
            }
            if !self.nodes.contains_key(&edge.target) {
                return Err(PipelineError::Consistency {
                    message: format!("edge target {} missing from node set", edge.target),
                });
            }
            if !seen.insert((&edge.source, &edge.target)) {
                return Err(PipelineError::Consistency {
                    message: format!("duplicate edge {} -> {}", edge.source, edge.target),
                });
            }
        }
        Ok(())
    }
}
