//! Edge role classification stage
//!
//! For each assembled edge, asks the external classifier why the
//! source paper cites the target, using the title and abstract of both
//! endpoints (missing text degrades to empty strings, the request is
//! still issued). Results are cached per ordered pair so idempotent
//! re-runs reuse them. A failed classification leaves the edge at
//! `UNKNOWN` and is counted; it never aborts the run.

use crate::cancel::CancelFlag;
use crate::report::{reason, StageSummary};
use citegraph_common::cache::ns;
use citegraph_common::clients::{EdgeTextPair, RetryPolicy, RoleAssignment, RoleClassifier};
use citegraph_common::errors::{PipelineError, Result};
use citegraph_common::models::CitationGraph;
use citegraph_common::{FileCache, PaperId};
use futures::stream::{self, StreamExt};
use tracing::{instrument, warn};

enum Outcome {
    Cached(RoleAssignment),
    Classified(RoleAssignment),
    Failed(&'static str),
}

/// Cache key for one ordered endpoint pair
fn edge_key(source: &PaperId, target: &PaperId) -> String {
    format!("{source}->{target}")
}

/// Classify every edge in the graph with bounded concurrency
#[instrument(skip_all, fields(edges = graph.edge_count()))]
pub async fn classify_edges(
    graph: &mut CitationGraph,
    cache: &FileCache,
    classifier: &dyn RoleClassifier,
    retry: &RetryPolicy,
    concurrency: usize,
    cancel: &CancelFlag,
) -> Result<StageSummary> {
    let mut summary = StageSummary::new("classify");

    // Snapshot pairs and endpoint text first; the graph itself is only
    // touched again when verdicts are applied.
    let units: Vec<(PaperId, PaperId, EdgeTextPair)> = graph
        .edge_pairs()
        .into_iter()
        .map(|(source, target)| {
            let pair = EdgeTextPair {
                source_title: node_title(graph, &source),
                source_abstract: node_abstract(graph, &source),
                target_title: node_title(graph, &target),
                target_abstract: node_abstract(graph, &target),
            };
            (source, target, pair)
        })
        .collect();
    summary.processed = units.len();

    let results: Vec<Result<(PaperId, PaperId, Outcome)>> = stream::iter(units)
        .map(|(source, target, pair)| async move {
            let outcome = classify_one(&source, &target, &pair, cache, classifier, retry, cancel)
                .await?;
            Ok((source, target, outcome))
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    for result in results {
        let (source, target, outcome) = result?;
        match outcome {
            Outcome::Cached(assignment) => {
                summary.from_cache += 1;
                summary.succeeded += 1;
                graph.set_role(&source, &target, assignment.role, assignment.confidence);
            }
            Outcome::Classified(assignment) => {
                summary.succeeded += 1;
                graph.set_role(&source, &target, assignment.role, assignment.confidence);
            }
            Outcome::Failed(why) => summary.exclude(why),
        }
    }

    Ok(summary)
}

fn node_title(graph: &CitationGraph, id: &PaperId) -> String {
    graph
        .node(id)
        .and_then(|n| n.title.clone())
        .unwrap_or_default()
}

fn node_abstract(graph: &CitationGraph, id: &PaperId) -> String {
    graph
        .node(id)
        .and_then(|n| n.abstract_text.clone())
        .unwrap_or_default()
}

async fn classify_one(
    source: &PaperId,
    target: &PaperId,
    pair: &EdgeTextPair,
    cache: &FileCache,
    classifier: &dyn RoleClassifier,
    retry: &RetryPolicy,
    cancel: &CancelFlag,
) -> Result<Outcome> {
    let key = edge_key(source, target);
    if let Some(assignment) = cache.get::<RoleAssignment>(ns::EDGE_ROLES, &key)? {
        return Ok(Outcome::Cached(assignment));
    }
    if cancel.is_cancelled() {
        return Ok(Outcome::Failed(reason::CANCELLED));
    }

    match retry.run("classify_edge", || classifier.classify(pair)).await {
        Ok(assignment) => {
            cache.put(ns::EDGE_ROLES, &key, &assignment)?;
            Ok(Outcome::Classified(assignment))
        }
        Err(
            e @ (PipelineError::Classification { .. }
            | PipelineError::Transient { .. }
            | PipelineError::Schema { .. }),
        ) => {
            warn!(
                source = %source,
                target = %target,
                error = %e,
                "Classification failed, edge keeps UNKNOWN role"
            );
            Ok(Outcome::Failed(reason::CLASSIFICATION_FAILED))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use citegraph_common::models::{CitationRole, Edge, MergedNode, PaperRecord};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct ScriptedClassifier {
        calls: AtomicUsize,
    }

    impl ScriptedClassifier {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RoleClassifier for ScriptedClassifier {
        async fn classify(&self, pair: &EdgeTextPair) -> Result<RoleAssignment> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if pair.source_title.contains("broken") {
                return Err(PipelineError::Classification {
                    message: "model rambled".into(),
                });
            }
            Ok(RoleAssignment {
                role: CitationRole::Support,
                confidence: Some(0.8),
                reason: None,
            })
        }
    }

    fn id(s: &str) -> PaperId {
        PaperId::from_doi(s).unwrap()
    }

    fn graph_with_edge(source_title: &str) -> CitationGraph {
        let mut graph = CitationGraph::new();
        for (doi, title) in [("10.1/a", source_title), ("10.1/b", "cited paper")] {
            let paper = PaperRecord {
                id: id(doi),
                title: Some(title.to_string()),
                authors: vec![],
                year: None,
                abstract_text: Some("an abstract".into()),
                provider_id: None,
                references: vec![],
            };
            graph.insert_node(MergedNode::merge(&paper, None));
        }
        graph.insert_edge(Edge::new(id("10.1/a"), id("10.1/b")));
        graph
    }

    fn retry() -> RetryPolicy {
        RetryPolicy::new(2, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_roles_are_applied_to_edges() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::open(dir.path()).unwrap();
        let classifier = ScriptedClassifier::new();
        let mut graph = graph_with_edge("citing paper");

        let summary = classify_edges(
            &mut graph,
            &cache,
            &classifier,
            &retry(),
            2,
            &CancelFlag::new(),
        )
        .await
        .unwrap();

        assert_eq!(summary.succeeded, 1);
        let edge = &graph.edges()[0];
        assert_eq!(edge.role, CitationRole::Support);
        assert_eq!(edge.confidence, Some(0.8));
    }

    #[tokio::test]
    async fn test_failure_leaves_unknown_role() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::open(dir.path()).unwrap();
        let classifier = ScriptedClassifier::new();
        let mut graph = graph_with_edge("broken prompt");

        let summary = classify_edges(
            &mut graph,
            &cache,
            &classifier,
            &retry(),
            1,
            &CancelFlag::new(),
        )
        .await
        .unwrap();

        assert_eq!(
            summary.excluded.get(reason::CLASSIFICATION_FAILED),
            Some(&1)
        );
        assert_eq!(graph.edges()[0].role, CitationRole::Unknown);
        // A failed verdict must never be cached
        assert!(!cache.contains(ns::EDGE_ROLES, &edge_key(&id("10.1/a"), &id("10.1/b"))));
    }

    #[tokio::test]
    async fn test_rerun_reuses_cached_verdicts() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::open(dir.path()).unwrap();
        let mut graph = graph_with_edge("citing paper");

        let first = ScriptedClassifier::new();
        classify_edges(&mut graph, &cache, &first, &retry(), 1, &CancelFlag::new())
            .await
            .unwrap();
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);

        let mut graph2 = graph_with_edge("citing paper");
        let second = ScriptedClassifier::new();
        let summary = classify_edges(
            &mut graph2,
            &cache,
            &second,
            &retry(),
            1,
            &CancelFlag::new(),
        )
        .await
        .unwrap();
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
        assert_eq!(summary.from_cache, 1);
        assert_eq!(graph2.edges()[0].role, CitationRole::Support);
    }
}
