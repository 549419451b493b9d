//! Pipeline orchestration
//!
//! Drives the stages in order and persists an artifact after each one
//! so a run can be inspected stage by stage. Artifacts are plain JSON
//! under the output directory, plus the two CSV tables and a final
//! `run_report.json` with per-stage counts.

use crate::artifacts::write_json;
use crate::cancel::CancelFlag;
use crate::classify::classify_edges;
use crate::export::export_tables;
use crate::export_input::load_export;
use crate::extract::extract_edges;
use crate::fetch::fetch_metadata;
use crate::filter::filter_edges;
use crate::graph::assemble_graph;
use crate::merge::merge_nodes;
use crate::report::RunReport;
use crate::resolve::resolve_ids;
use crate::tally::fetch_tallies;
use citegraph_common::clients::{
    MetadataSource, OpenAiClassifier, OpenAlexClient, RetryPolicy, RoleClassifier, SciteClient,
    TallySource,
};
use citegraph_common::errors::Result;
use citegraph_common::{AppConfig, FileCache};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// External services the pipeline talks to
///
/// Held as trait objects so tests can substitute scripted
/// implementations for the network clients.
pub struct Services {
    pub metadata: Arc<dyn MetadataSource>,
    pub tallies: Arc<dyn TallySource>,
    /// Absent when no classifier API key is configured; classification
    /// is then skipped and every edge keeps the UNKNOWN role.
    pub classifier: Option<Arc<dyn RoleClassifier>>,
}

impl Services {
    /// Build the real HTTP clients from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let metadata: Arc<dyn MetadataSource> = Arc::new(OpenAlexClient::new(
            config.openalex.base_url.clone(),
            config.openalex.mailto.clone(),
            config.openalex_timeout(),
        )?);
        let tallies: Arc<dyn TallySource> = Arc::new(SciteClient::new(
            config.scite.base_url.clone(),
            config.scite.api_key.clone(),
            config.scite_timeout(),
        )?);
        let classifier: Option<Arc<dyn RoleClassifier>> = match &config.classifier.api_key {
            Some(key) => Some(Arc::new(OpenAiClassifier::new(
                config.classifier.base_url.clone(),
                key.clone(),
                config.classifier.model.clone(),
                config.classifier_timeout(),
            )?)),
            None => {
                warn!("No classifier API key configured, edges will keep the UNKNOWN role");
                None
            }
        };
        Ok(Self {
            metadata,
            tallies,
            classifier,
        })
    }
}

/// Run the full pipeline from a bibliographic export to graph tables
#[instrument(skip_all, fields(export = %export_path.display()))]
pub async fn run_pipeline(
    config: &AppConfig,
    services: &Services,
    export_path: &Path,
    out_dir: &Path,
    cancel: &CancelFlag,
) -> Result<RunReport> {
    let cache = FileCache::open(&config.cache.root)?;
    let retry = RetryPolicy::new(
        config.pipeline.max_attempts,
        config.retry_base_delay(),
    );
    let concurrency = config.pipeline.concurrency;
    let mut report = RunReport::default();

    let records = load_export(export_path)?;
    info!(records = records.len(), "Loaded bibliographic export");

    let (ids, summary) = resolve_ids(&records);
    write_json(&out_dir.join("doi_list.json"), &ids)?;
    report.add(summary);

    let (papers, summary) = fetch_metadata(
        &ids,
        &cache,
        services.metadata.as_ref(),
        &retry,
        config.openalex_delay(),
        concurrency,
        cancel,
    )
    .await?;
    write_json(&out_dir.join("papers.json"), &papers)?;
    report.add(summary);

    let raw_edges = extract_edges(&papers);
    write_json(&out_dir.join("edges_raw.json"), &raw_edges)?;

    let collection: BTreeSet<_> = ids.iter().cloned().collect();
    let (edges, summary) = filter_edges(&raw_edges, &collection);
    write_json(&out_dir.join("edges_collection.json"), &edges)?;
    report.add(summary);

    // Tallies only for papers that were actually fetched.
    let fetched: Vec<_> = papers.keys().cloned().collect();
    let (tallies, summary) = fetch_tallies(
        &fetched,
        &cache,
        services.tallies.as_ref(),
        &retry,
        config.scite_delay(),
        concurrency,
        cancel,
    )
    .await?;
    write_json(&out_dir.join("tallies.json"), &tallies)?;
    report.add(summary);

    let nodes = merge_nodes(&papers, &tallies);
    write_json(&out_dir.join("nodes_merged.json"), &nodes)?;

    let (mut graph, summary) = assemble_graph(nodes, &edges)?;
    report.add(summary);

    if let Some(classifier) = &services.classifier {
        let summary = classify_edges(
            &mut graph,
            &cache,
            classifier.as_ref(),
            &retry,
            concurrency,
            cancel,
        )
        .await?;
        report.add(summary);
    }

    export_tables(
        &graph,
        &out_dir.join("graph_nodes.csv"),
        &out_dir.join("graph_edges.csv"),
    )?;
    write_json(&out_dir.join("run_report.json"), &report)?;

    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "Pipeline complete"
    );
    Ok(report)
}
