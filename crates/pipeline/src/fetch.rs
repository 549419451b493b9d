//! Metadata fetch stage
//!
//! Resolves every collection id to a full [`PaperRecord`] through the
//! persistent cache: a hit short-circuits the network, a miss goes to
//! the metadata service under the bounded retry policy, and every
//! successful fetch is durably cached before it is returned. Ids whose
//! lookups fail permanently are excluded with a per-reason count; a
//! warm-cache re-run performs zero network calls.

use crate::cancel::CancelFlag;
use crate::report::{reason, StageSummary};
use citegraph_common::cache::ns;
use citegraph_common::clients::{MetadataSource, RetryPolicy};
use citegraph_common::errors::{PipelineError, Result};
use citegraph_common::models::PaperRecord;
use citegraph_common::{FileCache, PaperId};
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{instrument, warn};

enum Outcome {
    Cached(PaperRecord),
    Fetched(PaperRecord),
    Excluded(&'static str),
}

/// Fetch metadata for all collection ids with bounded concurrency
///
/// Per-id failures exclude that id only; siblings proceed. Completion
/// order never affects the output map.
#[instrument(skip_all, fields(ids = ids.len()))]
pub async fn fetch_metadata(
    ids: &[PaperId],
    cache: &FileCache,
    source: &dyn MetadataSource,
    retry: &RetryPolicy,
    delay: Duration,
    concurrency: usize,
    cancel: &CancelFlag,
) -> Result<(BTreeMap<PaperId, PaperRecord>, StageSummary)> {
    let mut summary = StageSummary::new("fetch_metadata");
    summary.processed = ids.len();

    let results: Vec<Result<(PaperId, Outcome)>> = stream::iter(ids.iter().cloned())
        .map(|id| async move { fetch_one(id, cache, source, retry, delay, cancel).await })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut papers = BTreeMap::new();
    for result in results {
        let (id, outcome) = result?;
        match outcome {
            Outcome::Cached(record) => {
                summary.from_cache += 1;
                summary.succeeded += 1;
                papers.insert(id, record);
            }
            Outcome::Fetched(record) => {
                summary.succeeded += 1;
                papers.insert(id, record);
            }
            Outcome::Excluded(why) => summary.exclude(why),
        }
    }

    Ok((papers, summary))
}

async fn fetch_one(
    id: PaperId,
    cache: &FileCache,
    source: &dyn MetadataSource,
    retry: &RetryPolicy,
    delay: Duration,
    cancel: &CancelFlag,
) -> Result<(PaperId, Outcome)> {
    if let Some(record) = cache.get::<PaperRecord>(ns::OPENALEX, id.as_str())? {
        return Ok((id, Outcome::Cached(record)));
    }
    if cancel.is_cancelled() {
        return Ok((id, Outcome::Excluded(reason::CANCELLED)));
    }

    let result = retry.run("fetch_metadata", || source.fetch_work(&id)).await;
    // Politeness delay after each network round; cache hits skip it.
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    match result {
        Ok(record) => {
            // Durable before returned: a crash after this point never
            // loses the fetch.
            cache.put(ns::OPENALEX, id.as_str(), &record)?;
            Ok((id, Outcome::Fetched(record)))
        }
        Err(PipelineError::NotFound { .. }) => {
            warn!(paper_id = %id, "No metadata record upstream, excluding");
            Ok((id, Outcome::Excluded(reason::NOT_FOUND)))
        }
        Err(e @ PipelineError::Transient { .. }) => {
            warn!(paper_id = %id, error = %e, "Retries exhausted, excluding");
            Ok((id, Outcome::Excluded(reason::RETRIES_EXHAUSTED)))
        }
        Err(e @ PipelineError::Schema { .. }) => {
            warn!(paper_id = %id, error = %e, "Malformed metadata payload, excluding");
            Ok((id, Outcome::Excluded(reason::SCHEMA)))
        }
        Err(e) => Err(e),
    }
}
