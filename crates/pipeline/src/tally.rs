//! Tally fetch stage
//!
//! Same cache-then-fetch discipline as the metadata stage, against the
//! sentiment tally service. Absence of tally data is not an error:
//! papers the service does not know get zero-count records, and even
//! permanent fetch failures demote to zero counts with a reported
//! exclusion rather than dropping the node.

use crate::cancel::CancelFlag;
use crate::report::{reason, StageSummary};
use citegraph_common::cache::ns;
use citegraph_common::clients::{RetryPolicy, TallySource};
use citegraph_common::errors::{PipelineError, Result};
use citegraph_common::models::TallyRecord;
use citegraph_common::{FileCache, PaperId};
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{instrument, warn};

enum Outcome {
    Cached(TallyRecord),
    Fetched(TallyRecord),
    Defaulted(TallyRecord, &'static str),
}

/// Fetch tallies for every fetched paper with bounded concurrency
#[instrument(skip_all, fields(ids = ids.len()))]
pub async fn fetch_tallies(
    ids: &[PaperId],
    cache: &FileCache,
    source: &dyn TallySource,
    retry: &RetryPolicy,
    delay: Duration,
    concurrency: usize,
    cancel: &CancelFlag,
) -> Result<(BTreeMap<PaperId, TallyRecord>, StageSummary)> {
    let mut summary = StageSummary::new("fetch_tallies");
    summary.processed = ids.len();

    let results: Vec<Result<(PaperId, Outcome)>> = stream::iter(ids.iter().cloned())
        .map(|id| async move { tally_one(id, cache, source, retry, delay, cancel).await })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut tallies = BTreeMap::new();
    for result in results {
        let (id, outcome) = result?;
        match outcome {
            Outcome::Cached(record) => {
                summary.from_cache += 1;
                summary.succeeded += 1;
                tallies.insert(id, record);
            }
            Outcome::Fetched(record) => {
                summary.succeeded += 1;
                tallies.insert(id, record);
            }
            Outcome::Defaulted(record, why) => {
                summary.exclude(why);
                tallies.insert(id, record);
            }
        }
    }

    Ok((tallies, summary))
}

async fn tally_one(
    id: PaperId,
    cache: &FileCache,
    source: &dyn TallySource,
    retry: &RetryPolicy,
    delay: Duration,
    cancel: &CancelFlag,
) -> Result<(PaperId, Outcome)> {
    if let Some(record) = cache.get::<TallyRecord>(ns::SCITE, id.as_str())? {
        return Ok((id, Outcome::Cached(record)));
    }
    if cancel.is_cancelled() {
        let zero = TallyRecord::empty(id.clone());
        return Ok((id, Outcome::Defaulted(zero, reason::CANCELLED)));
    }

    let result = retry.run("fetch_tallies", || source.fetch_tallies(&id)).await;
    // Politeness delay after each network round; cache hits skip it.
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    match result {
        Ok(record) => {
            cache.put(ns::SCITE, id.as_str(), &record)?;
            Ok((id, Outcome::Fetched(record)))
        }
        Err(e @ PipelineError::Transient { .. }) => {
            warn!(paper_id = %id, error = %e, "Tally retries exhausted, defaulting to zero counts");
            let zero = TallyRecord::empty(id.clone());
            Ok((id, Outcome::Defaulted(zero, reason::RETRIES_EXHAUSTED)))
        }
        Err(e @ PipelineError::Schema { .. }) => {
            warn!(paper_id = %id, error = %e, "Malformed tally payload, defaulting to zero counts");
            let zero = TallyRecord::empty(id.clone());
            Ok((id, Outcome::Defaulted(zero, reason::SCHEMA)))
        }
        Err(PipelineError::NotFound { .. }) => {
            // Clients map absence to zero counts themselves; keep the
            // same behavior if one surfaces it as NotFound instead.
            let zero = TallyRecord::empty(id.clone());
            Ok((id, Outcome::Defaulted(zero, reason::NOT_FOUND)))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct ScriptedTallies {
        calls: AtomicUsize,
    }

    impl ScriptedTallies {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TallySource for ScriptedTallies {
        async fn fetch_tallies(&self, id: &PaperId) -> Result<TallyRecord> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match id.as_str() {
                "10.1/down" => Err(PipelineError::Transient {
                    message: "upstream 503".into(),
                }),
                "10.1/garbled" => Err(PipelineError::Schema {
                    message: "unexpected shape".into(),
                }),
                _ => Ok(TallyRecord {
                    supporting: 7,
                    ..TallyRecord::empty(id.clone())
                }),
            }
        }
    }

    fn ids(raw: &[&str]) -> Vec<PaperId> {
        raw.iter().map(|s| PaperId::from_doi(s).unwrap()).collect()
    }

    #[tokio::test]
    async fn test_failures_default_to_zero_counts() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::open(dir.path()).unwrap();
        let source = ScriptedTallies::new();
        let retry = RetryPolicy::new(2, Duration::from_millis(1));

        let (tallies, summary) = fetch_tallies(
            &ids(&["10.1/a", "10.1/down", "10.1/garbled"]),
            &cache,
            &source,
            &retry,
            Duration::ZERO,
            2,
            &CancelFlag::new(),
        )
        .await
        .unwrap();

        // Every id gets a record; failures just carry zeros
        assert_eq!(tallies.len(), 3);
        assert_eq!(
            tallies[&PaperId::from_doi("10.1/a").unwrap()].supporting,
            7
        );
        assert_eq!(
            tallies[&PaperId::from_doi("10.1/down").unwrap()].supporting,
            0
        );
        assert_eq!(summary.excluded.get(reason::RETRIES_EXHAUSTED), Some(&1));
        assert_eq!(summary.excluded.get(reason::SCHEMA), Some(&1));
    }

    #[tokio::test]
    async fn test_warm_cache_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::open(dir.path()).unwrap();
        let retry = RetryPolicy::new(2, Duration::from_millis(1));
        let ids = ids(&["10.1/a"]);

        let first = ScriptedTallies::new();
        fetch_tallies(&ids, &cache, &first, &retry, Duration::ZERO, 1, &CancelFlag::new())
            .await
            .unwrap();
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);

        let second = ScriptedTallies::new();
        let (tallies, summary) =
            fetch_tallies(&ids, &cache, &second, &retry, Duration::ZERO, 1, &CancelFlag::new())
                .await
                .unwrap();
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
        assert_eq!(summary.from_cache, 1);
        assert_eq!(tallies.len(), 1);
    }
}
