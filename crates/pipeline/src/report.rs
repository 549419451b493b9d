//! Stage summaries and the end-of-run report
//!
//! Each stage reports how many items it processed, how many came from
//! the cache, and every exclusion grouped by reason, so silent data
//! loss is never possible.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Exclusion reason labels used across stages
pub mod reason {
    pub const UNRESOLVED: &str = "unresolved";
    pub const NOT_FOUND: &str = "not_found";
    pub const RETRIES_EXHAUSTED: &str = "retries_exhausted";
    pub const SCHEMA: &str = "schema";
    pub const CLASSIFICATION_FAILED: &str = "classification_failed";
    pub const OUTSIDE_COLLECTION: &str = "outside_collection";
    pub const DUPLICATE: &str = "duplicate";
    pub const ENDPOINT_MISSING: &str = "endpoint_missing";
    pub const CANCELLED: &str = "cancelled";
}

/// Outcome counts for one pipeline stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSummary {
    pub stage: String,
    pub processed: usize,
    pub succeeded: usize,
    pub from_cache: usize,
    pub excluded: BTreeMap<String, usize>,
}

impl StageSummary {
    pub fn new(stage: &str) -> Self {
        Self {
            stage: stage.to_string(),
            processed: 0,
            succeeded: 0,
            from_cache: 0,
            excluded: BTreeMap::new(),
        }
    }

    /// Count one excluded item under a reason label
    pub fn exclude(&mut self, reason: &str) {
        *self.excluded.entry(reason.to_string()).or_insert(0) += 1;
    }

    pub fn excluded_total(&self) -> usize {
        self.excluded.values().sum()
    }

    /// Emit the stage outcome as a structured log line
    pub fn log(&self) {
        info!(
            stage = %self.stage,
            processed = self.processed,
            succeeded = self.succeeded,
            from_cache = self.from_cache,
            excluded = self.excluded_total(),
            reasons = ?self.excluded,
            "Stage complete"
        );
    }
}

/// All stage summaries for one completed run
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub stages: Vec<StageSummary>,
}

impl RunReport {
    pub fn add(&mut self, summary: StageSummary) {
        summary.log();
        self.stages.push(summary);
    }

    pub fn stage(&self, name: &str) -> Option<&StageSummary> {
        self.stages.iter().find(|s| s.stage == name)
    }
}
