//! Identity resolution
//!
//! Maps each export record to a single canonical [`PaperId`]: DOI
//! first, provider-native id as the fallback, exclusion with a warning
//! when neither is usable. Pure and deterministic; no network access.

use crate::export_input::ExportRecord;
use crate::report::{reason, StageSummary};
use citegraph_common::PaperId;
use std::collections::BTreeSet;
use tracing::warn;

/// Resolve export records to a sorted, deduplicated id list
///
/// The output order is stable across runs so downstream artifacts
/// diff cleanly.
pub fn resolve_ids(records: &[ExportRecord]) -> (Vec<PaperId>, StageSummary) {
    let mut summary = StageSummary::new("resolve");
    summary.processed = records.len();

    let mut ids = BTreeSet::new();
    for record in records {
        let id = record
            .doi
            .as_deref()
            .and_then(PaperId::from_doi)
            .or_else(|| {
                record
                    .provider_id
                    .as_deref()
                    .and_then(PaperId::from_provider)
            });
        match id {
            Some(id) => {
                ids.insert(id);
            }
            None => {
                warn!(?record, "Record has no usable identifier, excluding");
                summary.exclude(reason::UNRESOLVED);
            }
        }
    }

    summary.succeeded = ids.len();
    (ids.into_iter().collect(), summary)
}
