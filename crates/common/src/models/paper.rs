//! Paper metadata record

use crate::ids::PaperId;
use serde::{Deserialize, Serialize};

/// Full metadata record for one paper, as resolved by the metadata
/// fetcher on first successful lookup
///
/// Cached indefinitely and never mutated in place; tallies land on a
/// separate [`MergedNode`](crate::models::MergedNode) instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub id: PaperId,

    pub title: Option<String>,

    /// Author display names, in publication order
    #[serde(default)]
    pub authors: Vec<String>,

    pub year: Option<i32>,

    pub abstract_text: Option<String>,

    /// Provider-native identifier (e.g. OpenAlex work URL)
    pub provider_id: Option<String>,

    /// Raw reference identifiers as found upstream, pre-normalization
    #[serde(default)]
    pub references: Vec<String>,
}
