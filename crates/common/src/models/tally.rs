//! Aggregate citation-sentiment tallies

use crate::ids::PaperId;
use serde::{Deserialize, Serialize};

/// Per-paper sentiment tallies from the aggregate tally service
///
/// Absence of tally data upstream is a legitimate outcome, so every
/// count defaults to zero. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyRecord {
    pub id: PaperId,

    #[serde(default)]
    pub supporting: u32,

    #[serde(default)]
    pub contradicting: u32,

    #[serde(default)]
    pub mentioning: u32,

    #[serde(default)]
    pub unclassified: u32,

    #[serde(default)]
    pub total: u32,

    #[serde(default)]
    pub citing_publications: u32,
}

impl TallyRecord {
    /// Zero-count record for a paper with no tally data upstream
    pub fn empty(id: PaperId) -> Self {
        Self {
            id,
            supporting: 0,
            contradicting: 0,
            mentioning: 0,
            unclassified: 0,
            total: 0,
            citing_publications: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tally_is_all_zero() {
        let id = PaperId::from_doi("10.1/x").unwrap();
        let t = TallyRecord::empty(id.clone());
        assert_eq!(t.id, id);
        assert_eq!(t.supporting, 0);
        assert_eq!(t.contradicting, 0);
        assert_eq!(t.mentioning, 0);
        assert_eq!(t.total, 0);
    }

    #[test]
    fn test_missing_counts_deserialize_to_zero() {
        let t: TallyRecord =
            serde_json::from_str(r#"{"id": "10.1/x", "supporting": 3}"#).unwrap();
        assert_eq!(t.supporting, 3);
        assert_eq!(t.contradicting, 0);
        assert_eq!(t.citing_publications, 0);
    }
}
