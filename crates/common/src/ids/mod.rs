//! Canonical paper identifiers
//!
//! A `PaperId` is the normalized identity every stage keys on. DOIs are
//! preferred; records without one fall back to a provider-native id
//! (e.g. an OpenAlex work URL). Normalization is total, deterministic
//! and idempotent: normalizing an already-normalized id is a no-op.

use serde::{Deserialize, Serialize};
use std::fmt;

/// URL/scheme prefixes stripped off raw DOI strings, longest first
const DOI_PREFIXES: &[&str] = &[
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "https://doi.org/",
    "http://doi.org/",
    "doi:",
];

/// Normalized canonical identifier for a paper
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaperId(String);

impl PaperId {
    /// Normalize a raw DOI string into a canonical id
    ///
    /// Strips known URL/scheme prefixes, trims whitespace and
    /// lowercases. Returns `None` when the remainder does not look
    /// like a DOI: a DOI always starts with the `10.` registrant
    /// prefix and contains a `/`. Provider URLs (e.g. OpenAlex work
    /// URLs) fail this shape check and must go through
    /// [`PaperId::from_provider`] instead.
    pub fn from_doi(raw: &str) -> Option<PaperId> {
        let mut doi = raw.trim();
        let lower = doi.to_ascii_lowercase();
        for prefix in DOI_PREFIXES {
            if lower.starts_with(prefix) {
                doi = &doi[prefix.len()..];
                break;
            }
        }
        let doi = doi.trim();
        if !doi.starts_with("10.") || !doi.contains('/') {
            return None;
        }
        Some(PaperId(doi.to_ascii_lowercase()))
    }

    /// Normalize a provider-native identifier (fallback when no DOI)
    pub fn from_provider(raw: &str) -> Option<PaperId> {
        let id = raw.trim();
        if id.is_empty() {
            return None;
        }
        Some(PaperId(id.to_ascii_lowercase()))
    }

    /// Whether this id is a DOI (as opposed to a provider id)
    pub fn is_doi(&self) -> bool {
        self.0.starts_with("10.")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaperId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_url_prefixes() {
        for raw in [
            "https://doi.org/10.1234/ABC.5",
            "http://doi.org/10.1234/abc.5",
            "https://dx.doi.org/10.1234/Abc.5",
            "doi:10.1234/abc.5",
            "  10.1234/abc.5  ",
        ] {
            assert_eq!(
                PaperId::from_doi(raw).unwrap().as_str(),
                "10.1234/abc.5",
                "failed for {raw:?}"
            );
        }
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let once = PaperId::from_doi("https://doi.org/10.1234/ABC").unwrap();
        let twice = PaperId::from_doi(once.as_str()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rejects_non_doi_strings() {
        assert!(PaperId::from_doi("").is_none());
        assert!(PaperId::from_doi("   ").is_none());
        assert!(PaperId::from_doi("not-a-doi").is_none());
        assert!(PaperId::from_doi("doi:").is_none());
    }

    #[test]
    fn test_rejects_provider_urls() {
        // Work URLs contain a `/` but are not DOIs; they must take the
        // provider path so the extract stage can remap them.
        assert!(PaperId::from_doi("https://openalex.org/W2").is_none());
        assert!(PaperId::from_doi("https://example.org/record/42").is_none());
    }

    #[test]
    fn test_provider_fallback() {
        let id = PaperId::from_provider(" https://openalex.org/W123 ").unwrap();
        assert_eq!(id.as_str(), "https://openalex.org/w123");
        assert!(!id.is_doi());
        assert!(PaperId::from_provider("").is_none());
    }

    #[test]
    fn test_doi_detection() {
        assert!(PaperId::from_doi("10.1/x").unwrap().is_doi());
    }
}
