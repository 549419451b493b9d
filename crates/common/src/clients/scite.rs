//! scite.ai tally client
//!
//! Retrieves aggregate citation-sentiment counts per paper. A 404 from
//! the service is not a failure: papers without tally data get a
//! zero-count record, since "no tally data" is a common, legitimate
//! outcome.

use crate::errors::{PipelineError, Result};
use crate::ids::PaperId;
use crate::models::TallyRecord;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Trait for aggregate tally lookups
#[async_trait]
pub trait TallySource: Send + Sync {
    async fn fetch_tallies(&self, id: &PaperId) -> Result<TallyRecord>;
}

/// scite.ai API client
pub struct SciteClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ScitePayload {
    #[serde(default)]
    supporting: u32,
    #[serde(default)]
    contradicting: u32,
    #[serde(default)]
    mentioning: u32,
    #[serde(default)]
    unclassified: u32,
    #[serde(default)]
    total: u32,
    #[serde(default, rename = "citingPublications")]
    citing_publications: u32,
}

impl SciteClient {
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Config {
                message: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }
}

#[async_trait]
impl TallySource for SciteClient {
    async fn fetch_tallies(&self, id: &PaperId) -> Result<TallyRecord> {
        let url = format!("{}/tallies/{}", self.base_url, id);
        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!(paper_id = %id, "No tally data, defaulting to zero counts");
                Ok(TallyRecord::empty(id.clone()))
            }
            status if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() => {
                Err(PipelineError::Transient {
                    message: format!("scite returned {status} for {id}"),
                })
            }
            status if !status.is_success() => Err(PipelineError::Schema {
                message: format!("scite returned {status} for {id}"),
            }),
            _ => {
                let payload: ScitePayload =
                    response.json().await.map_err(|e| PipelineError::Schema {
                        message: format!("Failed to decode scite tallies for {id}: {e}"),
                    })?;
                Ok(TallyRecord {
                    id: id.clone(),
                    supporting: payload.supporting,
                    contradicting: payload.contradicting,
                    mentioning: payload.mentioning,
                    unclassified: payload.unclassified,
                    total: payload.total,
                    citing_publications: payload.citing_publications,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_defaults_missing_counts() {
        let payload: ScitePayload =
            serde_json::from_str(r#"{"supporting": 4, "citingPublications": 9}"#).unwrap();
        assert_eq!(payload.supporting, 4);
        assert_eq!(payload.contradicting, 0);
        assert_eq!(payload.citing_publications, 9);
    }

    #[test]
    fn test_payload_empty_object() {
        let payload: ScitePayload = serde_json::from_str("{}").unwrap();
        assert_eq!(payload.total, 0);
        assert_eq!(payload.mentioning, 0);
    }
}
