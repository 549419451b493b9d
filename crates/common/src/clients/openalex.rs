//! OpenAlex metadata client
//!
//! Resolves a `PaperId` to a full work record. Response payloads are
//! decoded into an explicit [`OpenAlexWork`] at the boundary; shapes
//! that do not carry a work id are rejected as schema errors rather
//! than propagated downstream. Abstracts arrive as an inverted index
//! and are reconstructed into plain text here.

use crate::errors::{PipelineError, Result};
use crate::ids::PaperId;
use crate::models::PaperRecord;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Trait for paper metadata lookups
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch the metadata record for one paper
    ///
    /// Fails with `NotFound` when the service has no record and
    /// `Transient` on network or rate-limit failures.
    async fn fetch_work(&self, id: &PaperId) -> Result<PaperRecord>;
}

/// OpenAlex API client
pub struct OpenAlexClient {
    client: reqwest::Client,
    base_url: String,
    mailto: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAlexWork {
    id: Option<String>,
    title: Option<String>,
    display_name: Option<String>,
    publication_year: Option<i32>,
    #[serde(default)]
    authorships: Vec<Authorship>,
    abstract_inverted_index: Option<HashMap<String, Vec<usize>>>,
    #[serde(default)]
    referenced_works: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Authorship {
    author: Option<Author>,
}

#[derive(Debug, Deserialize)]
struct Author {
    display_name: Option<String>,
}

impl OpenAlexClient {
    pub fn new(base_url: String, mailto: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Config {
                message: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url,
            mailto,
        })
    }

    /// Work endpoint for an id: DOIs go through the doi.org alias,
    /// provider ids are used directly
    fn work_url(&self, id: &PaperId) -> String {
        if id.is_doi() {
            format!("{}/works/https://doi.org/{}", self.base_url, id)
        } else {
            format!("{}/works/{}", self.base_url, id)
        }
    }

    async fn get_work(&self, id: &PaperId) -> Result<OpenAlexWork> {
        let mut request = self.client.get(self.work_url(id));
        if let Some(mailto) = &self.mailto {
            request = request.query(&[("mailto", mailto.as_str())]);
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(PipelineError::NotFound { id: id.to_string() }),
            status if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() => {
                Err(PipelineError::Transient {
                    message: format!("OpenAlex returned {status} for {id}"),
                })
            }
            status if !status.is_success() => Err(PipelineError::Schema {
                message: format!("OpenAlex returned {status} for {id}"),
            }),
            _ => response
                .json::<OpenAlexWork>()
                .await
                .map_err(|e| PipelineError::Schema {
                    message: format!("Failed to decode OpenAlex work for {id}: {e}"),
                }),
        }
    }
}

#[async_trait]
impl MetadataSource for OpenAlexClient {
    async fn fetch_work(&self, id: &PaperId) -> Result<PaperRecord> {
        let work = self.get_work(id).await?;
        work_to_record(id, work)
    }
}

/// Convert a decoded work into the pipeline's paper record, keyed by
/// the id that was asked for
fn work_to_record(id: &PaperId, work: OpenAlexWork) -> Result<PaperRecord> {
    let provider_id = work.id.ok_or_else(|| PipelineError::Schema {
        message: format!("OpenAlex work for {id} has no id field"),
    })?;

    let abstract_text = work
        .abstract_inverted_index
        .as_ref()
        .map(reconstruct_abstract)
        .filter(|s| !s.is_empty());

    let authors = work
        .authorships
        .into_iter()
        .filter_map(|a| a.author.and_then(|a| a.display_name))
        .collect();

    Ok(PaperRecord {
        id: id.clone(),
        title: work.title.or(work.display_name),
        authors,
        year: work.publication_year,
        abstract_text,
        provider_id: Some(provider_id),
        references: work.referenced_works,
    })
}

/// Rebuild plain abstract text from an OpenAlex inverted index
///
/// Each word is placed at its minimum recorded position; ties keep an
/// arbitrary but deterministic order after sorting.
pub fn reconstruct_abstract(inverted: &HashMap<String, Vec<usize>>) -> String {
    let mut positioned: Vec<(usize, &str)> = inverted
        .iter()
        .filter_map(|(word, positions)| {
            positions
                .iter()
                .min()
                .map(|&first| (first, word.as_str()))
        })
        .collect();
    positioned.sort();
    positioned
        .into_iter()
        .map(|(_, word)| word)
        .collect::<Vec<_>>()
        .join(" ")
}
