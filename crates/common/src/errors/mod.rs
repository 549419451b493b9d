//! Error types for the CiteGraph pipeline
//!
//! Provides:
//! - The failure taxonomy shared by every stage (not-found, transient,
//!   schema, classification, consistency)
//! - Retry classification via [`PipelineError::is_transient`]
//! - Conversions from ambient error sources (IO, JSON, HTTP)

use thiserror::Error;

/// Result type alias using PipelineError
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Pipeline error types
///
/// Per-record failures (`NotFound`, `Transient`, `Schema`,
/// `Classification`) are isolated by the stage that hits them and
/// surfaced in the stage summary. Only `Consistency` halts a run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No record for {id}")]
    NotFound { id: String },

    #[error("Transient upstream failure: {message}")]
    Transient { message: String },

    #[error("Malformed upstream payload: {message}")]
    Schema { message: String },

    #[error("Classifier failure: {message}")]
    Classification { message: String },

    #[error("Graph consistency violation: {message}")]
    Consistency { message: String },

    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    /// Whether this failure is worth retrying with backoff
    pub fn is_transient(&self) -> bool {
        matches!(self, PipelineError::Transient { .. })
    }

    /// Whether this failure must halt the pipeline
    ///
    /// Everything except a consistency violation is a per-record
    /// failure that excludes one item and lets siblings proceed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PipelineError::Consistency { .. })
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        // Connection-level and timeout failures are retryable;
        // anything else from the HTTP layer means the response body
        // did not have the shape we expected.
        if err.is_timeout() || err.is_connect() || err.is_request() {
            PipelineError::Transient {
                message: err.to_string(),
            }
        } else {
            PipelineError::Schema {
                message: err.to_string(),
            }
        }
    }
}
