//! CiteGraph Common Library
//!
//! Shared code for the CiteGraph pipeline including:
//! - Canonical paper identifiers and DOI normalization
//! - Core data models (papers, tallies, edges, the citation graph)
//! - Error types and handling
//! - Persistent fetch cache
//! - External service clients (metadata, tallies, role classification)
//! - Configuration management

pub mod cache;
pub mod clients;
pub mod config;
pub mod errors;
pub mod ids;
pub mod models;

// Re-export commonly used types
pub use cache::FileCache;
pub use config::AppConfig;
pub use errors::{PipelineError, Result};
pub use ids::PaperId;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
