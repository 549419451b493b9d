//! Intermediate artifact persistence
//!
//! Every stage writes its output under the run's output directory so
//! any stage can be inspected or re-run without repeating upstream
//! work. Artifacts are JSON; the final graph tables are CSV (see
//! [`crate::export`]).

use citegraph_common::errors::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Write a JSON artifact, creating parent directories as needed
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    debug!(path = %path.display(), "Artifact written");
    Ok(())
}

/// Read a JSON artifact back
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
