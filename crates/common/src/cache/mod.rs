//! Persistent fetch cache
//!
//! Provides:
//! - One durable JSON record per (namespace, key) pair
//! - Atomic per-key writes (temp file + rename), so a crash never
//!   leaves a torn entry
//! - Cache-then-fetch via [`FileCache::get_or_fetch`]: a hit
//!   short-circuits the network entirely
//!
//! Entries are written only by successful fetches, never by failures,
//! and are treated as permanent for the lifetime of the store. The
//! cache is an explicit service object opened once per run and passed
//! into each fetcher; it is the only resource shared across concurrent
//! fetch units.

use crate::errors::{PipelineError, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Cache namespaces, one per external service
pub mod ns {
    pub const OPENALEX: &str = "openalex";
    pub const SCITE: &str = "scite";
    pub const EDGE_ROLES: &str = "edge_roles";
}

/// Envelope stored on disk around every cached value
#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    key: String,
    fetched_at: DateTime<Utc>,
    value: T,
}

/// File-backed cache client
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    /// Open (creating if needed) a cache rooted at `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| PipelineError::Cache {
            message: format!("Failed to create cache root {}: {}", root.display(), e),
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, namespace: &str, key: &str) -> PathBuf {
        self.root
            .join(namespace)
            .join(format!("{}.json", sanitize_key(key)))
    }

    /// Get a cached value
    pub fn get<T: DeserializeOwned>(&self, namespace: &str, key: &str) -> Result<Option<T>> {
        let path = self.entry_path(namespace, key);
        if !path.exists() {
            debug!(namespace, key, "Cache miss");
            return Ok(None);
        }
        let raw = fs::read_to_string(&path).map_err(|e| PipelineError::Cache {
            message: format!("Failed to read cache entry {}: {}", path.display(), e),
        })?;
        let envelope: Envelope<T> =
            serde_json::from_str(&raw).map_err(|e| PipelineError::Cache {
                message: format!("Failed to parse cache entry {}: {}", path.display(), e),
            })?;
        debug!(namespace, key, "Cache hit");
        Ok(Some(envelope.value))
    }

    /// Durably write a value, replacing any previous entry for the key
    ///
    /// Writing the same key twice with the same value is a no-op
    /// upsert. The write is atomic: the entry is staged to a temp file,
    /// flushed, then renamed into place.
    pub fn put<T: Serialize>(&self, namespace: &str, key: &str, value: &T) -> Result<()> {
        let path = self.entry_path(namespace, key);
        let dir = self.root.join(namespace);
        fs::create_dir_all(&dir).map_err(|e| PipelineError::Cache {
            message: format!("Failed to create namespace dir {}: {}", dir.display(), e),
        })?;

        let envelope = Envelope {
            key: key.to_string(),
            fetched_at: Utc::now(),
            value,
        };
        let json = serde_json::to_string_pretty(&envelope)?;

        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp).map_err(|e| PipelineError::Cache {
                message: format!("Failed to stage cache entry {}: {}", tmp.display(), e),
            })?;
            file.write_all(json.as_bytes())
                .and_then(|_| file.sync_all())
                .map_err(|e| PipelineError::Cache {
                    message: format!("Failed to flush cache entry {}: {}", tmp.display(), e),
                })?;
        }
        fs::rename(&tmp, &path).map_err(|e| PipelineError::Cache {
            message: format!("Failed to commit cache entry {}: {}", path.display(), e),
        })?;

        debug!(namespace, key, "Cache write");
        Ok(())
    }

    /// Check if a key exists
    pub fn contains(&self, namespace: &str, key: &str) -> bool {
        self.entry_path(namespace, key).exists()
    }

    /// Cache-then-fetch: consult the store first, call the loader only
    /// on a miss, and durably write the result before returning it
    ///
    /// Loader failures are propagated untouched and never written.
    pub async fn get_or_fetch<T, F, Fut>(&self, namespace: &str, key: &str, loader: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        if let Some(cached) = self.get::<T>(namespace, key)? {
            return Ok(cached);
        }
        let value = loader().await?;
        self.put(namespace, key, &value)?;
        Ok(value)
    }
}

/// Turn a cache key into a filesystem-safe filename
///
/// DOIs and provider URLs contain `/` and `:`; those are replaced and
/// a short digest of the original key is appended so distinct keys can
/// never collide after substitution.
pub fn sanitize_key(key: &str) -> String {
    let safe: String = key
        .chars()
        .map(|c| match c {
            '/' | ':' | '\\' | '?' | '*' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();
    let digest = Sha256::digest(key.as_bytes());
    let short = hex::encode(&digest[..4]);
    // Keep filenames bounded; long provider URLs get truncated
    let safe: String = safe.chars().take(120).collect();
    format!("{safe}-{short}")
}
