//! Configuration management for the CiteGraph pipeline
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/<env>.toml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Metadata service (OpenAlex) configuration
    #[serde(default)]
    pub openalex: OpenAlexConfig,

    /// Tally service (scite.ai) configuration
    #[serde(default)]
    pub scite: SciteConfig,

    /// Role classifier configuration
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Persistent cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Stage scheduling configuration
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenAlexConfig {
    /// API base URL
    #[serde(default = "default_openalex_base")]
    pub base_url: String,

    /// Contact email passed for polite API usage
    pub mailto: Option<String>,

    /// Per-call timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,

    /// Politeness delay between requests in milliseconds
    #[serde(default = "default_openalex_delay")]
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SciteConfig {
    /// API base URL
    #[serde(default = "default_scite_base")]
    pub base_url: String,

    /// Optional API key; the free endpoint works without one
    pub api_key: Option<String>,

    /// Per-call timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,

    /// Politeness delay between requests in milliseconds
    #[serde(default = "default_scite_delay")]
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifierConfig {
    /// OpenAI-compatible API base URL
    #[serde(default = "default_classifier_base")]
    pub base_url: String,

    /// API key; classification is skipped when absent
    pub api_key: Option<String>,

    /// Model to use
    #[serde(default = "default_classifier_model")]
    pub model: String,

    /// Per-call timeout in seconds
    #[serde(default = "default_classifier_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Cache root directory
    #[serde(default = "default_cache_root")]
    pub root: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Concurrency limit for independent fetch units within a stage
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Maximum attempts per fetch (first try included)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff delay in milliseconds, doubled per attempt
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,
}

// Default value functions
fn default_openalex_base() -> String { "https://api.openalex.org".to_string() }
fn default_scite_base() -> String { "https://api.scite.ai".to_string() }
fn default_classifier_base() -> String { "https://api.openai.com/v1".to_string() }
fn default_classifier_model() -> String { "gpt-4.1-mini".to_string() }
fn default_http_timeout() -> u64 { 20 }
fn default_openalex_delay() -> u64 { 500 }
fn default_scite_delay() -> u64 { 300 }
fn default_classifier_timeout() -> u64 { 60 }
fn default_cache_root() -> String { "cache".to_string() }
fn default_concurrency() -> usize { 4 }
fn default_max_attempts() -> u32 { 3 }
fn default_retry_base_delay() -> u64 { 250 }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__OPENALEX__MAILTO=you@example.com
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Per-call HTTP timeout for metadata lookups
    pub fn openalex_timeout(&self) -> Duration {
        Duration::from_secs(self.openalex.timeout_secs)
    }

    pub fn scite_timeout(&self) -> Duration {
        Duration::from_secs(self.scite.timeout_secs)
    }

    pub fn classifier_timeout(&self) -> Duration {
        Duration::from_secs(self.classifier.timeout_secs)
    }

    /// Base backoff delay as a Duration
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.pipeline.retry_base_delay_ms)
    }

    /// Politeness delay between metadata requests
    pub fn openalex_delay(&self) -> Duration {
        Duration::from_millis(self.openalex.delay_ms)
    }

    /// Politeness delay between tally requests
    pub fn scite_delay(&self) -> Duration {
        Duration::from_millis(self.scite.delay_ms)
    }
}

impl Default for OpenAlexConfig {
    fn default() -> Self {
        Self {
            base_url: default_openalex_base(),
            mailto: None,
            timeout_secs: default_http_timeout(),
            delay_ms: default_openalex_delay(),
        }
    }
}

impl Default for SciteConfig {
    fn default() -> Self {
        Self {
            base_url: default_scite_base(),
            api_key: None,
            timeout_secs: default_http_timeout(),
            delay_ms: default_scite_delay(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: default_classifier_base(),
            api_key: None,
            model: default_classifier_model(),
            timeout_secs: default_classifier_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: default_cache_root(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openalex: OpenAlexConfig::default(),
            scite: SciteConfig::default(),
            classifier: ClassifierConfig::default(),
            cache: CacheConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.openalex.base_url, "https://api.openalex.org");
        assert_eq!(config.classifier.model, "gpt-4.1-mini");
        assert_eq!(config.pipeline.max_attempts, 3);
    }

    #[test]
    fn test_timeout_durations() {
        let config = AppConfig::default();
        assert_eq!(config.openalex_timeout(), Duration::from_secs(20));
        assert_eq!(config.retry_base_delay(), Duration::from_millis(250));
    }

    #[test]
    fn test_politeness_delays() {
        let config = AppConfig::default();
        assert_eq!(config.openalex_delay(), Duration::from_millis(500));
        assert_eq!(config.scite_delay(), Duration::from_millis(300));
    }
}
