//! External service clients
//!
//! One client module per upstream service, each exposing a trait so
//! the pipeline stages can run against mocks in tests:
//! - [`openalex`]: paper metadata lookups
//! - [`scite`]: aggregate citation-sentiment tallies
//! - [`classifier`]: rhetorical role classification
//!
//! All network calls go through [`RetryPolicy::run`], an explicit
//! bounded retry loop with exponential backoff that only retries
//! transient failures.

pub mod classifier;
pub mod openalex;
pub mod scite;

pub use classifier::{EdgeTextPair, OpenAiClassifier, RoleAssignment, RoleClassifier};
pub use openalex::{MetadataSource, OpenAlexClient};
pub use scite::{SciteClient, TallySource};

use crate::errors::{PipelineError, Result};
use std::time::Duration;
use tracing::warn;

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Run `op` until it succeeds, fails non-transiently, or the
    /// attempt budget is exhausted
    ///
    /// Backoff doubles per attempt starting from `base_delay`. The
    /// final transient error is returned to the caller, which demotes
    /// it to a per-record exclusion.
    pub async fn run<T, F, Fut>(&self, op_name: &str, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;
        for attempt in 0..self.max_attempts.max(1) {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.saturating_pow(attempt - 1);
                tokio::time::sleep(delay).await;
            }
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => {
                    warn!(
                        op = op_name,
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Transient failure, retrying"
                    );
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error.unwrap_or_else(|| PipelineError::Transient {
            message: format!("{op_name} exhausted its retry budget"),
        }))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(250))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PipelineError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_transient_then_success() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let result = policy
            .run("test", || async {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(PipelineError::Transient {
                        message: "flaky".into(),
                    })
                } else {
                    Ok(42)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let result: Result<()> = policy
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(PipelineError::Transient {
                    message: "still down".into(),
                })
            })
            .await;
        assert!(result.unwrap_err().is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_transient_fails_fast() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let result: Result<()> = policy
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(PipelineError::NotFound { id: "10.1/x".into() })
            })
            .await;
        assert!(matches!(
            result.unwrap_err(),
            PipelineError::NotFound { .. }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
