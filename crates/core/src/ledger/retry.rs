//! Bounded retries for postings that lose a transaction race.
//!
//! A retry re-runs the whole read-plan-commit closure, never just the commit,
//! so each attempt plans from fresh state.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use arqon_shared::PostingConfig;
use tokio::time::sleep;
use tracing::{info, warn};

/// Errors that can tell whether the failed operation is worth retrying.
pub trait Retryable {
    /// Returns true if the operation may succeed when re-run.
    fn is_retryable(&self) -> bool;
}

impl Retryable for crate::store::StoreError {
    fn is_retryable(&self) -> bool {
        self.is_conflict()
    }
}

impl Retryable for super::LedgerError {
    fn is_retryable(&self) -> bool {
        Self::is_retryable(self)
    }
}

/// Exponential backoff settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Backoff before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound for a single backoff.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&PostingConfig::default())
    }
}

impl From<&PostingConfig> for RetryPolicy {
    fn from(config: &PostingConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }
}

impl RetryPolicy {
    /// A policy that runs the operation exactly once.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Backoff before retry number `retry` (0-based): `initial * 2^retry`,
    /// capped at `max_backoff`.
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(retry))
            .min(self.max_backoff)
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error,
    /// or `max_attempts` is reached. Returns the last error.
    ///
    /// # Errors
    ///
    /// Returns the operation's error once retrying stops.
    pub async fn run<F, Fut, T, E>(&self, operation: &str, mut f: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let mut attempt: u32 = 1;
        loop {
            match f().await {
                Ok(value) => {
                    if attempt > 1 {
                        info!(operation, attempt, "operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    let backoff = self.backoff(attempt - 1);
                    warn!(
                        operation,
                        attempt,
                        backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "transaction conflict, retrying after backoff"
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_retryable() {
                        warn!(operation, attempt, error = %err, "giving up after max attempts");
                    }
                    return Err(err);
                }
            }
        }
    }
}
