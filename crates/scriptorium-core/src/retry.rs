//! Fixed-count, fixed-delay retry
//!
//! Every acquisition step runs under a [`RetryPolicy`]. A thrown error and an
//! empty result are both misses; the caller only ever sees "got a value" or
//! "got nothing".

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Default number of attempts
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default pause between attempts
pub const DEFAULT_DELAY_MS: u64 = 10_000;

/// Retry policy for acquisition steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Attempts before giving up (0 behaves like 1)
    pub max_attempts: u32,
    /// Pause between attempts in milliseconds
    pub delay_ms: u64,
}

impl RetryPolicy {
    /// Create a policy
    #[inline]
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Pause between attempts
    #[inline]
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Attempts actually performed before giving up
    #[inline]
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Run `operation` until it yields a value or attempts run out
    ///
    /// # Arguments
    /// * `label` - Name used in log lines (usually the item title)
    /// * `operation` - Produces one attempt; `Ok(None)` and `Err(_)` are misses
    ///
    /// # Returns
    /// The first value produced, or `None` once every attempt missed
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut operation: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
        E: Display,
    {
        let attempts = self.attempts();

        for attempt in 1..=attempts {
            match operation().await {
                Ok(Some(value)) => {
                    if attempt > 1 {
                        tracing::info!(label, attempt, "Succeeded after retry");
                    }
                    return Some(value);
                }
                Ok(None) => {
                    tracing::warn!(label, attempt, attempts, "Attempt produced nothing");
                }
                Err(e) => {
                    tracing::warn!(label, attempt, attempts, error = %e, "Attempt failed");
                }
            }

            if attempt < attempts {
                tracing::debug!(label, delay_ms = self.delay_ms, "Waiting before retry");
                tokio::time::sleep(self.delay()).await;
            }
        }

        tracing::error!(label, attempts, "Maximum attempts reached");
        None
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay_ms: DEFAULT_DELAY_MS,
        }
    }
}
