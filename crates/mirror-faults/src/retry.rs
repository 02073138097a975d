//! # Retry with Exponential Backoff
//!
//! The [`Retrier`] keys attempt counts by a caller-chosen operation id, so
//! every caller retrying the same logical operation draws from one shared
//! budget. The count clears on success (or an explicit [`Retrier::reset`]),
//! not on exhaustion: once the budget is spent, further runs against the
//! same id get a single attempt and the error straight back.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

/// Backoff parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total invocations allowed per operation id.
    pub max_retries: u32,
    /// First backoff delay, in milliseconds.
    pub base_delay_ms: u64,
    /// Backoff ceiling, in milliseconds.
    pub max_delay_ms: u64,
    /// Delay growth factor per attempt.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 250,
            max_delay_ms: 5_000,
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Millisecond-scale delays for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            base_delay_ms: 1,
            max_delay_ms: 5,
            ..Self::default()
        }
    }

    /// Backoff before the attempt after `attempt` (1-based) failed:
    /// `base × multiplier^(attempt-1)`, capped at `max_delay_ms`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let ms = self.base_delay_ms as f64 * self.multiplier.powi(exponent as i32);
        Duration::from_millis(ms.min(self.max_delay_ms as f64) as u64)
    }
}

/// Shared-budget retry executor.
#[derive(Debug, Default)]
pub struct Retrier {
    attempts: Mutex<HashMap<String, u32>>,
}

impl Retrier {
    /// Create a retrier with no recorded attempts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `op` until it succeeds or the shared budget for `operation_id`
    /// is spent. Returns the success value, or the last error.
    pub async fn run<T, E, F, Fut>(
        &self,
        operation_id: &str,
        config: &RetryConfig,
        mut op: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        loop {
            let attempt = self.bump(operation_id);
            match op().await {
                Ok(value) => {
                    self.reset(operation_id);
                    return Ok(value);
                }
                Err(e) if attempt >= config.max_retries => {
                    warn!(operation_id, attempt, error = %e, "Retry budget exhausted");
                    return Err(e);
                }
                Err(e) => {
                    let delay = config.delay_for(attempt);
                    debug!(
                        operation_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Attempt failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Attempts recorded against an operation id.
    #[must_use]
    pub fn attempts_for(&self, operation_id: &str) -> u32 {
        self.attempts
            .lock()
            .map(|a| a.get(operation_id).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Restore the full budget for an operation id.
    pub fn reset(&self, operation_id: &str) {
        if let Ok(mut attempts) = self.attempts.lock() {
            attempts.remove(operation_id);
        }
    }

    fn bump(&self, operation_id: &str) -> u32 {
        let Ok(mut attempts) = self.attempts.lock() else {
            return u32::MAX;
        };
        let count = attempts.entry(operation_id.to_string()).or_insert(0);
        *count += 1;
        *count
    }
}
