//! Bounded retry with exponential backoff for collaborator calls.

use std::future::Future;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::InfraError;

/// Retry policy.
///
/// Attempts are capped by `max_attempts`, and no retry starts if its delay
/// would push the total past `max_total_ms`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryPolicy {
    /// Attempts including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt (ms).
    pub initial_backoff_ms: u64,
    /// Delay growth per attempt.
    pub multiplier: f64,
    /// Total wall-clock bound (ms).
    pub max_total_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 50,
            multiplier: 2.0,
            max_total_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    /// Policy retrying `max_attempts` times without waiting.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff_ms: 0,
            ..Self::default()
        }
    }

    /// Delay before attempt `attempt + 1` (1-based `attempt`).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(attempt.saturating_sub(1) as i32);
        Duration::from_millis((self.initial_backoff_ms as f64 * factor) as u64)
    }

    /// Runs `op` until it succeeds or the policy gives up.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, InfraError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, InfraError>>,
    {
        let started = Instant::now();
        let budget = Duration::from_millis(self.max_total_ms);
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let delay = self.backoff(attempt);
                    if attempt >= max_attempts || started.elapsed() + delay > budget {
                        warn!(operation = what, attempt, error = %err, "giving up");
                        return Err(InfraError::RetriesExhausted {
                            attempts: attempt,
                            last: err.to_string(),
                        });
                    }
                    warn!(
                        operation = what,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_grows() {
        let p = RetryPolicy::default();
        assert_eq!(p.backoff(1), Duration::from_millis(50));
        assert_eq!(p.backoff(2), Duration::from_millis(100));
        assert_eq!(p.backoff(3), Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = RetryPolicy::immediate(3)
            .run("flaky", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(InfraError::Unavailable("down".into()))
                } else {
                    Ok(7)
                }
            })
            .await;
        assert_eq!(result, Ok(7));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = RetryPolicy::immediate(3)
            .run("broken", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(InfraError::Unavailable("down".into()))
            })
            .await;
        assert!(matches!(
            result,
            Err(InfraError::RetriesExhausted { attempts: 3, .. })
        ));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_total_bound_stops_early() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_backoff_ms: 5_000,
            multiplier: 2.0,
            max_total_ms: 100,
        };
        let result: Result<(), _> = policy
            .run("slow", || async { Err(InfraError::Unavailable("down".into())) })
            .await;
        assert!(matches!(
            result,
            Err(InfraError::RetriesExhausted { attempts: 1, .. })
        ));
    }
}
