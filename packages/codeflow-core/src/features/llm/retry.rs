//! Bounded retry and request pacing

use std::time::Duration;

use tokio::time::Instant;

use super::{ModelClient, ModelError};

/// Retry bound and backoff base for transient failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, first try included
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    fn backoff_for(&self, attempt: u32, err: &ModelError) -> Duration {
        if let ModelError::RateLimited {
            retry_after_ms: Some(ms),
        } = err
        {
            return Duration::from_millis(*ms);
        }
        // Exponential: base, 2*base, 4*base, ...
        self.base_backoff * 2u32.saturating_pow(attempt)
    }
}

/// Minimum spacing between request starts, shared by all in-flight
/// chunk tasks. This is the only state concurrent chunks share.
pub struct RateLimiter {
    min_interval: Duration,
    next_start: tokio::sync::Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_start: tokio::sync::Mutex::new(Instant::now()),
        }
    }

    /// Wait for this caller's reserved start slot
    pub async fn acquire(&self) {
        let start = {
            let mut next = self.next_start.lock().await;
            let now = Instant::now();
            let start = if *next > now { *next } else { now };
            *next = start + self.min_interval;
            start
        };
        tokio::time::sleep_until(start).await;
    }
}

/// Call the model with bounded retry on transient failures
///
/// Permanent failures propagate immediately without retry. On
/// exhausting the bound, the last transient error is returned and the
/// caller degrades to a placeholder fragment.
pub async fn complete_with_retry(
    client: &dyn ModelClient,
    limiter: &RateLimiter,
    prompt: &str,
    policy: &RetryPolicy,
) -> Result<String, ModelError> {
    let mut last_err = ModelError::Network("no attempts made".to_string());

    for attempt in 0..policy.max_attempts.max(1) {
        limiter.acquire().await;

        match client.complete(prompt).await {
            Ok(text) => return Ok(text),
            Err(err) if err.is_transient() => {
                let backoff = policy.backoff_for(attempt, &err);
                tracing::warn!(
                    attempt = attempt + 1,
                    max = policy.max_attempts,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %err,
                    "transient model failure, backing off"
                );
                last_err = err;
                if attempt + 1 < policy.max_attempts {
                    tokio::time::sleep(backoff).await;
                }
            }
            Err(err) => return Err(err),
        }
    }

    Err(last_err)
}
