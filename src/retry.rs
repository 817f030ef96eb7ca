//! Bounded retry with exponential backoff for remote platform calls.
//!
//! Retries are local and in-process; they do not coordinate with other
//! concurrent invocations. Only [`ProvisionError::Provisioning`] is
//! retried; validation errors propagate on the first attempt.

use std::time::Duration;

use rand::{Rng, thread_rng};
use tracing::warn;

use crate::config::RetryConfig;
use crate::error::ProvisionError;

/// Retry policy: up to `max_attempts` tries with exponential backoff
/// between them, capped at `max_delay`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    jitter_factor: f64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            jitter_factor: 0.0,
        }
    }

    /// Multiplicative jitter in `0.0..=1.0`, applied on top of the
    /// computed backoff to spread out concurrent retriers.
    pub fn with_jitter(mut self, jitter_factor: f64) -> Self {
        self.jitter_factor = jitter_factor.clamp(0.0, 1.0);
        self
    }

    /// Delay before attempt `attempt` (1-based); the first attempt has no
    /// delay. Backoff doubles per completed attempt: base, 2*base, ...
    /// capped at `max_delay`.
    fn backoff_before(&self, attempt: u32) -> Duration {
        debug_assert!(attempt >= 2);
        let exponent = attempt.saturating_sub(2).min(31);
        let raw = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(exponent));
        let capped = raw.min(self.max_delay);
        if self.jitter_factor > 0.0 {
            let jitter = thread_rng().gen_range(0.0..self.jitter_factor);
            capped.mul_f64(1.0 + jitter)
        } else {
            capped
        }
    }

    /// Run `operation` until it succeeds, fails with a non-retryable
    /// error, or the attempt budget is exhausted. The final error is
    /// propagated unchanged.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, ProvisionError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProvisionError>>,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.backoff_before(attempt + 1);
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        correlation_id = crate::telemetry::current_correlation_id().as_deref().unwrap_or(""),
                        error = %err,
                        "remote call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_secs(config.base_seconds),
            Duration::from_secs(config.max_seconds),
        )
        .with_jitter(config.jitter_factor)
    }
}
