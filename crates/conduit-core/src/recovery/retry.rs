//! Retrying provider calls

use super::backoff::{BackoffConfig, BackoffStrategy, ExponentialBackoff};
use crate::error::{ConduitError, ConduitResult};
use crate::provider::ProviderError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Retry behavior for provider dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Initial delay before first retry
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,
    /// Maximum delay between retries
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
    /// Backoff multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Add random jitter to prevent thundering herd
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a config that never retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }

    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn to_backoff_config(&self) -> BackoffConfig {
        BackoffConfig {
            initial_delay: self.initial_delay,
            max_delay: self.max_delay,
            multiplier: self.backoff_multiplier,
            jitter: self.jitter,
            jitter_ratio: 0.2,
        }
    }

    pub fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff::with_config(self.to_backoff_config())
    }
}

/// Run a provider operation, retrying retryable failures with backoff.
///
/// `on_retry` sees the upcoming attempt number (1-based), the delay and the
/// error that triggered it. Cancellation interrupts both the in-flight call
/// and the backoff sleep.
pub async fn retry_provider<T, F, Fut, N>(
    config: &RetryConfig,
    cancel: &CancellationToken,
    mut operation: F,
    mut on_retry: N,
) -> ConduitResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
    N: FnMut(u32, Duration, &ProviderError),
{
    let max_attempts = config.max_attempts.max(1);
    let backoff = config.create_backoff();
    let mut attempt = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(ConduitError::Cancelled);
        }

        let outcome = tokio::select! {
            _ = cancel.cancelled() => return Err(ConduitError::Cancelled),
            outcome = operation() => outcome,
        };

        let error = match outcome {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!(attempt = attempt + 1, "request succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) => error,
        };

        if !error.is_retryable() || attempt + 1 >= max_attempts {
            if error.is_retryable() {
                warn!("Request failed after {} attempts: {}", attempt + 1, error);
            }
            return Err(ConduitError::Provider(error));
        }

        let delay = error
            .retry_after()
            .map(|d| d.min(config.max_delay))
            .unwrap_or_else(|| backoff.delay_for_attempt(attempt));
        attempt += 1;

        warn!(
            "Request failed (attempt {}/{}): {}. Retrying in {:.2}s...",
            attempt,
            max_attempts,
            error,
            delay.as_secs_f64()
        );
        on_retry(attempt + 1, delay, &error);

        tokio::select! {
            _ = cancel.cancelled() => return Err(ConduitError::Cancelled),
            _ = sleep(delay) => {}
        }
    }
}
