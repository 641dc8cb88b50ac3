//! Retry with backoff for provider dispatch
//!
//! Only provider errors classified as retryable (rate limits, transient
//! network failures) are retried. Core data components never retry.

mod backoff;
mod retry;

pub use backoff::{BackoffConfig, BackoffStrategy, ExponentialBackoff};
pub use retry::{RetryConfig, retry_provider};
