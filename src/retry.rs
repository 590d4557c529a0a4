//! Bounded retry with a fixed backoff
//!
//! The discovery + download phase never fails hard, it just comes back empty.
//! [`retry_until`] re-runs such an operation until its output satisfies a
//! predicate or the attempt cap is reached, sleeping a fixed delay between
//! attempts.
//!
//! # Example
//!
//! ```no_run
//! use reel_relay::config::RetryConfig;
//! use reel_relay::retry::retry_until;
//!
//! # async fn example() {
//! let config = RetryConfig::default();
//! let outcome = retry_until(
//!     &config,
//!     |_attempt| async { vec![1, 2, 3] },
//!     |items: &Vec<i32>| !items.is_empty(),
//! )
//! .await;
//! assert_eq!(outcome.attempts, 1);
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::UploadError;
use std::future::Future;

/// Trait for errors that can be classified as transient or permanent
///
/// The pipeline does not retry publishes itself; the classification is
/// reported alongside failures so an operator can tell a flaky network from a
/// rejected request.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation could be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for UploadError {
    fn is_retryable(&self) -> bool {
        match self {
            UploadError::Request { source, .. } => source.is_timeout() || source.is_connect(),
            // 408 Request Timeout, 429 Too Many Requests, and 5xx are worth another try
            UploadError::Rejected { status, .. } => {
                *status == 408 || *status == 429 || (500..600).contains(status)
            }
            UploadError::Malformed { .. } => false,
            UploadError::File { .. } => false,
        }
    }
}

/// Result of a [`retry_until`] run
#[derive(Debug)]
pub struct RetryOutcome<T> {
    /// Output of the last attempt
    pub value: T,
    /// Number of attempts made (at least 1)
    pub attempts: u32,
}

/// Run `operation` until `is_done` accepts its output or `max_attempts` is reached
///
/// The operation receives the 1-based attempt number. The delay is only slept
/// between attempts, never after the last one. A `max_attempts` of zero is
/// treated as one.
pub async fn retry_until<F, Fut, T, P>(
    config: &RetryConfig,
    mut operation: F,
    is_done: P,
) -> RetryOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = T>,
    P: Fn(&T) -> bool,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let value = operation(attempt).await;

        if is_done(&value) {
            if attempt > 1 {
                tracing::info!(attempts = attempt, "Operation succeeded after retry");
            }
            return RetryOutcome {
                value,
                attempts: attempt,
            };
        }

        if attempt >= max_attempts {
            tracing::warn!(
                attempts = attempt,
                "Operation did not succeed after all retry attempts"
            );
            return RetryOutcome {
                value,
                attempts: attempt,
            };
        }

        let delay = config.backoff;
        tracing::warn!(
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            "Attempt came back empty, retrying"
        );

        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
