//! Bounded retry policy for outbound calls.
//!
//! A [`RetryPolicy`] runs an async operation up to `max_attempts` times.
//! Each attempt is bounded by `attempt_timeout`; an attempt that errors or
//! times out is retried immediately, the first one that completes wins.
//! Every attempt is counted in `outbound_attempts_total`, labelled with the
//! caller's operation name and the attempt outcome.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Default number of attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default per-attempt timeout.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);

/// Retry configuration for a single logical call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (at least 1).
    pub max_attempts: u32,
    /// Upper bound on the duration of one attempt.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

/// Every attempt failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{operation} failed after {attempts} attempt(s): {last_error}")]
pub struct RetryExhausted {
    /// The operation that was retried.
    pub operation: String,
    /// Number of attempts made.
    pub attempts: u32,
    /// Error of the final attempt.
    pub last_error: String,
}

impl RetryPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(max_attempts: u32, attempt_timeout: Duration) -> Self {
        Self {
            max_attempts,
            attempt_timeout,
        }
    }

    /// Runs `attempt` until it succeeds or the attempts are used up.
    ///
    /// The closure receives the 1-based attempt number. Any `Err` it returns,
    /// and any attempt exceeding `attempt_timeout`, counts as a failed
    /// attempt.
    ///
    /// # Errors
    ///
    /// Returns [`RetryExhausted`] carrying the last failure when no attempt
    /// succeeded.
    pub async fn run<T, E, F, Fut>(
        &self,
        operation: &str,
        mut attempt: F,
    ) -> Result<T, RetryExhausted>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut last_error = String::new();

        for number in 1..=max_attempts {
            match tokio::time::timeout(self.attempt_timeout, attempt(number)).await {
                Ok(Ok(value)) => {
                    record_attempt(operation, "success");
                    return Ok(value);
                },
                Ok(Err(e)) => {
                    last_error = e.to_string();
                    record_attempt(operation, "error");
                },
                Err(_) => {
                    last_error = format!("timed out after {:?}", self.attempt_timeout);
                    record_attempt(operation, "timeout");
                },
            }

            tracing::warn!(
                operation,
                attempt = number,
                max_attempts,
                error = %last_error,
                "Attempt failed"
            );
        }

        Err(RetryExhausted {
            operation: operation.to_string(),
            attempts: max_attempts,
            last_error,
        })
    }
}

fn record_attempt(operation: &str, outcome: &'static str) {
    metrics::counter!(
        "outbound_attempts_total",
        "operation" => operation.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}
