//! Retry Controller
//!
//! The single retry policy shared by every Gemini façade. Each attempt is
//! classified by HTTP status; retryable failures are followed by a delay
//! before the next attempt:
//!
//! - 429 with `Retry-After`: the server-requested delay
//! - anything else retryable: `backoff_base * 2^n` after the n-th failure
//!
//! 401 and 429 without `Retry-After` fail immediately. No delay is taken
//! after the final attempt. Sleeping goes through [`Sleeper`] so tests can
//! observe delays without waiting for them.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::envelope::error_message;
use crate::transport::RawResponse;
use crate::types::{GeminiError, LlmResult};

/// Default number of attempts per call.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Upper bound on a single delay, exponential or server-requested.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Retry configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first. Zero is treated as one.
    pub max_retries: u32,
    /// Multiplied by `2^n` after the n-th failed attempt.
    pub backoff_base: Duration,
    /// Used when a 429 carries an unparseable `Retry-After`.
    pub default_rate_limit_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: Duration::from_secs(1),
            default_rate_limit_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Exponential delay after the `failed_attempt`-th failure (1-based).
    pub fn backoff_delay(&self, failed_attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(failed_attempt).unwrap_or(u32::MAX);
        self.backoff_base
            .checked_mul(factor)
            .unwrap_or(MAX_BACKOFF)
            .min(MAX_BACKOFF)
    }

    /// Delay to take after `err` ended the `failed_attempt`-th attempt.
    pub fn delay_for(&self, err: &GeminiError, failed_attempt: u32) -> Duration {
        err.retry_after()
            .unwrap_or_else(|| self.backoff_delay(failed_attempt))
    }
}

/// Parse a `Retry-After` header value as (fractional) seconds.
///
/// HTTP-date values, garbage and values too large for a `Duration` fall back
/// to `default`. The result never exceeds the backoff cap.
pub fn parse_retry_after(value: &str, default: Duration) -> Duration {
    let delay = match value.trim().parse::<f64>() {
        Ok(secs) if secs >= 0.0 => Duration::try_from_secs_f64(secs).unwrap_or(default),
        _ => default,
    };
    delay.min(MAX_BACKOFF)
}

/// Map a non-2xx response to its error. 2xx passes through.
pub fn classify_response(response: &RawResponse, policy: &RetryPolicy) -> LlmResult<()> {
    if (200..300).contains(&response.status) {
        return Ok(());
    }

    let message = error_message(&response.body)
        .unwrap_or_else(|| format!("HTTP {}", response.status));

    match response.status {
        401 => Err(GeminiError::Unauthorized { message }),
        429 => Err(GeminiError::RateLimited {
            message,
            retry_after: response
                .retry_after
                .as_deref()
                .map(|v| parse_retry_after(v, policy.default_rate_limit_delay)),
        }),
        status => Err(GeminiError::ServerError { status, message }),
    }
}

/// Abstracts waiting between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Runs an attempt function under a [`RetryPolicy`].
#[derive(Clone)]
pub struct RetryController {
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryController {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_sleeper(policy, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { policy, sleeper }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `attempt` until it succeeds, fails terminally, or the attempts are
    /// used up.
    ///
    /// `attempt` receives the 1-based attempt number. Cancelling `cancel`
    /// during an attempt or a delay ends the call with
    /// [`GeminiError::Cancelled`]; the in-flight attempt future is dropped.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &str,
        cancel: &CancellationToken,
        mut attempt: F,
    ) -> LlmResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = LlmResult<T>>,
    {
        let max_attempts = self.policy.attempts();
        let mut last_error: Option<GeminiError> = None;

        for attempt_index in 1..=max_attempts {
            if cancel.is_cancelled() {
                return Err(GeminiError::Cancelled);
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(operation, attempt = attempt_index, "attempt cancelled");
                    return Err(GeminiError::Cancelled);
                }
                result = attempt(attempt_index) => result,
            };

            let err = match outcome {
                Ok(value) => {
                    if attempt_index > 1 {
                        tracing::info!(operation, attempt = attempt_index, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !err.is_retryable() {
                tracing::warn!(
                    operation,
                    attempt = attempt_index,
                    error = %err,
                    "non-retryable error"
                );
                return Err(err);
            }

            let delay = self.policy.delay_for(&err, attempt_index);
            let has_next = attempt_index < max_attempts;
            let delay_ms = if has_next { delay.as_millis() as u64 } else { 0 };

            tracing::warn!(
                operation,
                attempt = attempt_index,
                max_attempts,
                delay_ms,
                error = %err,
                "retryable error"
            );

            last_error = Some(err);

            if has_next {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::debug!(operation, "cancelled during backoff");
                        return Err(GeminiError::Cancelled);
                    }
                    _ = self.sleeper.sleep(delay) => {}
                }
            }
        }

        Err(GeminiError::MaxRetriesExceeded {
            attempts: max_attempts,
            last_error: last_error.map(Box::new),
        })
    }
}

impl std::fmt::Debug for RetryController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryController")
            .field("policy", &self.policy)
            .finish()
    }
}
