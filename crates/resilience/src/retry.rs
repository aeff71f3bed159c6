//! Bounded retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{PolicyError, RetryError};
use crate::retryable::Retryable;

/// Randomisation applied to each backoff delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JitterPolicy {
    /// Use the computed delay exactly
    None,
    /// random(0, delay)
    Full,
    /// delay/2 + random(0, delay/2)
    Equal,
    /// random(delay, 3 * previous), falling back to `Equal` on the first retry
    Decorrelated,
}

impl JitterPolicy {
    /// Apply jitter to `delay`.
    #[must_use]
    pub fn apply(self, delay: Duration, previous: Option<Duration>) -> Duration {
        match self {
            Self::None => delay,
            Self::Full => {
                let millis = delay.as_millis() as u64;
                if millis == 0 {
                    return delay;
                }
                Duration::from_millis(fastrand::u64(0..=millis))
            }
            Self::Equal => {
                let half = delay.as_millis() as u64 / 2;
                let jitter = if half > 0 { fastrand::u64(0..=half) } else { 0 };
                Duration::from_millis(half + jitter)
            }
            Self::Decorrelated => match previous {
                Some(prev) => {
                    let base = delay.as_millis() as u64;
                    let upper = (prev.as_millis() as u64).saturating_mul(3).max(base);
                    Duration::from_millis(fastrand::u64(base..=upper))
                }
                None => Self::Equal.apply(delay, None),
            },
        }
    }
}

/// How often and how patiently to repeat a failing operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,
    /// Growth factor between consecutive delays.
    pub multiplier: f64,
    /// Upper bound for a single delay, before jitter.
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
    /// Jitter applied to each delay.
    pub jitter: JitterPolicy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            multiplier: 2.0,
            max_delay: Duration::from_secs(2),
            jitter: JitterPolicy::Equal,
        }
    }
}

impl RetryPolicy {
    /// Reject values the retry loop cannot honour.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.max_attempts == 0 {
            return Err(PolicyError::NoAttempts);
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(PolicyError::Multiplier(self.multiplier.to_string()));
        }
        if self.max_delay < self.initial_delay {
            return Err(PolicyError::DelayBounds {
                initial: self.initial_delay,
                max: self.max_delay,
            });
        }
        Ok(())
    }

    /// Un-jittered delay after the `retry`-th failure (zero-based).
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        let exp = i32::try_from(retry).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exp);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Run `operation` until it succeeds, fails permanently, runs out of
/// attempts, or `cancel` fires.
///
/// Cancellation is checked before every attempt and interrupts backoff
/// sleeps, so no attempt starts after `cancel` has fired.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    E: Retryable,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut previous = None;
    let mut attempt = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled);
        }

        attempt += 1;
        let error = match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        if !error.is_retryable() {
            return Err(RetryError::Permanent(error));
        }
        if attempt >= max_attempts {
            return Err(RetryError::Exhausted {
                attempts: attempt,
                last: error,
            });
        }

        let delay = policy.jitter.apply(policy.backoff(attempt - 1), previous);
        previous = Some(delay);
        tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, %error, "retrying");

        tokio::select! {
            () = cancel.cancelled() => return Err(RetryError::Cancelled),
            () = tokio::time::sleep(delay) => {}
        }
    }
}
