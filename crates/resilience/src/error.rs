//! Error types.

use std::time::Duration;

/// An operation did not finish before its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation timed out after {duration:?}")]
pub struct TimeoutError {
    /// The deadline that elapsed.
    pub duration: Duration,
}

/// Outcome of [`retry`](crate::retry) when the operation never succeeded.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// Every allowed attempt failed with a transient error.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        /// Attempts made.
        attempts: u32,
        /// Error of the final attempt.
        #[source]
        last: E,
    },

    /// The error was classified as permanent; no further attempt was made.
    #[error("permanent failure: {0}")]
    Permanent(#[source] E),

    /// Cancellation was requested before the operation succeeded.
    #[error("cancelled before the operation succeeded")]
    Cancelled,
}

impl<E> RetryError<E> {
    /// The underlying error, if the operation ran at least once.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Exhausted { last, .. } => Some(last),
            Self::Permanent(e) => Some(e),
            Self::Cancelled => None,
        }
    }

    /// True for [`RetryError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// A retry policy with values that cannot work.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// `max_attempts` was zero.
    #[error("max_attempts must be at least 1")]
    NoAttempts,

    /// `multiplier` was below 1 or not finite.
    #[error("multiplier must be a finite number >= 1, got {0}")]
    Multiplier(String),

    /// `max_delay` was smaller than `initial_delay`.
    #[error("max_delay ({max:?}) is smaller than initial_delay ({initial:?})")]
    DelayBounds {
        /// Configured first delay.
        initial: Duration,
        /// Configured cap.
        max: Duration,
    },
}
