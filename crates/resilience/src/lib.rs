#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Beacon Resilience
//!
//! Failure handling shared by the producer and consumer sides.
//!
//! - [`Retryable`] -- errors classify themselves as transient or permanent
//! - [`RetryPolicy`] + [`retry`] -- bounded exponential backoff with jitter,
//!   cut short by a cancellation token
//! - [`timeout`] -- deadline around a single operation

mod error;
mod retry;
mod retryable;
mod timeout;

pub use error::{PolicyError, RetryError, TimeoutError};
pub use retry::{JitterPolicy, RetryPolicy, retry};
pub use retryable::Retryable;
pub use timeout::timeout;
