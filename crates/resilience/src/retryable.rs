//! Transient-error classification.

use std::error::Error;

/// Errors that know whether repeating the operation may succeed.
///
/// ```
/// use beacon_resilience::Retryable;
///
/// #[derive(Debug, thiserror::Error)]
/// enum FetchError {
///     #[error("connection reset")]
///     Reset,
///     #[error("bad request")]
///     BadRequest,
/// }
///
/// impl Retryable for FetchError {
///     fn is_retryable(&self) -> bool {
///         matches!(self, Self::Reset)
///     }
/// }
///
/// assert!(FetchError::Reset.is_retryable());
/// assert!(!FetchError::BadRequest.is_retryable());
/// ```
pub trait Retryable: Error {
    /// Whether a later attempt may succeed.
    ///
    /// Default: `true`
    fn is_retryable(&self) -> bool {
        true
    }
}

impl Retryable for std::io::Error {
    fn is_retryable(&self) -> bool {
        use std::io::ErrorKind::{
            ConnectionAborted, ConnectionRefused, ConnectionReset, Interrupted, TimedOut,
            WouldBlock,
        };
        matches!(
            self.kind(),
            Interrupted | WouldBlock | TimedOut | ConnectionReset | ConnectionAborted | ConnectionRefused
        )
    }
}
