//! Presence invariants of log events.

use crate::event::LogLevel;

/// A log event whose optional fields disagree with its severity.
///
/// Raised both by the checked constructor and at the wire boundary, where it
/// turns into a malformed-message diagnostic on the consumer side.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantError {
    /// Only one of `response_time_ms` / `threshold_limit_ms` was given.
    #[error("response_time_ms and threshold_limit_ms must be present together")]
    PartialLatency,

    /// Latency figures attached to a non-WARN event.
    #[error("latency fields are only allowed on WARN events, got {0}")]
    LatencyOnLevel(LogLevel),

    /// Error details attached to a non-ERROR event.
    #[error("error_details is only allowed on ERROR events, got {0}")]
    DetailsOnLevel(LogLevel),
}
