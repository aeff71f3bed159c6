//! Producer errors.

use std::time::Duration;

use beacon_broker::BrokerError;
use beacon_core::{CodecError, ServiceNameError, Topic};
use beacon_resilience::PolicyError;

/// Invalid node configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// The service name is not usable.
    #[error("invalid service name: {0}")]
    ServiceName(#[from] ServiceNameError),

    /// A schedule interval was zero.
    #[error("{field} must be greater than zero")]
    ZeroInterval {
        /// Offending field.
        field: &'static str,
    },

    /// All level weights were zero.
    #[error("levels: at least one weight must be non-zero")]
    EmptyDistribution,

    /// A probability fell outside `[0, 1]`.
    #[error("{field} must be within [0, 1], got {value}")]
    Probability {
        /// Offending field.
        field: &'static str,
        /// Configured value.
        value: f64,
    },

    /// The latency ceiling leaves no room above the threshold.
    #[error(
        "latency.max_response_ms ({max_response_ms}) must exceed latency.threshold_ms ({threshold_ms})"
    )]
    LatencyRange {
        /// Configured threshold.
        threshold_ms: u64,
        /// Configured ceiling.
        max_response_ms: u64,
    },

    /// The retry policy is unusable.
    #[error("retry: {0}")]
    Retry(#[from] PolicyError),
}

/// An event could not be handed to the broker.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The event failed to serialize.
    #[error(transparent)]
    Encode(#[from] CodecError),

    /// Every attempt failed with a transient error.
    #[error("publish to {topic} failed after {attempts} attempts: {source}")]
    Exhausted {
        /// Destination topic.
        topic: Topic,
        /// Attempts made.
        attempts: u32,
        /// Error of the last attempt.
        #[source]
        source: BrokerError,
    },

    /// The broker refused the event permanently.
    #[error("publish to {topic} rejected: {source}")]
    Rejected {
        /// Destination topic.
        topic: Topic,
        /// Broker error.
        #[source]
        source: BrokerError,
    },

    /// Shutdown began before the event was accepted.
    #[error("publish to {topic} cancelled by shutdown")]
    Cancelled {
        /// Destination topic.
        topic: Topic,
    },
}

impl PublishError {
    /// True when the node is shutting down rather than failing.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

pub(crate) fn timeout_error(duration: Duration) -> BrokerError {
    BrokerError::Timeout(duration)
}
