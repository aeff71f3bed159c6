//! Broker errors.

use std::time::Duration;

use beacon_resilience::Retryable;

/// Failure talking to a broker.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrokerError {
    /// The broker is temporarily not accepting requests.
    #[error("broker unavailable: {0}")]
    Unavailable(String),

    /// A request did not complete in time.
    #[error("broker request timed out after {0:?}")]
    Timeout(Duration),

    /// The broker or subscription was shut down.
    #[error("broker connection closed")]
    Closed,

    /// None of the configured addresses is reachable.
    #[error("no broker reachable at {addresses}")]
    UnknownAddress {
        /// Comma-separated addresses that were tried.
        addresses: String,
    },

    /// The broker configuration is unusable.
    #[error("invalid broker configuration: {0}")]
    InvalidConfig(String),
}

impl Retryable for BrokerError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(BrokerError::Unavailable("down".into()), true)]
    #[case(BrokerError::Timeout(Duration::from_secs(1)), true)]
    #[case(BrokerError::Closed, false)]
    #[case(BrokerError::UnknownAddress { addresses: "a:1".into() }, false)]
    #[case(BrokerError::InvalidConfig("x".into()), false)]
    fn classification(#[case] err: BrokerError, #[case] retryable: bool) {
        assert_eq!(err.is_retryable(), retryable);
    }
}
