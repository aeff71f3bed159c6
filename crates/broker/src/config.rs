//! Broker connection settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::BrokerError;

/// Where to find the broker and how patiently to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Addresses tried in order; the first one hosting a broker wins.
    pub bootstrap_servers: Vec<String>,
    /// Partitions per topic for brokers created from this config.
    pub partitions: u32,
    /// How long `connect` waits for any address to come up.
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: vec!["localhost:9092".to_string()],
            partitions: 3,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl BrokerConfig {
    /// Config pointing at a single address.
    pub fn with_address(address: impl Into<String>) -> Self {
        Self {
            bootstrap_servers: vec![address.into()],
            ..Self::default()
        }
    }

    /// Reject configurations no connection could be made from.
    pub fn validate(&self) -> Result<(), BrokerError> {
        if self.bootstrap_servers.iter().all(|s| s.trim().is_empty()) {
            return Err(BrokerError::InvalidConfig(
                "bootstrap_servers must name at least one address".into(),
            ));
        }
        if self.partitions == 0 {
            return Err(BrokerError::InvalidConfig(
                "partitions must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Addresses joined for diagnostics.
    pub fn addresses(&self) -> String {
        self.bootstrap_servers.join(",")
    }
}
