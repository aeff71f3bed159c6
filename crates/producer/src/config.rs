//! Per-node settings.

use std::time::Duration;

use beacon_core::{NodeId, NodeIdentity, ServiceName};
use beacon_resilience::RetryPolicy;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sampling::{LatencyProfile, LevelDistribution, LivenessPolicy};

/// Everything one simulated node needs besides its broker connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Label shared by every replica of the service.
    pub service_name: String,

    /// Fixed node id. A random UUID is minted when absent.
    pub node_id: Option<String>,

    /// Time between heartbeats.
    #[serde(with = "humantime_serde")]
    pub heartbeat_interval: Duration,

    /// Base time between log lines.
    #[serde(with = "humantime_serde")]
    pub log_interval: Duration,

    /// Upper bound of the random delay added to `log_interval`.
    #[serde(with = "humantime_serde")]
    pub log_jitter: Duration,

    /// Severity weights for log lines.
    pub levels: LevelDistribution,

    /// Heartbeat failure injection.
    pub liveness: LivenessPolicy,

    /// Latency figures on slow-response warnings.
    pub latency: LatencyProfile,

    /// Backoff for failed publishes.
    pub retry: RetryPolicy,

    /// Deadline for a single publish attempt.
    #[serde(with = "humantime_serde")]
    pub publish_timeout: Duration,

    /// Seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            service_name: "PaymentService".to_string(),
            node_id: None,
            heartbeat_interval: Duration::from_secs(5),
            log_interval: Duration::from_secs(2),
            log_jitter: Duration::from_secs(1),
            levels: LevelDistribution::default(),
            liveness: LivenessPolicy::default(),
            latency: LatencyProfile::default(),
            retry: RetryPolicy::default(),
            publish_timeout: Duration::from_secs(5),
            seed: None,
        }
    }
}

impl NodeConfig {
    /// Default settings for `service_name`.
    pub fn for_service(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Self::default()
        }
    }

    /// Check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ServiceName::new(&self.service_name)?;
        for (field, value) in [
            ("heartbeat_interval", self.heartbeat_interval),
            ("log_interval", self.log_interval),
            ("publish_timeout", self.publish_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ZeroInterval { field });
            }
        }
        self.levels.validate()?;
        self.liveness.validate()?;
        self.latency.validate()?;
        self.retry.validate()?;
        Ok(())
    }

    /// Identity for a node built from this config.
    pub fn identity(&self) -> Result<NodeIdentity, ConfigError> {
        let service_name = ServiceName::new(&self.service_name)?;
        Ok(match &self.node_id {
            Some(id) => NodeIdentity::new(NodeId::new(id.clone()), service_name),
            None => NodeIdentity::generate(service_name),
        })
    }
}
