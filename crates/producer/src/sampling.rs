//! Random policies behind generated telemetry.

use serde::{Deserialize, Serialize};

use beacon_core::{HeartbeatStatus, Latency};

use crate::error::ConfigError;

/// Severity a generated log line is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Routine line
    Info,
    /// Degraded behavior
    Warn,
    /// Failure
    Error,
}

/// Relative weights of INFO, WARN and ERROR lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelDistribution {
    /// Weight of INFO.
    pub info: u32,
    /// Weight of WARN.
    pub warn: u32,
    /// Weight of ERROR.
    pub error: u32,
}

impl Default for LevelDistribution {
    fn default() -> Self {
        Self {
            info: 80,
            warn: 15,
            error: 5,
        }
    }
}

impl LevelDistribution {
    /// Sum of all weights.
    pub fn total(&self) -> u64 {
        u64::from(self.info) + u64::from(self.warn) + u64::from(self.error)
    }

    /// Reject an all-zero distribution.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total() == 0 {
            return Err(ConfigError::EmptyDistribution);
        }
        Ok(())
    }

    /// Draw a severity.
    pub fn sample(&self, rng: &mut fastrand::Rng) -> Severity {
        let total = self.total().max(1);
        let roll = rng.u64(0..total);
        if roll < u64::from(self.info) {
            Severity::Info
        } else if roll < u64::from(self.info) + u64::from(self.warn) {
            Severity::Warn
        } else {
            Severity::Error
        }
    }
}

/// Failure injection for heartbeats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessPolicy {
    /// Chance that a heartbeat reports DOWN, in `[0, 1]`.
    pub down_probability: f64,
}

impl Default for LivenessPolicy {
    fn default() -> Self {
        Self {
            down_probability: 0.05,
        }
    }
}

impl LivenessPolicy {
    /// Always UP.
    #[must_use]
    pub fn always_up() -> Self {
        Self {
            down_probability: 0.0,
        }
    }

    /// Reject probabilities outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        probability("liveness.down_probability", self.down_probability)
    }

    /// Draw a status.
    pub fn sample(&self, rng: &mut fastrand::Rng) -> HeartbeatStatus {
        if rng.f64() < self.down_probability {
            HeartbeatStatus::Down
        } else {
            HeartbeatStatus::Up
        }
    }
}

/// Shape of the latency figures attached to slow-response warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyProfile {
    /// Threshold reported alongside each measurement.
    pub threshold_ms: u64,
    /// Largest response time generated.
    pub max_response_ms: u64,
}

impl Default for LatencyProfile {
    fn default() -> Self {
        Self {
            threshold_ms: 200,
            max_response_ms: 2_000,
        }
    }
}

impl LatencyProfile {
    /// The ceiling has to leave room above the threshold.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_response_ms <= self.threshold_ms {
            return Err(ConfigError::LatencyRange {
                threshold_ms: self.threshold_ms,
                max_response_ms: self.max_response_ms,
            });
        }
        Ok(())
    }

    /// A response time over the threshold.
    pub fn sample(&self, rng: &mut fastrand::Rng) -> Latency {
        let low = self.threshold_ms.saturating_add(1);
        let high = self.max_response_ms.max(low);
        Latency::new(rng.u64(low..=high), self.threshold_ms)
    }
}

pub(crate) fn probability(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Probability { field, value })
    }
}
