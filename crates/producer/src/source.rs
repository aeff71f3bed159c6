//! Builds the events one node emits.

use std::time::Duration;

use beacon_core::{
    ErrorDetails, HeartbeatEvent, LogEvent, NodeIdentity, RegistrationEvent, timestamp,
};

use crate::catalog;
use crate::sampling::{LatencyProfile, LevelDistribution, LivenessPolicy, Severity};

/// Random event factory for one node.
///
/// Each task of a node owns its own source, forked from the node's seed.
#[derive(Debug, Clone)]
pub struct EventSource {
    identity: NodeIdentity,
    levels: LevelDistribution,
    liveness: LivenessPolicy,
    latency: LatencyProfile,
    rng: fastrand::Rng,
}

impl EventSource {
    /// Source for `identity` with the given policies.
    pub fn new(
        identity: NodeIdentity,
        levels: LevelDistribution,
        liveness: LivenessPolicy,
        latency: LatencyProfile,
        rng: fastrand::Rng,
    ) -> Self {
        Self {
            identity,
            levels,
            liveness,
            latency,
            rng,
        }
    }

    /// Independent source with the same policies.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        Self {
            rng: self.rng.fork(),
            ..self.clone()
        }
    }

    /// Node this source speaks for.
    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// The one-shot registration.
    pub fn registration(&self) -> RegistrationEvent {
        RegistrationEvent::new(&self.identity, timestamp::now())
    }

    /// A heartbeat with a status drawn from the liveness policy.
    pub fn heartbeat(&mut self) -> HeartbeatEvent {
        let status = self.liveness.sample(&mut self.rng);
        HeartbeatEvent::new(&self.identity, timestamp::now(), status)
    }

    /// Uniform random delay in `[0, max]`.
    pub fn jitter(&mut self, max: Duration) -> Duration {
        max.mul_f64(self.rng.f64())
    }

    /// A log line with severity drawn from the level distribution.
    pub fn log(&mut self) -> LogEvent {
        let now = timestamp::now();
        match self.levels.sample(&mut self.rng) {
            Severity::Info => LogEvent::info(&self.identity, now, catalog::info(&mut self.rng)),
            Severity::Warn => {
                let entry = catalog::warn(&mut self.rng);
                let latency = entry
                    .with_latency
                    .then(|| self.latency.sample(&mut self.rng));
                LogEvent::warn(&self.identity, now, entry.message, latency)
            }
            Severity::Error => {
                let entry = catalog::error(&mut self.rng);
                let details = entry
                    .details
                    .map(|(code, detail)| ErrorDetails::new(code, detail));
                LogEvent::error(&self.identity, now, entry.message, details)
            }
        }
    }
}
