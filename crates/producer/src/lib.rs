#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Beacon Producer
//!
//! Simulated service nodes.
//!
//! An [`EventGenerator`] owns one [`NodeIdentity`](beacon_core::NodeIdentity).
//! When started it publishes a single registration, then runs a heartbeat
//! task and a log task side by side until shut down:
//!
//! - heartbeats fire every `heartbeat_interval`, reporting DOWN with the
//!   probability set by [`LivenessPolicy`]
//! - log lines fire every `log_interval` plus up to `log_jitter`, with
//!   severity drawn from [`LevelDistribution`]
//!
//! Publish failures are retried by the [`Publisher`]; when retries run out
//! the event is dropped, the failure counted, and the task carries on.

mod catalog;
mod config;
mod error;
mod generator;
mod publisher;
mod sampling;
mod source;

pub use config::NodeConfig;
pub use error::{ConfigError, PublishError};
pub use generator::{EventGenerator, NodeHandle};
pub use publisher::{Publisher, metrics};
pub use sampling::{LatencyProfile, LevelDistribution, LivenessPolicy, Severity};
pub use source::EventSource;
