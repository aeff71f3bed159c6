#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Beacon Core
//!
//! Shared vocabulary for the beacon telemetry fleet.
//!
//! This crate provides:
//! - [`NodeIdentity`] -- stable id + service label of one simulated node
//! - [`Topic`] -- the three broker channels and their default consumer groups
//! - [`TelemetryEvent`] -- tagged union of [`RegistrationEvent`], [`HeartbeatEvent`]
//!   and [`LogEvent`]
//! - [`codec`] -- the canonical JSON wire schema, validated at the decode boundary
//!
//! Events are immutable values. A [`LogEvent`] can only be built (or decoded)
//! when its optional fields agree with its severity: latency figures travel
//! together and only on `WARN`, error details only on `ERROR`.

pub mod codec;
pub mod event;
pub mod id;
pub mod keys;
pub mod timestamp;
pub mod topic;

mod error;

pub use codec::{CodecError, decode, encode, to_document};
pub use error::InvariantError;
pub use event::{
    ErrorDetails, HeartbeatEvent, HeartbeatStatus, Latency, LogEvent, LogLevel,
    RegistrationEvent, TelemetryEvent,
};
pub use id::{NodeId, NodeIdentity};
pub use keys::{ServiceName, ServiceNameError};
pub use topic::{Topic, UnknownTopic};
