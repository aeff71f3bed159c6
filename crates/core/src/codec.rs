//! Canonical wire codec.
//!
//! Payloads are JSON documents in the flat schema of each event kind. The
//! topic decides which kind a payload is decoded as; nothing on the wire
//! tags the kind.

use crate::event::{LogEvent, TelemetryEvent};
use crate::topic::Topic;

/// Errors raised while encoding or decoding wire payloads.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The payload is not a valid document for the topic's event kind.
    #[error("malformed {topic} message: {source}")]
    Malformed {
        /// Topic the payload arrived on.
        topic: Topic,
        /// Underlying parse or validation failure.
        #[source]
        source: serde_json::Error,
    },

    /// The event could not be serialized.
    #[error("failed to encode event: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Serialize an event to its wire payload.
pub fn encode(event: &TelemetryEvent) -> Result<Vec<u8>, CodecError> {
    let bytes = match event {
        TelemetryEvent::Registration(e) => serde_json::to_vec(e),
        TelemetryEvent::Heartbeat(e) => serde_json::to_vec(e),
        TelemetryEvent::Log(e) => serde_json::to_vec(e),
    };
    bytes.map_err(CodecError::Encode)
}

/// Parse a payload received on `topic`.
///
/// Presence invariants are checked here; a payload that violates them is
/// [`CodecError::Malformed`].
pub fn decode(topic: Topic, payload: &[u8]) -> Result<TelemetryEvent, CodecError> {
    let parsed = match topic {
        Topic::Registration => serde_json::from_slice(payload).map(TelemetryEvent::Registration),
        Topic::Heartbeat => serde_json::from_slice(payload).map(TelemetryEvent::Heartbeat),
        Topic::Log => serde_json::from_slice(payload).map(TelemetryEvent::Log),
    };
    parsed.map_err(|source| CodecError::Malformed { topic, source })
}

/// Structured document for the index store. Fields pass through verbatim.
pub fn to_document(event: &LogEvent) -> Result<serde_json::Value, CodecError> {
    serde_json::to_value(event).map_err(CodecError::Encode)
}
