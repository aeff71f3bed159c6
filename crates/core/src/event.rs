//! Telemetry event types.
//!
//! Each event kind maps to one [`Topic`]. Serialization follows the flat,
//! field-named wire schema; optional fields that are absent in the value are
//! absent on the wire, never defaulted.
//!
//! Field values are carried as sent. `service_name` is a plain string here;
//! [`ServiceName`](crate::ServiceName) validation applies to node
//! configuration only.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::InvariantError;
use crate::id::{NodeId, NodeIdentity};
use crate::topic::Topic;

/// Liveness reported by a heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HeartbeatStatus {
    /// The node is serving.
    Up,
    /// The node reports itself unhealthy.
    Down,
}

impl HeartbeatStatus {
    /// Wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
        }
    }
}

impl fmt::Display for HeartbeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a log event.
///
/// Unrecognized spellings are kept as [`LogLevel::Other`] so newer producers
/// do not break older consumers; they never alert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogLevel {
    /// Routine operation.
    Info,
    /// Degraded operation, e.g. slow responses.
    Warn,
    /// Failed operation.
    Error,
    /// Any other severity name.
    Other(String),
}

impl LogLevel {
    /// Wire spelling.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Other(name) => name,
        }
    }

    /// Whether events of this severity raise an alert.
    #[must_use]
    pub fn is_alerting(&self) -> bool {
        matches!(self, Self::Warn | Self::Error)
    }
}

impl From<String> for LogLevel {
    fn from(value: String) -> Self {
        match value.as_str() {
            "INFO" => Self::Info,
            "WARN" => Self::Warn,
            "ERROR" => Self::Error,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for LogLevel {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Other(name) => name,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response time measured against the limit it exceeded. WARN only.
///
/// Both figures are JSON numbers, integral or not, kept exactly as sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Latency {
    /// Observed response time.
    pub response_time_ms: Number,
    /// Configured limit.
    pub threshold_limit_ms: Number,
}

impl Latency {
    /// Latency figures in milliseconds.
    pub fn new(response_time_ms: impl Into<Number>, threshold_limit_ms: impl Into<Number>) -> Self {
        Self {
            response_time_ms: response_time_ms.into(),
            threshold_limit_ms: threshold_limit_ms.into(),
        }
    }
}

/// Failure description. ERROR only; both fields are always present.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Machine-readable code, e.g. `DB_CONN_ERR`.
    pub error_code: String,
    /// Human-readable description.
    pub error_message: String,
}

impl ErrorDetails {
    /// Build error details.
    pub fn new(error_code: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            error_message: error_message.into(),
        }
    }
}

/// Announces a node once, when its generator starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationEvent {
    /// Emitting node.
    pub node_id: NodeId,
    /// Service label of the node.
    pub service_name: String,
    /// ISO-8601 emission time.
    pub timestamp: String,
}

impl RegistrationEvent {
    /// Registration for `identity` stamped with `timestamp`.
    pub fn new(identity: &NodeIdentity, timestamp: impl Into<String>) -> Self {
        Self {
            node_id: identity.node_id().clone(),
            service_name: identity.service_name().to_string(),
            timestamp: timestamp.into(),
        }
    }
}

/// Periodic liveness report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatEvent {
    /// Emitting node.
    pub node_id: NodeId,
    /// Service label of the node.
    pub service_name: String,
    /// ISO-8601 emission time.
    pub timestamp: String,
    /// Reported liveness.
    pub status: HeartbeatStatus,
}

impl HeartbeatEvent {
    /// Heartbeat for `identity` stamped with `timestamp`.
    pub fn new(
        identity: &NodeIdentity,
        timestamp: impl Into<String>,
        status: HeartbeatStatus,
    ) -> Self {
        Self {
            node_id: identity.node_id().clone(),
            service_name: identity.service_name().to_string(),
            timestamp: timestamp.into(),
            status,
        }
    }
}

/// Structured log line.
///
/// Fields are private so the presence invariant cannot be broken after
/// construction: latency only on WARN, error details only on ERROR.
/// Fields outside the schema are kept and written back unchanged.
///
/// # Examples
///
/// ```
/// use beacon_core::{Latency, LogEvent, LogLevel, NodeId};
///
/// let event = LogEvent::new(
///     NodeId::new("abcd1234ef56"),
///     "OrderService",
///     "2024-01-01T10:00:00",
///     LogLevel::Warn,
///     "slow",
/// )
/// .with_latency(Latency::new(500_u64, 200_u64))
/// .unwrap();
///
/// assert_eq!(event.response_time_ms().and_then(|n| n.as_u64()), Some(500));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LogRecord", into = "LogRecord")]
pub struct LogEvent {
    node_id: NodeId,
    service_name: String,
    timestamp: String,
    log_level: LogLevel,
    message: String,
    latency: Option<Latency>,
    error_details: Option<ErrorDetails>,
    extra: Map<String, Value>,
}

impl LogEvent {
    /// Log event without optional fields.
    pub fn new(
        node_id: NodeId,
        service_name: impl Into<String>,
        timestamp: impl Into<String>,
        log_level: LogLevel,
        message: impl Into<String>,
    ) -> Self {
        Self {
            node_id,
            service_name: service_name.into(),
            timestamp: timestamp.into(),
            log_level,
            message: message.into(),
            latency: None,
            error_details: None,
            extra: Map::new(),
        }
    }

    /// INFO event for `identity`.
    pub fn info(
        identity: &NodeIdentity,
        timestamp: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::for_identity(identity, timestamp, LogLevel::Info, message)
    }

    /// WARN event for `identity`, optionally carrying latency figures.
    pub fn warn(
        identity: &NodeIdentity,
        timestamp: impl Into<String>,
        message: impl Into<String>,
        latency: Option<Latency>,
    ) -> Self {
        let mut event = Self::for_identity(identity, timestamp, LogLevel::Warn, message);
        event.latency = latency;
        event
    }

    /// ERROR event for `identity`, optionally carrying error details.
    pub fn error(
        identity: &NodeIdentity,
        timestamp: impl Into<String>,
        message: impl Into<String>,
        error_details: Option<ErrorDetails>,
    ) -> Self {
        let mut event = Self::for_identity(identity, timestamp, LogLevel::Error, message);
        event.error_details = error_details;
        event
    }

    fn for_identity(
        identity: &NodeIdentity,
        timestamp: impl Into<String>,
        log_level: LogLevel,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            identity.node_id().clone(),
            identity.service_name().as_str(),
            timestamp,
            log_level,
            message,
        )
    }

    /// Attach latency figures. Fails unless the level is WARN.
    pub fn with_latency(mut self, latency: Latency) -> Result<Self, InvariantError> {
        if self.log_level != LogLevel::Warn {
            return Err(InvariantError::LatencyOnLevel(self.log_level));
        }
        self.latency = Some(latency);
        Ok(self)
    }

    /// Attach error details. Fails unless the level is ERROR.
    pub fn with_error_details(mut self, details: ErrorDetails) -> Result<Self, InvariantError> {
        if self.log_level != LogLevel::Error {
            return Err(InvariantError::DetailsOnLevel(self.log_level));
        }
        self.error_details = Some(details);
        Ok(self)
    }

    /// Emitting node.
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Service label of the emitting node, as sent.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// ISO-8601 emission time, as sent.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Severity.
    pub fn log_level(&self) -> &LogLevel {
        &self.log_level
    }

    /// Free-text message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Latency figures, present only on some WARN events.
    pub fn latency(&self) -> Option<&Latency> {
        self.latency.as_ref()
    }

    /// Observed response time, when latency figures are present.
    pub fn response_time_ms(&self) -> Option<&Number> {
        self.latency.as_ref().map(|l| &l.response_time_ms)
    }

    /// Response-time limit, when latency figures are present.
    pub fn threshold_limit_ms(&self) -> Option<&Number> {
        self.latency.as_ref().map(|l| &l.threshold_limit_ms)
    }

    /// Error details, present only on some ERROR events.
    pub fn error_details(&self) -> Option<&ErrorDetails> {
        self.error_details.as_ref()
    }

    /// Fields the sender added beyond the schema.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }
}

/// Flat wire shape of a [`LogEvent`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LogRecord {
    node_id: NodeId,
    service_name: String,
    timestamp: String,
    log_level: LogLevel,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    response_time_ms: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    threshold_limit_ms: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_details: Option<ErrorDetails>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<LogRecord> for LogEvent {
    type Error = InvariantError;

    fn try_from(record: LogRecord) -> Result<Self, Self::Error> {
        let mut event = Self::new(
            record.node_id,
            record.service_name,
            record.timestamp,
            record.log_level,
            record.message,
        );
        event.extra = record.extra;

        let event = match (record.response_time_ms, record.threshold_limit_ms) {
            (Some(response_time_ms), Some(threshold_limit_ms)) => event.with_latency(Latency {
                response_time_ms,
                threshold_limit_ms,
            })?,
            (None, None) => event,
            _ => return Err(InvariantError::PartialLatency),
        };

        match record.error_details {
            Some(details) => event.with_error_details(details),
            None => Ok(event),
        }
    }
}

impl From<LogEvent> for LogRecord {
    fn from(event: LogEvent) -> Self {
        Self {
            node_id: event.node_id,
            service_name: event.service_name,
            timestamp: event.timestamp,
            log_level: event.log_level,
            message: event.message,
            response_time_ms: event.latency.as_ref().map(|l| l.response_time_ms.clone()),
            threshold_limit_ms: event.latency.map(|l| l.threshold_limit_ms),
            error_details: event.error_details,
            extra: event.extra,
        }
    }
}

/// Any telemetry event, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryEvent {
    /// See [`RegistrationEvent`].
    Registration(RegistrationEvent),
    /// See [`HeartbeatEvent`].
    Heartbeat(HeartbeatEvent),
    /// See [`LogEvent`].
    Log(LogEvent),
}

impl TelemetryEvent {
    /// Topic this event travels on.
    #[must_use]
    pub fn topic(&self) -> Topic {
        match self {
            Self::Registration(_) => Topic::Registration,
            Self::Heartbeat(_) => Topic::Heartbeat,
            Self::Log(_) => Topic::Log,
        }
    }

    /// Emitting node.
    pub fn node_id(&self) -> &NodeId {
        match self {
            Self::Registration(e) => &e.node_id,
            Self::Heartbeat(e) => &e.node_id,
            Self::Log(e) => e.node_id(),
        }
    }

    /// Service label of the emitting node, as sent.
    pub fn service_name(&self) -> &str {
        match self {
            Self::Registration(e) => &e.service_name,
            Self::Heartbeat(e) => &e.service_name,
            Self::Log(e) => e.service_name(),
        }
    }

    /// ISO-8601 emission time, as sent.
    pub fn timestamp(&self) -> &str {
        match self {
            Self::Registration(e) => &e.timestamp,
            Self::Heartbeat(e) => &e.timestamp,
            Self::Log(e) => e.timestamp(),
        }
    }
}

impl From<RegistrationEvent> for TelemetryEvent {
    fn from(event: RegistrationEvent) -> Self {
        Self::Registration(event)
    }
}

impl From<HeartbeatEvent> for TelemetryEvent {
    fn from(event: HeartbeatEvent) -> Self {
        Self::Heartbeat(event)
    }
}

impl From<LogEvent> for TelemetryEvent {
    fn from(event: LogEvent) -> Self {
        Self::Log(event)
    }
}
