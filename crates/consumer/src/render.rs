//! Operator-facing lines.
//!
//! Formatting is pure: an event always renders to the same text. Styling
//! is left to the sink, which only sees a [`Presentation`] hint.

use std::fmt;
use std::io;
use std::sync::Arc;

use beacon_core::{
    HeartbeatEvent, HeartbeatStatus, LogEvent, LogLevel, RegistrationEvent, TelemetryEvent,
    timestamp,
};

use crate::dispatch::RenderHandler;
use crate::error::HandlerError;
use crate::sink::LineSink;

/// How a line should stand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Presentation {
    /// INFO, heartbeat UP.
    Success,
    /// WARN.
    Caution,
    /// ERROR, heartbeat DOWN.
    Danger,
    /// Unrecognized severity.
    Neutral,
    /// Registrations.
    Highlight,
}

impl Presentation {
    /// Attribute for a log severity.
    pub fn for_level(level: &LogLevel) -> Self {
        match level {
            LogLevel::Info => Self::Success,
            LogLevel::Warn => Self::Caution,
            LogLevel::Error => Self::Danger,
            LogLevel::Other(_) => Self::Neutral,
        }
    }

    /// Attribute for a heartbeat status.
    pub fn for_status(status: HeartbeatStatus) -> Self {
        match status {
            HeartbeatStatus::Up => Self::Success,
            HeartbeatStatus::Down => Self::Danger,
        }
    }
}

/// One display line and its presentation hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    /// Styling hint.
    pub presentation: Presentation,
    /// Unstyled text.
    pub text: String,
}

impl RenderedLine {
    /// Line with `text` shown as `presentation`.
    pub fn new(presentation: Presentation, text: impl Into<String>) -> Self {
        Self {
            presentation,
            text: text.into(),
        }
    }
}

impl fmt::Display for RenderedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Render any event.
pub fn render(event: &TelemetryEvent) -> RenderedLine {
    match event {
        TelemetryEvent::Registration(e) => registration(e),
        TelemetryEvent::Heartbeat(e) => heartbeat(e),
        TelemetryEvent::Log(e) => log(e),
    }
}

/// `[ts] [REGISTRATION] New service registered: svc (id)`
pub fn registration(event: &RegistrationEvent) -> RenderedLine {
    RenderedLine::new(
        Presentation::Highlight,
        format!(
            "[{}] [REGISTRATION] New service registered: {} ({})",
            timestamp::display(&event.timestamp),
            event.service_name,
            event.node_id.short(),
        ),
    )
}

/// `[ts] [HEARTBEAT] svc (id): Status: UP`
pub fn heartbeat(event: &HeartbeatEvent) -> RenderedLine {
    RenderedLine::new(
        Presentation::for_status(event.status),
        format!(
            "[{}] [HEARTBEAT] {} ({}): Status: {}",
            timestamp::display(&event.timestamp),
            event.service_name,
            event.node_id.short(),
            event.status.as_str(),
        ),
    )
}

/// `[ts] [LEVEL] svc (id): message` plus latency or error details.
pub fn log(event: &LogEvent) -> RenderedLine {
    RenderedLine::new(
        Presentation::for_level(event.log_level()),
        format!(
            "[{}] [{}] {}",
            timestamp::display(event.timestamp()),
            event.log_level(),
            log_body(event),
        ),
    )
}

/// `svc (id): message` plus the severity-specific suffix.
pub(crate) fn log_body(event: &LogEvent) -> String {
    let mut body = format!(
        "{} ({}): {}",
        event.service_name(),
        event.node_id().short(),
        event.message()
    );
    match event.log_level() {
        LogLevel::Warn => {
            if let Some(latency) = event.latency() {
                body.push_str(&format!(
                    " [Response: {}ms, Threshold: {}ms]",
                    latency.response_time_ms, latency.threshold_limit_ms
                ));
            }
        }
        LogLevel::Error => {
            if let Some(details) = event.error_details() {
                body.push_str(&format!(
                    " [Code: {}, Details: {}]",
                    details.error_code, details.error_message
                ));
            }
        }
        LogLevel::Info | LogLevel::Other(_) => {}
    }
    body
}

/// Writes the rendered line of every event to a sink.
#[derive(Clone)]
pub struct Renderer {
    sink: Arc<dyn LineSink>,
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer").finish_non_exhaustive()
    }
}

impl Renderer {
    /// Renderer writing to `sink`.
    pub fn new(sink: Arc<dyn LineSink>) -> Self {
        Self { sink }
    }

    fn emit(&self, line: &RenderedLine) -> io::Result<()> {
        self.sink.emit(line)
    }
}

impl RenderHandler for Renderer {
    fn registration(&self, event: &RegistrationEvent) -> Result<(), HandlerError> {
        Ok(self.emit(&registration(event))?)
    }

    fn heartbeat(&self, event: &HeartbeatEvent) -> Result<(), HandlerError> {
        Ok(self.emit(&heartbeat(event))?)
    }

    fn log(&self, event: &LogEvent) -> Result<(), HandlerError> {
        Ok(self.emit(&log(event))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::{ErrorDetails, Latency, NodeId, NodeIdentity, ServiceName, Topic};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn identity(service: &str) -> NodeIdentity {
        NodeIdentity::new(
            NodeId::new("abcd1234ef56"),
            ServiceName::new(service).unwrap(),
        )
    }

    const TS: &str = "2024-01-01T10:00:00";

    #[test]
    fn registration_line() {
        let line = registration(&RegistrationEvent::new(&identity("OrderService"), TS));
        assert_eq!(
            line.text,
            "[2024-01-01 10:00:00] [REGISTRATION] New service registered: OrderService (abcd1234)"
        );
        assert_eq!(line.presentation, Presentation::Highlight);
    }

    #[rstest]
    #[case(HeartbeatStatus::Up, Presentation::Success)]
    #[case(HeartbeatStatus::Down, Presentation::Danger)]
    fn heartbeat_presentation_follows_status(
        #[case] status: HeartbeatStatus,
        #[case] expected: Presentation,
    ) {
        let line = heartbeat(&HeartbeatEvent::new(&identity("PaymentService"), TS, status));
        assert_eq!(line.presentation, expected);
        assert!(line.text.ends_with(&format!("Status: {}", status.as_str())));
    }

    #[test]
    fn warn_line_carries_latency() {
        let event = LogEvent::warn(
            &identity("PaymentService"),
            TS,
            "slow",
            Some(Latency::new(500_u64, 200_u64)),
        );
        let line = log(&event);
        assert_eq!(
            line.text,
            "[2024-01-01 10:00:00] [WARN] PaymentService (abcd1234): slow [Response: 500ms, Threshold: 200ms]"
        );
        assert_eq!(line.presentation, Presentation::Caution);
    }

    #[test]
    fn wire_values_are_shown_as_sent() {
        let payload = br#"{"node_id":"abcd1234ef56","service_name":" PaymentService ","timestamp":"2024-01-01T10:00:00","log_level":"WARN","message":"slow","response_time_ms":500.5,"threshold_limit_ms":200}"#;
        let TelemetryEvent::Log(event) = beacon_core::decode(Topic::Log, payload).unwrap() else {
            panic!("expected a log event");
        };
        assert_eq!(
            log(&event).text,
            "[2024-01-01 10:00:00] [WARN]  PaymentService  (abcd1234): slow [Response: 500.5ms, Threshold: 200ms]"
        );
    }

    #[test]
    fn warn_without_latency_has_no_suffix() {
        let event = LogEvent::warn(&identity("PaymentService"), TS, "cache miss", None);
        assert!(log(&event).text.ends_with("cache miss"));
    }

    #[test]
    fn error_line_carries_details() {
        let event = LogEvent::error(
            &identity("InventoryService"),
            TS,
            "failed",
            Some(ErrorDetails::new("E1", "boom")),
        );
        let line = log(&event);
        assert!(line.text.ends_with("failed [Code: E1, Details: boom]"));
        assert!(!line.text.contains("Response"));
        assert_eq!(line.presentation, Presentation::Danger);
    }

    #[test]
    fn unknown_level_is_neutral() {
        let event = LogEvent::new(
            NodeId::new("abcd1234ef56"),
            ServiceName::new("OrderService").unwrap(),
            TS,
            LogLevel::Other("DEBUG".into()),
            "trace",
        );
        let line = log(&event);
        assert_eq!(line.presentation, Presentation::Neutral);
        assert!(line.text.contains("[DEBUG]"));
    }

    #[test]
    fn unparsable_timestamp_is_shown_raw() {
        let line = registration(&RegistrationEvent::new(&identity("OrderService"), "yesterday"));
        assert!(line.text.starts_with("[yesterday] "));
    }

    #[test]
    fn short_ids_are_not_padded() {
        let identity = NodeIdentity::new(NodeId::new("n1"), ServiceName::new("A").unwrap());
        let line = registration(&RegistrationEvent::new(&identity, TS));
        assert!(line.text.ends_with("A (n1)"));
    }
}
