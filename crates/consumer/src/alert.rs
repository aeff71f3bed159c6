//! Alerts for WARN and ERROR logs.

use std::fmt;
use std::sync::Arc;

use beacon_core::LogEvent;
use beacon_telemetry::{Counter, Diagnostics};

use crate::dispatch::AlertHandler;
use crate::error::HandlerError;
use crate::metrics::ALERTS;
use crate::render::{Presentation, RenderedLine, log_body};
use crate::sink::LineSink;

/// `[ALERT] [LEVEL] svc (id): message` for alerting severities.
///
/// Returns `None` for INFO and unrecognized levels.
pub fn alert_line(event: &LogEvent) -> Option<RenderedLine> {
    let level = event.log_level();
    level.is_alerting().then(|| {
        RenderedLine::new(
            Presentation::for_level(level),
            format!("[ALERT] [{level}] {}", log_body(event)),
        )
    })
}

/// Writes an alert line ahead of the regular render.
#[derive(Clone)]
pub struct Alerter {
    sink: Arc<dyn LineSink>,
    alerts: Counter,
}

impl fmt::Debug for Alerter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Alerter")
            .field("alerts", &self.alerts.get())
            .finish_non_exhaustive()
    }
}

impl Alerter {
    /// Alerter writing to `sink`.
    pub fn new(sink: Arc<dyn LineSink>, diagnostics: &Diagnostics) -> Self {
        Self {
            sink,
            alerts: diagnostics.counter(ALERTS),
        }
    }
}

impl AlertHandler for Alerter {
    fn alert(&self, event: &LogEvent) -> Result<(), HandlerError> {
        let Some(line) = alert_line(event) else {
            return Ok(());
        };
        self.sink.emit(&line)?;
        self.alerts.inc();
        tracing::debug!(
            node_id = %event.node_id(),
            level = %event.log_level(),
            "alert raised"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use beacon_core::{ErrorDetails, LogLevel, NodeId, NodeIdentity, ServiceName};
    use pretty_assertions::assert_eq;

    fn identity() -> NodeIdentity {
        NodeIdentity::new(
            NodeId::new("abcd1234ef56"),
            ServiceName::new("OrderService").unwrap(),
        )
    }

    #[test]
    fn info_does_not_alert() {
        assert_eq!(alert_line(&LogEvent::info(&identity(), "t", "ok")), None);
    }

    #[test]
    fn unknown_levels_never_alert() {
        let identity = identity();
        let event = LogEvent::new(
            identity.node_id().clone(),
            identity.service_name().as_str(),
            "t",
            LogLevel::Other("DEBUG".into()),
            "verbose",
        );
        assert_eq!(alert_line(&event), None);
    }

    #[test]
    fn error_alert_is_marked_and_danger() {
        let event = LogEvent::error(
            &identity(),
            "t",
            "db down",
            Some(ErrorDetails::new("DB_CONN_ERR", "refused")),
        );
        let line = alert_line(&event).unwrap();
        assert_eq!(
            line.text,
            "[ALERT] [ERROR] OrderService (abcd1234): db down [Code: DB_CONN_ERR, Details: refused]"
        );
        assert_eq!(line.presentation, Presentation::Danger);
    }

    #[test]
    fn alerter_counts_alerts() {
        let sink = MemorySink::new();
        let diagnostics = Diagnostics::detached("test");
        let alerter = Alerter::new(Arc::new(sink.clone()), &diagnostics);

        alerter.alert(&LogEvent::info(&identity(), "t", "fine")).unwrap();
        alerter
            .alert(&LogEvent::warn(&identity(), "t", "slow", None))
            .unwrap();

        assert_eq!(sink.lines().len(), 1);
        assert_eq!(diagnostics.metrics().snapshot().counter(ALERTS), 1);
    }
}
