//! Routes decoded events to their handlers.
//!
//! Which handlers run depends only on the event kind and, for logs, the
//! severity and whether persistence is on:
//!
//! | event        | handlers                                   |
//! |--------------|--------------------------------------------|
//! | registration | render                                     |
//! | heartbeat    | render                                     |
//! | log          | alert (WARN/ERROR), render, persist (if on) |
//!
//! Each handler runs in isolation. A failure or panic is recorded in the
//! [`DispatchReport`] and the remaining handlers still run.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use beacon_core::{HeartbeatEvent, LogEvent, RegistrationEvent, TelemetryEvent};
use beacon_telemetry::{Counter, Diagnostics};
use futures::FutureExt;

use crate::error::{HandlerError, HandlerKind};
use crate::metrics;

/// Display handler, one method per event kind.
pub trait RenderHandler: Send + Sync {
    /// Show a registration.
    fn registration(&self, event: &RegistrationEvent) -> Result<(), HandlerError>;
    /// Show a heartbeat.
    fn heartbeat(&self, event: &HeartbeatEvent) -> Result<(), HandlerError>;
    /// Show a log line.
    fn log(&self, event: &LogEvent) -> Result<(), HandlerError>;
}

/// Raises alerts for WARN and ERROR logs.
pub trait AlertHandler: Send + Sync {
    /// Alert on `event`.
    fn alert(&self, event: &LogEvent) -> Result<(), HandlerError>;
}

/// Stores log events.
#[async_trait]
pub trait PersistHandler: Send + Sync {
    /// Store `event`.
    async fn persist(&self, event: &LogEvent) -> Result<(), HandlerError>;
}

/// What happened to one message.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Handlers invoked, in order.
    pub invoked: Vec<HandlerKind>,
    /// Handlers that failed.
    pub failures: Vec<(HandlerKind, HandlerError)>,
}

impl DispatchReport {
    /// Whether every invoked handler succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether `kind` was invoked and succeeded.
    pub fn succeeded(&self, kind: HandlerKind) -> bool {
        self.invoked.contains(&kind) && !self.failures.iter().any(|(k, _)| *k == kind)
    }

    fn record(&mut self, kind: HandlerKind, outcome: Result<(), HandlerError>) {
        self.invoked.push(kind);
        if let Err(e) = outcome {
            self.failures.push((kind, e));
        }
    }
}

/// Fixed handler set for one consumer.
pub struct Dispatcher {
    renderer: Arc<dyn RenderHandler>,
    alerter: Arc<dyn AlertHandler>,
    persister: Option<Arc<dyn PersistHandler>>,
    dispatched: Counter,
    failures: Counter,
    diagnostics: Diagnostics,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("persistence", &self.persister.is_some())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Dispatcher without persistence.
    pub fn new(
        renderer: Arc<dyn RenderHandler>,
        alerter: Arc<dyn AlertHandler>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            renderer,
            alerter,
            persister: None,
            dispatched: diagnostics.counter(metrics::DISPATCHED),
            failures: diagnostics.counter(metrics::HANDLER_FAILURES),
            diagnostics,
        }
    }

    /// Also store every log event.
    #[must_use]
    pub fn with_persister(mut self, persister: Arc<dyn PersistHandler>) -> Self {
        self.persister = Some(persister);
        self
    }

    /// Run every handler `event` is routed to.
    pub async fn dispatch(&self, event: &TelemetryEvent) -> DispatchReport {
        let mut report = DispatchReport::default();
        match event {
            TelemetryEvent::Registration(e) => {
                report.record(
                    HandlerKind::Render,
                    guarded(HandlerKind::Render, || self.renderer.registration(e)),
                );
            }
            TelemetryEvent::Heartbeat(e) => {
                report.record(
                    HandlerKind::Render,
                    guarded(HandlerKind::Render, || self.renderer.heartbeat(e)),
                );
            }
            TelemetryEvent::Log(e) => {
                if e.log_level().is_alerting() {
                    report.record(
                        HandlerKind::Alert,
                        guarded(HandlerKind::Alert, || self.alerter.alert(e)),
                    );
                }
                report.record(
                    HandlerKind::Render,
                    guarded(HandlerKind::Render, || self.renderer.log(e)),
                );
                if let Some(persister) = &self.persister {
                    let outcome = AssertUnwindSafe(persister.persist(e))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|panic| Err(panicked(HandlerKind::Persist, &*panic)));
                    report.record(HandlerKind::Persist, outcome);
                }
            }
        }

        self.dispatched.inc();
        for (handler, error) in &report.failures {
            self.failures.inc();
            tracing::warn!(
                parent: self.diagnostics.span(),
                topic = %event.topic(),
                node_id = %event.node_id(),
                %handler,
                %error,
                "handler failed"
            );
        }
        report
    }
}

fn guarded(
    kind: HandlerKind,
    handler: impl FnOnce() -> Result<(), HandlerError>,
) -> Result<(), HandlerError> {
    std::panic::catch_unwind(AssertUnwindSafe(handler))
        .unwrap_or_else(|panic| Err(panicked(kind, &*panic)))
}

fn panicked(handler: HandlerKind, payload: &(dyn Any + Send)) -> HandlerError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned());
    HandlerError::Panicked { handler, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::Alerter;
    use crate::render::Renderer;
    use crate::sink::MemorySink;
    use beacon_core::{HeartbeatStatus, NodeId, NodeIdentity, ServiceName};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    fn identity() -> NodeIdentity {
        NodeIdentity::new(
            NodeId::new("abcd1234ef56"),
            ServiceName::new("OrderService").unwrap(),
        )
    }

    #[derive(Default)]
    struct Recording(Mutex<Vec<LogEvent>>);

    #[async_trait]
    impl PersistHandler for Recording {
        async fn persist(&self, event: &LogEvent) -> Result<(), HandlerError> {
            self.0.lock().push(event.clone());
            Ok(())
        }
    }

    struct Exploding;

    impl AlertHandler for Exploding {
        fn alert(&self, _event: &LogEvent) -> Result<(), HandlerError> {
            panic!("alert channel exploded")
        }
    }

    fn dispatcher(sink: &MemorySink, diagnostics: &Diagnostics) -> Dispatcher {
        let sink: Arc<MemorySink> = Arc::new(sink.clone());
        Dispatcher::new(
            Arc::new(Renderer::new(sink.clone())),
            Arc::new(Alerter::new(sink, diagnostics)),
            diagnostics.clone(),
        )
    }

    #[tokio::test]
    async fn heartbeat_is_only_rendered() {
        let sink = MemorySink::new();
        let d = dispatcher(&sink, &Diagnostics::detached("test"));
        let event = HeartbeatEvent::new(&identity(), "t", HeartbeatStatus::Up).into();
        let report = d.dispatch(&event).await;
        assert_eq!(report.invoked, vec![HandlerKind::Render]);
        assert_eq!(sink.lines().len(), 1);
    }

    #[tokio::test]
    async fn info_log_skips_alert() {
        let sink = MemorySink::new();
        let store = Arc::new(Recording::default());
        let d = dispatcher(&sink, &Diagnostics::detached("test")).with_persister(store.clone());
        let report = d.dispatch(&LogEvent::info(&identity(), "t", "ok").into()).await;
        assert_eq!(report.invoked, vec![HandlerKind::Render, HandlerKind::Persist]);
        assert!(report.is_clean());
        assert_eq!(store.0.lock().len(), 1);
    }

    #[tokio::test]
    async fn error_log_alerts_renders_and_persists() {
        let sink = MemorySink::new();
        let store = Arc::new(Recording::default());
        let d = dispatcher(&sink, &Diagnostics::detached("test")).with_persister(store.clone());
        let report = d
            .dispatch(&LogEvent::error(&identity(), "t", "boom", None).into())
            .await;
        assert_eq!(
            report.invoked,
            vec![HandlerKind::Alert, HandlerKind::Render, HandlerKind::Persist]
        );
        let lines = sink.lines();
        assert!(lines[0].text.starts_with("[ALERT] [ERROR]"));
        assert!(lines[1].text.contains("[ERROR] OrderService"));
    }

    #[tokio::test]
    async fn panicking_handler_is_isolated() {
        let sink = MemorySink::new();
        let diagnostics = Diagnostics::detached("test");
        let store = Arc::new(Recording::default());
        let d = Dispatcher::new(
            Arc::new(Renderer::new(Arc::new(sink.clone()))),
            Arc::new(Exploding),
            diagnostics.clone(),
        )
        .with_persister(store.clone());

        let report = d
            .dispatch(&LogEvent::warn(&identity(), "t", "slow", None).into())
            .await;

        assert!(matches!(
            &report.failures[..],
            [(HandlerKind::Alert, HandlerError::Panicked { message, .. })]
                if message == "alert channel exploded"
        ));
        assert!(report.succeeded(HandlerKind::Render));
        assert!(report.succeeded(HandlerKind::Persist));
        assert_eq!(store.0.lock().len(), 1);
        let snapshot = diagnostics.metrics().snapshot();
        assert_eq!(snapshot.counter(metrics::HANDLER_FAILURES), 1);
        assert_eq!(snapshot.counter(metrics::DISPATCHED), 1);
    }
}
