//! Lifecycle of one simulated node.

use std::sync::Arc;
use std::time::Duration;

use beacon_broker::Broker;
use beacon_core::{NodeIdentity, TelemetryEvent};
use beacon_telemetry::Diagnostics;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::NodeConfig;
use crate::error::ConfigError;
use crate::publisher::Publisher;
use crate::source::EventSource;

/// Drives one node: a registration, then heartbeats and log lines on
/// independent schedules until shut down.
#[derive(Debug)]
pub struct EventGenerator {
    source: EventSource,
    publisher: Publisher,
    heartbeat_interval: Duration,
    log_interval: Duration,
    log_jitter: Duration,
    diagnostics: Diagnostics,
}

impl EventGenerator {
    /// Validate `config` and prepare a node publishing through `broker`.
    pub fn new(
        config: &NodeConfig,
        broker: Arc<dyn Broker>,
        diagnostics: Diagnostics,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let identity = config.identity()?;
        let diagnostics = diagnostics.child(format!(
            "{}.{}",
            identity.service_name(),
            identity.node_id().short()
        ));
        let rng = config
            .seed
            .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
        let source = EventSource::new(
            identity,
            config.levels,
            config.liveness,
            config.latency,
            rng,
        );
        let publisher = Publisher::new(
            broker,
            config.retry.clone(),
            config.publish_timeout,
            diagnostics.child("publisher"),
        );
        Ok(Self {
            source,
            publisher,
            heartbeat_interval: config.heartbeat_interval,
            log_interval: config.log_interval,
            log_jitter: config.log_jitter,
            diagnostics,
        })
    }

    /// Identity of the node.
    pub fn identity(&self) -> &NodeIdentity {
        self.source.identity()
    }

    /// Spawn the node on the current runtime.
    ///
    /// The node stops when `shutdown` fires or [`NodeHandle::shutdown`] is
    /// called; no event is published after that point.
    pub fn start(self, shutdown: CancellationToken) -> NodeHandle {
        let identity = self.identity().clone();
        let cancel = shutdown.child_token();
        let span = self.diagnostics.span().clone();
        let task = tokio::spawn(self.run(cancel.clone()).instrument(span));
        NodeHandle {
            identity,
            cancel,
            task,
        }
    }

    async fn run(mut self, cancel: CancellationToken) {
        let registration = TelemetryEvent::from(self.source.registration());
        match self.publisher.publish(&registration, &cancel).await {
            Ok(_) => tracing::info!(node = %self.source.identity(), "registered"),
            Err(e) if e.is_cancelled() => return,
            Err(e) => tracing::warn!(error = %e, "registration failed; continuing"),
        }

        let heartbeats = tokio::spawn(
            heartbeat_loop(
                self.source.fork(),
                self.publisher.clone(),
                self.heartbeat_interval,
                cancel.clone(),
            )
            .in_current_span(),
        );
        let logs = tokio::spawn(
            log_loop(
                self.source.fork(),
                self.publisher.clone(),
                self.log_interval,
                self.log_jitter,
                cancel,
            )
            .in_current_span(),
        );

        for (task, outcome) in [("heartbeat", heartbeats.await), ("log", logs.await)] {
            if let Err(e) = outcome {
                tracing::error!(task, error = %e, "node task aborted");
            }
        }
        tracing::debug!("node stopped");
    }
}

async fn heartbeat_loop(
    mut source: EventSource,
    publisher: Publisher,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let event = TelemetryEvent::from(source.heartbeat());
        if !emit(&publisher, &event, &cancel).await {
            break;
        }
    }
}

async fn log_loop(
    mut source: EventSource,
    publisher: Publisher,
    interval: Duration,
    jitter: Duration,
    cancel: CancellationToken,
) {
    loop {
        let delay = interval + source.jitter(jitter);
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
        let event = TelemetryEvent::from(source.log());
        if !emit(&publisher, &event, &cancel).await {
            break;
        }
    }
}

/// Publish one event. Returns false once the node is shutting down.
async fn emit(publisher: &Publisher, event: &TelemetryEvent, cancel: &CancellationToken) -> bool {
    match publisher.publish(event, cancel).await {
        Ok(_) => true,
        Err(e) if e.is_cancelled() => false,
        Err(e) => {
            tracing::warn!(topic = %event.topic(), error = %e, "dropping event");
            true
        }
    }
}

/// Handle to a running node.
#[derive(Debug)]
pub struct NodeHandle {
    identity: NodeIdentity,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl NodeHandle {
    /// Identity of the node.
    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// Whether every task of the node has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the node and wait until its tasks have exited.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        self.join().await;
    }

    /// Wait for the node to stop without requesting it.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::error!(node = %self.identity, error = %e, "node task failed");
        }
    }
}
