//! One consumption loop per topic.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use beacon_broker::{Broker, BrokerError, Subscription};
use beacon_core::{Topic, codec};
use beacon_telemetry::{Counter, Diagnostics, Histogram};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::ConsumerConfig;
use crate::dispatch::Dispatcher;
use crate::error::RouterError;
use crate::metrics;

/// Subscribes every configured topic under its own group and feeds the
/// dispatcher, one message at a time per topic.
#[derive(Debug)]
pub struct Router {
    config: ConsumerConfig,
    dispatcher: Arc<Dispatcher>,
    diagnostics: Diagnostics,
}

impl Router {
    /// Router over `dispatcher`.
    pub fn new(
        config: ConsumerConfig,
        dispatcher: Arc<Dispatcher>,
        diagnostics: Diagnostics,
    ) -> Result<Self, RouterError> {
        config.validate()?;
        Ok(Self {
            config,
            dispatcher,
            diagnostics,
        })
    }

    /// Subscribe every topic and spawn its loop.
    ///
    /// All subscriptions are made before any loop starts; if one fails
    /// nothing is spawned. Loops stop when `shutdown` fires or
    /// [`RouterHandle::shutdown`] is called.
    pub async fn start(
        self,
        broker: Arc<dyn Broker>,
        shutdown: CancellationToken,
    ) -> Result<RouterHandle, RouterError> {
        let mut subscriptions = Vec::with_capacity(self.config.topics.len());
        for &topic in &self.config.topics {
            let group = self.config.groups.for_topic(topic);
            let subscription = broker.subscribe(topic, group).await.map_err(|source| {
                RouterError::Subscribe {
                    topic,
                    group: group.to_owned(),
                    source,
                }
            })?;
            subscriptions.push(subscription);
        }

        let cancel = shutdown.child_token();
        let tasks = subscriptions
            .into_iter()
            .map(|subscription| {
                let diagnostics = self.diagnostics.child(subscription.topic().name());
                let span = tracing::info_span!(
                    parent: diagnostics.span(),
                    "topic_loop",
                    topic = %subscription.topic(),
                    group = subscription.group(),
                );
                let topic_loop = TopicLoop {
                    subscription,
                    dispatcher: Arc::clone(&self.dispatcher),
                    fetch_timeout: self.config.fetch_timeout,
                    error_backoff: self.config.error_backoff,
                    received: diagnostics.counter(metrics::RECEIVED),
                    malformed: diagnostics.counter(metrics::MALFORMED),
                    broker_errors: diagnostics.counter(metrics::BROKER_ERRORS),
                    dispatch_time: diagnostics.histogram(metrics::DISPATCH_MICROS),
                };
                tokio::spawn(topic_loop.run(cancel.clone()).instrument(span))
            })
            .collect();

        Ok(RouterHandle {
            cancel,
            tasks: Mutex::new(tasks),
            joined: AtomicBool::new(false),
        })
    }
}

struct TopicLoop {
    subscription: Box<dyn Subscription>,
    dispatcher: Arc<Dispatcher>,
    fetch_timeout: Duration,
    error_backoff: Duration,
    received: Counter,
    malformed: Counter,
    broker_errors: Counter,
    dispatch_time: Histogram,
}

impl TopicLoop {
    async fn run(mut self, cancel: CancellationToken) {
        let topic = self.subscription.topic();
        tracing::debug!("consuming");
        loop {
            let fetched = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                fetched = self.subscription.fetch(self.fetch_timeout) => fetched,
            };
            match fetched {
                Ok(Some(message)) => {
                    self.received.inc();
                    match codec::decode(topic, &message.payload) {
                        Ok(event) => {
                            let started = Instant::now();
                            self.dispatcher.dispatch(&event).await;
                            let micros = started.elapsed().as_micros();
                            self.dispatch_time
                                .observe(u64::try_from(micros).unwrap_or(u64::MAX));
                        }
                        Err(error) => {
                            self.malformed.inc();
                            tracing::warn!(
                                partition = message.partition,
                                offset = message.offset,
                                %error,
                                "skipping malformed message"
                            );
                        }
                    }
                }
                Ok(None) => {}
                Err(BrokerError::Closed) => {
                    tracing::info!("subscription closed");
                    break;
                }
                Err(error) => {
                    self.broker_errors.inc();
                    tracing::warn!(%error, backoff = ?self.error_backoff, "fetch failed");
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(self.error_backoff) => {}
                    }
                }
            }
        }
        tracing::debug!("stopped");
    }
}

/// Handle to the running topic loops.
#[derive(Debug)]
pub struct RouterHandle {
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    joined: AtomicBool,
}

impl RouterHandle {
    /// Whether every loop has exited.
    pub fn is_finished(&self) -> bool {
        self.joined.load(Ordering::Acquire)
            || self
                .tasks
                .try_lock()
                .is_ok_and(|tasks| tasks.iter().all(JoinHandle::is_finished))
    }

    /// Stop every loop and wait for them to exit.
    ///
    /// Safe to call more than once and from several tasks; every call
    /// returns only once the loops are gone.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.join().await;
    }

    /// Wait for every loop to exit without requesting it.
    pub async fn join(&self) {
        let mut tasks = self.tasks.lock().await;
        while let Some(task) = tasks.last_mut() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "topic loop failed");
            }
            tasks.pop();
        }
        self.joined.store(true, Ordering::Release);
    }
}
