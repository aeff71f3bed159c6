//! Encodes events and hands them to the broker.

use std::sync::Arc;
use std::time::Duration;

use beacon_broker::{Broker, BrokerError, Delivery};
use beacon_core::{TelemetryEvent, codec};
use beacon_resilience::{RetryError, RetryPolicy, retry};
use beacon_telemetry::{Counter, Diagnostics};
use tokio_util::sync::CancellationToken;

use crate::error::{PublishError, timeout_error};

/// Counter names recorded by [`Publisher`].
pub mod metrics {
    /// Events accepted by the broker.
    pub const PUBLISHED: &str = "producer.published";
    /// Events given up on.
    pub const PUBLISH_FAILURES: &str = "producer.publish_failures";
    /// Attempts beyond the first.
    pub const RETRIES: &str = "producer.retries";
}

/// Serializes events and publishes them keyed by node id.
///
/// Transient broker errors are retried with the configured backoff; each
/// attempt runs under its own deadline.
#[derive(Clone)]
pub struct Publisher {
    broker: Arc<dyn Broker>,
    retry: RetryPolicy,
    attempt_timeout: Duration,
    published: Counter,
    failures: Counter,
    retries: Counter,
    diagnostics: Diagnostics,
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("retry", &self.retry)
            .field("attempt_timeout", &self.attempt_timeout)
            .finish_non_exhaustive()
    }
}

impl Publisher {
    /// Publisher over `broker`.
    pub fn new(
        broker: Arc<dyn Broker>,
        retry: RetryPolicy,
        attempt_timeout: Duration,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            broker,
            retry,
            attempt_timeout,
            published: diagnostics.counter(metrics::PUBLISHED),
            failures: diagnostics.counter(metrics::PUBLISH_FAILURES),
            retries: diagnostics.counter(metrics::RETRIES),
            diagnostics,
        }
    }

    /// Publish `event` to its topic.
    ///
    /// Nothing is sent once `cancel` has fired.
    pub async fn publish(
        &self,
        event: &TelemetryEvent,
        cancel: &CancellationToken,
    ) -> Result<Delivery, PublishError> {
        let topic = event.topic();
        let payload = codec::encode(event)?;
        let key = event.node_id().as_str();

        let outcome = retry(&self.retry, cancel, |attempt| {
            if attempt > 1 {
                self.retries.inc();
            }
            let broker = Arc::clone(&self.broker);
            let payload = payload.clone();
            let deadline = self.attempt_timeout;
            async move {
                beacon_resilience::timeout(deadline, broker.publish(topic, key, payload))
                    .await
                    .unwrap_or_else(|e| Err(timeout_error(e.duration)))
            }
        })
        .await;

        match outcome {
            Ok(delivery) => {
                self.published.inc();
                tracing::trace!(
                    parent: self.diagnostics.span(),
                    %topic,
                    partition = delivery.partition,
                    offset = delivery.offset,
                    "published"
                );
                Ok(delivery)
            }
            Err(RetryError::Cancelled) => Err(PublishError::Cancelled { topic }),
            Err(err) => {
                self.failures.inc();
                Err(classify(topic, err))
            }
        }
    }
}

fn classify(topic: beacon_core::Topic, err: RetryError<BrokerError>) -> PublishError {
    match err {
        RetryError::Exhausted { attempts, last } => PublishError::Exhausted {
            topic,
            attempts,
            source: last,
        },
        RetryError::Permanent(source) => PublishError::Rejected { topic, source },
        RetryError::Cancelled => PublishError::Cancelled { topic },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_broker::MemoryBroker;
    use beacon_core::{NodeIdentity, RegistrationEvent, ServiceName, Topic};
    use beacon_resilience::JitterPolicy;
    use slow::SlowBroker;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(10),
            multiplier: 2.0,
            max_delay: Duration::from_millis(100),
            jitter: JitterPolicy::None,
        }
    }

    fn event() -> TelemetryEvent {
        let identity = NodeIdentity::generate(ServiceName::new("PaymentService").unwrap());
        RegistrationEvent::new(&identity, "2024-01-01T10:00:00").into()
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_to_event_topic() {
        let broker = MemoryBroker::new(2);
        let diag = Diagnostics::detached("test");
        let publisher = Publisher::new(
            Arc::new(broker.clone()),
            policy(3),
            Duration::from_secs(1),
            diag.clone(),
        );
        publisher
            .publish(&event(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(broker.len(Topic::Registration), 1);
        assert_eq!(diag.metrics().snapshot().counter(metrics::PUBLISHED), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn outage_exhausts_retries() {
        let broker = MemoryBroker::new(1);
        broker.set_available(false);
        let diag = Diagnostics::detached("test");
        let publisher = Publisher::new(
            Arc::new(broker),
            policy(3),
            Duration::from_secs(1),
            diag.clone(),
        );
        let err = publisher
            .publish(&event(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Exhausted { attempts: 3, .. }));

        let snap = diag.metrics().snapshot();
        assert_eq!(snap.counter(metrics::RETRIES), 2);
        assert_eq!(snap.counter(metrics::PUBLISH_FAILURES), 1);
        assert_eq!(snap.counter(metrics::PUBLISHED), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_broker_is_not_retried() {
        let broker = MemoryBroker::new(1);
        broker.close();
        let diag = Diagnostics::detached("test");
        let publisher =
            Publisher::new(Arc::new(broker), policy(5), Duration::from_secs(1), diag.clone());
        let err = publisher
            .publish(&event(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Rejected { source: BrokerError::Closed, .. }));
        assert_eq!(diag.metrics().snapshot().counter(metrics::RETRIES), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_attempts_time_out() {
        let diag = Diagnostics::detached("test");
        let publisher = Publisher::new(
            Arc::new(SlowBroker),
            policy(2),
            Duration::from_millis(100),
            diag,
        );
        let err = publisher
            .publish(&event(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PublishError::Exhausted {
                source: BrokerError::Timeout(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn cancelled_publish_sends_nothing() {
        let broker = MemoryBroker::new(1);
        let publisher = Publisher::new(
            Arc::new(broker.clone()),
            policy(3),
            Duration::from_secs(1),
            Diagnostics::detached("test"),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = publisher.publish(&event(), &cancel).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(broker.is_empty(Topic::Registration));
    }

    mod slow {
        use super::*;
        use beacon_broker::Subscription;

        /// Broker whose publishes never complete.
        pub struct SlowBroker;

        #[async_trait::async_trait]
        impl Broker for SlowBroker {
            async fn publish(
                &self,
                _topic: Topic,
                _key: &str,
                _payload: Vec<u8>,
            ) -> Result<Delivery, BrokerError> {
                std::future::pending().await
            }

            async fn subscribe(
                &self,
                _topic: Topic,
                _group: &str,
            ) -> Result<Box<dyn Subscription>, BrokerError> {
                Err(BrokerError::Closed)
            }
        }
    }
}
