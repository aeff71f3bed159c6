//! Node lifecycle against the in-process broker.

use std::sync::Arc;
use std::time::Duration;

use beacon_broker::{Broker, MemoryBroker, Subscription};
use beacon_core::{TelemetryEvent, Topic, codec};
use beacon_producer::{EventGenerator, LivenessPolicy, NodeConfig, metrics};
use beacon_resilience::{JitterPolicy, RetryPolicy};
use beacon_telemetry::Diagnostics;
use tokio_util::sync::CancellationToken;

fn config(service: &str) -> NodeConfig {
    NodeConfig {
        node_id: Some(format!("{service}-node-0001")),
        heartbeat_interval: Duration::from_secs(5),
        log_interval: Duration::from_secs(2),
        log_jitter: Duration::from_secs(1),
        liveness: LivenessPolicy::always_up(),
        retry: RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            multiplier: 2.0,
            max_delay: Duration::from_secs(1),
            jitter: JitterPolicy::None,
        },
        seed: Some(7),
        ..NodeConfig::for_service(service)
    }
}

async fn drain(broker: &MemoryBroker, topic: Topic) -> Vec<TelemetryEvent> {
    let mut sub: Box<dyn Subscription> = broker.subscribe(topic, "test-reader").await.unwrap();
    let mut out = Vec::new();
    while let Some(message) = sub.fetch(Duration::ZERO).await.unwrap() {
        out.push(codec::decode(topic, &message.payload).unwrap());
    }
    out
}

#[tokio::test(start_paused = true)]
async fn emits_registration_then_scheduled_events() {
    let _log = beacon_log::init_test();
    let broker = MemoryBroker::new(3);
    let generator = EventGenerator::new(
        &config("OrderService"),
        Arc::new(broker.clone()),
        Diagnostics::detached("fleet"),
    )
    .unwrap();
    let node_id = generator.identity().node_id().clone();

    let node = generator.start(CancellationToken::new());
    tokio::time::sleep(Duration::from_millis(10_500)).await;
    node.shutdown().await;

    let registrations = drain(&broker, Topic::Registration).await;
    assert_eq!(registrations.len(), 1);
    assert_eq!(registrations[0].node_id(), &node_id);

    let heartbeats = drain(&broker, Topic::Heartbeat).await;
    assert_eq!(heartbeats.len(), 3, "ticks at 0s, 5s and 10s");

    let logs = drain(&broker, Topic::Log).await;
    assert!((3..=5).contains(&logs.len()), "got {} logs", logs.len());
    assert!(logs.iter().all(|e| e.node_id() == &node_id));
}

#[tokio::test(start_paused = true)]
async fn nothing_is_published_after_shutdown() {
    let broker = MemoryBroker::new(1);
    let node = EventGenerator::new(
        &config("PaymentService"),
        Arc::new(broker.clone()),
        Diagnostics::detached("fleet"),
    )
    .unwrap()
    .start(CancellationToken::new());

    tokio::time::sleep(Duration::from_secs(6)).await;
    node.shutdown().await;
    let counts: Vec<_> = Topic::ALL.iter().map(|t| broker.len(*t)).collect();

    tokio::time::sleep(Duration::from_secs(60)).await;
    let after: Vec<_> = Topic::ALL.iter().map(|t| broker.len(*t)).collect();
    assert_eq!(counts, after);
}

#[tokio::test(start_paused = true)]
async fn survives_broker_outage() {
    let broker = MemoryBroker::new(1);
    broker.set_available(false);
    let diagnostics = Diagnostics::detached("fleet");
    let node = EventGenerator::new(
        &config("InventoryService"),
        Arc::new(broker.clone()),
        diagnostics.clone(),
    )
    .unwrap()
    .start(CancellationToken::new());

    tokio::time::sleep(Duration::from_secs(12)).await;
    assert_eq!(broker.len(Topic::Heartbeat), 0);
    assert!(!node.is_finished());

    broker.set_available(true);
    tokio::time::sleep(Duration::from_secs(9)).await;
    node.shutdown().await;

    assert!(broker.len(Topic::Heartbeat) >= 2);
    let snapshot = diagnostics.metrics().snapshot();
    assert!(snapshot.counter(metrics::PUBLISH_FAILURES) >= 1);
    assert!(snapshot.counter(metrics::RETRIES) >= 2);
    assert!(snapshot.counter(metrics::PUBLISHED) >= 2);
}

#[tokio::test(start_paused = true)]
async fn parent_token_stops_every_node() {
    let broker = MemoryBroker::new(2);
    let shutdown = CancellationToken::new();
    let nodes: Vec<_> = ["PaymentService", "OrderService", "InventoryService"]
        .into_iter()
        .map(|service| {
            EventGenerator::new(
                &NodeConfig {
                    node_id: None,
                    ..config(service)
                },
                Arc::new(broker.clone()),
                Diagnostics::detached("fleet"),
            )
            .unwrap()
            .start(shutdown.clone())
        })
        .collect();

    tokio::time::sleep(Duration::from_secs(1)).await;
    shutdown.cancel();
    for node in nodes {
        node.join().await;
    }
    assert_eq!(broker.len(Topic::Registration), 3);
}

#[test]
fn invalid_config_is_rejected() {
    let err = EventGenerator::new(
        &NodeConfig::for_service(""),
        Arc::new(MemoryBroker::new(1)),
        Diagnostics::detached("fleet"),
    )
    .unwrap_err();
    assert!(err.to_string().contains("service name"));
}
