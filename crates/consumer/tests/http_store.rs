//! HTTP index store against a mock search store.

use std::sync::Arc;
use std::time::Duration;

use beacon_broker::{Broker, MemoryBroker};
use beacon_consumer::{
    Consumer, ConsumerConfig, HttpIndexStore, IndexConfig, IndexStatus, MemorySink, PersistError,
    Persister, StoreError,
};
use beacon_core::{
    ErrorDetails, LogEvent, NodeId, NodeIdentity, ServiceName, TelemetryEvent, codec,
};
use beacon_telemetry::Diagnostics;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INDEX: &str = "microservice_logs";

fn persister(server: &MockServer) -> Persister {
    let store = HttpIndexStore::new(server.uri(), Duration::from_secs(2)).unwrap();
    Persister::new(
        Arc::new(store),
        INDEX,
        Duration::from_secs(2),
        Diagnostics::detached("persister"),
    )
}

fn error_event() -> LogEvent {
    let identity = NodeIdentity::new(
        NodeId::new("abcd1234ef56"),
        ServiceName::new("InventoryService").unwrap(),
    );
    LogEvent::error(
        &identity,
        "2024-01-01T10:00:00",
        "failed",
        Some(ErrorDetails::new("E1", "boom")),
    )
}

#[tokio::test]
async fn creates_missing_index() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/microservice_logs"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/microservice_logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"acknowledged": true})))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(persister(&server).ensure_index().await.unwrap(), IndexStatus::Created);
}

#[tokio::test]
async fn existing_index_is_left_alone() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/microservice_logs"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let p = persister(&server);
    assert_eq!(p.ensure_index().await.unwrap(), IndexStatus::Existing);
    assert_eq!(p.ensure_index().await.unwrap(), IndexStatus::Existing);
}

#[tokio::test]
async fn already_exists_response_is_success() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "root_cause": [{"type": "resource_already_exists_exception"}],
                "type": "resource_already_exists_exception",
                "reason": "index [microservice_logs/abc] already exists"
            },
            "status": 400
        })))
        .mount(&server)
        .await;

    assert_eq!(persister(&server).ensure_index().await.unwrap(), IndexStatus::Existing);
}

#[tokio::test]
async fn other_creation_failures_surface() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let err = persister(&server).ensure_index().await.unwrap_err();
    assert!(matches!(
        err,
        PersistError::Store {
            source: StoreError::Status { status: 403, .. },
            ..
        }
    ));
}

#[tokio::test]
async fn posts_document_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/microservice_logs/_doc"))
        .and(body_json(json!({
            "node_id": "abcd1234ef56",
            "service_name": "InventoryService",
            "timestamp": "2024-01-01T10:00:00",
            "log_level": "ERROR",
            "message": "failed",
            "error_details": {"error_code": "E1", "error_message": "boom"}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"result": "created"})))
        .expect(1)
        .mount(&server)
        .await;

    persister(&server).store(&error_event()).await.unwrap();
}

#[tokio::test]
async fn server_error_drops_the_event() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(1)
        .mount(&server)
        .await;

    let err = persister(&server).store(&error_event()).await.unwrap_err();
    assert!(matches!(
        err,
        PersistError::Store {
            source: StoreError::Status { status: 503, .. },
            ..
        }
    ));
}

#[tokio::test]
async fn slow_store_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;
    let store = HttpIndexStore::new(server.uri(), Duration::from_millis(200)).unwrap();
    let p = Persister::new(
        Arc::new(store),
        INDEX,
        Duration::from_secs(10),
        Diagnostics::detached("persister"),
    );

    let err = p.store(&error_event()).await.unwrap_err();
    assert!(matches!(
        err,
        PersistError::Store {
            source: StoreError::Timeout(_),
            ..
        }
    ));
}

#[tokio::test]
async fn consumer_persists_through_configured_url() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/microservice_logs/_doc"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let broker = MemoryBroker::new(1);
    let sink = MemorySink::new();
    let config = ConsumerConfig {
        fetch_timeout: Duration::from_millis(50),
        ..ConsumerConfig::with_index(IndexConfig::at(server.uri()))
    };
    let handle = Consumer::new(config, Arc::new(sink.clone()), Diagnostics::detached("consumer"))
        .start(Arc::new(broker.clone()), CancellationToken::new())
        .await
        .unwrap();

    let event = TelemetryEvent::from(error_event());
    broker
        .publish(event.topic(), "abcd1234ef56", codec::encode(&event).unwrap())
        .await
        .unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while server.received_requests().await.map_or(0, |r| r.len()) < 3
        && tokio::time::Instant::now() < deadline
    {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    handle.shutdown().await;
    assert_eq!(sink.lines().len(), 2);
}
