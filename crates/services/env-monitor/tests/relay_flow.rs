//! Integration tests for the environment monitor relay
//!
//! These drive the real router with in-memory stand-ins for the broadcast
//! channel and the table store, verifying the relay contract end to end:
//! one verbatim publish per ingress call, credential issuance without side
//! effects, and single-segment snapshot semantics.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use relaycast_core::records::EnvironmentReading;
use relaycast_core::table::{Continuation, EntitySegment, TableStore};
use relaycast_core::{BroadcastChannel, ConnectionDescriptor};
use relaycast_env_monitor::api::{build_router, AppState};
use relaycast_env_monitor::config::Config;

const API_KEY: &str = "test-key";

/// Broadcast channel stand-in that records publishes
struct RecordingChannel {
    publishes: Mutex<Vec<(String, String)>>,
    fail_publish: bool,
}

impl RecordingChannel {
    fn new() -> Self {
        Self {
            publishes: Mutex::new(Vec::new()),
            fail_publish: false,
        }
    }

    fn failing() -> Self {
        Self {
            publishes: Mutex::new(Vec::new()),
            fail_publish: true,
        }
    }

    fn published(&self) -> Vec<(String, String)> {
        self.publishes.lock().expect("poisoned mutex").clone()
    }
}

#[async_trait]
impl BroadcastChannel for RecordingChannel {
    async fn publish(&self, target: &str, payload: &str) -> relaycast_core::Result<()> {
        if self.fail_publish {
            return Err(relaycast_core::Error::Channel(
                "service unavailable".to_string(),
            ));
        }
        self.publishes
            .lock()
            .expect("poisoned mutex")
            .push((target.to_string(), payload.to_string()));
        Ok(())
    }

    fn negotiate(&self) -> relaycast_core::Result<ConnectionDescriptor> {
        Ok(ConnectionDescriptor {
            url: "https://broadcast.example.net/client/?hub=environment".to_string(),
            access_token: "token-123".to_string(),
        })
    }
}

/// Table store stand-in serving a fixed scan result
struct FixedStore {
    segment: EntitySegment,
    fail_query: bool,
    queries: Mutex<usize>,
}

impl FixedStore {
    fn with_rows(entities: Vec<Value>) -> Self {
        Self {
            segment: EntitySegment {
                entities,
                continuation: None,
            },
            fail_query: false,
            queries: Mutex::new(0),
        }
    }

    fn truncated(entities: Vec<Value>) -> Self {
        Self {
            segment: EntitySegment {
                entities,
                continuation: Some(Continuation {
                    next_partition_key: "next".to_string(),
                    next_row_key: None,
                }),
            },
            fail_query: false,
            queries: Mutex::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            segment: EntitySegment::default(),
            fail_query: true,
            queries: Mutex::new(0),
        }
    }

    fn query_count(&self) -> usize {
        *self.queries.lock().expect("poisoned mutex")
    }
}

#[async_trait]
impl TableStore for FixedStore {
    async fn query_segment(
        &self,
        _table: &str,
        _continuation: Option<&Continuation>,
    ) -> relaycast_core::Result<EntitySegment> {
        *self.queries.lock().expect("poisoned mutex") += 1;
        if self.fail_query {
            return Err(relaycast_core::Error::Storage("timed out".to_string()));
        }
        Ok(self.segment.clone())
    }

    async fn get_entity(
        &self,
        _table: &str,
        _partition_key: &str,
        _row_key: &str,
    ) -> relaycast_core::Result<Option<Value>> {
        Ok(None)
    }

    async fn insert_entity(&self, _table: &str, _entity: &Value) -> relaycast_core::Result<()> {
        Ok(())
    }

    async fn merge_entity(
        &self,
        _table: &str,
        _partition_key: &str,
        _row_key: &str,
        _etag: &str,
        _entity: &Value,
    ) -> relaycast_core::Result<()> {
        Ok(())
    }
}

fn test_config() -> Arc<Config> {
    let mut config = Config::default();
    config.auth.api_key = Some(API_KEY.to_string());
    Arc::new(config)
}

fn router(
    channel: Arc<RecordingChannel>,
    store: Arc<FixedStore>,
) -> axum::Router {
    build_router(AppState::new(channel, store, test_config()))
}

fn device_row(device: &str, celsius: f64, count: i64) -> Value {
    json!({
        "PartitionKey": "devices",
        "RowKey": device,
        "DeviceId": device,
        "Celsius": celsius,
        "Count": count
    })
}

#[tokio::test]
async fn ingress_publishes_body_verbatim() {
    let channel = Arc::new(RecordingChannel::new());
    let store = Arc::new(FixedStore::with_rows(vec![]));
    let app = router(channel.clone(), store);

    let body = r#"{"DeviceId":"dev-1","Celsius":21.5,"Count":3}"#;
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/messages")
                .header("x-api-key", API_KEY)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let published = channel.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, "newMessage");
    assert_eq!(published[0].1, body);
}

#[tokio::test]
async fn ingress_forwards_empty_and_malformed_bodies_unchanged() {
    let channel = Arc::new(RecordingChannel::new());
    let store = Arc::new(FixedStore::with_rows(vec![]));
    let app = router(channel.clone(), store);

    for body in ["", "not json at all {{{"] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/messages")
                    .header("x-api-key", API_KEY)
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let published = channel.published();
    assert_eq!(published.len(), 2);
    assert_eq!(published[0].1, "");
    assert_eq!(published[1].1, "not json at all {{{");
}

#[tokio::test]
async fn ingress_without_key_is_rejected_and_publishes_nothing() {
    let channel = Arc::new(RecordingChannel::new());
    let store = Arc::new(FixedStore::with_rows(vec![]));
    let app = router(channel.clone(), store);

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/messages")
                .body(Body::from("payload"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(channel.published().is_empty());
}

#[tokio::test]
async fn ingress_publish_failure_maps_to_bad_gateway() {
    let channel = Arc::new(RecordingChannel::failing());
    let store = Arc::new(FixedStore::with_rows(vec![]));
    let app = router(channel, store);

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/messages")
                .header("x-api-key", API_KEY)
                .body(Body::from("payload"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn negotiate_returns_descriptor_without_side_effects() {
    let channel = Arc::new(RecordingChannel::new());
    let store = Arc::new(FixedStore::with_rows(vec![device_row("dev-1", 20.0, 1)]));
    let app = router(channel.clone(), store.clone());

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/api/negotiate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let descriptor: ConnectionDescriptor = serde_json::from_slice(&bytes).unwrap();
    assert!(!descriptor.url.is_empty());
    assert!(!descriptor.access_token.is_empty());

    // Pure pass-through: no publish, no scan
    assert!(channel.published().is_empty());
    assert_eq!(store.query_count(), 0);
}

#[tokio::test]
async fn snapshot_publishes_all_rows_of_a_single_segment() {
    let rows = vec![
        device_row("dev-1", 21.5, 3),
        device_row("dev-2", 19.0, 8),
        device_row("dev-3", 24.25, 1),
    ];
    let channel = Arc::new(RecordingChannel::new());
    let store = Arc::new(FixedStore::with_rows(rows.clone()));
    let app = router(channel.clone(), store);

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/snapshot")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let published = channel.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, "newMessage");

    // The payload deserializes back to the stored rows, field by field
    let readings: Vec<EnvironmentReading> = serde_json::from_str(&published[0].1).unwrap();
    assert_eq!(readings.len(), 3);
    assert_eq!(readings[0].device_id, "dev-1");
    assert_eq!(readings[0].celsius, 21.5);
    assert_eq!(readings[0].count, 3);
    assert_eq!(readings[2].device_id, "dev-3");

    let republished: Vec<Value> = serde_json::from_str(&published[0].1).unwrap();
    assert_eq!(republished, rows);
}

#[tokio::test]
async fn snapshot_relays_only_the_first_page_of_a_larger_table() {
    let first_page = vec![device_row("dev-1", 21.5, 3), device_row("dev-2", 19.0, 8)];
    let channel = Arc::new(RecordingChannel::new());
    let store = Arc::new(FixedStore::truncated(first_page.clone()));
    let app = router(channel.clone(), store.clone());

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/snapshot")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    // Exactly one scan: the continuation token is not followed
    assert_eq!(store.query_count(), 1);

    let published = channel.published();
    assert_eq!(published.len(), 1);
    let republished: Vec<Value> = serde_json::from_str(&published[0].1).unwrap();
    assert_eq!(republished, first_page);
}

#[tokio::test]
async fn snapshot_storage_failure_fails_request_without_publishing() {
    let channel = Arc::new(RecordingChannel::new());
    let store = Arc::new(FixedStore::failing());
    let app = router(channel.clone(), store);

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/snapshot")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(channel.published().is_empty());
}

#[tokio::test]
async fn snapshot_publish_failure_maps_to_bad_gateway() {
    let channel = Arc::new(RecordingChannel::failing());
    let store = Arc::new(FixedStore::with_rows(vec![device_row("dev-1", 20.0, 1)]));
    let app = router(channel, store);

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/snapshot")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn telemetry_batch_reports_summary() {
    let channel = Arc::new(RecordingChannel::new());
    let store = Arc::new(FixedStore::with_rows(vec![]));
    let app = router(channel, store);

    let body = json!([
        { "deviceId": "dev-1", "temperature": 21.0 },
        { "deviceId": "dev-2", "temperature": 300.0 }
    ]);
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/telemetry")
                .header("x-api-key", API_KEY)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let summary: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(summary["accepted"], 1);
    assert_eq!(summary["skipped"], 1);
}

#[tokio::test]
async fn health_check_is_open() {
    let channel = Arc::new(RecordingChannel::new());
    let store = Arc::new(FixedStore::with_rows(vec![]));
    let app = router(channel, store);

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
