//! Integration tests for the image classifier relay
//!
//! These drive the real router with in-memory stand-ins for the broadcast
//! channel and the table store. The relay contract matches the environment
//! monitor's; the cases here focus on the classification record shape and
//! on gating a historically-open route through configuration.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use relaycast_core::auth::RoutePolicy;
use relaycast_core::records::ClassificationResult;
use relaycast_core::table::{Continuation, EntitySegment, TableStore};
use relaycast_core::{BroadcastChannel, ConnectionDescriptor};
use relaycast_image_classifier::api::{build_router, AppState};
use relaycast_image_classifier::config::Config;

/// Broadcast channel stand-in that records publishes
struct RecordingChannel {
    publishes: Mutex<Vec<(String, String)>>,
}

impl RecordingChannel {
    fn new() -> Self {
        Self {
            publishes: Mutex::new(Vec::new()),
        }
    }

    fn published(&self) -> Vec<(String, String)> {
        self.publishes.lock().expect("poisoned mutex").clone()
    }
}

#[async_trait]
impl BroadcastChannel for RecordingChannel {
    async fn publish(&self, target: &str, payload: &str) -> relaycast_core::Result<()> {
        self.publishes
            .lock()
            .expect("poisoned mutex")
            .push((target.to_string(), payload.to_string()));
        Ok(())
    }

    fn negotiate(&self) -> relaycast_core::Result<ConnectionDescriptor> {
        Ok(ConnectionDescriptor {
            url: "https://broadcast.example.net/client/?hub=classification".to_string(),
            access_token: "token-456".to_string(),
        })
    }
}

/// Table store stand-in serving a fixed scan result
struct FixedStore {
    segment: EntitySegment,
}

impl FixedStore {
    fn with_rows(entities: Vec<Value>) -> Self {
        Self {
            segment: EntitySegment {
                entities,
                continuation: None,
            },
        }
    }
}

#[async_trait]
impl TableStore for FixedStore {
    async fn query_segment(
        &self,
        _table: &str,
        _continuation: Option<&Continuation>,
    ) -> relaycast_core::Result<EntitySegment> {
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

fn router_with(config: Config, channel: Arc<RecordingChannel>, rows: Vec<Value>) -> axum::Router {
    build_router(AppState::new(
        channel,
        Arc::new(FixedStore::with_rows(rows)),
        Arc::new(config),
    ))
}

fn classification_row(count: i64, tag: &str, probability: f64) -> Value {
    json!({
        "PartitionKey": "images",
        "RowKey": count.to_string(),
        "Count": count,
        "Tag": tag,
        "Probability": probability
    })
}

#[tokio::test]
async fn ingress_is_anonymous_by_default_and_publishes_verbatim() {
    let channel = Arc::new(RecordingChannel::new());
    let app = router_with(Config::default(), channel.clone(), vec![]);

    let body = r#"{"Count":12,"Tag":"dog","Probability":0.87}"#;
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/messages")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let published = channel.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0], ("newMessage".to_string(), body.to_string()));
}

#[tokio::test]
async fn ingress_can_be_gated_by_configuration() {
    let mut config = Config::default();
    config.auth.api_key = Some("gate-key".to_string());
    config.auth.ingress = RoutePolicy::ApiKey;

    let channel = Arc::new(RecordingChannel::new());
    let app = router_with(config, channel.clone(), vec![]);

    let denied = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/messages")
                .body(Body::from("payload"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
    assert!(channel.published().is_empty());

    let allowed = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/messages")
                .header("x-api-key", "gate-key")
                .body(Body::from("payload"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(allowed.status(), StatusCode::NO_CONTENT);
    assert_eq!(channel.published().len(), 1);
}

#[tokio::test]
async fn negotiate_answers_get_and_post() {
    let channel = Arc::new(RecordingChannel::new());
    let app = router_with(Config::default(), channel.clone(), vec![]);

    for method in [Method::GET, Method::POST] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
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
    }

    assert!(channel.published().is_empty());
}

#[tokio::test]
async fn snapshot_publishes_classification_rows() {
    let rows = vec![
        classification_row(1, "cat", 0.93),
        classification_row(2, "dog", 0.71),
    ];
    let channel = Arc::new(RecordingChannel::new());
    let app = router_with(Config::default(), channel.clone(), rows.clone());

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

    let results: Vec<ClassificationResult> = serde_json::from_str(&published[0].1).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].tag, "cat");
    assert_eq!(results[1].count, 2);

    let republished: Vec<Value> = serde_json::from_str(&published[0].1).unwrap();
    assert_eq!(republished, rows);
}
