//! HTTP API for the image classifier relay
//!
//! - `POST /api/messages` - relay a raw payload to the broadcast channel
//! - `GET|POST /api/negotiate` - issue channel connection credentials
//! - `POST /api/snapshot` - relay the classifications table to the channel
//! - `GET /health` - liveness probe

pub mod negotiate;
pub mod relay;

use axum::{
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use relaycast_core::auth::{self, RoutePolicy};
use relaycast_core::{BroadcastChannel, TableStore};

use crate::config::Config;

/// Header callers present their API key in
pub const API_KEY_HEADER: &str = "x-api-key";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Broadcast channel client
    pub channel: Arc<dyn BroadcastChannel>,

    /// Table store client
    pub store: Arc<dyn TableStore>,

    /// Service configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(
        channel: Arc<dyn BroadcastChannel>,
        store: Arc<dyn TableStore>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            channel,
            store,
            config,
        }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Build the HTTP API router
pub fn build_router(state: AppState) -> Router {
    // Dashboards are served from other origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/messages", post(relay::ingress))
        .route("/api/negotiate", get(negotiate::negotiate).post(negotiate::negotiate))
        .route("/api/snapshot", post(relay::snapshot))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Check the request against a route's configured policy
pub(crate) fn require(
    policy: RoutePolicy,
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    let presented = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
    auth::authorize(policy, state.config.auth.api_key.as_deref(), presented).map_err(|e| {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "unauthorized".to_string(),
                message: e.to_string(),
            }),
        )
    })
}
