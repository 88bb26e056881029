//! Relay endpoints
//!
//! Pass-throughs to the broadcast channel; see the environment monitor's
//! twin module for the shared contract. The only differences here are the
//! configured channel and table names.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};

use relaycast_core::NEW_MESSAGE;

use super::{AppState, ErrorResponse};

/// Relay a raw payload to the broadcast channel
///
/// POST /api/messages
pub async fn ingress(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    if let Err(rejection) = super::require(state.config.auth.ingress, &state, &headers) {
        return rejection.into_response();
    }

    let payload = String::from_utf8_lossy(&body);
    match state.channel.publish(NEW_MESSAGE, &payload).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "ingress publish failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: "publish_failed".to_string(),
                    message: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Relay the classifications table to the broadcast channel
///
/// POST /api/snapshot
pub async fn snapshot(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(rejection) = super::require(state.config.auth.snapshot, &state, &headers) {
        return rejection.into_response();
    }

    let table = &state.config.storage.table;
    let segment = match state.store.query_segment(table, None).await {
        Ok(segment) => segment,
        Err(e) => {
            tracing::error!(table = %table, error = %e, "classification scan failed");
            return (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: "scan_failed".to_string(),
                    message: e.to_string(),
                }),
            )
                .into_response();
        }
    };

    // Single segment only: rows past the first storage page are not relayed
    if segment.continuation.is_some() {
        tracing::warn!(table = %table, rows = segment.entities.len(), "snapshot truncated to first segment");
    }

    let payload = match serde_json::to_string(&segment.entities) {
        Ok(payload) => payload,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "serialize_failed".to_string(),
                    message: e.to_string(),
                }),
            )
                .into_response();
        }
    };

    match state.channel.publish(NEW_MESSAGE, &payload).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!(table = %table, error = %e, "snapshot publish failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: "publish_failed".to_string(),
                    message: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
