//! Telemetry ingestion endpoint

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};

use relaycast_core::records::Telemetry;

use super::AppState;

/// Ingest a batch of telemetry readings into the device-state table
///
/// POST /api/telemetry
///
/// Readings that fail calibration-range validation or lose their merge are
/// skipped, never failing the batch; the response reports both tallies.
pub async fn ingest_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(readings): Json<Vec<Telemetry>>,
) -> impl IntoResponse {
    if let Err(rejection) = super::require(state.config.auth.telemetry, &state, &headers) {
        return rejection.into_response();
    }

    let summary = state.ingestor.ingest_batch(&readings).await;
    tracing::info!(
        accepted = summary.accepted,
        skipped = summary.skipped,
        "telemetry batch ingested"
    );

    (StatusCode::OK, Json(summary)).into_response()
}
