//! Credential issuance endpoint

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};

use super::{AppState, ErrorResponse};

/// Issue connection credentials for a client to join the channel directly
///
/// GET|POST /api/negotiate
pub async fn negotiate(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(rejection) = super::require(state.config.auth.negotiate, &state, &headers) {
        return rejection.into_response();
    }

    match state.channel.negotiate() {
        Ok(descriptor) => (StatusCode::OK, Json(descriptor)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "negotiate failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "negotiate_failed".to_string(),
                    message: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
