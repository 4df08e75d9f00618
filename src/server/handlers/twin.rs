//! Desired and reported properties.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::sync::Arc;

use super::super::state::AppState;
use super::error_response;
use crate::dispatch::ReportedProperties;

/// Handle PATCH /twin/desired - apply a desired-properties document.
///
/// Answers with the reported properties now in effect, or 400 when the
/// document is rejected (the previous configuration stays active).
pub async fn update_desired(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let desired: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, &format!("Invalid JSON: {}", e));
        }
    };

    match state.dispatcher.apply_desired(&desired).await {
        Ok(reported) => Json(reported).into_response(),
        Err(e) => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}

/// Handle GET /twin/reported - properties currently in effect.
pub async fn reported(State(state): State<Arc<AppState>>) -> Json<ReportedProperties> {
    Json(state.dispatcher.reported())
}
