//! Liveness check.

use axum::{Json, extract::State};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use super::super::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub device_id: String,
    pub module_id: String,
    pub printer_path: String,
    pub uptime_secs: i64,
}

/// Handle GET /health.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let identity = state.dispatcher.identity();
    Json(HealthResponse {
        status: "ok",
        device_id: identity.device_id.clone(),
        module_id: identity.module_id.clone(),
        printer_path: state.dispatcher.config().snapshot().printer_path,
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
    })
}
