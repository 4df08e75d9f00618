//! HTTP handlers for the server.

pub mod health;
pub mod methods;
pub mod twin;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// JSON error body in the same `{"status": ...}` shape as method responses.
fn error_response(code: StatusCode, message: &str) -> Response {
    (code, Json(json!({ "status": message }))).into_response()
}
