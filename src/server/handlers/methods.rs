//! Direct method invocation.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::super::state::AppState;

/// Handle POST /methods/:name - invoke a method with the raw request body
/// as its payload.
///
/// The dispatcher's code becomes the HTTP status; the body is passed
/// through unchanged.
pub async fn invoke(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Response {
    let response = state.dispatcher.invoke(&name, &body).await;
    let code = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (
        code,
        [(header::CONTENT_TYPE, "application/json")],
        response.payload,
    )
        .into_response()
}
