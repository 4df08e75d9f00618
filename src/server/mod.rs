//! # HTTP Server for the Control-Plane Surface
//!
//! Exposes the agent's inbound side over HTTP so a local edge runtime (or
//! an operator with `curl`) can invoke methods and push desired properties.
//!
//! ## Routes
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `POST /methods/:name` | Invoke a method; body is the JSON payload |
//! | `PATCH /twin/desired` | Apply desired properties (`printerPath`) |
//! | `GET /twin/reported` | Reported properties in effect |
//! | `GET /health` | Liveness and identity |
//!
//! ## Usage
//!
//! ```bash
//! tup900-edge serve --listen 0.0.0.0:8080 --device /dev/usb/lp1
//! curl -X POST localhost:8080/methods/print -d '{"name":"Ada"}'
//! ```

mod handlers;
mod state;

pub use state::{AppState, ServerConfig};

use axum::{
    Router,
    routing::{get, patch, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::dispatch::Dispatcher;
use crate::error::AgentError;

/// Build the router around a dispatcher.
pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    let app_state = Arc::new(AppState::new(dispatcher));

    Router::new()
        .route("/methods/:name", post(handlers::methods::invoke))
        .route("/twin/desired", patch(handlers::twin::update_desired))
        .route("/twin/reported", get(handlers::twin::reported))
        .route("/health", get(handlers::health::health))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use tup900_edge::dispatch::{Dispatcher, Identity, control::LogControlPlane};
/// use tup900_edge::printer::ConfigHandle;
/// use tup900_edge::server::{serve, ServerConfig};
/// use tup900_edge::transport::FileOpener;
/// use tup900_edge::worker::DeviceWorker;
///
/// # async fn example() -> Result<(), tup900_edge::error::AgentError> {
/// let device = DeviceWorker::spawn(FileOpener::default(), Duration::from_millis(2000));
/// let dispatcher = Dispatcher::new(
///     Identity::new("edge-01", "printer"),
///     ConfigHandle::default(),
///     device,
///     Arc::new(LogControlPlane),
/// );
///
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
/// };
/// serve(config, Arc::new(dispatcher)).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig, dispatcher: Arc<Dispatcher>) -> Result<(), AgentError> {
    let printer_path = dispatcher.config().snapshot().printer_path;
    let app = router(dispatcher);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            AgentError::Transport(format!("Failed to bind to {}: {}", config.listen_addr, e))
        })?;

    info!(listen = %config.listen_addr, printer_path = %printer_path, "HTTP server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| AgentError::Transport(format!("Server error: {}", e)))?;

    Ok(())
}
