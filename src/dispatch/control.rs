//! # Control Plane Adapter
//!
//! Outbound side of the control-plane session: telemetry events and
//! reported properties. The agent only depends on the [`ControlPlane`]
//! trait; session management lives with the implementation.
//!
//! ## Implementations
//!
//! | Type | Use |
//! |------|-----|
//! | [`LogControlPlane`] | No upstream configured; events are logged |
//! | [`HttpControlPlane`] | Forwards to an upstream HTTP endpoint |
//! | [`RecordingControlPlane`] | Keeps everything in memory (tests, simulation) |

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::error::AgentError;

/// Output channel every method outcome is published on.
pub const OUTPUT_NAME: &str = "output1";

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_ENCODING_UTF8: &str = "utf-8";

/// A telemetry message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMessage {
    pub message_id: Uuid,
    pub body: Vec<u8>,
    pub content_type: String,
    pub content_encoding: String,
}

impl EventMessage {
    /// Wrap an already-serialized JSON body.
    pub fn json_bytes(body: Vec<u8>) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            body,
            content_type: CONTENT_TYPE_JSON.to_string(),
            content_encoding: CONTENT_ENCODING_UTF8.to_string(),
        }
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Outbound control-plane operations.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Publish `message` on the named output.
    async fn send_event(&self, output: &str, message: EventMessage) -> Result<(), AgentError>;

    /// Patch the reported properties document.
    async fn update_reported(&self, properties: &serde_json::Value) -> Result<(), AgentError>;
}

/// Logs events and reported properties; nothing leaves the host.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogControlPlane;

#[async_trait]
impl ControlPlane for LogControlPlane {
    async fn send_event(&self, output: &str, message: EventMessage) -> Result<(), AgentError> {
        info!(
            output,
            message_id = %message.message_id,
            body = %message.body_text(),
            "Event message sent"
        );
        Ok(())
    }

    async fn update_reported(&self, properties: &serde_json::Value) -> Result<(), AgentError> {
        info!(reported = %properties, "Reported properties updated");
        Ok(())
    }
}

/// Forwards events and reported properties to an upstream HTTP endpoint.
///
/// - events: `POST {base}/events/{output}`
/// - reported properties: `PATCH {base}/twin/reported`
#[derive(Debug, Clone)]
pub struct HttpControlPlane {
    client: reqwest::Client,
    base_url: String,
}

impl HttpControlPlane {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ControlPlane for HttpControlPlane {
    async fn send_event(&self, output: &str, message: EventMessage) -> Result<(), AgentError> {
        let url = format!("{}/events/{}", self.base_url, output);
        let content_type = format!(
            "{}; charset={}",
            message.content_type, message.content_encoding
        );

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-message-id", message.message_id.to_string())
            .body(message.body)
            .send()
            .await
            .map_err(|e| AgentError::EventPublish(format!("POST {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(AgentError::EventPublish(format!(
                "POST {} returned {}",
                url,
                response.status()
            )));
        }
        Ok(())
    }

    async fn update_reported(&self, properties: &serde_json::Value) -> Result<(), AgentError> {
        let url = format!("{}/twin/reported", self.base_url);
        let response = self
            .client
            .patch(&url)
            .json(properties)
            .send()
            .await
            .map_err(|e| AgentError::EventPublish(format!("PATCH {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(AgentError::EventPublish(format!(
                "PATCH {} returned {}",
                url,
                response.status()
            )));
        }
        Ok(())
    }
}

/// Keeps every event and reported patch in memory.
#[derive(Debug, Default)]
pub struct RecordingControlPlane {
    events: Mutex<Vec<(String, EventMessage)>>,
    reported: Mutex<Vec<serde_json::Value>>,
    fail: AtomicBool,
}

impl RecordingControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<(String, EventMessage)> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn reported(&self) -> Vec<serde_json::Value> {
        self.reported
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn check(&self) -> Result<(), AgentError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AgentError::EventPublish("upstream unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ControlPlane for RecordingControlPlane {
    async fn send_event(&self, output: &str, message: EventMessage) -> Result<(), AgentError> {
        self.check()?;
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((output.to_string(), message));
        Ok(())
    }

    async fn update_reported(&self, properties: &serde_json::Value) -> Result<(), AgentError> {
        self.check()?;
        self.reported
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(properties.clone());
        Ok(())
    }
}
