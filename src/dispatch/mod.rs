//! # Command Dispatcher
//!
//! Maps remote method invocations and desired-property updates onto the
//! protocol core and the device worker.
//!
//! ## Methods
//!
//! | Name | Payload | Device traffic | Codes |
//! |------|---------|----------------|-------|
//! | `print` | `{"name": string}` | one encoded job | 200 / 500 |
//! | `status` | ignored | `enableStatusReporting`, then ASB read | 200 / 500 |
//! | `recover` | ignored | `executeRecovery` | 200 / 500 |
//! | anything else | ignored | none | 501 |
//!
//! Every `print`/`status`/`recover` outcome is also published on
//! [`OUTPUT_NAME`] with the response body as the event body. A failed
//! publish is logged and never changes the response.
//!
//! Each operation snapshots the printer path when it starts; a concurrent
//! `printerPath` update only affects operations that start after it.

pub mod control;
pub mod messages;
pub mod twin;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::AgentError;
use crate::printer::ConfigHandle;
use crate::protocol::job;
use crate::protocol::status::{self, ASB_LEN, StatusDecode};
use crate::protocol::text::TextPolicy;
use crate::worker::{DeviceHandle, StatusRead};

pub use control::{ControlPlane, EventMessage, OUTPUT_NAME};
pub use messages::{OperationResponse, PrintRequest, StatusResponse, UnknownMethodResponse};
pub use twin::ReportedProperties;

pub const PRINTED: &str = "Message deserialized and printed.";
pub const STATUS_READ: &str = "Status method called and status read.";
pub const RECOVERED: &str = "Presenter recovery executed.";
pub const NO_RESPONSE: &str = "No response from status request";

/// Methods the agent registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Print,
    Status,
    Recover,
}

impl Method {
    pub const ALL: [Method; 3] = [Method::Print, Method::Status, Method::Recover];

    pub fn name(self) -> &'static str {
        match self {
            Method::Print => "print",
            Method::Status => "status",
            Method::Recover => "recover",
        }
    }

    /// Method names are matched exactly.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }
}

/// Device and module identity, opaque to the agent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Identity {
    pub device_id: String,
    pub module_id: String,
}

impl Identity {
    pub fn new(device_id: impl Into<String>, module_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            module_id: module_id.into(),
        }
    }
}

/// Synchronous answer to a method invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodResponse {
    /// HTTP-like status code
    pub status: u16,
    /// UTF-8 JSON body
    pub payload: Vec<u8>,
}

impl MethodResponse {
    fn json<T: Serialize>(status: u16, body: &T) -> Self {
        let payload = serde_json::to_vec(body).unwrap_or_else(|e| {
            error!(error = %e, "Failed to serialize method response");
            Vec::new()
        });
        Self { status, payload }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// # Dispatcher
///
/// Shared by every inbound surface (HTTP handlers, CLI one-shots).
pub struct Dispatcher {
    identity: Identity,
    config: ConfigHandle,
    device: DeviceHandle,
    control: Arc<dyn ControlPlane>,
    text_policy: TextPolicy,
}

impl Dispatcher {
    pub fn new(
        identity: Identity,
        config: ConfigHandle,
        device: DeviceHandle,
        control: Arc<dyn ControlPlane>,
    ) -> Self {
        Self {
            identity,
            config,
            device,
            control,
            text_policy: TextPolicy::default(),
        }
    }

    pub fn with_text_policy(mut self, policy: TextPolicy) -> Self {
        self.text_policy = policy;
        self
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }

    /// Handle one method invocation. Never fails; errors become 500s.
    pub async fn invoke(&self, method: &str, payload: &[u8]) -> MethodResponse {
        match Method::from_name(method) {
            Some(Method::Print) => self.print(payload).await,
            Some(Method::Status) => self.status().await,
            Some(Method::Recover) => self.recover().await,
            None => {
                warn!(method, "Unknown method invoked");
                MethodResponse::json(
                    501,
                    &UnknownMethodResponse {
                        status: format!("Method '{}' is not implemented", method),
                    },
                )
            }
        }
    }

    async fn print(&self, payload: &[u8]) -> MethodResponse {
        info!("Print method called");
        let path = self.config.snapshot().printer_path;

        let (code, response) = match self.print_job(&path, payload).await {
            Ok(()) => (
                200,
                OperationResponse::new(&self.identity.device_id, PRINTED),
            ),
            Err(e) => {
                error!(path = %path, error = %e, "Print failed");
                (
                    500,
                    OperationResponse::new(
                        &self.identity.device_id,
                        format!("Failed to print message ({})", e),
                    ),
                )
            }
        };

        self.respond(code, &response).await
    }

    async fn print_job(&self, path: &str, payload: &[u8]) -> Result<(), AgentError> {
        let request = PrintRequest::from_payload(payload)?;
        let data = job::encode(&request.name, self.text_policy)?;
        info!(path, name = %request.name, bytes = data.len(), "Printing message");
        self.device.print(path, data).await
    }

    async fn status(&self) -> MethodResponse {
        info!("Status method called");
        let path = self.config.snapshot().printer_path;
        let device_id = &self.identity.device_id;

        let (code, response) = match self.device.status(&path).await {
            Ok(StatusRead::Bytes(raw)) => match status::decode(&raw) {
                StatusDecode::Status(flags) => {
                    info!(paper = flags.paper_text(), roll = flags.roll_text(), "Status decoded");
                    let mut response = StatusResponse::new(device_id, STATUS_READ);
                    response.set_flags(flags);
                    (200, response)
                }
                StatusDecode::NoResponse => {
                    warn!(path = %path, "No response from status request");
                    (200, StatusResponse::new(device_id, NO_RESPONSE))
                }
                StatusDecode::Short { len } => {
                    warn!(path = %path, len, "Short status response");
                    (
                        200,
                        StatusResponse::new(
                            device_id,
                            format!("Short status response ({} of {} bytes)", len, ASB_LEN),
                        ),
                    )
                }
            },
            Ok(StatusRead::TimedOut { after }) => {
                warn!(path = %path, ?after, "Status request timed out");
                (
                    200,
                    StatusResponse::new(
                        device_id,
                        format!("Status request timed out after {} ms", after.as_millis()),
                    ),
                )
            }
            Err(e) => {
                error!(path = %path, error = %e, "Status read failed");
                (
                    500,
                    StatusResponse::new(device_id, format!("Failed to read status ({})", e)),
                )
            }
        };

        self.respond(code, &response).await
    }

    async fn recover(&self) -> MethodResponse {
        info!("Recover method called");
        let path = self.config.snapshot().printer_path;

        let (code, response) = match self.device.recover(&path).await {
            Ok(()) => (
                200,
                OperationResponse::new(&self.identity.device_id, RECOVERED),
            ),
            Err(e) => {
                error!(path = %path, error = %e, "Recovery failed");
                (
                    500,
                    OperationResponse::new(
                        &self.identity.device_id,
                        format!("Failed to execute recovery ({})", e),
                    ),
                )
            }
        };

        self.respond(code, &response).await
    }

    /// Serialize the response, publish it as an event and hand it back.
    async fn respond<T: Serialize>(&self, code: u16, body: &T) -> MethodResponse {
        let response = MethodResponse::json(code, body);
        let event = EventMessage::json_bytes(response.payload.clone());
        let message_id = event.message_id;

        match self.control.send_event(OUTPUT_NAME, event).await {
            Ok(()) => info!(%message_id, output = OUTPUT_NAME, "Event published"),
            Err(e) => warn!(%message_id, error = %e, "Failed to publish event"),
        }

        response
    }

    /// Apply a desired-properties document and report the effective path.
    ///
    /// A rejected document leaves the configuration untouched.
    pub async fn apply_desired(&self, desired: &Value) -> Result<ReportedProperties, AgentError> {
        let path = twin::desired_printer_path(desired).inspect_err(|e| {
            error!(error = %e, "Desired properties rejected, keeping previous configuration");
        })?;

        let effective = self.config.apply_device_path(path.as_deref());
        let reported = ReportedProperties::new(effective);
        self.push_reported(&reported).await;
        Ok(reported)
    }

    /// Properties currently in effect.
    pub fn reported(&self) -> ReportedProperties {
        ReportedProperties::new(self.config.snapshot().printer_path)
    }

    /// Push the current properties upstream (used once at startup).
    pub async fn report_current(&self) {
        let reported = self.reported();
        self.push_reported(&reported).await;
    }

    async fn push_reported(&self, reported: &ReportedProperties) {
        match self.control.update_reported(&reported.to_value()).await {
            Ok(()) => info!(printer_path = %reported.printer_path, "Reported properties sent"),
            Err(e) => warn!(error = %e, "Failed to send reported properties"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names() {
        assert_eq!(Method::from_name("print"), Some(Method::Print));
        assert_eq!(Method::from_name("status"), Some(Method::Status));
        assert_eq!(Method::from_name("recover"), Some(Method::Recover));
        assert_eq!(Method::from_name("Print"), None);
        assert_eq!(Method::from_name(""), None);
    }

    #[test]
    fn test_method_response_json() {
        let response = MethodResponse::json(
            501,
            &UnknownMethodResponse {
                status: "Method 'reboot' is not implemented".to_string(),
            },
        );
        assert!(!response.is_success());
        assert_eq!(
            String::from_utf8(response.payload).unwrap(),
            r#"{"status":"Method 'reboot' is not implemented"}"#
        );
    }
}
