//! Method payloads and responses.
//!
//! Field names follow the control plane's camelCase JSON convention.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::protocol::status::DeviceStatus;

/// `print` request body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PrintRequest {
    pub name: String,
}

impl PrintRequest {
    /// Parse a UTF-8 JSON payload of the form `{"name": "..."}`.
    pub fn from_payload(payload: &[u8]) -> Result<Self, AgentError> {
        serde_json::from_slice(payload).map_err(|e| AgentError::MalformedRequest(e.to_string()))
    }
}

/// Response for `print` and `recover`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub status: String,
}

impl OperationResponse {
    pub fn new(device_id: &str, status: impl Into<String>) -> Self {
        Self {
            device_id: device_id.to_string(),
            timestamp: Utc::now(),
            status: status.into(),
        }
    }
}

/// Response for `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub status: String,
    pub paper_collected: bool,
    pub roll_missing: bool,
}

impl StatusResponse {
    pub fn new(device_id: &str, status: impl Into<String>) -> Self {
        Self {
            device_id: device_id.to_string(),
            timestamp: Utc::now(),
            status: status.into(),
            paper_collected: false,
            roll_missing: false,
        }
    }

    pub fn set_flags(&mut self, flags: DeviceStatus) {
        self.paper_collected = flags.paper_collected;
        self.roll_missing = flags.roll_missing;
    }
}

/// Body returned for method names the agent does not handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownMethodResponse {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_request_parses() {
        let req = PrintRequest::from_payload(br#"{"name":"Ada"}"#).unwrap();
        assert_eq!(req.name, "Ada");
    }

    #[test]
    fn test_print_request_ignores_extra_fields() {
        let req = PrintRequest::from_payload(br#"{"name":"Ada","copies":2}"#).unwrap();
        assert_eq!(req.name, "Ada");
    }

    #[test]
    fn test_print_request_malformed() {
        let payloads: [&[u8]; 5] = [b"", b"null", b"{}", br#"{"name":42}"#, b"\xff\xfe"];
        for payload in payloads {
            let err = PrintRequest::from_payload(payload).unwrap_err();
            assert!(matches!(err, AgentError::MalformedRequest(_)), "{:?}", payload);
        }
    }

    #[test]
    fn test_status_response_json_shape() {
        let mut response = StatusResponse::new("edge-01", "ok");
        response.set_flags(DeviceStatus {
            paper_collected: true,
            roll_missing: true,
        });
        let value = serde_json::to_value(&response).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object["deviceId"], "edge-01");
        assert_eq!(object["status"], "ok");
        assert_eq!(object["paperCollected"], true);
        assert_eq!(object["rollMissing"], true);
        // RFC 3339 / ISO-8601
        let ts = object["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(ts).is_ok(), "{}", ts);
        assert_eq!(object.len(), 5);
    }

    #[test]
    fn test_operation_response_json_shape() {
        let value = serde_json::to_value(OperationResponse::new("edge-01", "done")).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 3);
        assert!(object.contains_key("deviceId"));
        assert!(object.contains_key("timestamp"));
        assert!(object.contains_key("status"));
    }
}
