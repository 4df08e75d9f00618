//! Desired and reported property documents.

use serde::Serialize;
use serde_json::Value;

use crate::error::AgentError;

/// Property key carrying the device path.
pub const PRINTER_PATH_KEY: &str = "printerPath";

/// Pull `printerPath` out of a desired-properties document.
///
/// `Ok(None)` when the key is absent or `null`. Any other non-string value,
/// or a document that is not a JSON object, is a configuration error.
/// Other keys (including `$version`) are ignored.
pub fn desired_printer_path(desired: &Value) -> Result<Option<String>, AgentError> {
    let object = desired.as_object().ok_or_else(|| {
        AgentError::Config(format!(
            "desired properties must be a JSON object, got {}",
            json_type(desired)
        ))
    })?;

    match object.get(PRINTER_PATH_KEY) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(path)) => Ok(Some(path.clone())),
        Some(other) => Err(AgentError::Config(format!(
            "{} must be a string, got {}",
            PRINTER_PATH_KEY,
            json_type(other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Reported properties patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedProperties {
    pub printer_path: String,
}

impl ReportedProperties {
    pub fn new(printer_path: impl Into<String>) -> Self {
        Self {
            printer_path: printer_path.into(),
        }
    }

    pub fn to_value(&self) -> Value {
        let mut patch = serde_json::Map::new();
        patch.insert(
            PRINTER_PATH_KEY.to_string(),
            Value::String(self.printer_path.clone()),
        );
        Value::Object(patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_path() {
        let desired = json!({"printerPath": "/dev/usb/lp0", "$version": 4});
        assert_eq!(
            desired_printer_path(&desired).unwrap(),
            Some("/dev/usb/lp0".to_string())
        );
    }

    #[test]
    fn test_absent_or_null_path() {
        assert_eq!(desired_printer_path(&json!({"$version": 2})).unwrap(), None);
        assert_eq!(
            desired_printer_path(&json!({"printerPath": null})).unwrap(),
            None
        );
    }

    #[test]
    fn test_non_string_path_is_config_error() {
        for value in [json!(42), json!(true), json!(["/dev/usb/lp0"]), json!({})] {
            let err = desired_printer_path(&json!({ "printerPath": value })).unwrap_err();
            assert!(matches!(err, AgentError::Config(_)), "{:?}", err);
        }
    }

    #[test]
    fn test_non_object_document() {
        let err = desired_printer_path(&json!("/dev/usb/lp0")).unwrap_err();
        assert!(err.to_string().contains("JSON object"));
    }

    #[test]
    fn test_reported_value() {
        assert_eq!(
            ReportedProperties::new("/dev/usb/lp1").to_value(),
            json!({"printerPath": "/dev/usb/lp1"})
        );
        assert_eq!(
            serde_json::to_value(ReportedProperties::new("/dev/usb/lp1")).unwrap(),
            json!({"printerPath": "/dev/usb/lp1"})
        );
    }
}
