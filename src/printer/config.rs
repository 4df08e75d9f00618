//! # Printer Configuration
//!
//! The only reconfigurable value is the device path. It lives in a
//! [`ConfigHandle`] shared between the desired-property handler (the single
//! writer) and every device operation (readers).
//!
//! Readers take a [`ConfigHandle::snapshot`] once when an operation starts
//! and use that copy throughout, so an update that lands mid-operation only
//! affects operations that start after it.
//!
//! ## Usage
//!
//! ```
//! use tup900_edge::printer::{ConfigHandle, DEFAULT_PRINTER_PATH};
//!
//! let config = ConfigHandle::default();
//! let before = config.snapshot();
//!
//! assert_eq!(config.apply_device_path(Some("/dev/usb/lp0")), "/dev/usb/lp0");
//! assert_eq!(before.printer_path, DEFAULT_PRINTER_PATH);
//!
//! // Empty or absent falls back to the default
//! assert_eq!(config.apply_device_path(Some("  ")), DEFAULT_PRINTER_PATH);
//! ```

use serde::Serialize;
use tokio::sync::watch;
use tracing::info;

/// Device node of the TUP900 on a stock Linux edge host.
pub const DEFAULT_PRINTER_PATH: &str = "/dev/usb/lp1";

/// # Printer Configuration
///
/// Replaced wholesale on every update; never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterConfig {
    /// Path of the byte-oriented read/write device channel
    pub printer_path: String,
}

impl PrinterConfig {
    pub fn new(printer_path: impl Into<String>) -> Self {
        Self {
            printer_path: printer_path.into(),
        }
    }
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PRINTER_PATH)
    }
}

/// Shared, copy-on-read handle to the active [`PrinterConfig`].
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    tx: std::sync::Arc<watch::Sender<PrinterConfig>>,
}

impl ConfigHandle {
    pub fn new(initial: PrinterConfig) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            tx: std::sync::Arc::new(tx),
        }
    }

    /// Copy of the configuration in effect right now.
    pub fn snapshot(&self) -> PrinterConfig {
        self.tx.borrow().clone()
    }

    /// Replace the device path, falling back to [`DEFAULT_PRINTER_PATH`] when
    /// `path` is absent or blank.
    ///
    /// Returns the path now in effect.
    pub fn apply_device_path(&self, path: Option<&str>) -> String {
        let effective = match path.map(str::trim) {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => DEFAULT_PRINTER_PATH.to_string(),
        };

        let previous = self.tx.send_replace(PrinterConfig::new(effective.clone()));
        if previous.printer_path != effective {
            info!(
                from = %previous.printer_path,
                to = %effective,
                "Printer path changed"
            );
        }
        effective
    }
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self::new(PrinterConfig::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path() {
        assert_eq!(ConfigHandle::default().snapshot().printer_path, "/dev/usb/lp1");
    }

    #[test]
    fn test_apply_replaces() {
        let config = ConfigHandle::default();
        assert_eq!(config.apply_device_path(Some("/dev/ttyUSB0")), "/dev/ttyUSB0");
        assert_eq!(config.snapshot().printer_path, "/dev/ttyUSB0");
    }

    #[test]
    fn test_absent_and_empty_reset_to_default() {
        let config = ConfigHandle::new(PrinterConfig::new("/dev/ttyUSB0"));
        assert_eq!(config.apply_device_path(None), DEFAULT_PRINTER_PATH);
        assert_eq!(config.snapshot().printer_path, DEFAULT_PRINTER_PATH);

        config.apply_device_path(Some("/dev/ttyUSB0"));
        assert_eq!(config.apply_device_path(Some("")), DEFAULT_PRINTER_PATH);
        assert_eq!(config.snapshot().printer_path, DEFAULT_PRINTER_PATH);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let config = ConfigHandle::default();
        let snapshot = config.snapshot();
        config.apply_device_path(Some("/dev/usb/lp7"));
        assert_eq!(snapshot.printer_path, DEFAULT_PRINTER_PATH);
    }

    #[test]
    fn test_clones_share_state() {
        let a = ConfigHandle::default();
        let b = a.clone();
        a.apply_device_path(Some("/dev/usb/lp3"));
        assert_eq!(b.snapshot().printer_path, "/dev/usb/lp3");
    }
}
