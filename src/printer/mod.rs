//! # Printer Module
//!
//! Printer-side configuration.
//!
//! ## Modules
//!
//! - [`config`]: Active device path and its shared handle

pub mod config;

pub use config::{ConfigHandle, DEFAULT_PRINTER_PATH, PrinterConfig};
