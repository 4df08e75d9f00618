//! # tup900-edge - Edge Agent for the Star TUP900 Kiosk Printer
//!
//! Bridges a cloud-managed control plane to a Star TUP900 attached to the
//! edge host. It provides:
//!
//! - **Protocol implementation**: Star Line Mode command catalog, the
//!   greeting job encoder and Automatic Status Block (ASB) decoding
//! - **Device worker**: Single-owner, serialized access to the device node
//! - **Dispatcher**: `print`, `status` and `recover` methods plus the
//!   `printerPath` desired property
//! - **Server**: HTTP surface for methods and properties
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tup900_edge::{
//!     ConfigHandle, Dispatcher,
//!     dispatch::{Identity, control::RecordingControlPlane},
//!     transport::MemoryOpener,
//!     worker::DeviceWorker,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let printer = MemoryOpener::healthy();
//! let dispatcher = Dispatcher::new(
//!     Identity::new("edge-01", "printer"),
//!     ConfigHandle::default(),
//!     DeviceWorker::spawn(printer.clone(), Duration::from_millis(500)),
//!     Arc::new(RecordingControlPlane::new()),
//! );
//!
//! let response = dispatcher.invoke("print", br#"{"name":"Ada"}"#).await;
//! assert_eq!(response.status, 200);
//! assert!(!printer.written("/dev/usb/lp1").is_empty());
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`protocol`] | Star Line Mode commands, job encoding, ASB decoding |
//! | [`transport`] | Device channels (device node, in-memory) |
//! | [`worker`] | Serialized device access |
//! | [`printer`] | Runtime printer configuration |
//! | [`dispatch`] | Method and property handling, control-plane adapter |
//! | [`server`] | HTTP surface |
//! | [`error`] | Error types |

pub mod dispatch;
pub mod error;
pub mod printer;
pub mod protocol;
pub mod server;
pub mod transport;
pub mod worker;

// Re-exports for convenience
pub use dispatch::Dispatcher;
pub use error::AgentError;
pub use printer::ConfigHandle;
