//! # Star Line Mode Protocol
//!
//! Byte-level protocol for the Star TUP900 kiosk printer.
//!
//! ## Module Structure
//!
//! - [`commands`]: The frozen command catalog
//! - [`text`]: Single-byte text encoding and the [`text::TextPolicy`]
//! - [`job`]: The greeting print job encoder
//! - [`status`]: Automatic Status Block (ASB) decoding
//!
//! ## Usage Example
//!
//! ```
//! use tup900_edge::protocol::{commands::Command, job, status, text::TextPolicy};
//!
//! let data = job::encode("Ada", TextPolicy::Replace).unwrap();
//! assert!(data.ends_with(Command::ArmRecovery.bytes()));
//!
//! let asb = [0u8; status::ASB_LEN];
//! assert!(status::decode(&asb).flags().paper_collected);
//! ```

pub mod commands;
pub mod job;
pub mod status;
pub mod text;
