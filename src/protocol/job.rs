//! # Print Job Encoder
//!
//! Builds the complete byte stream for one greeting receipt. The greeting is
//! printed four times, once per text style, followed by the stored logo, a
//! Code128 barcode, a cut, and finally the presenter recovery timer so an
//! uncollected receipt is retracted after 32 seconds.
//!
//! ## Layout
//!
//! ```text
//! pitch12 G LF
//! emphasizeOn pitch15 G emphasizeOff LF
//! underlineOn pitch16 G underlineOff LF
//! inverseOn G inverseOff LF
//! printLogo LF
//! printBarcode LF
//! cut armRecovery
//! ```
//!
//! `G` is the greeting text for the display name.

use super::commands::Command;
use super::text::{self, TextPolicy};
use crate::error::AgentError;

/// The greeting printed for a display name.
///
/// ## Example
///
/// ```
/// use tup900_edge::protocol::job::greeting;
///
/// assert!(greeting("Ada").starts_with("Hello Ada, welcome"));
/// ```
pub fn greeting(name: &str) -> String {
    format!(
        "Hello {}, welcome to this IoT Edge printer module running on Linux!",
        name
    )
}

/// Accumulates commands and text into one job buffer.
#[derive(Debug, Default, Clone)]
pub struct JobBuilder {
    buf: Vec<u8>,
}

impl JobBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a catalog command.
    pub fn command(mut self, command: Command) -> Self {
        self.buf.extend_from_slice(command.bytes());
        self
    }

    /// Append already-encoded text.
    pub fn text(mut self, encoded: &[u8]) -> Self {
        self.buf.extend_from_slice(encoded);
        self
    }

    /// Append `text` wrapped between `on` and `off`.
    pub fn styled(self, on: &[Command], encoded: &[u8], off: Command) -> Self {
        on.iter()
            .fold(self, |job, c| job.command(*c))
            .text(encoded)
            .command(off)
    }

    pub fn line_feed(self) -> Self {
        self.command(Command::LineFeed)
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

/// Encode the greeting job for `name`.
///
/// The name is converted under `policy`; with [`TextPolicy::Reject`] an
/// unprintable character fails the whole job before any byte is produced.
pub fn encode(name: &str, policy: TextPolicy) -> Result<Vec<u8>, AgentError> {
    let greeting = text::encode(&greeting(name), policy)?;
    Ok(encode_text(&greeting))
}

/// Lay out the job around an already-encoded greeting.
pub fn encode_text(greeting: &[u8]) -> Vec<u8> {
    JobBuilder::new()
        .command(Command::Pitch12)
        .text(greeting)
        .line_feed()
        .styled(
            &[Command::EmphasizeOn, Command::Pitch15],
            greeting,
            Command::EmphasizeOff,
        )
        .line_feed()
        .styled(
            &[Command::UnderlineOn, Command::Pitch16],
            greeting,
            Command::UnderlineOff,
        )
        .line_feed()
        .styled(&[Command::InverseOn], greeting, Command::InverseOff)
        .line_feed()
        .command(Command::PrintLogo)
        .line_feed()
        .command(Command::PrintBarcode)
        .line_feed()
        .command(Command::Cut)
        .command(Command::ArmRecovery)
        .build()
}

// ============================================================================
// TESTS
// ============================================================================
