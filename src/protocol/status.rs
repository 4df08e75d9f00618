//! # Automatic Status Block (ASB) Decoding
//!
//! After `ESC RS a 4` the TUP900 answers with a 10-byte ASB. Only two sensors
//! are interpreted here:
//!
//! | Byte | Mask | Meaning when set |
//! |------|------|------------------|
//! | 5 | `0x04` | Paper roll missing |
//! | 8 | `0x02` | Paper in presenter (exit sensor) |
//! | 8 | `0x04` | Paper in presenter (entry sensor) |
//!
//! The receipt counts as collected when both presenter bits are clear.
//! Remaining bytes are not interpreted but are always logged in hex.

use serde::Serialize;

/// Length of the ASB returned by the TUP900.
pub const ASB_LEN: usize = 10;

/// Shortest buffer that contains every byte the decoder reads.
pub const MIN_DECODE_LEN: usize = 9;

/// Byte holding the paper roll sensor.
const ROLL_BYTE: usize = 5;
const ROLL_MISSING_MASK: u8 = 0x04;

/// Byte holding the presenter paper sensors.
const PRESENTER_BYTE: usize = 8;
const PRESENTER_ENTRY_MASK: u8 = 0x04;
const PRESENTER_EXIT_MASK: u8 = 0x02;

/// Decoded sensor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatus {
    /// No receipt is waiting in the presenter
    pub paper_collected: bool,
    /// The paper roll is absent
    pub roll_missing: bool,
}

impl DeviceStatus {
    pub fn paper_text(&self) -> &'static str {
        if self.paper_collected {
            "Paper taken or collected"
        } else {
            "Paper still in slot"
        }
    }

    pub fn roll_text(&self) -> &'static str {
        if self.roll_missing {
            "Roll missing"
        } else {
            "Roll placed"
        }
    }
}

/// Result of interpreting a raw status buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusDecode {
    /// Enough bytes were present to decode the sensors
    Status(DeviceStatus),
    /// The device returned nothing
    NoResponse,
    /// The device returned fewer than [`MIN_DECODE_LEN`] bytes
    Short { len: usize },
}

impl StatusDecode {
    /// Sensor flags, defaulting to all-false when nothing could be decoded.
    pub fn flags(&self) -> DeviceStatus {
        match self {
            StatusDecode::Status(status) => *status,
            _ => DeviceStatus::default(),
        }
    }
}

/// Decode a raw ASB.
///
/// Never panics; buffers shorter than [`MIN_DECODE_LEN`] yield
/// [`StatusDecode::NoResponse`] or [`StatusDecode::Short`].
///
/// ## Example
///
/// ```
/// use tup900_edge::protocol::status::{decode, StatusDecode};
///
/// let mut asb = [0u8; 10];
/// asb[5] = 0x04;
/// match decode(&asb) {
///     StatusDecode::Status(s) => {
///         assert!(s.roll_missing);
///         assert!(s.paper_collected);
///     }
///     other => panic!("unexpected {:?}", other),
/// }
/// ```
pub fn decode(raw: &[u8]) -> StatusDecode {
    if raw.is_empty() {
        return StatusDecode::NoResponse;
    }
    if raw.len() < MIN_DECODE_LEN {
        return StatusDecode::Short { len: raw.len() };
    }

    let presenter = raw[PRESENTER_BYTE];
    let paper_collected =
        presenter & PRESENTER_ENTRY_MASK == 0 && presenter & PRESENTER_EXIT_MASK == 0;
    let roll_missing = raw[ROLL_BYTE] & ROLL_MISSING_MASK != 0;

    StatusDecode::Status(DeviceStatus {
        paper_collected,
        roll_missing,
    })
}

// ============================================================================
// TESTS
// ============================================================================
