//! # Star Line Mode Command Catalog
//!
//! This module holds every control code the agent sends to the TUP900.
//! The catalog is one frozen table indexed by [`Command`]; the bytes of an
//! entry never change for the lifetime of the process.
//!
//! ## Escape Sequence Structure
//!
//! Commands follow these patterns:
//! - Single byte: `LF`
//! - Two bytes: `ESC E`, `ESC F`, `ESC 4`
//! - Multi-byte with parameters: `ESC d n`, `ESC - n`, `ESC RS a n`
//!
//! ## Catalog
//!
//! | Name | Bytes | Effect |
//! |------|-------|--------|
//! | `lineFeed` | `0A` | Line feed (includes carriage return) |
//! | `pitch12` | `1B 4D` | 12-dot character pitch |
//! | `pitch15` | `1B 50` | 15-dot character pitch |
//! | `pitch16` | `1B 3A` | 16-dot character pitch |
//! | `emphasizeOn` / `emphasizeOff` | `1B 45` / `1B 46` | Bold |
//! | `underlineOn` / `underlineOff` | `1B 2D 01` / `1B 2D 00` | Underline |
//! | `inverseOn` / `inverseOff` | `1B 34` / `1B 35` | White on black |
//! | `cut` | `1B 64 02` | Feed to cutter and cut |
//! | `printLogo` | `1B 1C 70 01 00` | Print NV logo #1 |
//! | `printBarcode` | `1B 62 06 02 02 A0 4D 56 50 1E` | Code128 "MVP" |
//! | `armRecovery` | `1B 16 31 40` | Presenter auto-recovery after 32 s |
//! | `executeRecovery` | `1B 16 30 00` | Presenter recovery now |
//! | `enableStatusReporting` | `1B 1E 61 04` | Enable Automatic Status Back |
//!
//! ## Reference
//!
//! Star Line Mode Command Specifications, TUP900 series.

// ============================================================================
// ESCAPE SEQUENCE CONSTANTS
// ============================================================================

/// ESC (Escape) - Command prefix byte
pub const ESC: u8 = 0x1B;

/// FS (File Separator) - Logo command prefix (`ESC FS p`)
pub const FS: u8 = 0x1C;

/// RS (Record Separator) - Used by `ESC RS a n` to configure ASB
pub const RS: u8 = 0x1E;

/// SYN - Presenter control prefix (`ESC SYN n m`)
pub const SYN: u8 = 0x16;

/// LF (Line Feed) - Print and advance one line
pub const LF: u8 = 0x0A;

// ============================================================================
// CATALOG
// ============================================================================

/// A named, immutable printer control sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandCode {
    /// Catalog name, e.g. `cut`
    pub name: &'static str,
    /// Bytes written verbatim to the device
    pub bytes: &'static [u8],
}

/// Every control code known to the agent.
///
/// The discriminant is the index into the catalog table, so lookups are a
/// single array access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    LineFeed,
    Pitch12,
    Pitch15,
    Pitch16,
    EmphasizeOn,
    EmphasizeOff,
    UnderlineOn,
    UnderlineOff,
    InverseOn,
    InverseOff,
    Cut,
    PrintLogo,
    PrintBarcode,
    ArmRecovery,
    ExecuteRecovery,
    EnableStatusReporting,
}

/// The frozen catalog, in [`Command`] discriminant order.
static CATALOG: [CommandCode; 16] = [
    CommandCode {
        name: "lineFeed",
        bytes: &[LF],
    },
    // Pitch (white space between characters)
    CommandCode {
        name: "pitch12",
        bytes: &[ESC, b'M'],
    },
    CommandCode {
        name: "pitch15",
        bytes: &[ESC, b'P'],
    },
    CommandCode {
        name: "pitch16",
        bytes: &[ESC, b':'],
    },
    CommandCode {
        name: "emphasizeOn",
        bytes: &[ESC, b'E'],
    },
    CommandCode {
        name: "emphasizeOff",
        bytes: &[ESC, b'F'],
    },
    CommandCode {
        name: "underlineOn",
        bytes: &[ESC, b'-', 0x01],
    },
    CommandCode {
        name: "underlineOff",
        bytes: &[ESC, b'-', 0x00],
    },
    CommandCode {
        name: "inverseOn",
        bytes: &[ESC, b'4'],
    },
    CommandCode {
        name: "inverseOff",
        bytes: &[ESC, b'5'],
    },
    // ESC d 2: feed to cutter position, then full cut
    CommandCode {
        name: "cut",
        bytes: &[ESC, b'd', 0x02],
    },
    // ESC FS p n m: n = logo 1, m = normal size
    CommandCode {
        name: "printLogo",
        bytes: &[ESC, FS, b'p', 0x01, 0x00],
    },
    // ESC b n1 n2 n3 n4 d... RS
    // n1 = Code128, n2 = HRI under bars, n3 = mode, n4 = 0xA0 dot height, data "MVP"
    CommandCode {
        name: "printBarcode",
        bytes: &[ESC, b'b', 0x06, 0x02, 0x02, 0xA0, b'M', b'V', b'P', RS],
    },
    // ESC SYN 1 n: n = 0x40 (64 half-seconds = 32 s)
    CommandCode {
        name: "armRecovery",
        bytes: &[ESC, SYN, b'1', 0x40],
    },
    CommandCode {
        name: "executeRecovery",
        bytes: &[ESC, SYN, b'0', 0x00],
    },
    // ESC RS a n: n = 4 enables presenter status in the ASB
    CommandCode {
        name: "enableStatusReporting",
        bytes: &[ESC, RS, b'a', 0x04],
    },
];

impl Command {
    /// All commands, in catalog order.
    pub const ALL: [Command; 16] = [
        Command::LineFeed,
        Command::Pitch12,
        Command::Pitch15,
        Command::Pitch16,
        Command::EmphasizeOn,
        Command::EmphasizeOff,
        Command::UnderlineOn,
        Command::UnderlineOff,
        Command::InverseOn,
        Command::InverseOff,
        Command::Cut,
        Command::PrintLogo,
        Command::PrintBarcode,
        Command::ArmRecovery,
        Command::ExecuteRecovery,
        Command::EnableStatusReporting,
    ];

    /// The catalog entry for this command.
    #[inline]
    pub fn code(self) -> &'static CommandCode {
        &CATALOG[self as usize]
    }

    /// Bytes to write for this command.
    ///
    /// ## Example
    ///
    /// ```
    /// use tup900_edge::protocol::commands::Command;
    ///
    /// assert_eq!(Command::Cut.bytes(), &[0x1B, 0x64, 0x02]);
    /// ```
    #[inline]
    pub fn bytes(self) -> &'static [u8] {
        self.code().bytes
    }

    /// Catalog name of this command.
    #[inline]
    pub fn name(self) -> &'static str {
        self.code().name
    }

    /// Resolve a catalog name (e.g. `"armRecovery"`).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.name() == name)
    }
}

/// Look up the catalog entry for a command.
#[inline]
pub fn lookup(command: Command) -> &'static CommandCode {
    command.code()
}

/// The whole catalog, read-only.
pub fn catalog() -> &'static [CommandCode] {
    &CATALOG
}

/// Format bytes as uppercase hex with no separators (e.g. `1B6402`).
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_matches_enum() {
        for (i, command) in Command::ALL.iter().enumerate() {
            assert_eq!(*command as usize, i);
            assert_eq!(lookup(*command), &catalog()[i]);
        }
    }

    #[test]
    fn test_every_entry_non_empty_and_stable() {
        for command in Command::ALL {
            let first = lookup(command).bytes;
            assert!(!first.is_empty(), "{} is empty", command.name());
            assert_eq!(lookup(command).bytes, first);
            assert!(std::ptr::eq(lookup(command), lookup(command)));
        }
    }

    #[test]
    fn test_exact_bytes() {
        assert_eq!(Command::LineFeed.bytes(), &[0x0A]);
        assert_eq!(Command::Pitch12.bytes(), &[0x1B, 0x4D]);
        assert_eq!(Command::Pitch15.bytes(), &[0x1B, 0x50]);
        assert_eq!(Command::Pitch16.bytes(), &[0x1B, 0x3A]);
        assert_eq!(Command::EmphasizeOn.bytes(), &[0x1B, 0x45]);
        assert_eq!(Command::EmphasizeOff.bytes(), &[0x1B, 0x46]);
        assert_eq!(Command::UnderlineOn.bytes(), &[0x1B, 0x2D, 0x01]);
        assert_eq!(Command::UnderlineOff.bytes(), &[0x1B, 0x2D, 0x00]);
        assert_eq!(Command::InverseOn.bytes(), &[0x1B, 0x34]);
        assert_eq!(Command::InverseOff.bytes(), &[0x1B, 0x35]);
        assert_eq!(Command::Cut.bytes(), &[0x1B, 0x64, 0x02]);
        assert_eq!(Command::PrintLogo.bytes(), &[0x1B, 0x1C, 0x70, 0x01, 0x00]);
        assert_eq!(
            Command::PrintBarcode.bytes(),
            &[0x1B, 0x62, 0x06, 0x02, 0x02, 0xA0, 0x4D, 0x56, 0x50, 0x1E]
        );
        assert_eq!(Command::ArmRecovery.bytes(), &[0x1B, 0x16, 0x31, 0x40]);
        assert_eq!(Command::ExecuteRecovery.bytes(), &[0x1B, 0x16, 0x30, 0x00]);
        assert_eq!(
            Command::EnableStatusReporting.bytes(),
            &[0x1B, 0x1E, 0x61, 0x04]
        );
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Command::from_name("cut"), Some(Command::Cut));
        assert_eq!(
            Command::from_name("enableStatusReporting"),
            Some(Command::EnableStatusReporting)
        );
        assert_eq!(Command::from_name("Cut"), None);
        assert_eq!(Command::from_name(""), None);
    }

    #[test]
    fn test_names_unique() {
        for a in Command::ALL {
            for b in Command::ALL {
                if a != b {
                    assert_ne!(a.name(), b.name());
                }
            }
        }
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex(&[]), "");
        assert_eq!(to_hex(Command::Cut.bytes()), "1B6402");
        assert_eq!(to_hex(&[0x00, 0xAB, 0x0F]), "00AB0F");
    }
}
