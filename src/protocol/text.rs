//! # Single-Byte Text Encoding
//!
//! Star Line Mode prints text as raw single bytes. Anything outside printable
//! ASCII (`0x20..=0x7E`) is either unprintable on the default code page or,
//! worse, a control byte that the firmware would execute as a command (an
//! `ESC` inside a name would start an escape sequence mid-job).
//!
//! How such characters are handled is chosen with a [`TextPolicy`]:
//!
//! | Policy | `"Zoë\x1b"` becomes |
//! |--------|---------------------|
//! | `replace` (default) | `Zo??` |
//! | `strip` | `Zo` |
//! | `transliterate` | `Zoe?` |
//! | `reject` | error |

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::AgentError;

/// Byte written in place of an unrepresentable character.
pub const REPLACEMENT: u8 = b'?';

/// What to do with characters that cannot be sent as printable ASCII.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextPolicy {
    /// Substitute `?` for each unrepresentable character
    #[default]
    Replace,
    /// Drop unrepresentable characters
    Strip,
    /// Fold accented Latin letters to their base letter, `?` otherwise
    Transliterate,
    /// Fail the encode on the first unrepresentable character
    Reject,
}

impl TextPolicy {
    pub const ALL: [TextPolicy; 4] = [
        TextPolicy::Replace,
        TextPolicy::Strip,
        TextPolicy::Transliterate,
        TextPolicy::Reject,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TextPolicy::Replace => "replace",
            TextPolicy::Strip => "strip",
            TextPolicy::Transliterate => "transliterate",
            TextPolicy::Reject => "reject",
        }
    }
}

impl fmt::Display for TextPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "unknown text policy '{}' (expected replace, strip, transliterate or reject)",
                    s
                )
            })
    }
}

/// Whether a character can be written as-is.
#[inline]
pub fn is_printable(ch: char) -> bool {
    matches!(ch, ' '..='~')
}

/// Encode a string as printable single-byte ASCII under `policy`.
///
/// ## Example
///
/// ```
/// use tup900_edge::protocol::text::{encode, TextPolicy};
///
/// assert_eq!(encode("Ada", TextPolicy::Reject).unwrap(), b"Ada".to_vec());
/// assert_eq!(encode("Zoë", TextPolicy::Replace).unwrap(), b"Zo?".to_vec());
/// assert_eq!(encode("Zoë", TextPolicy::Transliterate).unwrap(), b"Zoe".to_vec());
/// assert!(encode("Zoë", TextPolicy::Reject).is_err());
/// ```
pub fn encode(s: &str, policy: TextPolicy) -> Result<Vec<u8>, AgentError> {
    let mut out = Vec::with_capacity(s.len());
    for (index, ch) in s.chars().enumerate() {
        if is_printable(ch) {
            out.push(ch as u8);
            continue;
        }
        match policy {
            TextPolicy::Replace => out.push(REPLACEMENT),
            TextPolicy::Strip => {}
            TextPolicy::Transliterate => out.push(fold_latin(ch).unwrap_or(REPLACEMENT)),
            TextPolicy::Reject => {
                return Err(AgentError::InvalidText(format!(
                    "character U+{:04X} at position {} is not printable ASCII",
                    ch as u32, index
                )));
            }
        }
    }
    Ok(out)
}

/// Map an accented Latin-1 / Latin Extended-A letter to its ASCII base letter.
///
/// Returns `None` for anything else, including control characters.
fn fold_latin(ch: char) -> Option<u8> {
    let base = match ch {
        'À'..='Å' | 'Ā' | 'Ă' | 'Ą' => b'A',
        'à'..='å' | 'ā' | 'ă' | 'ą' => b'a',
        'Ç' | 'Ć' | 'Ĉ' | 'Ċ' | 'Č' => b'C',
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => b'c',
        'Ď' | 'Đ' => b'D',
        'ď' | 'đ' => b'd',
        'È'..='Ë' | 'Ē' | 'Ĕ' | 'Ė' | 'Ę' | 'Ě' => b'E',
        'è'..='ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => b'e',
        'Ĝ' | 'Ğ' | 'Ġ' | 'Ģ' => b'G',
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => b'g',
        'Ì'..='Ï' | 'Ĩ' | 'Ī' | 'Ĭ' | 'Į' | 'İ' => b'I',
        'ì'..='ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => b'i',
        'Ł' | 'Ĺ' | 'Ļ' | 'Ľ' => b'L',
        'ł' | 'ĺ' | 'ļ' | 'ľ' => b'l',
        'Ñ' | 'Ń' | 'Ņ' | 'Ň' => b'N',
        'ñ' | 'ń' | 'ņ' | 'ň' => b'n',
        'Ò'..='Ö' | 'Ø' | 'Ō' | 'Ŏ' | 'Ő' => b'O',
        'ò'..='ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => b'o',
        'Ŕ' | 'Ŗ' | 'Ř' => b'R',
        'ŕ' | 'ŗ' | 'ř' => b'r',
        'Ś' | 'Ŝ' | 'Ş' | 'Š' => b'S',
        'ś' | 'ŝ' | 'ş' | 'š' => b's',
        'Ţ' | 'Ť' => b'T',
        'ţ' | 'ť' => b't',
        'Ù'..='Ü' | 'Ũ' | 'Ū' | 'Ŭ' | 'Ů' | 'Ű' | 'Ų' => b'U',
        'ù'..='ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => b'u',
        'Ý' | 'Ÿ' => b'Y',
        'ý' | 'ÿ' => b'y',
        'Ź' | 'Ż' | 'Ž' => b'Z',
        'ź' | 'ż' | 'ž' => b'z',
        'ß' => b's',
        _ => return None,
    };
    Some(base)
}

// ============================================================================
// TESTS
// ============================================================================
