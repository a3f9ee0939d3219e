//! LiteTouch bridge wire format.
//!
//! Frames are ASCII, comma separated, start with the literal `R` and end
//! with a carriage return:
//!
//! | Direction | Frame | Meaning |
//! |-----------|-------|---------|
//! | out | `R,CTGSW,<keypad>,<button>` | toggle a keypad button |
//! | out | `R,CSLON,<load>` | switch a load on |
//! | out | `R,CSLOF,<load>` | switch a load off |
//! | out | `R,CSCLK,<YYYYMMDDhhmmss>` | set the controller clock |
//! | out | `R,CGLES,<address>` | request LED states |
//! | out | `R,CPING` | keep-alive |
//! | in | `R,RLEDU,<address>,<level>` | LED update |
//! | in | `R,CGLES,<address>,<level>` | LED state reply |
//! | in | `R,RERR,<code>` | error report |
//! | in | `R,RPONG` | keep-alive reply |

use std::fmt;

use chrono::NaiveDateTime;

use crate::address::Address;
use crate::error::ProtocolError;

/// Frame terminator.
pub const TERMINATOR: u8 = b'\r';

/// Unsolicited LED update.
pub const RLEDU: &str = "RLEDU";
/// Reply to a LED state request.
pub const CGLES: &str = "CGLES";
/// Error report from the bridge.
pub const RERR: &str = "RERR";
/// Keep-alive reply.
pub const RPONG: &str = "RPONG";

const CLOCK_FORMAT: &str = "%Y%m%d%H%M%S";

/// A command sent to the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ToggleSwitch { keypad: u16, button: u16 },
    LoadOn(u32),
    LoadOff(u32),
    SetClock(NaiveDateTime),
    GetLedStates(Address),
    KeepAlive,
}

impl Command {
    /// The frame bytes for this command, terminator included.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut frame = self.to_string().into_bytes();
        frame.push(TERMINATOR);
        frame
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToggleSwitch { keypad, button } => write!(f, "R,CTGSW,{keypad},{button}"),
            Self::LoadOn(load_id) => write!(f, "R,CSLON,{load_id}"),
            Self::LoadOff(load_id) => write!(f, "R,CSLOF,{load_id}"),
            Self::SetClock(at) => write!(f, "R,CSCLK,{}", at.format(CLOCK_FORMAT)),
            Self::GetLedStates(address) => write!(f, "R,{CGLES},{address}"),
            Self::KeepAlive => f.write_str("R,CPING"),
        }
    }
}

/// A decoded inbound frame.
///
/// `values` holds every field after the message type, so for status
/// frames `values[0]` is the address and `values[1]` the level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub msg_type: String,
    pub values: Vec<String>,
}

impl Frame {
    /// Parse one frame. Surrounding whitespace (including CR/LF) is ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] for an empty line, a missing `R` marker or
    /// a missing message type.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ProtocolError::Empty);
        }

        let mut fields = line.split(',').map(str::trim);
        if fields.next() != Some("R") {
            return Err(ProtocolError::MissingPrefix(line.to_string()));
        }
        let msg_type = match fields.next() {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => return Err(ProtocolError::MissingType),
        };

        Ok(Self {
            msg_type,
            values: fields.map(str::to_string).collect(),
        })
    }

    /// Whether this frame reports a LED level (`RLEDU` or `CGLES`).
    #[must_use]
    pub fn is_status(&self) -> bool {
        self.msg_type == RLEDU || self.msg_type == CGLES
    }

    /// The address field, if any.
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.values.first().map(String::as_str).filter(|a| !a.is_empty())
    }

    /// The level field of a status frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MissingLevel`] or
    /// [`ProtocolError::InvalidLevel`] when the field is absent or not an
    /// integer.
    pub fn level(&self) -> Result<i64, ProtocolError> {
        let raw = self.values.get(1).ok_or_else(|| ProtocolError::MissingLevel {
            msg_type: self.msg_type.clone(),
        })?;
        raw.parse().map_err(|_| ProtocolError::InvalidLevel {
            msg_type: self.msg_type.clone(),
            value: raw.clone(),
        })
    }
}
