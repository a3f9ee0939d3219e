//! Bus addresses and the fan-out signal derived from them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LiteTouchError;

/// Prefix of every per-device fan-out signal.
pub const SIGNAL_PREFIX: &str = "litetouch_entity_";

/// Fan-out signal for a raw address string.
#[must_use]
pub fn signal_for(address: &str) -> String {
    format!("{SIGNAL_PREFIX}{address}")
}

/// A LiteTouch device address, e.g. `"12_3"` (keypad 12, button 3).
///
/// Addresses are embedded verbatim in wire frames, so they may not be empty
/// or contain separators or whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Create an address from its textual form.
    ///
    /// # Errors
    ///
    /// Returns [`LiteTouchError::InvalidAddress`] when `value` is empty or
    /// contains a comma, whitespace or a control character.
    pub fn new(value: impl Into<String>) -> Result<Self, LiteTouchError> {
        let value = value.into();
        let forbidden = |c: char| c == ',' || c.is_whitespace() || c.is_control();
        if value.is_empty() || value.contains(forbidden) {
            return Err(LiteTouchError::InvalidAddress(value));
        }
        Ok(Self(value))
    }

    /// Recover an address from a signal built by [`Address::signal`].
    #[must_use]
    pub fn from_signal(signal: &str) -> Option<Self> {
        signal
            .strip_prefix(SIGNAL_PREFIX)
            .and_then(|rest| Self::new(rest).ok())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split a `keypad_button` address into its two numeric parts.
    ///
    /// # Errors
    ///
    /// Returns [`LiteTouchError::InvalidAddress`] unless the address is two
    /// unsigned integers joined by `_`.
    pub fn keypad_button(&self) -> Result<(u16, u16), LiteTouchError> {
        let invalid = || LiteTouchError::InvalidAddress(self.0.clone());
        let (keypad, button) = self.0.split_once('_').ok_or_else(invalid)?;
        let keypad = keypad.parse().map_err(|_| invalid())?;
        let button = button.parse().map_err(|_| invalid())?;
        Ok((keypad, button))
    }

    /// The fan-out signal for this address: `litetouch_entity_<address>`.
    #[must_use]
    pub fn signal(&self) -> String {
        signal_for(&self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = LiteTouchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Address {
    type Error = LiteTouchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}
