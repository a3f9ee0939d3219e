//! LiteTouch integration configuration.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::LiteTouchError;

/// Configuration for the LiteTouch integration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LiteTouchConfig {
    /// Bridge hostname or IP address.
    pub host: String,
    /// Bridge TCP port.
    pub port: u16,
    /// Idle time before a keep-alive frame is written, in seconds.
    pub keep_alive_secs: u64,
    /// Pause between reconnection attempts, in seconds.
    pub reconnect_delay_secs: u64,
    /// Capacity of the outbound command queue.
    pub command_buffer: usize,
    /// Switches wired to the bus.
    pub switches: Vec<SwitchConfig>,
}

impl Default for LiteTouchConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 10001,
            keep_alive_secs: 30,
            reconnect_delay_secs: 5,
            command_buffer: 64,
            switches: Vec::new(),
        }
    }
}

impl LiteTouchConfig {
    /// `host:port` of the bridge.
    #[must_use]
    pub fn bridge_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check the configuration before any connection or switch is created.
    ///
    /// # Errors
    ///
    /// Returns [`LiteTouchError::InvalidAddress`] for a toggle switch whose
    /// address is not `keypad_button`, or [`LiteTouchError::InvalidConfig`]
    /// for zero timings, an empty host or duplicate addresses.
    pub fn validate(&self) -> Result<(), LiteTouchError> {
        if self.host.trim().is_empty() {
            return Err(LiteTouchError::InvalidConfig("host is empty".to_string()));
        }
        if self.keep_alive_secs == 0 {
            return Err(LiteTouchError::InvalidConfig(
                "keep_alive_secs must be positive".to_string(),
            ));
        }
        if self.command_buffer == 0 {
            return Err(LiteTouchError::InvalidConfig(
                "command_buffer must be positive".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for switch in &self.switches {
            if !seen.insert(&switch.address) {
                return Err(LiteTouchError::InvalidConfig(format!(
                    "duplicate switch address {}",
                    switch.address
                )));
            }
            if switch.toggle {
                switch.address.keypad_button()?;
            }
        }
        Ok(())
    }
}

/// One configured switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchConfig {
    pub address: Address,
    pub name: String,
    /// Load addressed by direct on/off commands.
    #[serde(default, alias = "loadid")]
    pub load_id: u32,
    #[serde(default)]
    pub icon: Option<String>,
    /// The hardware flips state on each pulse.
    #[serde(default)]
    pub toggle: bool,
    /// Activation sets the controller clock instead of switching a load.
    #[serde(default, alias = "time")]
    pub timed: bool,
}
