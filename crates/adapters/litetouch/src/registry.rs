//! Last-known LED level per address.

use std::collections::HashMap;
use std::sync::Mutex;

/// Maps device addresses to the last level reported by the bridge.
#[derive(Debug, Default)]
pub struct StateRegistry {
    levels: Mutex<HashMap<String, i64>>,
}

impl StateRegistry {
    pub fn record(&self, address: &str, level: i64) {
        let previous = self
            .levels
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(address.to_string(), level);
        if previous != Some(level) {
            tracing::trace!(address, level, ?previous, "level recorded");
        }
    }

    #[must_use]
    pub fn level(&self, address: &str) -> Option<i64> {
        self.levels
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(address)
            .copied()
    }
}
