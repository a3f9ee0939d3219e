//! LiteTouch switch entity.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use litehub_domain::device::Device;
use litehub_domain::entity::{AttributeValue, Entity, EntityState};
use litehub_domain::error::LiteHubError;
use litehub_domain::id::{DeviceId, EntityId};

use crate::address::Address;
use crate::config::SwitchConfig;
use crate::controller::Controller;
use crate::dispatcher::Subscription;
use crate::error::LiteTouchError;
use crate::protocol::Frame;

/// Manufacturer reported for every LiteTouch device.
pub const MANUFACTURER: &str = "LiteTouch";

/// A switch on the LiteTouch bus.
///
/// Commands go through the injected controller; the on/off state is only
/// ever learned from status frames (`RLEDU` / `CGLES`).
pub struct LiteTouchSwitch<C> {
    config: SwitchConfig,
    controller: Arc<C>,
    state: Mutex<u8>,
}

impl<C: Controller> LiteTouchSwitch<C> {
    #[must_use]
    pub fn new(config: SwitchConfig, controller: Arc<C>) -> Self {
        Self {
            config,
            controller,
            state: Mutex::new(0),
        }
    }

    #[must_use]
    pub fn address(&self) -> &Address {
        &self.config.address
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    #[must_use]
    pub fn is_on(&self) -> bool {
        self.state() != 0
    }

    #[must_use]
    pub fn icon(&self) -> Option<&str> {
        self.config.icon.as_deref()
    }

    /// Diagnostic attributes exposed on the entity.
    #[must_use]
    pub fn attributes(&self) -> HashMap<String, AttributeValue> {
        let mut attributes = HashMap::from([
            (
                "litetouch_address".to_string(),
                AttributeValue::from(self.config.address.as_str()),
            ),
            ("load_id".to_string(), AttributeValue::from(self.config.load_id)),
            ("toggle".to_string(), AttributeValue::from(self.config.toggle)),
            ("timed".to_string(), AttributeValue::from(self.config.timed)),
        ]);
        if let Some(icon) = self.icon() {
            attributes.insert("icon".to_string(), AttributeValue::from(icon));
        }
        attributes
    }

    /// Activate the switch.
    ///
    /// Toggle switches get a toggle pulse, timed switches set the controller
    /// clock, everything else switches its load on.
    ///
    /// # Errors
    ///
    /// Returns [`LiteTouchError::InvalidAddress`] for a toggle switch whose
    /// address is not `keypad_button`, or the controller's send error.
    pub fn turn_on(&self) -> Result<(), LiteTouchError> {
        if self.config.toggle {
            let (keypad, button) = self.config.address.keypad_button()?;
            tracing::debug!(keypad, button, "call toggle on");
            self.controller.toggle_switch(keypad, button)
        } else if self.config.timed {
            tracing::debug!(address = %self.config.address, "call set clock");
            self.controller.set_clock()
        } else {
            tracing::debug!(load_id = self.config.load_id, "call load on");
            self.controller.set_load_on(self.config.load_id)
        }
    }

    /// Deactivate the switch.
    ///
    /// Toggle switches get the same pulse as [`turn_on`](Self::turn_on), so
    /// the resulting state depends on the hardware.
    ///
    /// # Errors
    ///
    /// See [`turn_on`](Self::turn_on).
    pub fn turn_off(&self) -> Result<(), LiteTouchError> {
        if self.config.toggle {
            let (keypad, button) = self.config.address.keypad_button()?;
            tracing::debug!(keypad, button, "call toggle off");
            self.controller.toggle_switch(keypad, button)
        } else {
            tracing::debug!(load_id = self.config.load_id, "call load off");
            self.controller.set_load_off(self.config.load_id)
        }
    }

    /// Flip the switch: one pulse for toggle switches, otherwise the
    /// opposite of the cached state.
    ///
    /// # Errors
    ///
    /// See [`turn_on`](Self::turn_on).
    pub fn toggle(&self) -> Result<(), LiteTouchError> {
        if !self.config.toggle && self.is_on() {
            self.turn_off()
        } else {
            self.turn_on()
        }
    }

    /// Subscribe to this switch's signal and request an initial snapshot.
    ///
    /// A level already known to the controller is applied immediately. While
    /// the bridge is offline the request is left to the controller's resync
    /// on connect; the subscription works either way.
    pub fn attach(&self) -> Subscription {
        let subscription = self.controller.subscribe(&self.config.address);
        if let Some(level) = self.controller.last_level(&self.config.address) {
            self.set_level(level);
        }
        match self.controller.get_led_states(&self.config.address) {
            Ok(()) => {}
            Err(LiteTouchError::NotConnected) => {
                tracing::debug!(address = %self.config.address, "bridge offline, state requested on connect");
            }
            Err(err) => {
                tracing::warn!(address = %self.config.address, error = %err, "initial state request failed");
            }
        }
        subscription
    }

    /// Apply a frame delivered on this switch's signal.
    ///
    /// Returns `Ok(true)` when the cached state was refreshed and `Ok(false)`
    /// for message types that carry no state.
    ///
    /// # Errors
    ///
    /// Returns [`LiteTouchError::Protocol`] when a status frame has no
    /// integer level; the cached state is left untouched.
    pub fn handle_update(&self, frame: &Frame) -> Result<bool, LiteTouchError> {
        if !frame.is_status() {
            return Ok(false);
        }
        let level = frame.level()?;
        tracing::debug!(address = %self.config.address, msg_type = %frame.msg_type, level, "switch update");
        self.set_level(level);
        Ok(true)
    }

    /// Device descriptor for registration.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the builder fails.
    pub fn device(&self) -> Result<Device, LiteHubError> {
        Device::builder()
            .name(self.config.name.clone())
            .manufacturer(MANUFACTURER)
            .model(if self.config.toggle {
                "Toggle Switch"
            } else {
                "Switch"
            })
            .integration(crate::INTEGRATION_NAME)
            .unique_id(self.config.address.as_str())
            .build()
    }

    /// Entity snapshot carrying the cached state.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the builder fails.
    pub fn entity(&self, id: EntityId, device_id: DeviceId) -> Result<Entity, LiteHubError> {
        Entity::builder()
            .id(id)
            .device_id(device_id)
            .entity_id(format!("switch.litetouch_{}", self.config.address))
            .friendly_name(self.config.name.clone())
            .state(EntityState::from(self.is_on()))
            .attributes(self.attributes())
            .build()
    }

    fn set_level(&self, level: i64) {
        *self.lock_state() = u8::from(level == 1);
    }

    fn state(&self) -> u8 {
        *self.lock_state()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, u8> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
