//! Device: a physical thing that exposes one or more entities.
//!
//! A device is identified across restarts by the `(integration, unique_id)`
//! pair; its UUID is assigned on first registration and preserved by upserts.

use serde::{Deserialize, Serialize};

use crate::error::{LiteHubError, ValidationError};
use crate::id::DeviceId;

/// A physical device (keypad button, load controller, …).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    /// Name of the integration that discovered this device.
    pub integration: String,
    /// Integration-scoped stable key (e.g. a LiteTouch address).
    pub unique_id: String,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`LiteHubError::Validation`] when `name` is empty.
    pub fn validate(&self) -> Result<(), LiteHubError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<DeviceId>,
    name: Option<String>,
    manufacturer: Option<String>,
    model: Option<String>,
    integration: Option<String>,
    unique_id: Option<String>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: DeviceId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn integration(mut self, integration: impl Into<String>) -> Self {
        self.integration = Some(integration.into());
        self
    }

    #[must_use]
    pub fn unique_id(mut self, unique_id: impl Into<String>) -> Self {
        self.unique_id = Some(unique_id.into());
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// # Errors
    ///
    /// Returns [`LiteHubError::Validation`] if `name` is missing or empty.
    pub fn build(self) -> Result<Device, LiteHubError> {
        let device = Device {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            manufacturer: self.manufacturer,
            model: self.model,
            integration: self.integration.unwrap_or_default(),
            unique_id: self.unique_id.unwrap_or_default(),
        };
        device.validate()?;
        Ok(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_valid_device_when_name_provided() {
        let device = Device::builder()
            .name("Kitchen Keypad")
            .manufacturer("LiteTouch")
            .integration("litetouch")
            .unique_id("12_3")
            .build()
            .unwrap();

        assert_eq!(device.name, "Kitchen Keypad");
        assert_eq!(device.manufacturer.as_deref(), Some("LiteTouch"));
        assert_eq!(device.integration, "litetouch");
        assert_eq!(device.unique_id, "12_3");
        assert!(device.model.is_none());
    }

    #[test]
    fn should_return_validation_error_when_name_is_empty() {
        let result = Device::builder().integration("litetouch").build();
        assert!(matches!(
            result,
            Err(LiteHubError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_keep_explicit_id() {
        let id = DeviceId::new();
        let device = Device::builder().id(id).name("Load 7").build().unwrap();
        assert_eq!(device.id, id);
    }
}
