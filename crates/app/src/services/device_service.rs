//! Device service: use-cases for managing devices.

use litehub_domain::device::Device;
use litehub_domain::error::{LiteHubError, NotFoundError};
use litehub_domain::id::DeviceId;

use crate::ports::DeviceRepository;

/// Application service for the device registry.
pub struct DeviceService<R> {
    repo: R,
}

impl<R: DeviceRepository> DeviceService<R> {
    /// Create a new service backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Create a new device after validating domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`LiteHubError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, device), fields(device_name = %device.name))]
    pub async fn create_device(&self, device: Device) -> Result<Device, LiteHubError> {
        device.validate()?;
        self.repo.create(device).await
    }

    /// Look up a device by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`LiteHubError::NotFound`] when no device with `id` exists,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_device(&self, id: DeviceId) -> Result<Device, LiteHubError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Device",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all devices.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_devices(&self) -> Result<Vec<Device>, LiteHubError> {
        self.repo.get_all().await
    }

    /// Update an existing device.
    ///
    /// # Errors
    ///
    /// Returns [`LiteHubError::Validation`] if invariants fail, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self, device))]
    async fn update_device(&self, device: Device) -> Result<Device, LiteHubError> {
        device.validate()?;
        self.repo.update(device).await
    }

    /// Create or update a device by its `(integration, unique_id)` pair.
    ///
    /// If a device with the same integration and unique id already exists, its
    /// name, manufacturer and model are refreshed while the original UUID is
    /// kept. Otherwise a new device is created.
    ///
    /// # Errors
    ///
    /// Returns [`LiteHubError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, device), fields(device_name = %device.name))]
    pub async fn upsert_device(&self, device: Device) -> Result<Device, LiteHubError> {
        if let Some(existing) = self
            .repo
            .find_by_integration_unique_id(&device.integration, &device.unique_id)
            .await?
        {
            tracing::debug!(id = %existing.id, "device already registered, refreshing");
            let updated = Device {
                id: existing.id,
                ..device
            };
            return self.update_device(updated).await;
        }
        self.create_device(device).await
    }
}
