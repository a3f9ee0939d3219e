//! Storage port: repository traits for persistence.

use std::future::Future;

use litehub_domain::device::Device;
use litehub_domain::entity::Entity;
use litehub_domain::error::LiteHubError;
use litehub_domain::id::{DeviceId, EntityId};

/// Repository for persisting and querying [`Entity`]s.
pub trait EntityRepository {
    /// Persist a new entity.
    fn create(&self, entity: Entity) -> impl Future<Output = Result<Entity, LiteHubError>> + Send;

    /// Get an entity by its unique identifier.
    fn get_by_id(
        &self,
        id: EntityId,
    ) -> impl Future<Output = Result<Option<Entity>, LiteHubError>> + Send;

    /// Get all entities.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Entity>, LiteHubError>> + Send;

    /// Look up an entity by its human-readable `entity_id` (e.g. `switch.litetouch_12_3`).
    fn find_by_entity_id(
        &self,
        entity_id: &str,
    ) -> impl Future<Output = Result<Option<Entity>, LiteHubError>> + Send;

    /// Overwrite an existing entity.
    fn update(&self, entity: Entity) -> impl Future<Output = Result<Entity, LiteHubError>> + Send;
}

/// Repository for persisting and querying [`Device`]s.
pub trait DeviceRepository {
    /// Persist a new device.
    fn create(&self, device: Device) -> impl Future<Output = Result<Device, LiteHubError>> + Send;

    /// Get a device by its unique identifier.
    fn get_by_id(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, LiteHubError>> + Send;

    /// Get all devices.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Device>, LiteHubError>> + Send;

    /// Find the device registered by `integration` under `unique_id`.
    fn find_by_integration_unique_id(
        &self,
        integration: &str,
        unique_id: &str,
    ) -> impl Future<Output = Result<Option<Device>, LiteHubError>> + Send;

    /// Overwrite an existing device.
    fn update(&self, device: Device) -> impl Future<Output = Result<Device, LiteHubError>> + Send;
}
