//! Integration port: lifecycle and service-call handling for device integrations.
//!
//! An integration bridges an external protocol (LiteTouch, …) into the
//! litehub system. It discovers devices/entities on startup, keeps their
//! state current from background tasks, and handles service calls directed
//! at entities it owns.

use std::future::Future;

use litehub_domain::device::Device;
use litehub_domain::entity::Entity;
use litehub_domain::error::LiteHubError;
use litehub_domain::event::Event;
use litehub_domain::id::EntityId;

/// Context provided to integrations for persisting discoveries.
///
/// This is a **port**: adapters call it to persist devices and entities
/// they discover. The binary crate provides a concrete implementation
/// backed by `DeviceService` and `EntityService`.
pub trait IntegrationContext: Send + Sync {
    /// Persist a discovered device (create or update by `integration`+`unique_id`).
    ///
    /// Returns the stored device, whose `id` may differ from the one passed
    /// in when the device was already known.
    fn upsert_device(
        &self,
        device: Device,
    ) -> impl Future<Output = Result<Device, LiteHubError>> + Send;

    /// Persist a discovered entity (create or update by `entity_id` string).
    ///
    /// Also publishes `StateChanged` / `EntityCreated` events through the
    /// event bus when appropriate (delegated to `EntityService`).
    fn upsert_entity(
        &self,
        entity: Entity,
    ) -> impl Future<Output = Result<Entity, LiteHubError>> + Send;

    /// Publish a domain event to the event bus.
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), LiteHubError>> + Send;

    /// Convenience: persist a full [`DiscoveredDevice`] (device + all entities).
    ///
    /// Entities are re-pointed at the stored device id before being
    /// persisted, and the stored records are returned.
    fn persist_discovered(
        &self,
        dd: DiscoveredDevice,
    ) -> impl Future<Output = Result<DiscoveredDevice, LiteHubError>> + Send {
        async move {
            let device = self.upsert_device(dd.device).await?;
            let mut entities = Vec::with_capacity(dd.entities.len());
            for mut entity in dd.entities {
                entity.device_id = device.id;
                entities.push(self.upsert_entity(entity).await?);
            }
            Ok(DiscoveredDevice { device, entities })
        }
    }
}

/// A pluggable device integration.
///
/// Implementations live in adapter crates (e.g. `adapter_litetouch`).
/// The binary crate calls the lifecycle methods in order:
///
/// 1. [`setup`](Self::setup): initialise and persist instant discoveries
/// 2. [`start_background`](Self::start_background): spawn long-running tasks
/// 3. (the server runs, forwarding service calls via [`handle_service_call`](Self::handle_service_call))
/// 4. [`teardown`](Self::teardown): clean up resources
pub trait Integration {
    /// Unique name identifying this integration (e.g. `"litetouch"`).
    fn name(&self) -> &'static str;

    /// Fast, non-blocking initialisation.
    ///
    /// Integrations that know their devices up front (e.g. from
    /// configuration) persist them via `ctx` here.
    fn setup(
        &mut self,
        ctx: &impl IntegrationContext,
    ) -> impl Future<Output = Result<(), LiteHubError>> + Send;

    /// Start long-running background work (state listeners, polling, …).
    ///
    /// Spawns internal tasks that persist updates via `ctx` and returns
    /// immediately. The default implementation is a no-op.
    fn start_background(
        &mut self,
        _ctx: impl IntegrationContext + Clone + 'static,
    ) -> impl Future<Output = Result<(), LiteHubError>> + Send {
        async { Ok(()) }
    }

    /// Handle a service call (e.g. `turn_on`, `turn_off`, `toggle`) for an
    /// entity owned by this integration.
    ///
    /// Returns the [`Entity`] snapshot after handling the call.
    fn handle_service_call(
        &self,
        entity_id: EntityId,
        service: &str,
        data: serde_json::Value,
    ) -> impl Future<Output = Result<Entity, LiteHubError>> + Send;

    /// Called on graceful shutdown. Clean up any background tasks or connections.
    fn teardown(&mut self) -> impl Future<Output = Result<(), LiteHubError>> + Send;
}

/// A device and its associated entities discovered during integration setup.
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    pub device: Device,
    pub entities: Vec<Entity>,
}
