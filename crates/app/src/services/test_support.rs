//! In-memory port implementations shared by the service tests.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use litehub_domain::device::Device;
use litehub_domain::entity::Entity;
use litehub_domain::error::LiteHubError;
use litehub_domain::event::Event;
use litehub_domain::id::{DeviceId, EntityId};

use crate::ports::{DeviceRepository, EntityRepository, EventPublisher};

#[derive(Default)]
pub struct InMemoryEntityRepo {
    store: Mutex<HashMap<EntityId, Entity>>,
}

impl EntityRepository for InMemoryEntityRepo {
    fn create(&self, entity: Entity) -> impl Future<Output = Result<Entity, LiteHubError>> + Send {
        self.store.lock().unwrap().insert(entity.id, entity.clone());
        async { Ok(entity) }
    }

    fn get_by_id(
        &self,
        id: EntityId,
    ) -> impl Future<Output = Result<Option<Entity>, LiteHubError>> + Send {
        let result = self.store.lock().unwrap().get(&id).cloned();
        async { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Entity>, LiteHubError>> + Send {
        let result: Vec<Entity> = self.store.lock().unwrap().values().cloned().collect();
        async { Ok(result) }
    }

    fn find_by_entity_id(
        &self,
        entity_id: &str,
    ) -> impl Future<Output = Result<Option<Entity>, LiteHubError>> + Send {
        let result = self
            .store
            .lock()
            .unwrap()
            .values()
            .find(|ent| ent.entity_id == entity_id)
            .cloned();
        async { Ok(result) }
    }

    fn update(&self, entity: Entity) -> impl Future<Output = Result<Entity, LiteHubError>> + Send {
        self.store.lock().unwrap().insert(entity.id, entity.clone());
        async { Ok(entity) }
    }
}

#[derive(Default)]
pub struct InMemoryDeviceRepo {
    store: Mutex<HashMap<DeviceId, Device>>,
}

impl DeviceRepository for InMemoryDeviceRepo {
    fn create(&self, device: Device) -> impl Future<Output = Result<Device, LiteHubError>> + Send {
        self.store.lock().unwrap().insert(device.id, device.clone());
        async { Ok(device) }
    }

    fn get_by_id(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, LiteHubError>> + Send {
        let result = self.store.lock().unwrap().get(&id).cloned();
        async { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Device>, LiteHubError>> + Send {
        let result: Vec<Device> = self.store.lock().unwrap().values().cloned().collect();
        async { Ok(result) }
    }

    fn find_by_integration_unique_id(
        &self,
        integration: &str,
        unique_id: &str,
    ) -> impl Future<Output = Result<Option<Device>, LiteHubError>> + Send {
        let result = self
            .store
            .lock()
            .unwrap()
            .values()
            .find(|d| d.integration == integration && d.unique_id == unique_id)
            .cloned();
        async { Ok(result) }
    }

    fn update(&self, device: Device) -> impl Future<Output = Result<Device, LiteHubError>> + Send {
        self.store.lock().unwrap().insert(device.id, device.clone());
        async { Ok(device) }
    }
}

/// Publisher that keeps every event for later inspection.
#[derive(Default)]
pub struct RecordingPublisher {
    pub events: Mutex<Vec<Event>>,
}

impl RecordingPublisher {
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), LiteHubError>> + Send {
        self.events.lock().unwrap().push(event);
        async { Ok(()) }
    }
}
