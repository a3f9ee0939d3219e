//! In-memory controller and integration context for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use litehub_app::ports::IntegrationContext;
use litehub_domain::device::Device;
use litehub_domain::entity::Entity;
use litehub_domain::error::LiteHubError;
use litehub_domain::event::Event;

use crate::address::{Address, signal_for};
use crate::controller::Controller;
use crate::dispatcher::{Dispatcher, Subscription};
use crate::error::LiteTouchError;
use crate::protocol::{Command, Frame};
use crate::registry::StateRegistry;

/// Controller that records commands instead of writing them to a socket.
#[derive(Default)]
pub(crate) struct RecordingController {
    sent: Mutex<Vec<Command>>,
    dispatcher: Dispatcher,
    registry: StateRegistry,
}

impl RecordingController {
    pub(crate) fn take(&self) -> Vec<Command> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    /// Feed a frame as if it came from the bridge; returns the number of
    /// subscribers reached.
    pub(crate) fn emit(&self, line: &str) -> usize {
        let frame = Frame::parse(line).unwrap();
        let address = frame.address().unwrap().to_string();
        if let Ok(level) = frame.level() {
            self.registry.record(&address, level);
        }
        self.dispatcher.dispatch(&signal_for(&address), &frame)
    }
}

impl Controller for RecordingController {
    fn send(&self, command: Command) -> Result<(), LiteTouchError> {
        self.sent.lock().unwrap().push(command);
        Ok(())
    }

    fn subscribe(&self, address: &Address) -> Subscription {
        self.dispatcher.subscribe(address.signal())
    }

    fn last_level(&self, address: &Address) -> Option<i64> {
        self.registry.level(address.as_str())
    }
}

/// Integration context keeping devices and entities in memory, with the
/// same id-preserving upsert rules as the application services.
#[derive(Clone, Default)]
pub(crate) struct MemoryContext {
    devices: Arc<Mutex<HashMap<String, Device>>>,
    entities: Arc<Mutex<HashMap<String, Entity>>>,
}

impl MemoryContext {
    pub(crate) fn devices(&self) -> Vec<Device> {
        self.devices.lock().unwrap().values().cloned().collect()
    }

    pub(crate) fn entity(&self, entity_id: &str) -> Option<Entity> {
        self.entities.lock().unwrap().get(entity_id).cloned()
    }

    pub(crate) fn entity_count(&self) -> usize {
        self.entities.lock().unwrap().len()
    }
}

impl IntegrationContext for MemoryContext {
    async fn upsert_device(&self, device: Device) -> Result<Device, LiteHubError> {
        let mut devices = self.devices.lock().unwrap();
        let key = format!("{}/{}", device.integration, device.unique_id);
        let stored = match devices.get(&key) {
            Some(existing) => Device {
                id: existing.id,
                ..device
            },
            None => device,
        };
        devices.insert(key, stored.clone());
        Ok(stored)
    }

    async fn upsert_entity(&self, entity: Entity) -> Result<Entity, LiteHubError> {
        let mut entities = self.entities.lock().unwrap();
        let stored = match entities.get(&entity.entity_id) {
            Some(existing) => Entity {
                id: existing.id,
                ..entity
            },
            None => entity,
        };
        entities.insert(stored.entity_id.clone(), stored.clone());
        Ok(stored)
    }

    async fn publish(&self, _event: Event) -> Result<(), LiteHubError> {
        Ok(())
    }
}
