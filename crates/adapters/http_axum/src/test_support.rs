//! In-memory ports and request helpers for the handler tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use tower::ServiceExt;

use litehub_app::event_bus::InProcessEventBus;
use litehub_app::ports::{DeviceRepository, EntityRepository, Integration, IntegrationContext};
use litehub_app::services::device_service::DeviceService;
use litehub_app::services::entity_service::EntityService;
use litehub_app::services::service_call::ServiceCallService;
use litehub_domain::device::Device;
use litehub_domain::entity::{Entity, EntityState};
use litehub_domain::error::LiteHubError;
use litehub_domain::id::{DeviceId, EntityId};

use crate::state::AppState;

#[derive(Default)]
pub struct MemoryEntityRepo {
    store: Mutex<HashMap<EntityId, Entity>>,
}

impl EntityRepository for MemoryEntityRepo {
    async fn create(&self, entity: Entity) -> Result<Entity, LiteHubError> {
        self.store.lock().unwrap().insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn get_by_id(&self, id: EntityId) -> Result<Option<Entity>, LiteHubError> {
        Ok(self.store.lock().unwrap().get(&id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Entity>, LiteHubError> {
        Ok(self.store.lock().unwrap().values().cloned().collect())
    }

    async fn find_by_entity_id(&self, entity_id: &str) -> Result<Option<Entity>, LiteHubError> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .values()
            .find(|e| e.entity_id == entity_id)
            .cloned())
    }

    async fn update(&self, entity: Entity) -> Result<Entity, LiteHubError> {
        self.store.lock().unwrap().insert(entity.id, entity.clone());
        Ok(entity)
    }
}

#[derive(Default)]
pub struct MemoryDeviceRepo {
    store: Mutex<HashMap<DeviceId, Device>>,
}

impl DeviceRepository for MemoryDeviceRepo {
    async fn create(&self, device: Device) -> Result<Device, LiteHubError> {
        self.store.lock().unwrap().insert(device.id, device.clone());
        Ok(device)
    }

    async fn get_by_id(&self, id: DeviceId) -> Result<Option<Device>, LiteHubError> {
        Ok(self.store.lock().unwrap().get(&id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Device>, LiteHubError> {
        Ok(self.store.lock().unwrap().values().cloned().collect())
    }

    async fn find_by_integration_unique_id(
        &self,
        integration: &str,
        unique_id: &str,
    ) -> Result<Option<Device>, LiteHubError> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .values()
            .find(|d| d.integration == integration && d.unique_id == unique_id)
            .cloned())
    }

    async fn update(&self, device: Device) -> Result<Device, LiteHubError> {
        self.store.lock().unwrap().insert(device.id, device.clone());
        Ok(device)
    }
}

/// Integration that records service names and answers with a fixed snapshot.
pub struct StubIntegration {
    snapshot: Entity,
    calls: Mutex<Vec<String>>,
}

impl Integration for StubIntegration {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn setup(&mut self, _ctx: &impl IntegrationContext) -> Result<(), LiteHubError> {
        Ok(())
    }

    async fn handle_service_call(
        &self,
        _entity_id: EntityId,
        service: &str,
        _data: serde_json::Value,
    ) -> Result<Entity, LiteHubError> {
        self.calls.lock().unwrap().push(service.to_string());
        Ok(self.snapshot.clone())
    }

    async fn teardown(&mut self) -> Result<(), LiteHubError> {
        Ok(())
    }
}

pub type TestState =
    AppState<MemoryEntityRepo, MemoryDeviceRepo, Arc<InProcessEventBus>, StubIntegration>;

pub struct TestApp {
    pub state: TestState,
    pub entity_id: EntityId,
    pub device_id: DeviceId,
    integration: Arc<StubIntegration>,
}

impl TestApp {
    /// App with one LiteTouch switch device and its entity stored.
    pub async fn with_switch() -> Self {
        let event_bus = Arc::new(InProcessEventBus::new(16));
        let entity_service = Arc::new(EntityService::new(
            MemoryEntityRepo::default(),
            Arc::clone(&event_bus),
        ));
        let device_service = Arc::new(DeviceService::new(MemoryDeviceRepo::default()));

        let device = device_service
            .create_device(
                Device::builder()
                    .name("Porch")
                    .manufacturer("LiteTouch")
                    .model("Switch")
                    .integration("litetouch")
                    .unique_id("12_3")
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();
        let entity = entity_service
            .create_entity(
                Entity::builder()
                    .device_id(device.id)
                    .entity_id("switch.litetouch_12_3")
                    .friendly_name("Porch")
                    .state(EntityState::Off)
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        let integration = Arc::new(StubIntegration {
            snapshot: entity.clone(),
            calls: Mutex::new(Vec::new()),
        });
        let service_call = Arc::new(ServiceCallService::new(
            Arc::clone(&entity_service),
            Arc::clone(&integration),
            Arc::clone(&event_bus),
        ));

        Self {
            state: AppState::new(entity_service, device_service, service_call, event_bus),
            entity_id: entity.id,
            device_id: device.id,
            integration,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        crate::router::build(self.state.clone())
            .oneshot(request)
            .await
            .unwrap()
    }

    pub fn calls(&self) -> Vec<String> {
        self.integration.calls.lock().unwrap().clone()
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
