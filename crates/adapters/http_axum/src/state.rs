//! Shared application state for axum handlers.

use std::sync::Arc;

use litehub_app::event_bus::InProcessEventBus;
use litehub_app::services::device_service::DeviceService;
use litehub_app::services::entity_service::EntityService;
use litehub_app::services::service_call::ServiceCallService;

/// Application state shared across all axum handlers.
///
/// Generic over the repositories, the event publisher and the integration
/// to avoid dynamic dispatch. `Clone` is implemented manually so the
/// underlying types themselves do not need to be `Clone`; only the `Arc`
/// wrappers are cloned.
pub struct AppState<ER, DR, EP, I> {
    /// Entity queries.
    pub entity_service: Arc<EntityService<ER, EP>>,
    /// Device queries.
    pub device_service: Arc<DeviceService<DR>>,
    /// Service-call routing to the integration.
    pub service_call: Arc<ServiceCallService<ER, EP, I>>,
    /// Bus the SSE endpoint subscribes to.
    pub event_bus: Arc<InProcessEventBus>,
}

impl<ER, DR, EP, I> Clone for AppState<ER, DR, EP, I> {
    fn clone(&self) -> Self {
        Self {
            entity_service: Arc::clone(&self.entity_service),
            device_service: Arc::clone(&self.device_service),
            service_call: Arc::clone(&self.service_call),
            event_bus: Arc::clone(&self.event_bus),
        }
    }
}

impl<ER, DR, EP, I> AppState<ER, DR, EP, I> {
    /// Create the state from services already shared with background tasks.
    pub fn new(
        entity_service: Arc<EntityService<ER, EP>>,
        device_service: Arc<DeviceService<DR>>,
        service_call: Arc<ServiceCallService<ER, EP, I>>,
        event_bus: Arc<InProcessEventBus>,
    ) -> Self {
        Self {
            entity_service,
            device_service,
            service_call,
            event_bus,
        }
    }
}
