//! Service-call routing: forwards `turn_on` / `turn_off` / `toggle` to the
//! integration that owns the target entity.

use std::sync::Arc;

use litehub_domain::entity::Entity;
use litehub_domain::error::LiteHubError;
use litehub_domain::event::{Event, EventType};
use litehub_domain::id::EntityId;
use litehub_domain::service::Service;

use crate::ports::{EntityRepository, EventPublisher, Integration};
use crate::services::entity_service::EntityService;

/// Routes service calls to an [`Integration`].
///
/// The returned entity comes from the integration: the stored record with
/// its cached state. It is not written back to storage because hardware
/// confirms state changes asynchronously through the integration's
/// background listeners.
pub struct ServiceCallService<ER, EP, I> {
    entity_service: Arc<EntityService<ER, EP>>,
    integration: Arc<I>,
    publisher: EP,
}

impl<ER, EP, I> ServiceCallService<ER, EP, I>
where
    ER: EntityRepository,
    EP: EventPublisher,
    I: Integration,
{
    /// Create a new router for the given integration.
    pub fn new(
        entity_service: Arc<EntityService<ER, EP>>,
        integration: Arc<I>,
        publisher: EP,
    ) -> Self {
        Self {
            entity_service,
            integration,
            publisher,
        }
    }

    /// Call `service` on the entity identified by `id`.
    ///
    /// # Errors
    ///
    /// Returns [`LiteHubError::Validation`] for an unknown service name,
    /// [`LiteHubError::NotFound`] when the entity is not stored, or any error
    /// raised by the integration while sending the command.
    #[tracing::instrument(skip(self, data))]
    pub async fn call(
        &self,
        id: EntityId,
        service: &str,
        data: serde_json::Value,
    ) -> Result<Entity, LiteHubError> {
        let service: Service = service.parse()?;
        let target = self.entity_service.get_entity(id).await?;

        tracing::info!(
            integration = self.integration.name(),
            entity_id = %target.entity_id,
            %service,
            "calling service"
        );
        let entity = self
            .integration
            .handle_service_call(id, service.as_str(), data)
            .await?;

        self.publisher
            .publish(Event::new(
                EventType::ServiceCalled,
                Some(id),
                serde_json::json!({
                    "entity_id": target.entity_id,
                    "service": service.as_str(),
                }),
            ))
            .await?;

        Ok(entity)
    }
}
