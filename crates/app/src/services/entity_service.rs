//! Entity service: use-cases for managing entities.

use litehub_domain::entity::{Entity, EntityState};
use litehub_domain::error::{LiteHubError, NotFoundError};
use litehub_domain::event::{Event, EventType};
use litehub_domain::id::EntityId;
use litehub_domain::time::now;

use crate::ports::{EntityRepository, EventPublisher};

/// Application service for registering entities and tracking their state.
///
/// Every state transition is announced on the event bus as a
/// [`EventType::StateChanged`] event; new entities produce
/// [`EventType::EntityCreated`].
pub struct EntityService<R, P> {
    repo: R,
    publisher: P,
}

impl<R: EntityRepository, P: EventPublisher> EntityService<R, P> {
    /// Create a new service backed by the given repository and publisher.
    pub fn new(repo: R, publisher: P) -> Self {
        Self { repo, publisher }
    }

    /// Create a new entity after validating domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`LiteHubError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, entity), fields(entity_id = %entity.entity_id))]
    pub async fn create_entity(&self, mut entity: Entity) -> Result<Entity, LiteHubError> {
        entity.validate()?;
        let ts = now();
        entity.last_updated = ts;
        entity.last_changed = ts;
        let created = self.repo.create(entity).await?;
        self.publisher
            .publish(Event::new(
                EventType::EntityCreated,
                Some(created.id),
                serde_json::json!({
                    "entity_id": created.entity_id,
                    "state": created.state.to_string(),
                }),
            ))
            .await?;
        Ok(created)
    }

    /// Look up an entity by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`LiteHubError::NotFound`] when no entity with `id` exists,
    /// or a storage error from the repository.
    pub async fn get_entity(&self, id: EntityId) -> Result<Entity, LiteHubError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Entity",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all entities.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_entities(&self) -> Result<Vec<Entity>, LiteHubError> {
        self.repo.get_all().await
    }

    /// Create or update an entity by its `entity_id` string.
    ///
    /// An existing entity keeps its UUID and `last_changed` (unless the state
    /// differs); name, state and attributes are taken from `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`LiteHubError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, entity), fields(entity_id = %entity.entity_id))]
    pub async fn upsert_entity(&self, entity: Entity) -> Result<Entity, LiteHubError> {
        entity.validate()?;
        let Some(existing) = self.repo.find_by_entity_id(&entity.entity_id).await? else {
            return self.create_entity(entity).await;
        };

        let mut updated = Entity {
            id: existing.id,
            state: existing.state.clone(),
            last_changed: existing.last_changed,
            ..entity.clone()
        };
        updated.update_state(entity.state, now());
        let saved = self.repo.update(updated).await?;
        self.announce_change(&existing.state, &saved).await?;
        Ok(saved)
    }

    async fn announce_change(
        &self,
        previous: &EntityState,
        saved: &Entity,
    ) -> Result<(), LiteHubError> {
        if *previous == saved.state {
            return Ok(());
        }
        tracing::debug!(
            entity_id = %saved.entity_id,
            from = %previous,
            to = %saved.state,
            "entity state changed"
        );
        self.publisher
            .publish(Event::new(
                EventType::StateChanged,
                Some(saved.id),
                serde_json::json!({
                    "entity_id": saved.entity_id,
                    "from": previous.to_string(),
                    "to": saved.state.to_string(),
                }),
            ))
            .await
    }
}
