//! `SQLite` implementation of [`EntityRepository`].

use std::collections::HashMap;

use sqlx::types::Json;
use sqlx::{FromRow, SqlitePool};

use litehub_app::ports::EntityRepository;
use litehub_domain::entity::{AttributeValue, Entity, EntityState};
use litehub_domain::error::{LiteHubError, NotFoundError};
use litehub_domain::id::EntityId;
use litehub_domain::time::Timestamp;

use crate::error::StorageError;

const COLUMNS: &str =
    "id, device_id, entity_id, friendly_name, state, attributes, last_changed, last_updated";

/// Column-for-column image of an `entities` row.
#[derive(FromRow)]
struct EntityRow {
    id: String,
    device_id: String,
    entity_id: String,
    friendly_name: String,
    state: String,
    attributes: Json<HashMap<String, AttributeValue>>,
    last_changed: Timestamp,
    last_updated: Timestamp,
}

fn malformed(column: &'static str, value: &str) -> StorageError {
    StorageError::Malformed {
        column,
        value: value.to_string(),
    }
}

fn decode_state(raw: &str) -> Result<EntityState, StorageError> {
    match raw {
        "on" => Ok(EntityState::On),
        "off" => Ok(EntityState::Off),
        "unknown" => Ok(EntityState::Unknown),
        "unavailable" => Ok(EntityState::Unavailable),
        other => Err(malformed("state", other)),
    }
}

impl TryFrom<EntityRow> for Entity {
    type Error = StorageError;

    fn try_from(row: EntityRow) -> Result<Self, Self::Error> {
        Ok(Entity {
            id: row.id.parse().map_err(|_| malformed("id", &row.id))?,
            device_id: row
                .device_id
                .parse()
                .map_err(|_| malformed("device_id", &row.device_id))?,
            state: decode_state(&row.state)?,
            entity_id: row.entity_id,
            friendly_name: row.friendly_name,
            attributes: row.attributes.0,
            last_changed: row.last_changed,
            last_updated: row.last_updated,
        })
    }
}

/// `SQLite`-backed entity repository.
pub struct SqliteEntityRepository {
    pool: SqlitePool,
}

impl SqliteEntityRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_where(
        &self,
        clause: &str,
        key: &str,
    ) -> Result<Option<Entity>, LiteHubError> {
        let sql = format!("SELECT {COLUMNS} FROM entities WHERE {clause} = ?");
        let row: Option<EntityRow> = sqlx::query_as(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(row.map(Entity::try_from).transpose()?)
    }
}

impl EntityRepository for SqliteEntityRepository {
    async fn create(&self, entity: Entity) -> Result<Entity, LiteHubError> {
        let sql = format!("INSERT INTO entities ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)");
        sqlx::query(&sql)
            .bind(entity.id.to_string())
            .bind(entity.device_id.to_string())
            .bind(&entity.entity_id)
            .bind(&entity.friendly_name)
            .bind(entity.state.to_string())
            .bind(Json(&entity.attributes))
            .bind(entity.last_changed)
            .bind(entity.last_updated)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(entity)
    }

    async fn get_by_id(&self, id: EntityId) -> Result<Option<Entity>, LiteHubError> {
        self.fetch_where("id", &id.to_string()).await
    }

    async fn get_all(&self) -> Result<Vec<Entity>, LiteHubError> {
        let sql = format!("SELECT {COLUMNS} FROM entities ORDER BY entity_id");
        let rows: Vec<EntityRow> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        rows.into_iter()
            .map(|row| Entity::try_from(row).map_err(LiteHubError::from))
            .collect()
    }

    async fn find_by_entity_id(&self, entity_id: &str) -> Result<Option<Entity>, LiteHubError> {
        self.fetch_where("entity_id", entity_id).await
    }

    /// Rewrite the mutable columns of an existing row. The owning device
    /// never changes once a switch is registered.
    async fn update(&self, entity: Entity) -> Result<Entity, LiteHubError> {
        let done = sqlx::query(
            "UPDATE entities
             SET friendly_name = ?, state = ?, attributes = ?, last_changed = ?, last_updated = ?
             WHERE id = ?",
        )
        .bind(&entity.friendly_name)
        .bind(entity.state.to_string())
        .bind(Json(&entity.attributes))
        .bind(entity.last_changed)
        .bind(entity.last_updated)
        .bind(entity.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;

        if done.rows_affected() == 0 {
            return Err(NotFoundError {
                entity: "Entity",
                id: entity.id.to_string(),
            }
            .into());
        }
        Ok(entity)
    }
}
