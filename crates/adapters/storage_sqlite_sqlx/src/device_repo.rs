//! `SQLite` implementation of [`DeviceRepository`].

use sqlx::{FromRow, SqlitePool};

use litehub_app::ports::DeviceRepository;
use litehub_domain::device::Device;
use litehub_domain::error::{LiteHubError, NotFoundError};
use litehub_domain::id::DeviceId;

use crate::error::StorageError;

const COLUMNS: &str = "id, name, manufacturer, model, integration, unique_id";

#[derive(FromRow)]
struct DeviceRow {
    id: String,
    name: String,
    manufacturer: Option<String>,
    model: Option<String>,
    integration: String,
    unique_id: String,
}

impl TryFrom<DeviceRow> for Device {
    type Error = StorageError;

    fn try_from(row: DeviceRow) -> Result<Self, Self::Error> {
        let id = row.id.parse().map_err(|_| StorageError::Malformed {
            column: "id",
            value: row.id.clone(),
        })?;
        Ok(Device {
            id,
            name: row.name,
            manufacturer: row.manufacturer,
            model: row.model,
            integration: row.integration,
            unique_id: row.unique_id,
        })
    }
}

fn into_devices(rows: Vec<DeviceRow>) -> Result<Vec<Device>, LiteHubError> {
    rows.into_iter()
        .map(|row| Device::try_from(row).map_err(LiteHubError::from))
        .collect()
}

/// `SQLite`-backed device repository.
pub struct SqliteDeviceRepository {
    pool: SqlitePool,
}

impl SqliteDeviceRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl DeviceRepository for SqliteDeviceRepository {
    async fn create(&self, device: Device) -> Result<Device, LiteHubError> {
        let sql = format!("INSERT INTO devices ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?)");
        sqlx::query(&sql)
            .bind(device.id.to_string())
            .bind(&device.name)
            .bind(&device.manufacturer)
            .bind(&device.model)
            .bind(&device.integration)
            .bind(&device.unique_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(device)
    }

    async fn get_by_id(&self, id: DeviceId) -> Result<Option<Device>, LiteHubError> {
        let sql = format!("SELECT {COLUMNS} FROM devices WHERE id = ?");
        let rows: Vec<DeviceRow> = sqlx::query_as(&sql)
            .bind(id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(into_devices(rows)?.pop())
    }

    async fn get_all(&self) -> Result<Vec<Device>, LiteHubError> {
        let sql = format!("SELECT {COLUMNS} FROM devices ORDER BY name, unique_id");
        let rows: Vec<DeviceRow> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        into_devices(rows)
    }

    async fn find_by_integration_unique_id(
        &self,
        integration: &str,
        unique_id: &str,
    ) -> Result<Option<Device>, LiteHubError> {
        let sql = format!("SELECT {COLUMNS} FROM devices WHERE integration = ? AND unique_id = ?");
        let rows: Vec<DeviceRow> = sqlx::query_as(&sql)
            .bind(integration)
            .bind(unique_id)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(into_devices(rows)?.pop())
    }

    /// Refresh the descriptive columns. The `(integration, unique_id)` key
    /// a device was registered under is never rewritten.
    async fn update(&self, device: Device) -> Result<Device, LiteHubError> {
        let done = sqlx::query("UPDATE devices SET name = ?, manufacturer = ?, model = ? WHERE id = ?")
            .bind(&device.name)
            .bind(&device.manufacturer)
            .bind(&device.model)
            .bind(device.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        if done.rows_affected() == 0 {
            return Err(NotFoundError {
                entity: "Device",
                id: device.id.to_string(),
            }
            .into());
        }
        Ok(device)
    }
}
