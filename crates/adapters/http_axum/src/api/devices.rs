//! JSON handlers for devices.

use axum::Json;
use axum::extract::{Path, State};

use litehub_app::ports::{DeviceRepository, EntityRepository, EventPublisher, Integration};
use litehub_domain::device::Device;
use litehub_domain::id::DeviceId;

use crate::api::parse_id;
use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/devices`
pub async fn list<ER, DR, EP, I>(
    State(state): State<AppState<ER, DR, EP, I>>,
) -> Result<Json<Vec<Device>>, ApiError>
where
    ER: EntityRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    I: Integration + Send + Sync + 'static,
{
    Ok(Json(state.device_service.list_devices().await?))
}

/// `GET /api/devices/{id}`
pub async fn get<ER, DR, EP, I>(
    State(state): State<AppState<ER, DR, EP, I>>,
    Path(id): Path<String>,
) -> Result<Json<Device>, ApiError>
where
    ER: EntityRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    I: Integration + Send + Sync + 'static,
{
    let id: DeviceId = parse_id(&id)?;
    Ok(Json(state.device_service.get_device(id).await?))
}
