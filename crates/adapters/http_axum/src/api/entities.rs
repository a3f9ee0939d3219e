//! JSON handlers for entities and service calls.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};

use litehub_app::ports::{DeviceRepository, EntityRepository, EventPublisher, Integration};
use litehub_domain::entity::Entity;
use litehub_domain::id::EntityId;

use crate::api::parse_id;
use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Entity>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get and service-call endpoints.
pub enum GetResponse {
    Ok(Json<Entity>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/entities`
pub async fn list<ER, DR, EP, I>(
    State(state): State<AppState<ER, DR, EP, I>>,
) -> Result<ListResponse, ApiError>
where
    ER: EntityRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    I: Integration + Send + Sync + 'static,
{
    let entities = state.entity_service.list_entities().await?;
    Ok(ListResponse::Ok(Json(entities)))
}

/// `GET /api/entities/{id}`
pub async fn get<ER, DR, EP, I>(
    State(state): State<AppState<ER, DR, EP, I>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    ER: EntityRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    I: Integration + Send + Sync + 'static,
{
    let id: EntityId = parse_id(&id)?;
    let entity = state.entity_service.get_entity(id).await?;
    Ok(GetResponse::Ok(Json(entity)))
}

/// `POST /api/entities/{id}/services/{service}`
///
/// The optional JSON body is passed to the integration as service data.
pub async fn call_service<ER, DR, EP, I>(
    State(state): State<AppState<ER, DR, EP, I>>,
    Path((id, service)): Path<(String, String)>,
    body: Option<Json<serde_json::Value>>,
) -> Result<GetResponse, ApiError>
where
    ER: EntityRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    I: Integration + Send + Sync + 'static,
{
    let id: EntityId = parse_id(&id)?;
    let data = body.map_or_else(|| serde_json::json!({}), |Json(data)| data);
    let entity = state.service_call.call(id, &service, data).await?;
    Ok(GetResponse::Ok(Json(entity)))
}
