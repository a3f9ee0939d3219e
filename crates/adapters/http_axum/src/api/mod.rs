//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod devices;
#[allow(clippy::missing_errors_doc)]
pub mod entities;
pub mod sse;

use std::str::FromStr;

use axum::Router;
use axum::routing::{get, post};

use litehub_app::ports::{DeviceRepository, EntityRepository, EventPublisher, Integration};
use litehub_domain::error::{LiteHubError, ValidationError};

use crate::error::ApiError;
use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<ER, DR, EP, I>() -> Router<AppState<ER, DR, EP, I>>
where
    ER: EntityRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    I: Integration + Send + Sync + 'static,
{
    Router::new()
        // Entities
        .route("/entities", get(entities::list::<ER, DR, EP, I>))
        .route("/entities/{id}", get(entities::get::<ER, DR, EP, I>))
        .route(
            "/entities/{id}/services/{service}",
            post(entities::call_service::<ER, DR, EP, I>),
        )
        // Devices
        .route("/devices", get(devices::list::<ER, DR, EP, I>))
        .route("/devices/{id}", get(devices::get::<ER, DR, EP, I>))
        // Events
        .route("/events/stream", get(sse::stream::<ER, DR, EP, I>))
}

/// Parse an identifier path segment.
fn parse_id<T: FromStr<Err = ValidationError>>(raw: &str) -> Result<T, ApiError> {
    T::from_str(raw).map_err(|err| ApiError::from(LiteHubError::from(err)))
}
