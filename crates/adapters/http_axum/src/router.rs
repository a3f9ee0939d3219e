//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use litehub_app::ports::{DeviceRepository, EntityRepository, EventPublisher, Integration};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Serves the JSON API under `/api` and a liveness check at `/health`.
/// Includes a [`TraceLayer`] that logs each HTTP request/response at the
/// `DEBUG` level using the `tracing` ecosystem.
pub fn build<ER, DR, EP, I>(state: AppState<ER, DR, EP, I>) -> Router
where
    ER: EntityRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    I: Integration + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
