//! # litehubd: litehub daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (`litehub.toml` plus environment overrides)
//! - Install the `tracing` subscriber
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct repositories, services and the event bus
//! - Connect to the LiteTouch bridge and register the configured switches
//! - Build the axum router and serve until SIGINT/SIGTERM
//! - Tear the integration down on the way out
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use litehub_adapter_http_axum::AppState;
use litehub_adapter_litetouch::{LiteTouchController, LiteTouchIntegration};
use litehub_adapter_storage_sqlite_sqlx::{
    Database, SqliteDeviceRepository, SqliteEntityRepository,
};
use litehub_app::event_bus::InProcessEventBus;
use litehub_app::ports::Integration;
use litehub_app::services::device_service::DeviceService;
use litehub_app::services::entity_service::EntityService;
use litehub_app::services::integration_context::ServiceContext;
use litehub_app::services::service_call::ServiceCallService;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Database
    let db = Database::open(config.database_url()).await?;
    let pool = db.pool().clone();

    // Repositories
    let entity_repo = SqliteEntityRepository::new(pool.clone());
    let device_repo = SqliteDeviceRepository::new(pool);

    // Event bus
    let event_bus = Arc::new(InProcessEventBus::default());

    // Services
    let entity_service = Arc::new(EntityService::new(entity_repo, Arc::clone(&event_bus)));
    let device_service = Arc::new(DeviceService::new(device_repo));
    let ctx = ServiceContext::new(
        Arc::clone(&device_service),
        Arc::clone(&entity_service),
        Arc::clone(&event_bus),
    );

    // Integration
    let (mut integration, controller_task) = start_litetouch(&config);
    integration.setup(&ctx).await?;
    integration.start_background(ctx).await?;
    let integration = Arc::new(integration);

    // HTTP
    let service_call = Arc::new(ServiceCallService::new(
        Arc::clone(&entity_service),
        Arc::clone(&integration),
        Arc::clone(&event_bus),
    ));
    let state = AppState::new(entity_service, device_service, service_call, event_bus);
    let app = litehub_adapter_http_axum::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "litehubd listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down");
    match Arc::into_inner(integration) {
        Some(mut integration) => integration.teardown().await?,
        None => tracing::warn!("integration still in use, skipping teardown"),
    }
    if let Some(task) = controller_task {
        task.abort();
    }

    Ok(())
}

/// Connect to the bridge and build the integration, or an empty one when
/// the integration is disabled.
fn start_litetouch(
    config: &Config,
) -> (
    LiteTouchIntegration<LiteTouchController>,
    Option<JoinHandle<()>>,
) {
    if !config.integrations.litetouch_enabled {
        tracing::info!("LiteTouch integration disabled");
        return (LiteTouchIntegration::new(Vec::new()), None);
    }

    let (controller, task) = LiteTouchController::connect(&config.litetouch);
    let controller = Arc::new(controller);
    (
        LiteTouchIntegration::from_config(&config.litetouch, &controller),
        Some(task),
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
