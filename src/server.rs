use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_doc::ApiDoc;
use crate::backend::{Backend, MemoryBackend};
use crate::config::Config;
use crate::flippy::Flippy;
use crate::handlers;
use crate::routes;
use crate::state::AppState;

/// Build the full application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(routes::INDEX, get(handlers::index_handler))
        .route(routes::SETUP, get(handlers::setup_handler))
        .route(routes::APP, get(handlers::app_handler))
        .route(routes::FEATURES, get(handlers::features_handler))
        .route(routes::HEALTH, get(handlers::health_handler))
        .route(routes::CONTROL, post(handlers::control_handler))
        .merge(SwaggerUi::new(routes::SWAGGER_UI).url(routes::OPENAPI_JSON, ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Create the in-memory backend, seeding it from the snapshot file if configured
pub fn load_backend(config: &Config) -> Result<MemoryBackend> {
    let backend = MemoryBackend::new();

    if let Some(path) = &config.state_file {
        let snapshot = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read FLIPPY_STATE_FILE {}", path))?;
        backend
            .load_json(&snapshot)
            .with_context(|| format!("Failed to load feature state from {}", path))?;
    }

    Ok(backend)
}

/// Serve the control API until the process is stopped
pub async fn serve(config: Config) -> Result<()> {
    let flippy = Flippy::new(load_backend(&config)?);
    let addr = format!("{}:{}", config.service_host, config.service_port);
    let state = AppState::new(flippy, config);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Listening on {}", addr);
    axum::serve(listener, router(state))
        .await
        .context("Server error")?;

    Ok(())
}
