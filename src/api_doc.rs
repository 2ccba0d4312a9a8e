use utoipa::OpenApi;

use crate::error::{ErrorResponse, HealthResponse};
use crate::feature::{ApiFeature, ApiGate, FlagState};
use crate::flippy::FeatureState;
use crate::handlers;
use crate::models::{AppResponse, IndexResponse, SetupResponse};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "flippy-control API",
        version = "0.1.0",
        description = "Feature flags with a demo control endpoint"
    ),
    paths(
        handlers::health::health_handler,
        handlers::control::control_handler,
        handlers::pages::index_handler,
        handlers::pages::setup_handler,
        handlers::pages::app_handler,
        handlers::features::features_handler
    ),
    components(
        schemas(
            IndexResponse,
            SetupResponse,
            AppResponse,
            FeatureState,
            FlagState,
            ApiFeature,
            ApiGate,
            ErrorResponse,
            HealthResponse
        )
    ),
    tags(
        (name = "health", description = "Health check operations"),
        (name = "control", description = "Demo control commands"),
        (name = "demo", description = "Demo pages"),
        (name = "flags", description = "Feature flag export")
    )
)]
pub struct ApiDoc;
