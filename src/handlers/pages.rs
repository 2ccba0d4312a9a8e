use crate::error::ApiError;
use crate::models::{AppResponse, IndexResponse, SetupResponse};
use crate::routes;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use std::collections::BTreeMap;

/// GET / handler - Current state of the demo feature
#[utoipa::path(
    get,
    path = routes::INDEX,
    responses(
        (status = 200, description = "Demo feature state", body = IndexResponse)
    ),
    tag = "demo"
)]
pub async fn index_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<IndexResponse>), ApiError> {
    let feature_exists = state.flippy.feature_exists(state.feature());
    let feature_state = if feature_exists {
        Some(state.flippy.get_feature_state(state.feature())?)
    } else {
        None
    };

    Ok((
        StatusCode::OK,
        Json(IndexResponse {
            feature_exists,
            feature_state,
        }),
    ))
}

/// GET /setup handler - Create the demo feature if it is missing
///
/// Idempotent, so a GET is acceptable here.
#[utoipa::path(
    get,
    path = routes::SETUP,
    responses(
        (status = 200, description = "Demo feature exists", body = SetupResponse)
    ),
    tag = "demo"
)]
pub async fn setup_handler(State(state): State<AppState>) -> (StatusCode, Json<SetupResponse>) {
    let created = !state.flippy.feature_exists(state.feature()) && state.flippy.create(state.feature());

    if created {
        tracing::info!("Created demo feature {}", state.feature());
    }

    (
        StatusCode::OK,
        Json(SetupResponse {
            feature: state.feature().to_string(),
            created,
        }),
    )
}

/// GET /app handler - Whether the demo feature is on for the demo user or group
#[utoipa::path(
    get,
    path = routes::APP,
    responses(
        (status = 200, description = "Feature enablement for the demo actors", body = AppResponse)
    ),
    tag = "demo"
)]
pub async fn app_handler(State(state): State<AppState>) -> (StatusCode, Json<AppResponse>) {
    let feature = state.feature();
    let is_enabled = state.flippy.is_enabled(feature, Some(&*state.user))
        | state.flippy.is_enabled(feature, Some(&*state.group));

    let mut flags = BTreeMap::new();
    flags.insert(feature.to_string(), is_enabled);

    (StatusCode::OK, Json(AppResponse(flags)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::config::{Config, DEFAULT_FEATURE};
    use crate::flippy::Flippy;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let config = Config {
            service_port: 3000,
            service_host: "0.0.0.0".to_string(),
            server_url: "http://127.0.0.1:3000".to_string(),
            feature: DEFAULT_FEATURE.to_string(),
            state_file: None,
        };
        AppState::new(Flippy::new(MemoryBackend::new()), config)
    }

    fn setup_test_app(state: AppState) -> Router {
        Router::new()
            .route(routes::INDEX, get(index_handler))
            .route(routes::SETUP, get(setup_handler))
            .route(routes::APP, get(app_handler))
            .with_state(state)
    }

    async fn get_json(app: &Router, uri: &str) -> serde_json::Value {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_index_before_setup() {
        let app = setup_test_app(test_state());

        let index = get_json(&app, "/").await;
        assert_eq!(index["feature_exists"], false);
        assert!(index["feature_state"].is_null());
    }

    #[tokio::test]
    async fn test_setup_is_idempotent() {
        let app = setup_test_app(test_state());

        let first = get_json(&app, "/setup").await;
        assert_eq!(first["created"], true);
        let second = get_json(&app, "/setup").await;
        assert_eq!(second["created"], false);

        let index = get_json(&app, "/").await;
        assert_eq!(index["feature_exists"], true);
        assert_eq!(index["feature_state"]["key"], DEFAULT_FEATURE);
        assert_eq!(index["feature_state"]["state"], "off");
    }

    #[tokio::test]
    async fn test_app_reflects_group_membership() {
        let state = test_state();
        state.flippy.create(DEFAULT_FEATURE);
        let app = setup_test_app(state.clone());

        let page = get_json(&app, "/app").await;
        assert_eq!(page, serde_json::json!({ "background_red": false }));

        state
            .flippy
            .enable_group(DEFAULT_FEATURE, &*state.group)
            .unwrap();

        let page = get_json(&app, "/app").await;
        assert_eq!(page, serde_json::json!({ "background_red": true }));
    }
}
