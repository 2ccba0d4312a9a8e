use crate::error::{ApiError, ErrorResponse};
use crate::routes;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};

/// GET /features handler - Export every feature in Flipper API form
///
/// The body is the same compact JSON the backend writes for snapshots, so it
/// can be saved and fed back through `FLIPPY_STATE_FILE`.
#[utoipa::path(
    get,
    path = routes::FEATURES,
    responses(
        (status = 200, description = "Map of feature name to feature"),
        (status = 500, description = "Serialization error", body = ErrorResponse)
    ),
    tag = "flags"
)]
pub async fn features_handler(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let body = state.flippy.backend().to_json()?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    ))
}
