use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error response type
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Response type for health check endpoint
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Errors raised by the feature-flag engine and its backends
#[derive(Debug, thiserror::Error)]
pub enum FlagError {
    #[error("feature not found: {0}")]
    FeatureNotFound(String),
    #[error("percentage must be between 0 and 100, got {0}")]
    PercentageInvalid(i64),
    #[error("expression gates are not supported")]
    ExpressionUnsupported,
    #[error("{0} is not a known gate type")]
    UnknownGate(String),
    #[error("invalid feature JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Custom error type for API endpoints
///
/// Maps control and flag failures onto HTTP status codes with a JSON body.
#[derive(Debug)]
pub enum ApiError {
    /// Command not understood by the control endpoint
    UnknownCommand(String),
    /// Flag engine error
    Flag(FlagError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::UnknownCommand(command) => (
                StatusCode::NOT_FOUND,
                format!("Unknown command: {}", command),
            ),
            ApiError::Flag(FlagError::FeatureNotFound(name)) => (
                StatusCode::NOT_FOUND,
                format!("Feature not found: {}", name),
            ),
            ApiError::Flag(err @ FlagError::PercentageInvalid(_)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            ApiError::Flag(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Flag error: {}", err),
            ),
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status, body).into_response()
    }
}

impl From<FlagError> for ApiError {
    fn from(err: FlagError) -> Self {
        ApiError::Flag(err)
    }
}
