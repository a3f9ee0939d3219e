//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use litehub_domain::error::LiteHubError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`LiteHubError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(LiteHubError);

impl From<LiteHubError> for ApiError {
    fn from(err: LiteHubError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            LiteHubError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            LiteHubError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            LiteHubError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
