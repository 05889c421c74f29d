use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use vic_sync::SyncError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("retrieval failed: {0}")]
    Sync(#[from] SyncError),

    #[error("platform error: {0}")]
    Platform(#[from] vic_platform::Error),

    #[error("invalid query: {0}")]
    Query(#[from] vic_api::QueryError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) | ApiError::Query(_) => StatusCode::BAD_REQUEST,
            ApiError::Sync(SyncError::EmptyOrUnauthorized(_)) => StatusCode::UNAUTHORIZED,
            ApiError::Sync(_) => StatusCode::BAD_GATEWAY,
            ApiError::Platform(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
