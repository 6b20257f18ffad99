//! Gateway error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use post_store::StoreError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors a request handler can end with.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The submission is missing required fields or is not valid JSON.
    #[error("{0}")]
    Validation(String),

    /// No post with the requested id.
    #[error("Post not found")]
    NotFound,

    /// Post store failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid gateway settings, raised while building the router.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using ServerError.
pub type ServerResult<T> = Result<T, ServerError>;

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::Store(e) => {
                error!(error = %e, "Post store request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ServerError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
