//! Request boundary error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Errors surfaced by the HTTP boundary
///
/// A hard-blocked batch is not an error; it is a normal refusal response.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Body failed to parse or validate
    #[error("Invalid request body: {0}")]
    InvalidRequest(String),

    /// The generator failed or returned unusable output
    #[error("Generator error: {0}")]
    Generator(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Generator(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match &self {
            ApiError::InvalidRequest(details) => json!({
                "error": "Invalid request body.",
                "details": details,
            }),
            ApiError::Generator(message) => {
                tracing::error!("Generator failed: {}", message);
                json!({
                    "error": "Server error while generating command.",
                    "message": message,
                })
            }
        };
        (self.status(), Json(body)).into_response()
    }
}
