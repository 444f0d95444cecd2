//! Error types.
//!
//! [`AppError`] covers failures of the collaborators the site talks to (the
//! article store and the embedding providers). [`ApiError`] is what JSON
//! endpoints return; each variant maps to one status code and renders as
//! `{"error": "message"}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("embedding provider '{0}' is not available")]
    ProviderUnavailable(String),

    #[error("could not decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },
}

impl AppError {
    pub fn decode(what: &'static str, reason: impl ToString) -> Self {
        AppError::Decode {
            what,
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Internal(String),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        tracing::error!(error = %err, "content request failed");
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
