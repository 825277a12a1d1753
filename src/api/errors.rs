use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::ingest::Rejection;

static EXPOSE_DETAILS: AtomicBool = AtomicBool::new(false);

/// Include store/internal error messages in responses (development only).
pub fn expose_details(on: bool) {
    EXPOSE_DETAILS.store(on, Ordering::Relaxed);
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{error}: {message}")]
    Validation { error: String, message: String },

    #[error("unauthorized")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            error: error.into(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Rejection> for ApiError {
    fn from(r: Rejection) -> Self {
        let error = match r {
            Rejection::MissingFields(_) => "Missing fields",
            Rejection::InvalidType(_) => "Invalid type",
        };
        Self::validation(error, r.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(r: JsonRejection) -> Self {
        Self::validation("Invalid body", r.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation { error, message } => json!({
                "success": false,
                "error": error,
                "message": message,
            }),
            ApiError::Unauthorized => json!({
                "success": false,
                "error": "Unauthorized",
                "message": "A valid bearer token is required",
            }),
            ApiError::NotFound(message) => json!({
                "success": false,
                "error": "Not Found",
                "message": message,
            }),
            ApiError::Store(_) | ApiError::Internal(_) => {
                let error_id = Uuid::new_v4();
                tracing::error!(error_id = %error_id, error = %self, "Request failed");
                let message = if EXPOSE_DETAILS.load(Ordering::Relaxed) {
                    self.to_string()
                } else {
                    "An internal error occurred".to_owned()
                };
                json!({
                    "success": false,
                    "error": "Server error",
                    "message": message,
                    "error_id": error_id,
                })
            }
        };
        (status, Json(body)).into_response()
    }
}
