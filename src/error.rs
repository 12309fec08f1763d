// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Constructed data failed a consistency check before anything was written.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The store has no access token, so remote writes are not possible.
    #[error("No write access to remote store")]
    NoWriteAccess,

    /// The remote rejected a write because the revision token was stale.
    #[error("Remote write conflict: {0}")]
    Conflict(String),

    #[error("Remote store error: {0}")]
    RemoteStore(String),

    #[error("Local cache error: {0}")]
    LocalCache(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether this is a stale-revision rejection from the remote store.
    pub fn is_conflict(&self) -> bool {
        matches!(self, AppError::Conflict(_))
    }

    /// Whether the failure came from the remote side only, meaning the local
    /// path is still usable.
    pub fn is_remote_failure(&self) -> bool {
        matches!(
            self,
            AppError::NoWriteAccess
                | AppError::Conflict(_)
                | AppError::RemoteStore(_)
                | AppError::Unauthorized
                | AppError::NotFound(_)
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::BadRequest(errors.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_failed",
                Some(msg.clone()),
            ),
            AppError::NoWriteAccess => (StatusCode::FORBIDDEN, "no_write_access", None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", Some(msg.clone())),
            AppError::RemoteStore(msg) => {
                (StatusCode::BAD_GATEWAY, "remote_store_error", Some(msg.clone()))
            }
            AppError::LocalCache(msg) => {
                tracing::error!(error = %msg, "Local cache error");
                (StatusCode::INTERNAL_SERVER_ERROR, "local_cache_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
