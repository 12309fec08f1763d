// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{http::StatusCode, response::IntoResponse};
use gradia_tracker::error::AppError;

#[test]
fn test_is_conflict_matches_only_conflict() {
    assert!(AppError::Conflict("stale sha".to_string()).is_conflict());

    assert!(!AppError::RemoteStore("HTTP 500".to_string()).is_conflict());
    assert!(!AppError::NoWriteAccess.is_conflict());
    assert!(!AppError::Validation("bad row".to_string()).is_conflict());
}

#[test]
fn test_is_remote_failure() {
    assert!(AppError::NoWriteAccess.is_remote_failure());
    assert!(AppError::Conflict("x".to_string()).is_remote_failure());
    assert!(AppError::RemoteStore("x".to_string()).is_remote_failure());
    assert!(AppError::Unauthorized.is_remote_failure());

    assert!(!AppError::LocalCache("disk full".to_string()).is_remote_failure());
    assert!(!AppError::Validation("x".to_string()).is_remote_failure());
    assert!(!AppError::BadRequest("x".to_string()).is_remote_failure());
}

#[test]
fn test_status_codes() {
    let cases = [
        (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
        (AppError::BadRequest("x".to_string()), StatusCode::BAD_REQUEST),
        (
            AppError::Validation("x".to_string()),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        (AppError::NoWriteAccess, StatusCode::FORBIDDEN),
        (AppError::Conflict("x".to_string()), StatusCode::CONFLICT),
        (AppError::RemoteStore("x".to_string()), StatusCode::BAD_GATEWAY),
        (
            AppError::LocalCache("x".to_string()),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (
            AppError::Internal(anyhow::anyhow!("boom")),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (err, status) in cases {
        let label = err.to_string();
        assert_eq!(err.into_response().status(), status, "{label}");
    }
}
