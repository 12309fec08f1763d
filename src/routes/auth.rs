// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-up, login and logout routes.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, session_ttl, SESSION_COOKIE};
use crate::models::credential::username_problem;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

/// Sign-up form.
#[derive(Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[validate(length(min = 4))]
    pub password: String,
    #[validate(must_match(other = "password"))]
    pub confirm_password: String,
}

/// Login form.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SignupResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    pub username: String,
    /// Session token, for clients that send it as a bearer header
    pub token: String,
}

/// Create an account.
async fn signup(
    State(state): State<Arc<AppState>>,
    Json(mut form): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>)> {
    form.username = form.username.trim().to_string();
    form.validate()?;
    if let Some(problem) = username_problem(&form.username) {
        return Err(AppError::BadRequest(problem.to_string()));
    }

    if !state
        .credentials
        .create_account(&form.username, &form.password)
        .await?
    {
        return Ok((
            StatusCode::CONFLICT,
            Json(SignupResponse {
                success: false,
                message: "Username already exists".to_string(),
            }),
        ));
    }

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            success: true,
            message: "Account created successfully! Please login.".to_string(),
        }),
    ))
}

/// Check credentials and start a session.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(form): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let username = form.username.trim();
    if username.is_empty() || form.password.is_empty() {
        return Err(AppError::BadRequest(
            "Please enter both username and password".to_string(),
        ));
    }

    if !state
        .credentials
        .authenticate(username, &form.password)
        .await?
    {
        tracing::info!(username, "Login rejected");
        return Err(AppError::Unauthorized);
    }

    let token = create_jwt(username, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.frontend_url.starts_with("https://"))
        .max_age(session_ttl());

    tracing::info!(username, "Login successful");
    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            username: username.to_string(),
            token,
        }),
    ))
}

/// End the session by expiring the cookie.
async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        StatusCode::NO_CONTENT,
    )
}
