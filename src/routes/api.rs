// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for logged-in users.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{EntryRecord, Metrics};
use crate::services::UpsertOutcome;
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require a session).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/entries", get(list_entries).put(upsert_entry))
        .route("/api/stats", get(get_stats))
        .route("/api/users/export", post(export_users))
}

// ─── User Profile ────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub username: String,
}

async fn get_me(Extension(user): Extension<AuthUser>) -> Json<UserResponse> {
    Json(UserResponse {
        username: user.username,
    })
}

// ─── Entries ─────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HistoryResponse {
    /// Newest first
    pub entries: Vec<EntryRecord>,
    pub count: usize,
}

/// History for the logged-in user.
async fn list_entries(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<HistoryResponse>> {
    let entries = state.entries.list_owner_entries(&user.username).await?;
    Ok(Json(HistoryResponse {
        count: entries.len(),
        entries,
    }))
}

/// Tracker form submission.
#[derive(Deserialize, Validate)]
pub struct UpsertEntryRequest {
    /// `YYYY-MM-DD`; defaults to today (UTC)
    #[serde(default)]
    pub date: Option<String>,
    #[serde(flatten)]
    #[validate(nested)]
    pub metrics: Metrics,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UpsertEntryResponse {
    /// `"synced"` or `"local_only"`
    pub status: String,
    pub date: String,
    pub message: String,
}

/// Record (or overwrite) the logged-in user's entry for a date.
async fn upsert_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(form): Json<UpsertEntryRequest>,
) -> Result<Json<UpsertEntryResponse>> {
    form.validate()?;
    let date = form
        .date
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%d").to_string());

    tracing::debug!(username = %user.username, date = %date, "Saving entry");

    let outcome = state
        .entries
        .upsert(&date, &user.username, &form.metrics)
        .await?;

    let response = match outcome {
        UpsertOutcome::Done => UpsertEntryResponse {
            status: "synced".to_string(),
            message: format!("Entry for {} saved successfully!", date),
            date,
        },
        UpsertOutcome::DegradedLocalOnly { reason } => UpsertEntryResponse {
            status: "local_only".to_string(),
            message: format!("Entry for {} saved locally only: {}", date, reason),
            date,
        },
    };

    Ok(Json(response))
}

// ─── Stats ───────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StatsResponse {
    pub user_entries: usize,
    pub total_users: usize,
}

async fn get_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<StatsResponse>> {
    let entries = state.entries.list_owner_entries(&user.username).await?;
    let total_users = state.credentials.count_users().await?;

    Ok(Json(StatsResponse {
        user_entries: entries.len(),
        total_users,
    }))
}

// ─── User Export ─────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ExportResponse {
    pub exported: usize,
}

/// Regenerate the remote tabular user export.
async fn export_users(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ExportResponse>> {
    tracing::info!(username = %user.username, "User export requested");
    let exported = state.credentials.sync_tabular_export().await?;
    Ok(Json(ExportResponse { exported }))
}
