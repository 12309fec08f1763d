// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential ledger: username → password digest.
//!
//! Consistency policy:
//! - The remote copy is authoritative per key; local-only keys are kept.
//! - The local cache is always written and is the backup of last resort.
//! - The structured map and the tabular export are written as two
//!   independent side effects. One succeeding while the other fails is an
//!   accepted, observable state (see [`SaveReport`]).

use crate::db::{cache_keys, remote_paths, FileStore, LocalCache};
use crate::error::{AppError, Result};
use crate::models::credential::{self, CredentialMap, CredentialRecord};
use crate::services::digest::{digest, digests_match};
use crate::time_utils::now_rfc3339;
use std::sync::Arc;

/// Outcome of one remote write inside [`CredentialLedger::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteWrite {
    Written,
    /// No write access; nothing was attempted.
    Skipped,
    Failed(String),
}

/// Per-target result of a save. The local cache write has already succeeded
/// whenever a report is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub structured: RemoteWrite,
    pub tabular: RemoteWrite,
}

/// Owner of the username → credential mapping.
#[derive(Clone)]
pub struct CredentialLedger {
    store: Arc<dyn FileStore>,
    cache: LocalCache,
}

impl CredentialLedger {
    pub fn new(store: Arc<dyn FileStore>, cache: LocalCache) -> Self {
        Self { store, cache }
    }

    /// Load the merged credential map.
    ///
    /// Tries the remote structured file, then the remote tabular export. A
    /// non-empty remote result is overlaid on the local copy and the merge is
    /// written back to the cache. Otherwise the local copy is returned.
    pub async fn load(&self) -> Result<CredentialMap> {
        let local = self.read_local().await?;

        let Some(remote) = self.fetch_remote().await else {
            return Ok(local);
        };

        let merged = credential::merge(local, remote);
        let json = credential::to_structured(&merged)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode users: {}", e)))?;
        self.cache.write(cache_keys::USERS, &json).await?;

        Ok(merged)
    }

    async fn read_local(&self) -> Result<CredentialMap> {
        let Some(text) = self.cache.read(cache_keys::USERS).await? else {
            return Ok(CredentialMap::new());
        };

        Ok(credential::parse_structured(&text).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Cached user map is corrupt, ignoring it");
            CredentialMap::new()
        }))
    }

    /// First non-empty remote representation, if any.
    async fn fetch_remote(&self) -> Option<CredentialMap> {
        if !self.store.can_read() {
            return None;
        }

        match self.store.fetch_file(remote_paths::USERS_JSON).await {
            Ok(Some(file)) => match credential::parse_structured(&file.content) {
                Ok(map) if !map.is_empty() => return Some(map),
                Ok(_) => tracing::debug!("Remote user map is empty"),
                Err(e) => tracing::warn!(error = %e, "Remote user map is not valid JSON"),
            },
            Ok(None) => tracing::debug!("Remote user map not found"),
            Err(e) => tracing::warn!(error = %e, "Failed to fetch remote user map"),
        }

        match self.store.fetch_file(remote_paths::USERS_CSV).await {
            Ok(Some(file)) => {
                let map = credential::parse_tabular(&file.content);
                if !map.is_empty() {
                    tracing::info!(users = map.len(), "Loaded users from tabular export");
                    return Some(map);
                }
            }
            Ok(None) => tracing::debug!("Remote user export not found"),
            Err(e) => tracing::warn!(error = %e, "Failed to fetch remote user export"),
        }

        None
    }

    /// Whether `password` matches the stored digest for `username`.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<bool> {
        let users = self.load().await?;
        let candidate = digest(password);

        Ok(users
            .get(username)
            .is_some_and(|record| digests_match(&record.password_digest, &candidate)))
    }

    /// Create an account. Returns `false` if the username is taken.
    pub async fn create_account(&self, username: &str, password: &str) -> Result<bool> {
        if let Some(problem) = credential::username_problem(username) {
            return Err(AppError::Validation(problem.to_string()));
        }

        let mut users = self.load().await?;
        if users.contains_key(username) {
            tracing::info!(username, "Sign-up rejected, username already exists");
            return Ok(false);
        }

        users.insert(
            username.to_string(),
            CredentialRecord {
                password_digest: digest(password),
                created_at: now_rfc3339(),
            },
        );

        let report = self.save(&users).await?;
        tracing::info!(username, report = ?report, "Account created");
        Ok(true)
    }

    /// Number of known accounts.
    pub async fn count_users(&self) -> Result<usize> {
        Ok(self.load().await?.len())
    }

    /// Persist the full map.
    ///
    /// The local cache write is the only fatal step. With write access, the
    /// structured file and the tabular export are then each attempted
    /// regardless of how the other went.
    pub async fn save(&self, users: &CredentialMap) -> Result<SaveReport> {
        let json = credential::to_structured(users)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode users: {}", e)))?;
        self.cache.write(cache_keys::USERS, &json).await?;

        if !self.store.can_write() {
            return Ok(SaveReport {
                structured: RemoteWrite::Skipped,
                tabular: RemoteWrite::Skipped,
            });
        }

        let structured = self
            .write_remote(remote_paths::USERS_JSON, &json, "Update users list")
            .await;

        let csv = credential::to_tabular(users, &now_rfc3339());
        let tabular = self
            .write_remote(
                remote_paths::USERS_CSV,
                &csv,
                &format!("Sync users to CSV - {}", now_rfc3339()),
            )
            .await;

        Ok(SaveReport {
            structured,
            tabular,
        })
    }

    /// Regenerate and upload the tabular export on demand.
    ///
    /// Returns the number of rows written.
    pub async fn sync_tabular_export(&self) -> Result<usize> {
        if !self.store.can_write() {
            return Err(AppError::NoWriteAccess);
        }

        let users = self.load().await?;
        if users.is_empty() {
            return Err(AppError::NotFound("No users found to sync".to_string()));
        }

        let csv = credential::to_tabular(&users, &now_rfc3339());
        match self
            .write_remote(
                remote_paths::USERS_CSV,
                &csv,
                &format!("Sync users to CSV - {}", now_rfc3339()),
            )
            .await
        {
            RemoteWrite::Written => Ok(users.len()),
            RemoteWrite::Skipped => Err(AppError::NoWriteAccess),
            RemoteWrite::Failed(reason) => Err(AppError::RemoteStore(reason)),
        }
    }

    /// Fetch the current revision, then overwrite (or create) `path`.
    async fn write_remote(&self, path: &str, content: &str, message: &str) -> RemoteWrite {
        let revision = match self.store.fetch_file(path).await {
            Ok(file) => file.map(|f| f.revision),
            Err(e) => {
                tracing::debug!(path, error = %e, "Revision lookup failed, writing as new file");
                None
            }
        };

        match self
            .store
            .put_file(path, content, revision.as_deref(), message)
            .await
        {
            Ok(()) => RemoteWrite::Written,
            Err(AppError::NoWriteAccess) => RemoteWrite::Skipped,
            Err(e) => {
                tracing::warn!(path, error = %e, "Remote write failed, local copy kept");
                RemoteWrite::Failed(e.to_string())
            }
        }
    }
}
