// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Entry ledger: (date, owner) → daily metrics, stored as a tabular log.
//!
//! An upsert moves through these phases:
//! 1. Loading: remote log if reachable, else the cached copy
//! 2. Migrating: legacy rows rewritten to the current schema
//! 3. Merging: replace the (date, owner) row in place, or append
//! 4. Validating: the new row must have the current field count
//! 5. Persisting: cache first (fatal on failure), then remote
//!
//! A remote-side write failure leaves the cached copy in place and yields
//! [`UpsertOutcome::DegradedLocalOnly`]. Any other failure is returned as an
//! error.
//!
//! There is no lock around read-merge-write. Two concurrent upserts against
//! the same remote file race; the loser's stale revision surfaces as a
//! degraded outcome rather than being retried.

use crate::db::{cache_keys, remote_paths, FileStore, LocalCache};
use crate::error::{AppError, Result};
use crate::models::entry::{self, EntryRecord, Metrics, CURRENT_HEADER};
use crate::time_utils::parse_calendar_date;
use std::sync::Arc;
use validator::Validate;

/// Terminal state of a successful upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// Written to the cache and the remote store.
    Done,
    /// Written to the cache only; remote sync is deferred.
    DegradedLocalOnly { reason: String },
}

/// Log text plus the revision it was read at (`None` if not from remote).
struct LoadedLog {
    text: String,
    revision: Option<String>,
}

/// Owner of the tabular entry log.
#[derive(Clone)]
pub struct EntryLedger {
    store: Arc<dyn FileStore>,
    cache: LocalCache,
}

impl EntryLedger {
    pub fn new(store: Arc<dyn FileStore>, cache: LocalCache) -> Self {
        Self { store, cache }
    }

    /// Current log text. Remote content, when available, replaces the cache.
    pub async fn load(&self) -> Result<String> {
        Ok(self.load_with_revision().await?.text)
    }

    async fn load_with_revision(&self) -> Result<LoadedLog> {
        if self.store.can_read() {
            match self.store.fetch_file(remote_paths::ENTRIES_CSV).await {
                Ok(Some(file)) => {
                    self.cache.write(cache_keys::ENTRIES, &file.content).await?;
                    return Ok(LoadedLog {
                        text: file.content,
                        revision: Some(file.revision),
                    });
                }
                Ok(None) => tracing::debug!("Remote entry log not found, using cache"),
                Err(e) => tracing::warn!(error = %e, "Failed to fetch entry log, using cache"),
            }
        }

        let text = self
            .cache
            .read(cache_keys::ENTRIES)
            .await?
            .unwrap_or_else(|| format!("{}\n", CURRENT_HEADER));

        Ok(LoadedLog {
            text,
            revision: None,
        })
    }

    /// Entries for `owner`, newest first.
    pub async fn list_owner_entries(&self, owner: &str) -> Result<Vec<EntryRecord>> {
        let text = self.load().await?;
        Ok(entry::parse_owner_entries(&text, owner))
    }

    /// Insert or overwrite the entry for (date, owner).
    pub async fn upsert(
        &self,
        date: &str,
        owner: &str,
        metrics: &Metrics,
    ) -> Result<UpsertOutcome> {
        if owner.trim().is_empty() {
            return Err(AppError::Validation("owner must not be empty".to_string()));
        }
        let date = parse_calendar_date(date)
            .ok_or_else(|| AppError::Validation(format!("invalid date {:?}", date)))?
            .format("%Y-%m-%d")
            .to_string();
        metrics
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        tracing::debug!(owner, date = %date, "Loading entry log");
        let loaded = self.load_with_revision().await?;

        tracing::debug!(owner, date = %date, "Migrating and merging entry log");
        let updated = entry::upsert_row(&loaded.text, &date, owner, metrics)?;

        self.cache.write(cache_keys::ENTRIES, &updated).await?;

        if !self.store.can_write() {
            tracing::info!(owner, date = %date, "Entry saved locally, no remote write access");
            return Ok(UpsertOutcome::DegradedLocalOnly {
                reason: AppError::NoWriteAccess.to_string(),
            });
        }

        let message = format!("Update daily routine tracker - {}", date);
        match self
            .store
            .put_file(
                remote_paths::ENTRIES_CSV,
                &updated,
                loaded.revision.as_deref(),
                &message,
            )
            .await
        {
            Ok(()) => {
                tracing::info!(owner, date = %date, "Entry saved");
                Ok(UpsertOutcome::Done)
            }
            Err(e) if e.is_remote_failure() => {
                tracing::warn!(
                    owner,
                    date = %date,
                    error = %e,
                    "Remote write failed, entry kept in local cache"
                );
                Ok(UpsertOutcome::DegradedLocalOnly {
                    reason: e.to_string(),
                })
            }
            Err(e) => {
                tracing::error!(owner, date = %date, error = %e, "Entry save failed");
                Err(e)
            }
        }
    }
}
