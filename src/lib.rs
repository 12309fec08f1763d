// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Gradia: a personal daily-habit tracker.
//!
//! This crate reconciles a user directory and a daily entry log between a
//! hosted-file store (authoritative) and a local cache (backup and offline
//! fallback), and serves them over a small JSON API.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::{FileStore, LocalCache};
use services::{CredentialLedger, EntryLedger};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub credentials: CredentialLedger,
    pub entries: EntryLedger,
}

impl AppState {
    /// Wire both ledgers to the same store and cache.
    pub fn new(config: Config, store: Arc<dyn FileStore>, cache: LocalCache) -> Self {
        Self {
            credentials: CredentialLedger::new(store.clone(), cache.clone()),
            entries: EntryLedger::new(store, cache),
            config,
        }
    }
}
