// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use gradia_tracker::config::Config;
use gradia_tracker::db::{LocalCache, MemoryFileStore};
use gradia_tracker::middleware::auth::create_jwt;
use gradia_tracker::routes::create_router;
use gradia_tracker::services::{CredentialLedger, EntryLedger};
use gradia_tracker::AppState;
use std::sync::Arc;

/// Test app over a writable in-memory store and an in-memory cache.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let (app, state, _) = create_test_app_with_store(Arc::new(MemoryFileStore::new()));
    (app, state)
}

/// Test app over the given store. Also returns the cache for inspection.
#[allow(dead_code)]
pub fn create_test_app_with_store(
    store: Arc<MemoryFileStore>,
) -> (axum::Router, Arc<AppState>, LocalCache) {
    let cache = LocalCache::new_mock();
    let state = Arc::new(AppState::new(Config::test_default(), store, cache.clone()));
    (create_router(state.clone()), state, cache)
}

/// Session token for `username` signed with `signing_key`.
#[allow(dead_code)]
pub fn create_test_jwt(username: &str, signing_key: &[u8]) -> String {
    create_jwt(username, signing_key).expect("JWT creation failed")
}

#[allow(dead_code)]
pub fn credential_ledger(store: Arc<MemoryFileStore>) -> (CredentialLedger, LocalCache) {
    let cache = LocalCache::new_mock();
    (CredentialLedger::new(store, cache.clone()), cache)
}

#[allow(dead_code)]
pub fn entry_ledger(store: Arc<MemoryFileStore>) -> (EntryLedger, LocalCache) {
    let cache = LocalCache::new_mock();
    (EntryLedger::new(store, cache.clone()), cache)
}
