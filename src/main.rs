// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gradia API Server
//!
//! Serves the daily-habit tracker: accounts, daily entries and history,
//! persisted to a GitHub repository with a local cache as backup.

use gradia_tracker::{
    config::{Config, StoreConfig},
    db::{FileStore, GitHubStore, LocalCache},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Gradia API");

    // Open the local cache
    let cache = LocalCache::open(&config.cache_dir).await?;

    // Resolve remote store settings once, before any ledger exists
    let store_config: StoreConfig = config.store.clone().fill_from_cache(&cache).await?;
    tracing::info!(
        owner = %store_config.owner,
        collection = %store_config.collection,
        branch = %store_config.branch,
        readable = store_config.can_read(),
        writable = store_config.can_write(),
        "Remote store configured"
    );
    if !store_config.can_write() {
        tracing::warn!("No remote write access, entries will be saved locally only");
    }

    let store: Arc<dyn FileStore> = Arc::new(GitHubStore::new(store_config.clone())?);

    // Build shared state
    let state = Arc::new(AppState::new(
        Config {
            store: store_config,
            ..config.clone()
        },
        store,
        cache,
    ));

    // Build router
    let app = gradia_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gradia_tracker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
