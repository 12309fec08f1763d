// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! The remote store settings are resolved once at startup and handed to the
//! ledgers as a [`StoreConfig`] value; nothing reads them ad hoc afterwards.

use crate::db::{cache_keys, LocalCache};
use crate::error::AppError;
use std::env;
use std::path::PathBuf;

/// Default hosted-file API endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// Default branch written to.
pub const DEFAULT_BRANCH: &str = "main";

/// Which remote collection to read/write and with what credential.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Account that owns the collection
    pub owner: String,
    /// Collection (repository) name
    pub collection: String,
    /// Bearer credential; `None` means read-only
    pub access_token: Option<String>,
    /// Branch files are read from and committed to
    pub branch: String,
    /// API endpoint (overridable for tests)
    pub api_base_url: String,
}

impl StoreConfig {
    /// A store that only ever uses the local cache.
    pub fn local_only() -> Self {
        Self {
            branch: DEFAULT_BRANCH.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            ..Default::default()
        }
    }

    /// Read store settings from `GITHUB_*` environment variables.
    pub fn from_env() -> Self {
        let non_empty = |name: &str| {
            env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            owner: non_empty("GITHUB_OWNER").unwrap_or_default(),
            collection: non_empty("GITHUB_REPO").unwrap_or_default(),
            access_token: non_empty("GITHUB_TOKEN"),
            branch: non_empty("GITHUB_BRANCH").unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            api_base_url: non_empty("GITHUB_API_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        }
    }

    /// Fill any unset owner/collection/token from the settings keys an
    /// earlier client left in the local cache.
    pub async fn fill_from_cache(mut self, cache: &LocalCache) -> Result<Self, AppError> {
        if self.owner.is_empty() {
            if let Some(owner) = cache.read(cache_keys::STORE_OWNER).await? {
                self.owner = owner.trim().to_string();
            }
        }
        if self.collection.is_empty() {
            if let Some(collection) = cache.read(cache_keys::STORE_COLLECTION).await? {
                self.collection = collection.trim().to_string();
            }
        }
        if self.access_token.is_none() {
            self.access_token = cache
                .read(cache_keys::STORE_TOKEN)
                .await?
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty());
        }
        Ok(self)
    }

    /// Owner and collection are known, so reads can be attempted.
    pub fn can_read(&self) -> bool {
        !self.owner.is_empty() && !self.collection.is_empty()
    }

    /// Reads are possible and a credential is present.
    pub fn can_write(&self) -> bool {
        self.can_read() && self.access_token.is_some()
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Directory backing the local cache
    pub cache_dir: PathBuf,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Remote store settings
    pub store: StoreConfig,
}

impl Config {
    /// Config for tests: local-only store, fixed signing key.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            cache_dir: PathBuf::from(".gradia-cache"),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            store: StoreConfig::local_only(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            cache_dir: env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".gradia-cache")),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            store: StoreConfig::from_env(),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
