// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local key-value cache on the client device.
//!
//! Backup and offline fallback for both ledgers. No transactions, no expiry;
//! the last write to a key wins.

use crate::error::AppError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
enum Backend {
    /// One file per key inside a directory.
    Dir(PathBuf),
    /// Process-local map (offline mode / tests).
    Memory(Arc<Mutex<HashMap<String, String>>>),
}

/// Local cache store.
#[derive(Clone)]
pub struct LocalCache {
    backend: Backend,
}

impl LocalCache {
    /// Open a directory-backed cache, creating the directory if needed.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, AppError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::LocalCache(format!("Failed to create {}: {}", dir.display(), e))
        })?;

        tracing::info!(dir = %dir.display(), "Local cache opened");
        Ok(Self {
            backend: Backend::Dir(dir),
        })
    }

    /// Create an in-memory cache for testing (offline mode).
    pub fn new_mock() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(Mutex::new(HashMap::new()))),
        }
    }

    fn key_path(dir: &Path, key: &str) -> Result<PathBuf, AppError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(AppError::LocalCache(format!("Invalid cache key: {:?}", key)));
        }
        Ok(dir.join(key))
    }

    /// Read a key. `Ok(None)` when absent.
    pub async fn read(&self, key: &str) -> Result<Option<String>, AppError> {
        match &self.backend {
            Backend::Dir(dir) => {
                let path = Self::key_path(dir, key)?;
                match tokio::fs::read_to_string(&path).await {
                    Ok(text) => Ok(Some(text)),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                    Err(e) => Err(AppError::LocalCache(format!("Failed to read {}: {}", key, e))),
                }
            }
            Backend::Memory(map) => {
                let map = map
                    .lock()
                    .map_err(|_| AppError::LocalCache("Cache lock poisoned".to_string()))?;
                Ok(map.get(key).cloned())
            }
        }
    }

    /// Write a key, replacing any previous value.
    pub async fn write(&self, key: &str, text: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Dir(dir) => {
                let path = Self::key_path(dir, key)?;
                // Write-then-rename so a crash never leaves a torn value
                let tmp = path.with_extension("tmp");
                tokio::fs::write(&tmp, text)
                    .await
                    .map_err(|e| AppError::LocalCache(format!("Failed to write {}: {}", key, e)))?;
                tokio::fs::rename(&tmp, &path)
                    .await
                    .map_err(|e| AppError::LocalCache(format!("Failed to write {}: {}", key, e)))?;
            }
            Backend::Memory(map) => {
                let mut map = map
                    .lock()
                    .map_err(|_| AppError::LocalCache("Cache lock poisoned".to_string()))?;
                map.insert(key.to_string(), text.to_string());
            }
        }
        tracing::debug!(key, bytes = text.len(), "Local cache written");
        Ok(())
    }
}
