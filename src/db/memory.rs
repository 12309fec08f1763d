// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory file store for offline mode and tests.
//!
//! Enforces revision tokens the same way the hosted API does, so stale
//! writes fail with a conflict.

use crate::db::{FileStore, RemoteFile};
use crate::error::AppError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct StoredFile {
    content: String,
    revision: String,
}

/// In-memory remote store.
pub struct MemoryFileStore {
    files: Mutex<HashMap<String, StoredFile>>,
    next_revision: AtomicU64,
    writable: bool,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    failing_paths: Mutex<HashSet<String>>,
    put_count: AtomicU64,
}

impl Default for MemoryFileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFileStore {
    /// Create a writable, empty store.
    pub fn new() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            next_revision: AtomicU64::new(1),
            writable: true,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            failing_paths: Mutex::new(HashSet::new()),
            put_count: AtomicU64::new(0),
        }
    }

    /// Create a store that behaves as if no access token is configured.
    pub fn read_only() -> Self {
        Self {
            writable: false,
            ..Self::new()
        }
    }

    /// Seed a file, bypassing revision checks.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.set_file(path, content);
        self
    }

    /// Replace a file out-of-band (simulates another writer).
    pub fn set_file(&self, path: &str, content: &str) {
        let revision = self.bump_revision();
        if let Ok(mut files) = self.files.lock() {
            files.insert(
                path.to_string(),
                StoredFile {
                    content: content.to_string(),
                    revision,
                },
            );
        }
    }

    /// Make every fetch fail with a transport error.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every write fail with a conflict.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make writes to one path fail with a transport error.
    pub fn fail_writes_to(&self, path: &str) {
        if let Ok(mut paths) = self.failing_paths.lock() {
            paths.insert(path.to_string());
        }
    }

    /// Current content of a file.
    pub fn content(&self, path: &str) -> Option<String> {
        self.files
            .lock()
            .ok()
            .and_then(|files| files.get(path).map(|f| f.content.clone()))
    }

    /// Number of successful writes.
    pub fn put_count(&self) -> u64 {
        self.put_count.load(Ordering::SeqCst)
    }

    fn bump_revision(&self) -> String {
        format!("rev-{}", self.next_revision.fetch_add(1, Ordering::SeqCst))
    }

    fn lock_files(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, StoredFile>>, AppError> {
        self.files
            .lock()
            .map_err(|_| AppError::RemoteStore("Store lock poisoned".to_string()))
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn fetch_file(&self, path: &str) -> Result<Option<RemoteFile>, AppError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::RemoteStore("simulated read failure".to_string()));
        }

        Ok(self.lock_files()?.get(path).map(|f| RemoteFile {
            path: path.to_string(),
            content: f.content.clone(),
            revision: f.revision.clone(),
        }))
    }

    async fn put_file(
        &self,
        path: &str,
        content: &str,
        revision: Option<&str>,
        _message: &str,
    ) -> Result<(), AppError> {
        if !self.writable {
            return Err(AppError::NoWriteAccess);
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Conflict("simulated stale revision".to_string()));
        }
        let path_fails = self
            .failing_paths
            .lock()
            .map(|paths| paths.contains(path))
            .unwrap_or(false);
        if path_fails {
            return Err(AppError::RemoteStore(format!("simulated failure writing {}", path)));
        }

        let new_revision = self.bump_revision();
        let mut files = self.lock_files()?;
        let current = files.get(path).map(|f| f.revision.as_str());
        if current != revision {
            return Err(AppError::Conflict(format!(
                "expected revision {:?}, got {:?}",
                current, revision
            )));
        }

        files.insert(
            path.to_string(),
            StoredFile {
                content: content.to_string(),
                revision: new_revision,
            },
        );
        self.put_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn can_read(&self) -> bool {
        true
    }

    fn can_write(&self) -> bool {
        self.writable
    }
}
