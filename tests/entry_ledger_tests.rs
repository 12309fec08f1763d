// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Entry ledger against the in-memory store: migration, upsert semantics and
//! degraded persistence.

use async_trait::async_trait;
use gradia_tracker::db::{cache_keys, remote_paths, FileStore, LocalCache, MemoryFileStore, RemoteFile};
use gradia_tracker::error::AppError;
use gradia_tracker::models::entry::{CURRENT_HEADER, LEGACY_HEADER, SENTINEL_OWNER};
use gradia_tracker::models::Metrics;
use gradia_tracker::services::{EntryLedger, UpsertOutcome};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

mod common;
use common::entry_ledger;

#[tokio::test]
async fn test_legacy_log_migrates_on_first_write() {
    let store = Arc::new(MemoryFileStore::new().with_file(
        remote_paths::ENTRIES_CSV,
        "Date,Sleep,Food,Exercise,Feeling\n2024-01-01,5,5,5,5",
    ));
    let (ledger, cache) = entry_ledger(store.clone());

    let outcome = ledger
        .upsert("2024-01-02", "alice", &Metrics::new(6, 7, 8, 9))
        .await
        .unwrap();
    assert_eq!(outcome, UpsertOutcome::Done);

    let expected = "Date,Username,Sleep,Food,Exercise,Feeling\n\
                    2024-01-01,unknown,5,5,5,5\n\
                    2024-01-02,alice,6,7,8,9\n";
    assert_eq!(store.content(remote_paths::ENTRIES_CSV).unwrap(), expected);
    assert_eq!(
        cache.read(cache_keys::ENTRIES).await.unwrap().unwrap(),
        expected
    );

    let alice = ledger.list_owner_entries("alice").await.unwrap();
    assert_eq!(alice.len(), 1);
    assert_eq!(alice[0].metrics, Metrics::new(6, 7, 8, 9));

    let legacy = ledger.list_owner_entries(SENTINEL_OWNER).await.unwrap();
    assert_eq!(legacy.len(), 1);
    assert_eq!(legacy[0].date, "2024-01-01");
}

#[tokio::test]
async fn test_resubmission_replaces_in_place() {
    let store = Arc::new(MemoryFileStore::new());
    let (ledger, _) = entry_ledger(store.clone());

    for (date, owner, score) in [
        ("2024-01-01", "alice", 1),
        ("2024-01-01", "bob", 2),
        ("2024-01-02", "alice", 3),
    ] {
        let metrics = Metrics::new(score, score, score, score);
        ledger.upsert(date, owner, &metrics).await.unwrap();
    }

    ledger
        .upsert("2024-01-01", "alice", &Metrics::new(9, 8, 7, 6))
        .await
        .unwrap();

    assert_eq!(
        store.content(remote_paths::ENTRIES_CSV).unwrap(),
        "Date,Username,Sleep,Food,Exercise,Feeling\n\
         2024-01-01,alice,9,8,7,6\n\
         2024-01-01,bob,2,2,2,2\n\
         2024-01-02,alice,3,3,3,3\n"
    );

    let alice = ledger.list_owner_entries("alice").await.unwrap();
    let dates: Vec<&str> = alice.iter().map(|e| e.date.as_str()).collect();
    assert_eq!(dates, vec!["2024-01-02", "2024-01-01"]);
    assert_eq!(alice[1].metrics, Metrics::new(9, 8, 7, 6));
}

#[tokio::test]
async fn test_rejected_remote_write_degrades_to_local() {
    let store = Arc::new(MemoryFileStore::new());
    store.set_fail_writes(true);
    let (ledger, cache) = entry_ledger(store.clone());

    let outcome = ledger
        .upsert("2024-05-01", "alice", &Metrics::new(4, 4, 4, 4))
        .await
        .unwrap();
    assert!(matches!(outcome, UpsertOutcome::DegradedLocalOnly { .. }));

    assert!(store.content(remote_paths::ENTRIES_CSV).is_none());
    let cached = cache.read(cache_keys::ENTRIES).await.unwrap().unwrap();
    assert!(cached.contains("2024-05-01,alice,4,4,4,4\n"));

    // Remote is still empty, so reads come from the cache
    let entries = ledger.list_owner_entries("alice").await.unwrap();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn test_read_only_store_never_writes_remote() {
    let store = Arc::new(
        MemoryFileStore::read_only().with_file(
            remote_paths::ENTRIES_CSV,
            &format!("{}\n2024-01-01,bob,1,1,1,1\n", CURRENT_HEADER),
        ),
    );
    let (ledger, cache) = entry_ledger(store.clone());

    let outcome = ledger
        .upsert("2024-01-02", "alice", &Metrics::new(2, 2, 2, 2))
        .await
        .unwrap();
    match outcome {
        UpsertOutcome::DegradedLocalOnly { reason } => {
            assert!(reason.contains("write access"), "{reason}")
        }
        other => panic!("expected degraded outcome, got {:?}", other),
    }

    assert_eq!(store.put_count(), 0);
    assert_eq!(
        store.content(remote_paths::ENTRIES_CSV).unwrap(),
        format!("{}\n2024-01-01,bob,1,1,1,1\n", CURRENT_HEADER)
    );

    // Local copy holds both the remote row and the new one
    let cached = cache.read(cache_keys::ENTRIES).await.unwrap().unwrap();
    assert!(cached.contains("2024-01-01,bob,1,1,1,1\n"));
    assert!(cached.contains("2024-01-02,alice,2,2,2,2\n"));
}

#[tokio::test]
async fn test_unreadable_existing_remote_surfaces_as_degraded() {
    let store = Arc::new(MemoryFileStore::new());
    let (ledger, cache) = entry_ledger(store.clone());
    ledger
        .upsert("2024-01-01", "alice", &Metrics::new(1, 1, 1, 1))
        .await
        .unwrap();

    // Remote unreachable for reads but present: the write has no revision
    store.set_fail_reads(true);
    let outcome = ledger
        .upsert("2024-01-02", "alice", &Metrics::new(2, 2, 2, 2))
        .await
        .unwrap();
    assert!(matches!(outcome, UpsertOutcome::DegradedLocalOnly { .. }));

    assert_eq!(store.put_count(), 1);
    let cached = cache.read(cache_keys::ENTRIES).await.unwrap().unwrap();
    assert!(cached.contains("2024-01-01,alice,1,1,1,1\n"));
    assert!(cached.contains("2024-01-02,alice,2,2,2,2\n"));
}

#[tokio::test]
async fn test_load_refreshes_cache_from_remote() {
    let store = Arc::new(MemoryFileStore::new());
    let (ledger, cache) = entry_ledger(store.clone());
    cache
        .write(cache_keys::ENTRIES, &format!("{}\n", CURRENT_HEADER))
        .await
        .unwrap();

    let remote = format!("{}\n2024-02-02,carol,3,4,5,6\n", CURRENT_HEADER);
    store.set_file(remote_paths::ENTRIES_CSV, &remote);

    assert_eq!(ledger.load().await.unwrap(), remote);
    assert_eq!(cache.read(cache_keys::ENTRIES).await.unwrap().unwrap(), remote);
}

#[tokio::test]
async fn test_local_legacy_data_seeds_missing_remote() {
    let store = Arc::new(MemoryFileStore::new());
    let (ledger, cache) = entry_ledger(store.clone());
    cache
        .write(
            cache_keys::ENTRIES,
            &format!("{}\n2023-12-31,7,7,7,7\n", LEGACY_HEADER),
        )
        .await
        .unwrap();

    let outcome = ledger
        .upsert("2024-01-01", "alice", &Metrics::new(8, 8, 8, 8))
        .await
        .unwrap();
    assert_eq!(outcome, UpsertOutcome::Done);

    assert_eq!(
        store.content(remote_paths::ENTRIES_CSV).unwrap(),
        "Date,Username,Sleep,Food,Exercise,Feeling\n\
         2023-12-31,unknown,7,7,7,7\n\
         2024-01-01,alice,8,8,8,8\n"
    );
}

#[tokio::test]
async fn test_owners_do_not_see_each_other() {
    let store = Arc::new(MemoryFileStore::new());
    let (ledger, _) = entry_ledger(store);

    ledger
        .upsert("2024-03-01", "alice", &Metrics::new(5, 5, 5, 5))
        .await
        .unwrap();
    ledger
        .upsert("2024-03-01", "bob", &Metrics::new(6, 6, 6, 6))
        .await
        .unwrap();

    let bob = ledger.list_owner_entries("bob").await.unwrap();
    assert_eq!(bob.len(), 1);
    assert_eq!(bob[0].owner, "bob");
    assert!(ledger.list_owner_entries("carol").await.unwrap().is_empty());
}

/// Lets another writer replace the entry log right after the first fetch.
struct RacingStore {
    inner: Arc<MemoryFileStore>,
    other_writer: String,
    raced: AtomicBool,
}

#[async_trait]
impl FileStore for RacingStore {
    async fn fetch_file(&self, path: &str) -> Result<Option<RemoteFile>, AppError> {
        let file = self.inner.fetch_file(path).await?;
        if path == remote_paths::ENTRIES_CSV && !self.raced.swap(true, Ordering::SeqCst) {
            self.inner.set_file(path, &self.other_writer);
        }
        Ok(file)
    }

    async fn put_file(
        &self,
        path: &str,
        content: &str,
        revision: Option<&str>,
        message: &str,
    ) -> Result<(), AppError> {
        self.inner.put_file(path, content, revision, message).await
    }

    fn can_read(&self) -> bool {
        self.inner.can_read()
    }

    fn can_write(&self) -> bool {
        self.inner.can_write()
    }
}

#[tokio::test]
async fn test_stale_revision_surfaces_as_degraded() {
    let original = format!("{}\n2024-01-01,alice,1,1,1,1\n", CURRENT_HEADER);
    let other_writer = format!("{}\n2024-01-01,bob,3,3,3,3\n", CURRENT_HEADER);
    let inner = Arc::new(MemoryFileStore::new().with_file(remote_paths::ENTRIES_CSV, &original));
    let store = Arc::new(RacingStore {
        inner: inner.clone(),
        other_writer: other_writer.clone(),
        raced: AtomicBool::new(false),
    });
    let cache = LocalCache::new_mock();
    let ledger = EntryLedger::new(store, cache.clone());

    let outcome = ledger
        .upsert("2024-01-02", "alice", &Metrics::new(2, 2, 2, 2))
        .await
        .unwrap();
    match outcome {
        UpsertOutcome::DegradedLocalOnly { reason } => {
            assert!(reason.contains("conflict"), "{reason}")
        }
        other => panic!("expected degraded outcome, got {:?}", other),
    }

    // The other writer's version is untouched
    assert_eq!(inner.content(remote_paths::ENTRIES_CSV).unwrap(), other_writer);
    assert_eq!(inner.put_count(), 0);

    // The cache kept the merged log from the first fetch
    let cached = cache.read(cache_keys::ENTRIES).await.unwrap().unwrap();
    assert!(cached.contains("2024-01-01,alice,1,1,1,1\n"));
    assert!(cached.contains("2024-01-02,alice,2,2,2,2\n"));
}

#[tokio::test]
async fn test_resubmission_replaces_unpadded_existing_date() {
    let store = Arc::new(MemoryFileStore::new().with_file(
        remote_paths::ENTRIES_CSV,
        &format!("{}\n2024-3-7,alice,1,1,1,1\n", CURRENT_HEADER),
    ));
    let (ledger, _) = entry_ledger(store.clone());

    ledger
        .upsert("2024-3-7", "alice", &Metrics::new(9, 9, 9, 9))
        .await
        .unwrap();

    assert_eq!(
        store.content(remote_paths::ENTRIES_CSV).unwrap(),
        format!("{}\n2024-03-07,alice,9,9,9,9\n", CURRENT_HEADER)
    );
    assert_eq!(ledger.list_owner_entries("alice").await.unwrap().len(), 1);
}
