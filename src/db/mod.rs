//! Storage layer: the hosted-file store and the local cache.

pub mod github;
pub mod local;
pub mod memory;

pub use github::GitHubStore;
pub use local::LocalCache;
pub use memory::MemoryFileStore;

use crate::error::AppError;
use async_trait::async_trait;

/// Local cache keys as constants.
pub mod cache_keys {
    /// Structured user map (JSON)
    pub const USERS: &str = "gradia_users";
    /// Entry log (CSV)
    pub const ENTRIES: &str = "gradia_data";
    pub const STORE_OWNER: &str = "github_username";
    pub const STORE_COLLECTION: &str = "github_repo";
    pub const STORE_TOKEN: &str = "github_token";
}

/// File paths inside the remote collection.
pub mod remote_paths {
    pub const USERS_JSON: &str = "gradia_users.json";
    pub const USERS_CSV: &str = "users.csv";
    pub const ENTRIES_CSV: &str = "gradia_data.csv";
}

/// A file fetched from the remote store.
///
/// Fetched immediately before a write and discarded after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    /// Decoded text content
    pub content: String,
    /// Opaque token required to overwrite this version
    pub revision: String,
}

/// A hosted-file store keyed by path.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Fetch a file. `Ok(None)` when the path does not exist.
    async fn fetch_file(&self, path: &str) -> Result<Option<RemoteFile>, AppError>;

    /// Create (`revision == None`) or overwrite a file.
    ///
    /// A stale revision fails with [`AppError::Conflict`]; there is no retry.
    async fn put_file(
        &self,
        path: &str,
        content: &str,
        revision: Option<&str>,
        message: &str,
    ) -> Result<(), AppError>;

    /// Whether reads can be attempted at all.
    fn can_read(&self) -> bool;

    /// Whether writes can be attempted at all.
    fn can_write(&self) -> bool;
}
