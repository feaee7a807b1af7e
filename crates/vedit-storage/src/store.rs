//! Durable artifact store trait.

use std::path::Path;

use async_trait::async_trait;

use crate::error::StorageResult;

/// Durable byte storage behind the edit core.
///
/// Implementations hold original uploads and finished artifacts. `location`
/// values are opaque to the core; it only stores them on video records and
/// hands them back.
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Load the bytes at a location.
    ///
    /// A missing object fails with [`StorageError::NotFound`], which callers
    /// can tell apart from other failures via
    /// [`StorageError::is_not_found`].
    ///
    /// [`StorageError::NotFound`]: crate::StorageError::NotFound
    /// [`StorageError::is_not_found`]: crate::StorageError::is_not_found
    async fn load(&self, location: &str) -> StorageResult<Vec<u8>>;

    /// Commit a finished local file into durable storage under `name`,
    /// atomically from a reader's perspective, and return its location.
    /// The source file is consumed by the move.
    async fn store_file(&self, path: &Path, name: &str) -> StorageResult<String>;

    /// Delete the object at a location. Idempotent: deleting an absent
    /// object is not an error.
    async fn delete(&self, location: &str) -> StorageResult<()>;
}
