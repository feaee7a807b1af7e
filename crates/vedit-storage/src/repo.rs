//! Video metadata repository.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use vedit_models::{VideoId, VideoRecord};

/// Result type for repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from the metadata repository.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("repository backend failed: {0}")]
    Backend(String),
}

impl RepoError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Access to persisted video records.
///
/// Contract: each call commits on its own, independent of any transaction
/// the caller may hold. The status transition authority relies on this to
/// make every transition durable the moment it returns.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    /// Fetch a record by id.
    async fn get(&self, id: &VideoId) -> RepoResult<Option<VideoRecord>>;

    /// Persist a record, replacing any previous version.
    async fn persist(&self, record: &VideoRecord) -> RepoResult<()>;
}

/// In-memory repository for tests and embedded use.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    records: Arc<RwLock<HashMap<VideoId, VideoRecord>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record, e.g. from a test fixture.
    pub async fn insert(&self, record: VideoRecord) {
        self.records.write().await.insert(record.id.clone(), record);
    }
}

#[async_trait]
impl VideoRepository for MemoryRepository {
    async fn get(&self, id: &VideoId) -> RepoResult<Option<VideoRecord>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn persist(&self, record: &VideoRecord) -> RepoResult<()> {
        self.records
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(())
    }
}
