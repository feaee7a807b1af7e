//! Status-change notification seam.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use vedit_models::StatusNote;

/// Error from the notification collaborator. Always non-fatal to the
/// emitting transition.
#[derive(Debug, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Outbound status-change delivery.
///
/// Implementations push to whatever transport reaches the owner (WebSocket
/// registry, pub/sub channel, ...). Publishing is fire-and-forget from the
/// transition authority's point of view.
#[async_trait]
pub trait StatusNotifier: Send + Sync {
    async fn publish(&self, note: StatusNote) -> Result<(), NotifyError>;
}

/// Notifier that drops every note. Useful when no delivery transport is
/// wired up.
#[derive(Debug, Clone, Default)]
pub struct NullNotifier;

#[async_trait]
impl StatusNotifier for NullNotifier {
    async fn publish(&self, _note: StatusNote) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Notifier that records every note in memory, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotifier {
    notes: Arc<Mutex<Vec<StatusNote>>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all notes published so far.
    pub async fn notes(&self) -> Vec<StatusNote> {
        self.notes.lock().await.clone()
    }
}

#[async_trait]
impl StatusNotifier for MemoryNotifier {
    async fn publish(&self, note: StatusNote) -> Result<(), NotifyError> {
        self.notes.lock().await.push(note);
        Ok(())
    }
}
