//! Status transition authority.
//!
//! The sole writer of a video's `status` and `result_location`. Each
//! transition is persisted through the repository as its own unit of work,
//! independent of whatever scope the caller runs in, and then announced to
//! the notification collaborator.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use vedit_models::{StatusNote, VideoId, VideoRecord, VideoStatus};
use vedit_storage::{VideoRepository, VideoStore};

use crate::error::{EngineError, EngineResult};
use crate::notify::StatusNotifier;

/// Outcome of [`StatusAuthority::transition_to_processing`].
#[derive(Debug, Clone)]
pub enum ProcessingStart {
    /// The video entered `Processing` from a startable state.
    Started(VideoRecord),
    /// The video was already `Processing`; nothing changed.
    AlreadyProcessing(VideoRecord),
}

/// The single component permitted to write a video's processing status.
pub struct StatusAuthority {
    repo: Arc<dyn VideoRepository>,
    store: Arc<dyn VideoStore>,
    notifier: Arc<dyn StatusNotifier>,
    /// Serializes every load-check-persist sequence. Without it two callers
    /// racing a repository with real latency can both observe a startable
    /// status and both claim the video.
    gate: Mutex<()>,
}

impl StatusAuthority {
    pub fn new(
        repo: Arc<dyn VideoRepository>,
        store: Arc<dyn VideoStore>,
        notifier: Arc<dyn StatusNotifier>,
    ) -> Self {
        Self {
            repo,
            store,
            notifier,
            gate: Mutex::new(()),
        }
    }

    /// Move a video into `Processing`.
    ///
    /// Legal from `Uploaded`, `Ready`, and `Failed`; clears any stale
    /// `result_location` and best-effort deletes the superseded artifact.
    /// A video already `Processing` is a no-op success — callers that need
    /// exclusivity must treat [`ProcessingStart::AlreadyProcessing`] as a
    /// conflict.
    pub async fn transition_to_processing(&self, id: &VideoId) -> EngineResult<ProcessingStart> {
        let gate = self.gate.lock().await;
        let mut record = self.load(id).await?;

        if record.status == VideoStatus::Processing {
            debug!(video_id = %id, "Duplicate processing start observed, nothing to do");
            return Ok(ProcessingStart::AlreadyProcessing(record));
        }

        let superseded = record.result_location.clone();
        record.mark_processing();
        self.repo.persist(&record).await?;
        drop(gate);
        metrics::counter!("vedit_status_transitions_total", "to" => "processing").increment(1);

        // The pointer is already gone from the record; leaking the old bytes
        // is preferable to blocking the new edit.
        if let Some(stale) = superseded {
            if let Err(e) = self.store.delete(&stale).await {
                warn!(video_id = %id, location = %stale, "Failed to delete superseded artifact: {}", e);
            }
        }

        self.announce(&record, None).await;
        Ok(ProcessingStart::Started(record))
    }

    /// Move a `Processing` video to `Ready`, recording the produced
    /// artifact's location in the same persisted write.
    pub async fn transition_to_ready(
        &self,
        id: &VideoId,
        result_location: &str,
    ) -> EngineResult<VideoRecord> {
        let gate = self.gate.lock().await;
        let mut record = self.load(id).await?;

        if record.status != VideoStatus::Processing {
            return Err(EngineError::IllegalTransition {
                id: id.clone(),
                from: record.status,
            });
        }

        record.mark_ready(result_location);
        self.repo.persist(&record).await?;
        drop(gate);
        metrics::counter!("vedit_status_transitions_total", "to" => "ready").increment(1);

        self.announce(&record, None).await;
        Ok(record)
    }

    /// Move a `Processing` video to `Failed`.
    ///
    /// Best effort, never throws: this usually runs from inside another
    /// failure's handling. A video that is no longer `Processing` has been
    /// resolved by another actor and is left untouched.
    pub async fn transition_to_failed(&self, id: &VideoId, message: &str) {
        let gate = self.gate.lock().await;
        let mut record = match self.load(id).await {
            Ok(record) => record,
            Err(e) => {
                error!(video_id = %id, "Cannot mark video failed: {}", e);
                return;
            }
        };

        if record.status != VideoStatus::Processing {
            debug!(
                video_id = %id,
                status = %record.status,
                "Failure report for a video that already moved on, ignoring"
            );
            return;
        }

        record.mark_failed(message);
        if let Err(e) = self.repo.persist(&record).await {
            error!(video_id = %id, "Failed to persist failed status: {}", e);
            return;
        }
        drop(gate);
        metrics::counter!("vedit_status_transitions_total", "to" => "failed").increment(1);

        self.announce(&record, Some(message)).await;
    }

    async fn load(&self, id: &VideoId) -> EngineResult<VideoRecord> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| EngineError::NotFound(id.clone()))
    }

    /// Publish a status note. Delivery failures never unwind a transition.
    async fn announce(&self, record: &VideoRecord, message: Option<&str>) {
        let mut note = StatusNote::new(record.id.clone(), &record.owner_id, record.status);
        if let Some(message) = message {
            note = note.with_message(message);
        }
        if let Err(e) = self.notifier.publish(note).await {
            warn!(video_id = %record.id, "Failed to publish status note: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use tempfile::TempDir;
    use vedit_storage::{LocalStore, MemoryRepository, RepoError, RepoResult};

    use crate::notify::{MemoryNotifier, NotifyError};

    /// Repository whose reads take long enough for tasks to interleave,
    /// like any backend with network latency.
    #[derive(Clone)]
    struct SlowRepository {
        inner: MemoryRepository,
    }

    #[async_trait]
    impl VideoRepository for SlowRepository {
        async fn get(&self, id: &VideoId) -> RepoResult<Option<VideoRecord>> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.inner.get(id).await
        }

        async fn persist(&self, record: &VideoRecord) -> RepoResult<()> {
            self.inner.persist(record).await
        }
    }

    /// Repository that serves reads but refuses every write.
    #[derive(Clone)]
    struct ReadOnlyRepository {
        inner: MemoryRepository,
    }

    #[async_trait]
    impl VideoRepository for ReadOnlyRepository {
        async fn get(&self, id: &VideoId) -> RepoResult<Option<VideoRecord>> {
            self.inner.get(id).await
        }

        async fn persist(&self, _record: &VideoRecord) -> RepoResult<()> {
            Err(RepoError::backend("write refused"))
        }
    }

    /// Notifier with a permanently broken transport.
    #[derive(Debug, Clone)]
    struct DeadLetterNotifier;

    #[async_trait]
    impl StatusNotifier for DeadLetterNotifier {
        async fn publish(&self, _note: StatusNote) -> Result<(), NotifyError> {
            Err(NotifyError("broker unreachable".to_string()))
        }
    }

    struct Fixture {
        _dir: TempDir,
        repo: MemoryRepository,
        store: Arc<LocalStore>,
        notifier: MemoryNotifier,
        authority: StatusAuthority,
    }

    async fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let repo = MemoryRepository::new();
        let store = Arc::new(LocalStore::new(dir.path().join("durable")).await.unwrap());
        let notifier = MemoryNotifier::new();
        let authority = StatusAuthority::new(
            Arc::new(repo.clone()),
            store.clone(),
            Arc::new(notifier.clone()),
        );
        Fixture {
            _dir: dir,
            repo,
            store,
            notifier,
            authority,
        }
    }

    async fn seed(fx: &Fixture, id: &str, status: VideoStatus) -> VideoRecord {
        let mut record =
            VideoRecord::new(VideoId::from(id), "user-1", "Title", "uploads/src.mp4");
        match status {
            VideoStatus::Uploaded => {}
            VideoStatus::Processing => record.mark_processing(),
            VideoStatus::Ready => record.mark_ready("old-result.mp4"),
            VideoStatus::Failed => record.mark_failed("previous failure"),
        }
        fx.repo.insert(record.clone()).await;
        record
    }

    #[tokio::test]
    async fn test_processing_legal_from_all_startable_states() {
        for status in [VideoStatus::Uploaded, VideoStatus::Ready, VideoStatus::Failed] {
            let fx = fixture().await;
            seed(&fx, "vid-1", status).await;

            let started = fx
                .authority
                .transition_to_processing(&VideoId::from("vid-1"))
                .await
                .unwrap();
            let record = match started {
                ProcessingStart::Started(r) => r,
                other => panic!("expected Started from {status}, got {other:?}"),
            };
            assert_eq!(record.status, VideoStatus::Processing);
            assert!(record.result_location.is_none());
        }
    }

    #[tokio::test]
    async fn test_duplicate_processing_start_is_noop() {
        let fx = fixture().await;
        seed(&fx, "vid-1", VideoStatus::Processing).await;

        let started = fx
            .authority
            .transition_to_processing(&VideoId::from("vid-1"))
            .await
            .unwrap();
        assert!(matches!(started, ProcessingStart::AlreadyProcessing(_)));
        // No transition happened, so no note was emitted.
        assert!(fx.notifier.notes().await.is_empty());
    }

    #[tokio::test]
    async fn test_processing_deletes_superseded_artifact() {
        let fx = fixture().await;

        // Put a real artifact where the stale result_location points.
        let staged = fx._dir.path().join("old.mp4");
        tokio::fs::write(&staged, b"old bytes").await.unwrap();
        let location = fx.store.store_file(&staged, "old-result.mp4").await.unwrap();

        seed(&fx, "vid-1", VideoStatus::Ready).await;
        fx.authority
            .transition_to_processing(&VideoId::from("vid-1"))
            .await
            .unwrap();

        assert!(fx.store.load(&location).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_processing_missing_record_is_not_found() {
        let fx = fixture().await;
        let err = fx
            .authority
            .transition_to_processing(&VideoId::from("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_ready_requires_processing() {
        let fx = fixture().await;
        seed(&fx, "vid-1", VideoStatus::Uploaded).await;

        let err = fx
            .authority
            .transition_to_ready(&VideoId::from("vid-1"), "result.mp4")
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_ready_sets_status_and_location_together() {
        let fx = fixture().await;
        seed(&fx, "vid-1", VideoStatus::Processing).await;

        let record = fx
            .authority
            .transition_to_ready(&VideoId::from("vid-1"), "vid-1-processed-abc.mp4")
            .await
            .unwrap();
        assert_eq!(record.status, VideoStatus::Ready);
        assert_eq!(
            record.result_location.as_deref(),
            Some("vid-1-processed-abc.mp4")
        );

        let notes = fx.notifier.notes().await;
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].status, VideoStatus::Ready);
    }

    #[tokio::test]
    async fn test_failed_from_processing() {
        let fx = fixture().await;
        seed(&fx, "vid-1", VideoStatus::Processing).await;

        fx.authority
            .transition_to_failed(&VideoId::from("vid-1"), "transcoder exited with code 1")
            .await;

        let record = fx
            .repo
            .get(&VideoId::from("vid-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, VideoStatus::Failed);
        assert!(record.result_location.is_none());
        assert_eq!(
            record.error_message.as_deref(),
            Some("transcoder exited with code 1")
        );

        let notes = fx.notifier.notes().await;
        assert_eq!(notes[0].status, VideoStatus::Failed);
        assert!(notes[0].message.is_some());
    }

    #[tokio::test]
    async fn test_failed_is_noop_when_video_moved_on() {
        let fx = fixture().await;
        let before = seed(&fx, "vid-1", VideoStatus::Ready).await;

        // A late failure report must not corrupt a resolved video.
        fx.authority
            .transition_to_failed(&VideoId::from("vid-1"), "stale report")
            .await;

        let after = fx
            .repo
            .get(&VideoId::from("vid-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.status, VideoStatus::Ready);
        assert_eq!(after.result_location, before.result_location);
        assert!(fx.notifier.notes().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_never_throws_on_missing_record() {
        let fx = fixture().await;
        fx.authority
            .transition_to_failed(&VideoId::from("ghost"), "whatever")
            .await;
    }

    #[tokio::test]
    async fn test_concurrent_starts_claim_video_exactly_once() {
        let dir = TempDir::new().unwrap();
        let inner = MemoryRepository::new();
        let store = Arc::new(LocalStore::new(dir.path().join("durable")).await.unwrap());
        let authority = Arc::new(StatusAuthority::new(
            Arc::new(SlowRepository {
                inner: inner.clone(),
            }),
            store,
            Arc::new(MemoryNotifier::new()),
        ));

        inner
            .insert(VideoRecord::new(
                VideoId::from("vid-1"),
                "user-1",
                "Title",
                "uploads/src.mp4",
            ))
            .await;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let authority = authority.clone();
                tokio::spawn(async move {
                    authority
                        .transition_to_processing(&VideoId::from("vid-1"))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut started = 0;
        for handle in handles {
            if let ProcessingStart::Started(_) = handle.await.unwrap() {
                started += 1;
            }
        }
        assert_eq!(started, 1);
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_roll_back_transition() {
        let dir = TempDir::new().unwrap();
        let repo = MemoryRepository::new();
        let store = Arc::new(LocalStore::new(dir.path().join("durable")).await.unwrap());
        let authority = StatusAuthority::new(
            Arc::new(repo.clone()),
            store,
            Arc::new(DeadLetterNotifier),
        );

        repo.insert(VideoRecord::new(
            VideoId::from("vid-1"),
            "user-1",
            "Title",
            "uploads/src.mp4",
        ))
        .await;

        let started = authority
            .transition_to_processing(&VideoId::from("vid-1"))
            .await
            .unwrap();
        assert!(matches!(started, ProcessingStart::Started(_)));

        let record = repo.get(&VideoId::from("vid-1")).await.unwrap().unwrap();
        assert_eq!(record.status, VideoStatus::Processing);
    }

    #[tokio::test]
    async fn test_failed_swallows_persist_failure() {
        let dir = TempDir::new().unwrap();
        let inner = MemoryRepository::new();
        let store = Arc::new(LocalStore::new(dir.path().join("durable")).await.unwrap());
        let authority = StatusAuthority::new(
            Arc::new(ReadOnlyRepository {
                inner: inner.clone(),
            }),
            store,
            Arc::new(MemoryNotifier::new()),
        );

        let mut record = VideoRecord::new(
            VideoId::from("vid-1"),
            "user-1",
            "Title",
            "uploads/src.mp4",
        );
        record.mark_processing();
        inner.insert(record).await;

        // Returns normally even though the write was refused.
        authority
            .transition_to_failed(&VideoId::from("vid-1"), "transcoder exited with code 1")
            .await;

        let record = inner.get(&VideoId::from("vid-1")).await.unwrap().unwrap();
        assert_eq!(record.status, VideoStatus::Processing);
    }
}
