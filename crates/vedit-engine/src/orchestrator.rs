//! Edit orchestration.
//!
//! The top-level coordinator for one edit job: stages the source locally,
//! drives the transcoder, commits the result into durable storage, and
//! delegates every status change to the status transition authority.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error};
use uuid::Uuid;

use vedit_media::{FfmpegCommand, StagingArea, Transcoder};
use vedit_models::{EditOptions, EncodingConfig, VideoId, VideoRecord, VideoStatus};
use vedit_storage::{VideoRepository, VideoStore};

use crate::config::EngineConfig;
use crate::error::{EditPhase, EngineError, EngineResult};
use crate::logging::JobLogger;
use crate::notify::StatusNotifier;
use crate::status::{ProcessingStart, StatusAuthority};

/// Edit job coordinator.
///
/// Cheaply cloneable; each accepted edit runs on its own spawned task with a
/// clone of the engine, fire-and-forget from the caller's point of view.
#[derive(Clone)]
pub struct EditEngine {
    repo: Arc<dyn VideoRepository>,
    store: Arc<dyn VideoStore>,
    transcoder: Arc<dyn Transcoder>,
    status: Arc<StatusAuthority>,
    staging: StagingArea,
    encoding: EncodingConfig,
}

impl EditEngine {
    /// Create an engine with an explicit transcoder implementation.
    pub async fn new(
        config: &EngineConfig,
        repo: Arc<dyn VideoRepository>,
        store: Arc<dyn VideoStore>,
        transcoder: Arc<dyn Transcoder>,
        notifier: Arc<dyn StatusNotifier>,
    ) -> EngineResult<Self> {
        let staging = StagingArea::new(&config.staging_dir).await?;
        let status = Arc::new(StatusAuthority::new(repo.clone(), store.clone(), notifier));
        Ok(Self {
            repo,
            store,
            transcoder,
            status,
            staging,
            encoding: EncodingConfig::default(),
        })
    }

    /// Create an engine that launches the FFmpeg binary from `config`.
    pub async fn with_ffmpeg(
        config: &EngineConfig,
        repo: Arc<dyn VideoRepository>,
        store: Arc<dyn VideoStore>,
        notifier: Arc<dyn StatusNotifier>,
    ) -> EngineResult<Self> {
        let runner = Arc::new(config.runner());
        Self::new(config, repo, store, runner, notifier).await
    }

    /// The status transition authority backing this engine.
    pub fn status(&self) -> &StatusAuthority {
        &self.status
    }

    /// Accept an edit request.
    ///
    /// Validates the options and claims the video for processing, both
    /// synchronously so the caller sees validation and conflict errors
    /// before any work starts. On success the job itself runs on its own
    /// task; the caller holds no handle to it.
    pub async fn start_edit(
        &self,
        id: &VideoId,
        options: EditOptions,
        requester: &str,
    ) -> EngineResult<()> {
        options.validate()?;

        match self.status.transition_to_processing(id).await? {
            ProcessingStart::Started(_) => {}
            ProcessingStart::AlreadyProcessing(record) => {
                return Err(EngineError::IllegalTransition {
                    id: id.clone(),
                    from: record.status,
                });
            }
        }

        let engine = self.clone();
        let id = id.clone();
        let requester = requester.to_string();
        tokio::spawn(async move {
            engine.run_edit(&id, &options, &requester).await;
        });

        Ok(())
    }

    /// Run one edit job to completion.
    ///
    /// The video must already be `Processing` (claimed through the status
    /// authority). Every failure inside the job is converted into a
    /// `Failed` transition and logged; nothing propagates back to the
    /// request that triggered the job. Staged files are removed whatever
    /// the outcome.
    pub async fn run_edit(&self, id: &VideoId, options: &EditOptions, requester: &str) {
        let logger = JobLogger::new(Uuid::new_v4().to_string(), id.to_string());

        // Defensive: the caller validated existence before claiming the
        // video, so a missing record means something external removed it.
        let record = match self.repo.get(id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                error!(video_id = %id, "Video vanished before its edit job ran");
                return;
            }
            Err(e) => {
                error!(video_id = %id, "Failed to load video for edit: {}", e);
                return;
            }
        };

        if record.status != VideoStatus::Processing {
            debug!(
                video_id = %id,
                status = %record.status,
                "Edit job found its video already resolved, aborting"
            );
            return;
        }

        logger.log_start(&format!("requested by {requester}"));

        let mut staged: Vec<PathBuf> = Vec::new();
        let outcome = self.execute(&record, options, &logger, &mut staged).await;

        match outcome {
            Ok(result_location) => {
                match self.status.transition_to_ready(id, &result_location).await {
                    Ok(_) => logger.log_completion(&format!("artifact at {result_location}")),
                    Err(e) => {
                        // The artifact landed but the status write failed;
                        // the record must not claim success it cannot show.
                        error!(video_id = %id, "Failed to persist ready status: {}", e);
                        self.status
                            .transition_to_failed(id, &format!("failed to record result: {e}"))
                            .await;
                    }
                }
            }
            Err(e) => {
                logger.log_error(&e.to_string());
                self.status.transition_to_failed(id, &e.to_string()).await;
            }
        }

        self.staging.cleanup(&staged).await;
    }

    /// The fallible middle of the job: stage, transcode, commit.
    ///
    /// Staged paths are pushed onto `staged` as they are created so the
    /// caller can clean them up regardless of where this returns.
    async fn execute(
        &self,
        record: &VideoRecord,
        options: &EditOptions,
        logger: &JobLogger,
        staged: &mut Vec<PathBuf>,
    ) -> EngineResult<String> {
        let source = self
            .store
            .load(&record.source_location)
            .await
            .map_err(|e| EngineError::in_phase(EditPhase::LoadSource, e))?;

        let input = self
            .staging
            .stage_input(&source, source_extension(&record.source_location))
            .await
            .map_err(|e| EngineError::in_phase(EditPhase::Stage, e))?;
        staged.push(input.clone());

        let output = self
            .staging
            .allocate_output("mp4")
            .map_err(|e| EngineError::in_phase(EditPhase::Stage, e))?;
        staged.push(output.clone());

        let command = build_command(&input, &output, options, &self.encoding, logger);
        self.transcoder
            .execute(&command.build_args())
            .await
            .map_err(|e| EngineError::in_phase(EditPhase::Transcode, e))?;

        let final_name = format!("{}-processed-{}.mp4", record.id, Uuid::new_v4().simple());
        self.store
            .store_file(&output, &final_name)
            .await
            .map_err(|e| EngineError::in_phase(EditPhase::Commit, e))
    }
}

/// Build the transcoder command for one job, deterministically from the
/// edit options.
fn build_command(
    input: &Path,
    output: &Path,
    options: &EditOptions,
    encoding: &EncodingConfig,
    logger: &JobLogger,
) -> FfmpegCommand {
    let mut cmd = FfmpegCommand::new(input, output);

    if let Some(start) = options.trim_start {
        cmd = cmd.seek(start);
    }
    if let Some(end) = options.trim_end {
        let start = options.trim_start.unwrap_or(0.0);
        if end > start {
            cmd = cmd.duration(end - start);
        } else {
            logger.log_warning(&format!(
                "ignoring trim end {end} at or before trim start {start}"
            ));
        }
    }
    if let Some(height) = options.target_height {
        cmd = cmd.scale_to_height(height);
    }
    cmd = if options.mute {
        cmd.drop_audio()
    } else {
        cmd.copy_audio()
    };

    cmd.encode_with(encoding)
}

/// Extension of the source object, for naming the staged input.
fn source_extension(location: &str) -> &str {
    Path::new(location)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("mp4")
}
