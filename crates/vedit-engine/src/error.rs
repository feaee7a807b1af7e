//! Engine error types.

use std::fmt;

use thiserror::Error;

use vedit_media::MediaError;
use vedit_models::{OptionsError, VideoId, VideoStatus};
use vedit_storage::{RepoError, StorageError};

pub type EngineResult<T> = Result<T, EngineError>;

/// Phase of an edit job, carried on failures for operational visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditPhase {
    /// Loading the source bytes from durable storage
    LoadSource,
    /// Staging local input/output files
    Stage,
    /// Running the transcoder
    Transcode,
    /// Committing the result into durable storage
    Commit,
}

impl fmt::Display for EditPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EditPhase::LoadSource => "load-source",
            EditPhase::Stage => "stage",
            EditPhase::Transcode => "transcode",
            EditPhase::Commit => "commit",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid edit options: {0}")]
    Validation(#[from] OptionsError),

    #[error("video not found: {0}")]
    NotFound(VideoId),

    #[error("video {id} is not startable from status '{from}': edit already running or record in a conflicting state")]
    IllegalTransition { id: VideoId, from: VideoStatus },

    #[error("{phase} phase failed: {source}")]
    Phase {
        phase: EditPhase,
        #[source]
        source: Box<EngineError>,
    },

    #[error("media error: {0}")]
    Media(#[from] MediaError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("repository error: {0}")]
    Repo(#[from] RepoError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Wrap an error with the edit phase it occurred in.
    pub fn in_phase(phase: EditPhase, err: impl Into<EngineError>) -> Self {
        Self::Phase {
            phase,
            source: Box::new(err.into()),
        }
    }

    /// The failed phase, if this is a phase-wrapped error.
    pub fn phase(&self) -> Option<EditPhase> {
        match self {
            Self::Phase { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// Whether this error should surface to the caller as a conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::IllegalTransition { .. })
    }
}
