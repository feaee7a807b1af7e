//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("failed to launch transcoder: {source}")]
    LaunchFailed {
        #[source]
        source: std::io::Error,
    },

    #[error("transcoder exited with code {exit_code:?}: {stderr}")]
    TranscodeFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("transcoder timed out after {0} seconds")]
    Timeout(u64),

    #[error("security violation: {0}")]
    SecurityViolation(String),

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create a transcode failure error.
    pub fn transcode_failed(exit_code: Option<i32>, stderr: impl Into<String>) -> Self {
        Self::TranscodeFailed {
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Create a security violation error.
    pub fn security_violation(message: impl Into<String>) -> Self {
        Self::SecurityViolation(message.into())
    }
}
