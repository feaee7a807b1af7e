//! Video record models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Generate a new random video ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VideoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Video processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    /// Source uploaded, no edit job has run yet
    #[default]
    Uploaded,
    /// An edit job is currently running
    Processing,
    /// The latest edit job produced a result
    Ready,
    /// The latest edit job failed
    Failed,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Uploaded => "uploaded",
            VideoStatus::Processing => "processing",
            VideoStatus::Ready => "ready",
            VideoStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Video record stored in the metadata store.
///
/// Invariant: `result_location` is `Some` if and only if `status == Ready`.
/// Status and `result_location` are only ever written through the status
/// transition authority; the `mark_*` helpers below keep the pair consistent.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoRecord {
    /// Unique video ID
    pub id: VideoId,

    /// User ID (owner)
    pub owner_id: String,

    /// Display title
    pub title: String,

    /// Processing status
    #[serde(default)]
    pub status: VideoStatus,

    /// Location of the original uploaded bytes (never mutated by edits)
    pub source_location: String,

    /// Location of the most recent successfully produced artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_location: Option<String>,

    /// Error message (if the latest job failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl VideoRecord {
    /// Create a new record for a freshly uploaded video.
    pub fn new(
        id: VideoId,
        owner_id: impl Into<String>,
        title: impl Into<String>,
        source_location: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            owner_id: owner_id.into(),
            title: title.into(),
            status: VideoStatus::Uploaded,
            source_location: source_location.into(),
            result_location: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark as processing, clearing any stale result.
    pub fn mark_processing(&mut self) {
        self.status = VideoStatus::Processing;
        self.result_location = None;
        self.error_message = None;
        self.updated_at = Utc::now();
    }

    /// Mark as ready with the produced artifact location.
    pub fn mark_ready(&mut self, result_location: impl Into<String>) {
        self.status = VideoStatus::Ready;
        self.result_location = Some(result_location.into());
        self.error_message = None;
        self.updated_at = Utc::now();
    }

    /// Mark as failed.
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = VideoStatus::Failed;
        self.result_location = None;
        self.error_message = Some(error.into());
        self.updated_at = Utc::now();
    }
}
