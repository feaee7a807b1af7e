//! Status-change notification payloads.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::video::{VideoId, VideoStatus};

/// Notification emitted after every successful status transition.
///
/// Delivery is a fire-and-forget concern of the notification collaborator;
/// this crate only defines the wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StatusNote {
    /// Video whose status changed
    pub video_id: VideoId,
    /// Owner to route the notification to
    pub owner_id: String,
    /// The status the video transitioned into
    pub status: VideoStatus,
    /// Optional human-readable detail (e.g. a failure summary)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusNote {
    pub fn new(video_id: VideoId, owner_id: impl Into<String>, status: VideoStatus) -> Self {
        Self {
            video_id,
            owner_id: owner_id.into(),
            status,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
