//! Shared data models for the vedit backend.
//!
//! This crate provides Serde-serializable types for:
//! - Video records and processing status
//! - Edit options supplied with an edit request
//! - Encoding configuration
//! - Status-change notification payloads

pub mod encoding;
pub mod note;
pub mod options;
pub mod video;

// Re-export common types
pub use encoding::EncodingConfig;
pub use note::StatusNote;
pub use options::{EditOptions, OptionsError, MIN_TARGET_HEIGHT};
pub use video::{VideoId, VideoRecord, VideoStatus};
