//! FFmpeg CLI wrapper and staging area for video edits.
//!
//! This crate provides:
//! - A builder for FFmpeg argument vectors
//! - A process runner with timeout enforcement and dual stream capture
//! - A confined staging area for per-job temporary files

pub mod command;
pub mod error;
pub mod runner;
pub mod staging;

pub use command::FfmpegCommand;
pub use error::{MediaError, MediaResult};
pub use runner::{TranscodeOutput, TranscodeRunner, Transcoder, DEFAULT_TIMEOUT};
pub use staging::StagingArea;
