//! Edit orchestration core.
//!
//! This crate provides:
//! - The status transition authority, the sole writer of a video's
//!   processing status
//! - The edit orchestrator that drives staging, transcoding, and commit
//! - The notifier seam for status-change fan-out
//! - Engine configuration and structured job logging

pub mod config;
pub mod error;
pub mod logging;
pub mod notify;
pub mod orchestrator;
pub mod status;

pub use config::EngineConfig;
pub use error::{EditPhase, EngineError, EngineResult};
pub use logging::JobLogger;
pub use notify::{MemoryNotifier, NotifyError, NullNotifier, StatusNotifier};
pub use orchestrator::EditEngine;
pub use status::{ProcessingStart, StatusAuthority};
