//! Durable storage collaborators for the vedit backend.
//!
//! This crate provides:
//! - The [`VideoStore`] trait for durable artifact bytes (load/store/delete)
//! - A local-filesystem implementation with atomic commits
//! - The [`VideoRepository`] trait for video metadata records, where every
//!   call is its own committed unit of work
//! - An in-memory repository for tests and embedding

pub mod error;
pub mod local;
pub mod repo;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use local::LocalStore;
pub use repo::{MemoryRepository, RepoError, RepoResult, VideoRepository};
pub use store::VideoStore;
