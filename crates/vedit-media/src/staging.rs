//! Per-job staging area for temporary input/output files.
//!
//! Every path handed out is confined to the staging root and carries a
//! collision-resistant random suffix, so concurrent jobs never need to
//! coordinate. Cleanup is idempotent and never fails the job.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::warn;
use uuid::Uuid;

use crate::error::{MediaError, MediaResult};

/// A confined working directory for one or more edit jobs.
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    /// Open (creating if needed) a staging area at `root`.
    pub async fn new(root: impl Into<PathBuf>) -> MediaResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        // Canonicalize so the confinement check below compares real paths.
        let root = fs::canonicalize(&root).await?;
        Ok(Self { root })
    }

    /// The staging root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write source bytes to a fresh staged input file.
    pub async fn stage_input(&self, bytes: &[u8], ext: &str) -> MediaResult<PathBuf> {
        let path = self.confined(&format!("in-{}", Uuid::new_v4().simple()), ext)?;
        fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// Allocate a fresh staged output path. The file is not created; the
    /// transcoder will write it.
    pub fn allocate_output(&self, ext: &str) -> MediaResult<PathBuf> {
        self.confined(&format!("out-{}", Uuid::new_v4().simple()), ext)
    }

    /// Delete staged paths. Missing files are fine; any other failure is
    /// logged and swallowed so cleanup never masks the job's real outcome.
    pub async fn cleanup(&self, paths: &[PathBuf]) {
        for path in paths {
            match fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!("Failed to remove staged file {}: {}", path.display(), e);
                }
            }
        }
    }

    /// Build a path under the root, refusing anything that would resolve
    /// outside it.
    fn confined(&self, stem: &str, ext: &str) -> MediaResult<PathBuf> {
        if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(MediaError::security_violation(format!(
                "invalid staged file extension: {ext:?}"
            )));
        }

        let path = self.root.join(format!("{stem}.{ext}"));
        if !path.starts_with(&self.root) {
            return Err(MediaError::security_violation(format!(
                "staged path escapes the staging root: {}",
                path.display()
            )));
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_stage_input_writes_under_root() {
        let dir = TempDir::new().unwrap();
        let staging = StagingArea::new(dir.path()).await.unwrap();

        let path = staging.stage_input(b"source bytes", "mp4").await.unwrap();
        assert!(path.starts_with(staging.root()));
        assert_eq!(fs::read(&path).await.unwrap(), b"source bytes");
    }

    #[tokio::test]
    async fn test_paths_are_unique() {
        let dir = TempDir::new().unwrap();
        let staging = StagingArea::new(dir.path()).await.unwrap();

        let a = staging.allocate_output("mp4").unwrap();
        let b = staging.allocate_output("mp4").unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_path_escape_rejected() {
        let dir = TempDir::new().unwrap();
        let staging = StagingArea::new(dir.path()).await.unwrap();

        let err = staging.allocate_output("mp4/../../etc/passwd").unwrap_err();
        assert!(matches!(err, MediaError::SecurityViolation(_)));

        let err = staging.stage_input(b"x", "").await.unwrap_err();
        assert!(matches!(err, MediaError::SecurityViolation(_)));
    }

    #[tokio::test]
    async fn test_cleanup_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let staging = StagingArea::new(dir.path()).await.unwrap();

        let path = staging.stage_input(b"x", "mp4").await.unwrap();
        staging.cleanup(&[path.clone()]).await;
        assert!(!path.exists());

        // Deleting again (and deleting a never-created path) must not panic.
        staging.cleanup(&[path, staging.allocate_output("mp4").unwrap()]).await;
    }
}
