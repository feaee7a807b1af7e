//! Local-filesystem implementation of [`VideoStore`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::store::VideoStore;

/// Durable storage rooted at a local directory.
///
/// Locations are paths relative to the root. Commits are atomic renames, so
/// readers never observe partially written artifacts.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub async fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        let root = fs::canonicalize(&root).await?;
        Ok(Self { root })
    }

    /// The durable storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a location under the root, refusing anything that escapes it.
    fn resolve(&self, location: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(location);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| !matches!(c, std::path::Component::Normal(_)))
        {
            return Err(StorageError::security_violation(format!(
                "storage location escapes the durable root: {location}"
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl VideoStore for LocalStore {
    async fn load(&self, location: &str) -> StorageResult<Vec<u8>> {
        let path = self.resolve(location)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::not_found(location))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn store_file(&self, path: &Path, name: &str) -> StorageResult<String> {
        let dst = self.resolve(name)?;
        if let Some(parent) = dst.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        move_file(path, &dst).await?;
        debug!("Stored artifact at {}", dst.display());
        Ok(name.to_string())
    }

    async fn delete(&self, location: &str) -> StorageResult<()> {
        let path = self.resolve(location)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::delete_failed(format!(
                "{}: {}",
                location, e
            ))),
        }
    }
}

/// Move a file from `src` to `dst`, handling cross-device moves.
///
/// Attempts a fast rename first. On EXDEV (cross-device link) it falls back
/// to copying to a temp file next to the destination and renaming that, so
/// the destination filesystem still sees a single atomic step.
async fn move_file(src: &Path, dst: &Path) -> StorageResult<()> {
    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            debug!(
                "Cross-device rename detected, falling back to copy+delete: {} -> {}",
                src.display(),
                dst.display()
            );
            copy_and_delete(src, dst).await
        }
        Err(e) => Err(StorageError::store_failed(format!(
            "{} -> {}: {}",
            src.display(),
            dst.display(),
            e
        ))),
    }
}

/// Check if an IO error is EXDEV (cross-device link).
fn is_cross_device_error(e: &std::io::Error) -> bool {
    // EXDEV is error code 18 on Linux/macOS
    e.raw_os_error() == Some(18)
}

/// Copy file to destination (via temp file) then delete source.
async fn copy_and_delete(src: &Path, dst: &Path) -> StorageResult<()> {
    let tmp_dst = dst.with_extension("tmp");

    fs::copy(src, &tmp_dst).await?;

    if let Err(e) = fs::rename(&tmp_dst, dst).await {
        let _ = fs::remove_file(&tmp_dst).await;
        return Err(StorageError::store_failed(format!(
            "{} -> {}: {}",
            tmp_dst.display(),
            dst.display(),
            e
        )));
    }

    // Best effort: the destination is complete at this point.
    if let Err(e) = fs::remove_file(src).await {
        tracing::warn!(
            "Failed to remove source file after cross-device move: {}: {}",
            src.display(),
            e
        );
    }

    Ok(())
}
