//! Atomic JSON file writes.
//!
//! Provides a thin layer for replacing a file's content all-or-nothing.

use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

/// A handle to a file that is only ever replaced atomically.
///
/// Provides:
/// - **Atomicity**: writes go to a uniquely named temporary file in the same
///   directory and are renamed over the target
/// - **Durability**: explicit fsync before rename
///
/// No locking is performed. Concurrent writers each produce a complete file
/// and the last rename wins.
pub struct AtomicJsonFile {
    path: PathBuf,
}

impl AtomicJsonFile {
    /// Creates a new handle for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file, returning `None` if it doesn't exist.
    pub async fn read(&self) -> std::io::Result<Option<String>> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Replaces the file's content with `content`.
    ///
    /// The parent directory is created if missing.
    pub async fn write(&self, content: &str) -> std::io::Result<()> {
        let parent = self.path.parent().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no parent directory",
            )
        })?;
        fs::create_dir_all(parent).await?;

        let tmp_path = self.temp_path()?;
        let result = write_synced(&tmp_path, content).await;
        if let Err(e) = result {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e);
        }

        if let Err(e) = fs::rename(&tmp_path, &self.path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e);
        }
        Ok(())
    }

    /// Removes the file; a missing file is not an error.
    ///
    /// Returns whether a file was removed.
    pub async fn remove(&self) -> std::io::Result<bool> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Gets a temporary file path next to the target.
    ///
    /// The name starts with `.` and ends in `.tmp`, so directory scans that
    /// look for `*.json` never pick it up.
    fn temp_path(&self) -> std::io::Result<PathBuf> {
        let file_name = self.path.file_name().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "Path has no file name")
        })?;

        let tmp_name = format!(
            ".{}.{}.tmp",
            file_name.to_string_lossy(),
            uuid::Uuid::new_v4().simple()
        );
        Ok(self.path.with_file_name(tmp_name))
    }
}

async fn write_synced(path: &Path, content: &str) -> std::io::Result<()> {
    let mut file = File::create(path).await?;
    file.write_all(content.as_bytes()).await?;
    file.sync_all().await?;
    Ok(())
}
