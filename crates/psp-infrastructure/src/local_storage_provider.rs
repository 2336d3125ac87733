//! Filesystem-backed StorageProvider implementation.

use crate::paths::PspPaths;
use crate::storage::AtomicJsonFile;
use async_trait::async_trait;
use psp_core::codec;
use psp_core::{
    LocalProviderOptions, PspError, Result, SessionFilter, SessionMetadata, StorageProvider,
    StoredSession, prepare_for_save, validate_session_id,
};
use std::path::{Path, PathBuf};
use tokio::fs;

const SESSION_FILE_EXTENSION: &str = "json";
const SHARD_PREFIX_LEN: usize = 2;

/// Stores each session as one JSON file, sharded by id prefix.
///
/// Directory structure:
/// ```text
/// base_dir/
/// ├── ab/
/// │   ├── abc.json
/// │   └── ab91f0.json
/// └── f0/
///     └── f0e1d2.json
/// ```
///
/// Shard directories are created on the first save of an id with that prefix.
pub struct LocalStorageProvider {
    base_dir: PathBuf,
}

impl LocalStorageProvider {
    /// Creates a provider at the default location (`<data_dir>/psp/sessions`).
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be determined or the base
    /// directory cannot be created.
    pub async fn default_location() -> Result<Self> {
        let base_dir = PspPaths::sessions_dir()?;
        Self::new(base_dir).await
    }

    /// Creates a provider rooted at `base_dir`, creating the directory if needed.
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).await.map_err(|e| {
            PspError::io(format!(
                "Failed to create base directory {}: {}",
                base_dir.display(),
                e
            ))
        })?;

        tracing::debug!(base_dir = %base_dir.display(), "Local session store ready");
        Ok(Self { base_dir })
    }

    /// Creates a provider from construction options.
    pub async fn from_options(options: &LocalProviderOptions) -> Result<Self> {
        match &options.directory {
            Some(directory) => Self::new(directory).await,
            None => Self::default_location().await,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Returns the path a session with `id` is stored at.
    ///
    /// `id` must already be validated.
    pub fn session_path(&self, id: &str) -> PathBuf {
        self.base_dir
            .join(shard_prefix(id))
            .join(format!("{}.{}", id, SESSION_FILE_EXTENSION))
    }

    /// Reads the metadata of every session file in one shard directory.
    ///
    /// Unreadable shards and entries are logged and skipped.
    async fn scan_shard(&self, shard: &Path, out: &mut Vec<SessionMetadata>) {
        let mut entries = match fs::read_dir(shard).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) => {
                tracing::warn!(shard = %shard.display(), error = %e, "Skipping unreadable shard");
                return;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(shard = %shard.display(), error = %e, "Stopped reading shard");
                    break;
                }
            };

            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(SESSION_FILE_EXTENSION) {
                continue;
            }

            let location = path.display().to_string();
            let raw = match fs::read_to_string(&path).await {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(path = %location, error = %e, "Skipping unreadable session file");
                    continue;
                }
            };

            match codec::decode_session_metadata(&raw, &location) {
                Ok(metadata) => out.push(metadata),
                Err(e) => {
                    tracing::warn!(path = %location, error = %e, "Skipping corrupt session file");
                }
            }
        }
    }
}

/// First two characters of the id (the whole id if shorter).
fn shard_prefix(id: &str) -> &str {
    match id.char_indices().nth(SHARD_PREFIX_LEN) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

#[async_trait]
impl StorageProvider for LocalStorageProvider {
    async fn save(&self, session: StoredSession) -> Result<StoredSession> {
        let session = prepare_for_save(session)?;
        let body = codec::encode_session_pretty(&session)?;

        let path = self.session_path(session.id());
        AtomicJsonFile::new(&path).write(&body).await.map_err(|e| {
            PspError::io(format!(
                "Failed to write session file {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::debug!(session_id = %session.id(), path = %path.display(), "Saved session");
        Ok(session)
    }

    async fn load(&self, id: &str) -> Result<StoredSession> {
        validate_session_id(id)?;

        let path = self.session_path(id);
        let raw = AtomicJsonFile::new(&path)
            .read()
            .await?
            .ok_or_else(|| PspError::not_found(id))?;

        codec::decode_session(&raw, &path.display().to_string())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        validate_session_id(id)?;

        let path = self.session_path(id);
        if AtomicJsonFile::new(&path).remove().await? {
            tracing::debug!(session_id = %id, "Deleted session");
        } else {
            tracing::debug!(session_id = %id, "Delete of absent session ignored");
        }
        Ok(())
    }

    async fn list(&self, filter: &SessionFilter) -> Result<Vec<SessionMetadata>> {
        filter.validate()?;

        let mut shards = match fs::read_dir(&self.base_dir).await {
            Ok(shards) => shards,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut candidates = Vec::new();
        loop {
            let shard = match shards.next_entry().await {
                Ok(Some(shard)) => shard,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(
                        base_dir = %self.base_dir.display(),
                        error = %e,
                        "Stopped reading base directory"
                    );
                    break;
                }
            };

            match shard.file_type().await {
                Ok(file_type) if file_type.is_dir() => {
                    self.scan_shard(&shard.path(), &mut candidates).await;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        shard = %shard.path().display(),
                        error = %e,
                        "Skipping shard of unknown type"
                    );
                }
            }
        }

        Ok(filter.apply(candidates))
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        validate_session_id(id)?;
        Ok(fs::try_exists(self.session_path(id)).await?)
    }
}
