//! Storage provider contract.
//!
//! Defines the interface every session storage backend implements, plus the
//! input checks all backends run before touching storage.

use crate::error::{PspError, Result};
use crate::filter::SessionFilter;
use crate::session::{EmptyKey, SessionMetadata, StoredSession, now_millis};
use async_trait::async_trait;

/// An abstract store for captured browser sessions.
///
/// This trait decouples callers (automation adapters, servers, CLIs) from the
/// concrete storage mechanism. Callers must not rely on backend-specific key
/// layouts.
///
/// # Implementation Notes
///
/// - `save` is an insert-or-overwrite of the whole record. There is no
///   optimistic concurrency: concurrent saves of one id are last-writer-wins.
/// - `delete` is idempotent.
/// - `list` must delegate final filtering, ordering and pagination to
///   [`SessionFilter::apply`] and skip individual unreadable records instead of
///   failing.
/// - Implementations must be safe to share across tasks.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Persists a session, replacing any previous record with the same id.
    ///
    /// # Returns
    ///
    /// - `Ok(StoredSession)`: The session as written, with `updated_at` refreshed
    /// - `Err(PspError::Validation)`: The id or storage maps are invalid
    /// - `Err(_)`: The backend failed to write
    async fn save(&self, session: StoredSession) -> Result<StoredSession>;

    /// Loads a session by id.
    ///
    /// # Returns
    ///
    /// - `Ok(StoredSession)`: Session found
    /// - `Err(PspError::NotFound)`: No session with that id exists
    /// - `Err(_)`: Error occurred during retrieval
    async fn load(&self, id: &str) -> Result<StoredSession>;

    /// Deletes a session and every index entry referring to it.
    ///
    /// Deleting an id that does not exist succeeds.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Lists session metadata matching `filter`, most recently updated first.
    async fn list(&self, filter: &SessionFilter) -> Result<Vec<SessionMetadata>>;

    /// Returns whether a session with the given id exists.
    async fn exists(&self, id: &str) -> Result<bool>;
}

/// Id reserved for the metadata hash under a backend namespace.
pub const RESERVED_SESSION_ID: &str = "metadata";

/// Id prefixes reserved for secondary index keys under a backend namespace.
pub const RESERVED_SESSION_ID_PREFIXES: &[&str] = &["index:", "tags:"];

/// Checks that `id` can be used as a storage key.
///
/// Ids become file names and key segments, so they must be non-empty, must
/// not contain path separators or control characters, and must not start
/// with `.`. Ids that would share a key with a secondary index
/// ([`RESERVED_SESSION_ID`], [`RESERVED_SESSION_ID_PREFIXES`]) are rejected on
/// every backend.
pub fn validate_session_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(PspError::validation("session id must not be empty"));
    }
    if id.starts_with('.') {
        return Err(PspError::validation(format!(
            "session id '{}' must not start with '.'",
            id
        )));
    }
    if id.contains(['/', '\\']) {
        return Err(PspError::validation(format!(
            "session id '{}' must not contain path separators",
            id
        )));
    }
    if id.chars().any(char::is_control) {
        return Err(PspError::validation(
            "session id must not contain control characters",
        ));
    }
    if id == RESERVED_SESSION_ID
        || RESERVED_SESSION_ID_PREFIXES
            .iter()
            .any(|prefix| id.starts_with(prefix))
    {
        return Err(PspError::validation(format!(
            "session id '{}' is reserved for index keys",
            id
        )));
    }
    Ok(())
}

/// Validates a session for writing and stamps `updated_at`.
///
/// Runs before any I/O; every backend calls this at the top of `save`.
pub fn prepare_for_save(mut session: StoredSession) -> Result<StoredSession> {
    validate_session_id(&session.metadata.id)?;

    let storage = &session.state.storage;
    for (label, map) in [
        ("localStorage", &storage.local_storage),
        ("sessionStorage", &storage.session_storage),
    ] {
        match map.find_empty_key() {
            Some(EmptyKey::Origin) => {
                return Err(PspError::validation(format!(
                    "{} contains an empty origin",
                    label
                )));
            }
            Some(EmptyKey::StorageKey { origin }) => {
                return Err(PspError::validation(format!(
                    "{} for origin '{}' contains an empty key",
                    label, origin
                )));
            }
            None => {}
        }
    }

    session.metadata.touch(now_millis());
    Ok(session)
}
