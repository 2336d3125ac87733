//! Redis-backed StorageProvider implementation.
//!
//! Besides the session body, the provider maintains secondary structures so
//! listings never have to read full bodies:
//!
//! ```text
//! <ns>:<id>            string      full encoded StoredSession
//! <ns>:metadata        hash        id -> encoded SessionMetadata
//! <ns>:index:name      sorted set  "<name>:<id>" scored by updated_at
//! <ns>:tags:<tag>      set         ids carrying <tag>
//! ```
//!
//! `save` and `delete` run as Lua scripts, so reading the previous metadata,
//! retracting its index entries and writing the new record is one atomic step
//! on the server. Concurrent saves of one id therefore never leave a tag
//! membership behind. Reads still treat an index entry whose metadata or body
//! is gone as absent, since older writers can leave such entries behind.

use async_trait::async_trait;
use futures::future::join_all;
use psp_core::codec;
use psp_core::{
    PspError, RedisProviderOptions, Result, SessionFilter, SessionMetadata, StorageProvider,
    StoredSession, prepare_for_save, validate_session_id,
};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError, Script};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Removes the name member and tag memberships of the metadata currently
/// stored for an id.
///
/// KEYS[1] metadata hash, KEYS[2] name index.
/// ARGV[1] id, ARGV[2] tag key prefix.
const RETRACT_PREVIOUS_LUA: &str = r#"
local previous = redis.call('HGET', KEYS[1], ARGV[1])
if previous then
  local ok, meta = pcall(cjson.decode, previous)
  if ok and type(meta) == 'table' then
    if type(meta.name) == 'string' then
      redis.call('ZREM', KEYS[2], meta.name .. ':' .. ARGV[1])
    end
    if type(meta.tags) == 'table' then
      for _, tag in ipairs(meta.tags) do
        redis.call('SREM', ARGV[2] .. tag, ARGV[1])
      end
    end
  end
end
"#;

/// KEYS[3] body key.
/// ARGV[3] body, ARGV[4] metadata, ARGV[5] name member, ARGV[6] score,
/// ARGV[7..] tags.
const SAVE_LUA: &str = r#"
redis.call('SET', KEYS[3], ARGV[3])
redis.call('HSET', KEYS[1], ARGV[1], ARGV[4])
redis.call('ZADD', KEYS[2], ARGV[6], ARGV[5])
for i = 7, #ARGV do
  redis.call('SADD', ARGV[2] .. ARGV[i], ARGV[1])
end
return 1
"#;

/// KEYS[3] body key. Returns 1 if a session was indexed.
const DELETE_LUA: &str = r#"
local indexed = redis.call('HDEL', KEYS[1], ARGV[1])
redis.call('DEL', KEYS[3])
return indexed
"#;

/// Key layout for one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisKeys {
    namespace: String,
}

impl RedisKeys {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Key holding the full session body.
    pub fn session(&self, id: &str) -> String {
        format!("{}:{}", self.namespace, id)
    }

    /// Hash of id -> metadata.
    pub fn metadata(&self) -> String {
        format!("{}:metadata", self.namespace)
    }

    /// Sorted set of name members scored by `updated_at`.
    pub fn name_index(&self) -> String {
        format!("{}:index:name", self.namespace)
    }

    /// Set of ids carrying `tag`.
    pub fn tag(&self, tag: &str) -> String {
        format!("{}{}", self.tag_prefix(), tag)
    }

    /// Common prefix of every tag set key.
    pub fn tag_prefix(&self) -> String {
        format!("{}:tags:", self.namespace)
    }

    /// Member stored in the name index for a session.
    pub fn name_member(metadata: &SessionMetadata) -> String {
        format!("{}:{}", metadata.name, metadata.id)
    }
}

/// Builds the connection URL, injecting `redis_password` when given.
pub fn connection_url(options: &RedisProviderOptions) -> Result<String> {
    let raw = options.url();
    let Some(password) = options.redis_password.as_deref() else {
        return Ok(raw.to_string());
    };

    let mut url = url::Url::parse(raw)
        .map_err(|e| PspError::config(format!("Invalid Redis URL '{}': {}", raw, e)))?;
    url.set_password(Some(password))
        .map_err(|_| PspError::config(format!("Cannot set a password on Redis URL '{}'", raw)))?;
    Ok(url.to_string())
}

/// Maps a Redis client error into the shared error type.
fn redis_error(err: RedisError) -> PspError {
    if err.is_connection_refusal()
        || err.is_connection_dropped()
        || err.is_io_error()
        || err.is_timeout()
        || err.kind() == redis::ErrorKind::AuthenticationFailed
    {
        PspError::connection(err.to_string())
    } else {
        PspError::data_access(format!("Redis error: {}", err))
    }
}

/// Redis storage provider.
///
/// Lifecycle: construct with [`RedisStorageProvider::new`] (no I/O), then
/// either call [`connect`](Self::connect) or let the first operation connect.
/// [`close`](Self::close) drops the connection; a later operation reconnects.
/// The underlying `ConnectionManager` also re-establishes dropped connections
/// on its own.
pub struct RedisStorageProvider {
    client: redis::Client,
    keys: RedisKeys,
    connection: Mutex<Option<ConnectionManager>>,
    save_script: Script,
    delete_script: Script,
}

impl RedisStorageProvider {
    /// Creates a provider without connecting.
    ///
    /// # Errors
    ///
    /// Returns `PspError::Config` if the URL or namespace is invalid.
    pub fn new(options: &RedisProviderOptions) -> Result<Self> {
        let namespace = options.namespace();
        if namespace.is_empty() {
            return Err(PspError::config("Redis namespace must not be empty"));
        }

        let url = connection_url(options)?;
        let client = redis::Client::open(url.as_str())
            .map_err(|e| PspError::config(format!("Invalid Redis configuration: {}", e)))?;

        Ok(Self {
            client,
            keys: RedisKeys::new(namespace),
            connection: Mutex::new(None),
            save_script: Script::new(&format!("{}{}", RETRACT_PREVIOUS_LUA, SAVE_LUA)),
            delete_script: Script::new(&format!("{}{}", RETRACT_PREVIOUS_LUA, DELETE_LUA)),
        })
    }

    /// Creates a provider and establishes the connection immediately.
    pub async fn connect_with(options: &RedisProviderOptions) -> Result<Self> {
        let provider = Self::new(options)?;
        provider.connect().await?;
        Ok(provider)
    }

    pub fn keys(&self) -> &RedisKeys {
        &self.keys
    }

    /// Establishes the connection if it is not already open.
    pub async fn connect(&self) -> Result<()> {
        self.ensure_connected().await.map(|_| ())
    }

    /// Drops the connection. Safe to call when not connected.
    pub async fn close(&self) {
        if self.connection.lock().await.take().is_some() {
            tracing::info!(namespace = %self.keys.namespace(), "Closed Redis connection");
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.lock().await.is_some()
    }

    /// Returns a handle to the shared connection, connecting on demand.
    async fn ensure_connected(&self) -> Result<ConnectionManager> {
        let mut guard = self.connection.lock().await;
        if let Some(manager) = guard.as_ref() {
            return Ok(manager.clone());
        }

        let manager = self
            .client
            .get_connection_manager()
            .await
            .map_err(|e| PspError::connection(format!("Failed to connect to Redis: {}", e)))?;

        tracing::info!(namespace = %self.keys.namespace(), "Connected to Redis");
        *guard = Some(manager.clone());
        Ok(manager)
    }

    /// Reads and decodes one metadata hash entry.
    ///
    /// An undecodable entry is logged and reported as absent.
    async fn read_metadata(
        &self,
        con: &mut ConnectionManager,
        id: &str,
    ) -> Result<Option<SessionMetadata>> {
        let raw: Option<String> = con
            .hget(self.keys.metadata(), id)
            .await
            .map_err(redis_error)?;

        Ok(raw.and_then(|raw| self.decode_metadata_entry(id, &raw)))
    }

    fn decode_metadata_entry(&self, id: &str, raw: &str) -> Option<SessionMetadata> {
        let location = format!("{}[{}]", self.keys.metadata(), id);
        match codec::decode_metadata(raw, &location) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                tracing::warn!(session_id = %id, error = %e, "Skipping corrupt metadata entry");
                None
            }
        }
    }

    /// Collects candidate metadata for a listing.
    ///
    /// Without tags every hash entry is a candidate; with tags the candidate
    /// ids are the intersection of the tag sets.
    async fn candidates(
        &self,
        con: &mut ConnectionManager,
        tags: &[String],
    ) -> Result<Vec<SessionMetadata>> {
        if tags.is_empty() {
            let entries: HashMap<String, String> = con
                .hgetall(self.keys.metadata())
                .await
                .map_err(redis_error)?;

            return Ok(entries
                .iter()
                .filter_map(|(id, raw)| self.decode_metadata_entry(id, raw))
                .collect());
        }

        let tag_keys: Vec<String> = tags.iter().map(|tag| self.keys.tag(tag)).collect();
        let ids: Vec<String> = con.sinter(tag_keys).await.map_err(redis_error)?;

        let lookups = ids.iter().map(|id| {
            let mut con = con.clone();
            async move { (id, self.read_metadata(&mut con, id).await) }
        });

        let mut found = Vec::with_capacity(ids.len());
        for (id, result) in join_all(lookups).await {
            match result? {
                Some(metadata) => found.push(metadata),
                None => {
                    tracing::warn!(session_id = %id, "Tag index references a missing session");
                }
            }
        }
        Ok(found)
    }
}

#[async_trait]
impl StorageProvider for RedisStorageProvider {
    async fn save(&self, session: StoredSession) -> Result<StoredSession> {
        let session = prepare_for_save(session)?;
        let body = codec::encode_session(&session)?;
        let metadata = codec::encode_metadata(&session.metadata)?;

        let mut con = self.ensure_connected().await?;
        let id = session.id();

        let mut invocation = self.save_script.prepare_invoke();
        invocation
            .key(self.keys.metadata())
            .key(self.keys.name_index())
            .key(self.keys.session(id))
            .arg(id)
            .arg(self.keys.tag_prefix())
            .arg(&body)
            .arg(&metadata)
            .arg(RedisKeys::name_member(&session.metadata))
            .arg(session.metadata.updated_at);
        for tag in &session.metadata.tags {
            invocation.arg(tag);
        }

        let _: i64 = invocation
            .invoke_async(&mut con)
            .await
            .map_err(redis_error)?;

        tracing::debug!(session_id = %id, namespace = %self.keys.namespace(), "Saved session");
        Ok(session)
    }

    async fn load(&self, id: &str) -> Result<StoredSession> {
        validate_session_id(id)?;

        let mut con = self.ensure_connected().await?;
        let key = self.keys.session(id);
        let raw: Option<String> = con.get(&key).await.map_err(redis_error)?;
        let raw = raw.ok_or_else(|| PspError::not_found(id))?;

        codec::decode_session(&raw, &key)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        validate_session_id(id)?;

        let mut con = self.ensure_connected().await?;
        let indexed: i64 = self
            .delete_script
            .key(self.keys.metadata())
            .key(self.keys.name_index())
            .key(self.keys.session(id))
            .arg(id)
            .arg(self.keys.tag_prefix())
            .invoke_async(&mut con)
            .await
            .map_err(redis_error)?;

        if indexed > 0 {
            tracing::debug!(session_id = %id, "Deleted session");
        } else {
            tracing::debug!(session_id = %id, "Delete of unindexed session");
        }
        Ok(())
    }

    async fn list(&self, filter: &SessionFilter) -> Result<Vec<SessionMetadata>> {
        filter.validate()?;

        let mut con = self.ensure_connected().await?;
        let candidates = self.candidates(&mut con, &filter.tags).await?;
        Ok(filter.apply(candidates))
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        validate_session_id(id)?;

        let mut con = self.ensure_connected().await?;
        con.exists(self.keys.session(id)).await.map_err(redis_error)
    }
}
