//! Serialization codec shared by every storage provider.
//!
//! This module is the only place that defines how a session becomes bytes:
//!
//! - [`storage_map`] maps the two-level `StorageMap` to a nested JSON object
//!   `{ "<origin>": { "<key>": "<value>" } }` and back. It is wired into the
//!   model through `#[serde(with = "crate::codec::storage_map")]`, so every
//!   JSON write path and every read path go through the same functions.
//! - [`encode_session`] / [`decode_session`] and the metadata variants are the
//!   entry points backends call. Decoding failures are reported as
//!   `PspError::CorruptRecord` tagged with the caller-supplied location.
//!
//! Values are never coerced: a non-string value inside a storage map is a
//! decoding error rather than being stringified.

use crate::error::{PspError, Result};
use crate::session::{SessionMetadata, StoredSession};
use serde::Deserialize;

/// Encodes a session as compact JSON.
pub fn encode_session(session: &StoredSession) -> Result<String> {
    Ok(serde_json::to_string(session)?)
}

/// Encodes a session as indented JSON, for files meant to be inspected by hand.
pub fn encode_session_pretty(session: &StoredSession) -> Result<String> {
    Ok(serde_json::to_string_pretty(session)?)
}

/// Decodes a session body read from `location`.
pub fn decode_session(raw: &str, location: &str) -> Result<StoredSession> {
    serde_json::from_str(raw).map_err(|e| PspError::corrupt(location, e))
}

/// Encodes metadata on its own (used for secondary indexes).
pub fn encode_metadata(metadata: &SessionMetadata) -> Result<String> {
    Ok(serde_json::to_string(metadata)?)
}

/// Decodes a metadata record read from `location`.
pub fn decode_metadata(raw: &str, location: &str) -> Result<SessionMetadata> {
    serde_json::from_str(raw).map_err(|e| PspError::corrupt(location, e))
}

/// Decodes only the `metadata` field of a full session body.
///
/// The `state` field is skipped without being materialized, which keeps
/// listings cheap for sessions with large captures.
pub fn decode_session_metadata(raw: &str, location: &str) -> Result<SessionMetadata> {
    #[derive(Deserialize)]
    struct MetadataOnly {
        metadata: SessionMetadata,
    }

    serde_json::from_str::<MetadataOnly>(raw)
        .map(|doc| doc.metadata)
        .map_err(|e| PspError::corrupt(location, e))
}

/// Serde adapter for [`StorageMap`](crate::session::StorageMap).
pub mod storage_map {
    use crate::session::{EmptyKey, OriginEntries, StorageMap};
    use serde::de::Error as DeError;
    use serde::ser::Error as SerError;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    fn describe(empty: EmptyKey<'_>) -> String {
        match empty {
            EmptyKey::Origin => "storage map contains an empty origin key".to_string(),
            EmptyKey::StorageKey { origin } => {
                format!("storage map for origin '{}' contains an empty key", origin)
            }
        }
    }

    pub fn serialize<S>(map: &StorageMap, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if let Some(empty) = map.find_empty_key() {
            return Err(S::Error::custom(describe(empty)));
        }
        serializer.collect_map(map.iter())
    }

    /// Accepts a nested object of strings; `null` decodes to an empty map.
    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<StorageMap, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<BTreeMap<String, OriginEntries>>::deserialize(deserializer)?;
        let map = StorageMap::from(raw.unwrap_or_default());
        if let Some(empty) = map.find_empty_key() {
            return Err(D::Error::custom(describe(empty)));
        }
        Ok(map)
    }
}
