//! Captured browser state.
//!
//! `BrowserSessionState` is what an automation adapter captures from a live
//! browser context: cookies plus localStorage and sessionStorage for every
//! origin, and a handful of optional payloads the storage layer carries
//! without interpreting.

use super::metadata::now_millis;
use super::payload::RawPayload;
use super::storage_map::StorageMap;
use serde::de::{Error as DeError, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Schema version written by [`BrowserSessionState::new`].
pub const STATE_SCHEMA_VERSION: &str = "1.0.0";

/// Cookie `SameSite` attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

/// A single captured cookie.
///
/// Cookies are kept in capture order and never deduplicated; two records
/// with the same `(name, domain, path)` are both preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default = "default_cookie_path")]
    pub path: String,
    /// Expiry as a Unix timestamp in seconds; `None` for session cookies
    #[serde(default)]
    pub expires: Option<f64>,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub same_site: SameSite,
}

fn default_cookie_path() -> String {
    "/".to_string()
}

impl Cookie {
    /// Creates a session cookie with path `/` and `SameSite=Lax`.
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: default_cookie_path(),
            expires: None,
            http_only: false,
            secure: false,
            same_site: SameSite::Lax,
        }
    }
}

/// Cookies and Web Storage captured from a browser context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSnapshot {
    #[serde(default)]
    pub cookies: Vec<Cookie>,
    #[serde(default, with = "crate::codec::storage_map")]
    pub local_storage: StorageMap,
    #[serde(default, with = "crate::codec::storage_map")]
    pub session_storage: StorageMap,
}

/// The captured content of a browser session.
///
/// `version` and every optional payload (`dom`, `history`, `network`,
/// `recording`, `extensions`) are opaque to the storage layer and are written
/// back byte-for-byte. Top-level fields this type does not know about are
/// kept verbatim in `extra` so newer capture formats survive a save/load
/// cycle.
///
/// Serialization is hand-written: `#[serde(flatten)]` buffers the whole object,
/// which would lose the raw text of the payloads.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowserSessionState {
    pub version: String,
    /// Capture time in milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Primary origin at capture time (may be empty)
    pub origin: String,
    pub storage: StorageSnapshot,
    pub dom: Option<RawPayload>,
    pub history: Option<RawPayload>,
    pub network: Option<RawPayload>,
    pub recording: Option<RawPayload>,
    pub extensions: Option<RawPayload>,
    pub extra: BTreeMap<String, RawPayload>,
}

const KNOWN_FIELDS: &[&str] = &[
    "version",
    "timestamp",
    "origin",
    "storage",
    "dom",
    "history",
    "network",
    "recording",
    "extensions",
];

impl Serialize for BrowserSessionState {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("version", &self.version)?;
        map.serialize_entry("timestamp", &self.timestamp)?;
        map.serialize_entry("origin", &self.origin)?;
        map.serialize_entry("storage", &self.storage)?;

        let payloads = [
            ("dom", &self.dom),
            ("history", &self.history),
            ("network", &self.network),
            ("recording", &self.recording),
            ("extensions", &self.extensions),
        ];
        for (name, payload) in payloads {
            if let Some(payload) = payload {
                map.serialize_entry(name, payload)?;
            }
        }

        for (key, value) in &self.extra {
            if !KNOWN_FIELDS.contains(&key.as_str()) {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for BrowserSessionState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(StateVisitor)
    }
}

struct StateVisitor;

impl<'de> Visitor<'de> for StateVisitor {
    type Value = BrowserSessionState;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a browser session state object")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut version: Option<String> = None;
        let mut timestamp: Option<i64> = None;
        let mut state = BrowserSessionState {
            version: String::new(),
            timestamp: 0,
            origin: String::new(),
            storage: StorageSnapshot::default(),
            dom: None,
            history: None,
            network: None,
            recording: None,
            extensions: None,
            extra: BTreeMap::new(),
        };

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "version" => version = Some(map.next_value()?),
                "timestamp" => timestamp = Some(map.next_value()?),
                "origin" => state.origin = map.next_value()?,
                "storage" => state.storage = map.next_value()?,
                "dom" => state.dom = map.next_value()?,
                "history" => state.history = map.next_value()?,
                "network" => state.network = map.next_value()?,
                "recording" => state.recording = map.next_value()?,
                "extensions" => state.extensions = map.next_value()?,
                _ => {
                    let value: RawPayload = map.next_value()?;
                    state.extra.insert(key, value);
                }
            }
        }

        state.version = version.ok_or_else(|| A::Error::missing_field("version"))?;
        state.timestamp = timestamp.ok_or_else(|| A::Error::missing_field("timestamp"))?;
        Ok(state)
    }
}

impl BrowserSessionState {
    /// Creates an empty state for `origin`, stamped with the current time.
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            version: STATE_SCHEMA_VERSION.to_string(),
            timestamp: now_millis(),
            origin: origin.into(),
            storage: StorageSnapshot::default(),
            dom: None,
            history: None,
            network: None,
            recording: None,
            extensions: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_cookies(mut self, cookies: Vec<Cookie>) -> Self {
        self.storage.cookies = cookies;
        self
    }

    pub fn with_local_storage(mut self, local_storage: StorageMap) -> Self {
        self.storage.local_storage = local_storage;
        self
    }

    pub fn with_session_storage(mut self, session_storage: StorageMap) -> Self {
        self.storage.session_storage = session_storage;
        self
    }
}
