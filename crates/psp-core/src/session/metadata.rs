//! Session identity and discovery fields.

use serde::{Deserialize, Serialize};

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Identity and discovery fields for a stored session.
///
/// Metadata is independent of the captured browser content and is what
/// `list` returns, so backends can serve listings without reading full
/// session bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    /// Opaque unique identifier, used as the sole storage key
    pub id: String,
    /// Human-readable display name
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Tags in insertion order
    #[serde(default)]
    pub tags: Vec<String>,
    /// Creation time (ms since epoch)
    pub created_at: i64,
    /// Last successful save (ms since epoch)
    pub updated_at: i64,
}

impl SessionMetadata {
    /// Creates metadata with a fresh UUID v4 id and both timestamps set to now.
    pub fn new(name: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates metadata for an explicit id.
    pub fn with_id(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::new(name)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replaces the tag list, dropping duplicates while keeping first-seen order.
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for tag in tags {
            let tag = tag.into();
            if !unique.contains(&tag) {
                unique.push(tag);
            }
        }
        self.tags = unique;
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Sets `updated_at` for a write happening at `now`.
    ///
    /// Never moves either timestamp backwards.
    pub fn touch(&mut self, now: i64) {
        self.updated_at = now.max(self.updated_at).max(self.created_at);
    }
}
