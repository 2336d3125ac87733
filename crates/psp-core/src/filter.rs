//! Listing filters shared by every storage provider.
//!
//! Backends may use their own structures to narrow the candidate set, but the
//! final filtering, ordering and pagination always go through
//! [`SessionFilter::apply`] so results are identical across backends.

use crate::error::{PspError, Result};
use crate::session::SessionMetadata;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Inclusive millisecond bounds; a missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(default)]
    pub from: Option<i64>,
    #[serde(default)]
    pub to: Option<i64>,
}

impl TimeRange {
    pub fn new(from: Option<i64>, to: Option<i64>) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        self.from.is_none_or(|from| timestamp >= from) && self.to.is_none_or(|to| timestamp <= to)
    }

    fn is_inverted(&self) -> bool {
        matches!((self.from, self.to), (Some(from), Some(to)) if from > to)
    }
}

/// Criteria for `StorageProvider::list`.
///
/// All criteria are AND-combined. Results are ordered by `updated_at`
/// descending (ties broken by `created_at` descending, then `id`) before
/// `offset` and `limit` are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFilter {
    /// Case-insensitive substring match on the session name
    #[serde(default)]
    pub name: Option<String>,
    /// Every listed tag must be present on the session
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created: Option<TimeRange>,
    #[serde(default)]
    pub updated: Option<TimeRange>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

impl SessionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn created_between(mut self, from: Option<i64>, to: Option<i64>) -> Self {
        self.created = Some(TimeRange::new(from, to));
        self
    }

    pub fn updated_between(mut self, from: Option<i64>, to: Option<i64>) -> Self {
        self.updated = Some(TimeRange::new(from, to));
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Rejects filters that can never be satisfied because they are malformed.
    pub fn validate(&self) -> Result<()> {
        if self.tags.iter().any(|tag| tag.is_empty()) {
            return Err(PspError::validation("tag filter contains an empty tag"));
        }
        if self.created.is_some_and(|range| range.is_inverted()) {
            return Err(PspError::validation(
                "created.from must not be later than created.to",
            ));
        }
        if self.updated.is_some_and(|range| range.is_inverted()) {
            return Err(PspError::validation(
                "updated.from must not be later than updated.to",
            ));
        }
        Ok(())
    }

    /// Returns true if `metadata` satisfies every criterion except pagination.
    pub fn matches(&self, metadata: &SessionMetadata) -> bool {
        if let Some(name) = &self.name {
            let needle = name.to_lowercase();
            if !metadata.name.to_lowercase().contains(&needle) {
                return false;
            }
        }

        if !self.tags.iter().all(|tag| metadata.has_tag(tag)) {
            return false;
        }

        if let Some(range) = &self.created {
            if !range.contains(metadata.created_at) {
                return false;
            }
        }

        if let Some(range) = &self.updated {
            if !range.contains(metadata.updated_at) {
                return false;
            }
        }

        true
    }

    /// Filters, orders and paginates a candidate set.
    pub fn apply(&self, candidates: Vec<SessionMetadata>) -> Vec<SessionMetadata> {
        let mut matched: Vec<SessionMetadata> = candidates
            .into_iter()
            .filter(|metadata| self.matches(metadata))
            .collect();

        sort_by_recency(&mut matched);

        matched
            .into_iter()
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

/// Orders metadata most recently updated first.
pub fn sort_by_recency(sessions: &mut [SessionMetadata]) {
    sessions.sort_by(recency_order);
}

fn recency_order(a: &SessionMetadata, b: &SessionMetadata) -> Ordering {
    b.updated_at
        .cmp(&a.updated_at)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(id: &str, name: &str, tags: &[&str], created_at: i64, updated_at: i64) -> SessionMetadata {
        SessionMetadata {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at,
            updated_at,
        }
    }

    fn ids(sessions: &[SessionMetadata]) -> Vec<&str> {
        sessions.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn test_orders_by_updated_at_descending() {
        let sessions = vec![
            meta("A", "a", &[], 0, 100),
            meta("B", "b", &[], 0, 300),
            meta("C", "c", &[], 0, 200),
        ];
        let result = SessionFilter::default().apply(sessions);
        assert_eq!(ids(&result), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_ties_are_deterministic() {
        let sessions = vec![
            meta("b", "x", &[], 10, 50),
            meta("a", "x", &[], 10, 50),
            meta("c", "x", &[], 20, 50),
        ];
        let result = SessionFilter::default().apply(sessions);
        assert_eq!(ids(&result), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_tags_are_all_of() {
        let sessions = vec![meta("s", "x", &["prod", "auth"], 0, 1)];

        let both = SessionFilter::new().with_tags(["prod", "auth"]);
        assert_eq!(both.apply(sessions.clone()).len(), 1);

        let mismatch = SessionFilter::new().with_tags(["prod", "staging"]);
        assert!(mismatch.apply(sessions).is_empty());
    }

    #[test]
    fn test_name_is_case_insensitive_substring() {
        let sessions = vec![
            meta("1", "GitHub Login", &[], 0, 1),
            meta("2", "gitlab", &[], 0, 2),
            meta("3", "Jira", &[], 0, 3),
        ];
        let result = SessionFilter::new().with_name("GIT").apply(sessions);
        assert_eq!(ids(&result), vec!["2", "1"]);
    }

    #[test]
    fn test_time_ranges_are_inclusive() {
        let sessions = vec![
            meta("1", "x", &[], 100, 1000),
            meta("2", "x", &[], 200, 2000),
            meta("3", "x", &[], 300, 3000),
        ];

        let created = SessionFilter::new().created_between(Some(100), Some(200));
        assert_eq!(ids(&created.apply(sessions.clone())), vec!["2", "1"]);

        let updated = SessionFilter::new().updated_between(Some(2000), None);
        assert_eq!(ids(&updated.apply(sessions)), vec!["3", "2"]);
    }

    #[test]
    fn test_pagination_after_sorting() {
        let sessions: Vec<_> = (1..=5)
            .map(|i| meta(&format!("s{i}"), "x", &[], 0, i * 100))
            .collect();

        let page = SessionFilter::new().with_limit(2).with_offset(1).apply(sessions);
        assert_eq!(ids(&page), vec!["s4", "s3"]);
    }

    #[test]
    fn test_offset_past_end_is_empty() {
        let sessions = vec![meta("1", "x", &[], 0, 1)];
        assert!(SessionFilter::new().with_offset(5).apply(sessions).is_empty());
    }

    #[test]
    fn test_validate() {
        assert!(SessionFilter::default().validate().is_ok());
        assert!(
            SessionFilter::new()
                .with_tags([""])
                .validate()
                .unwrap_err()
                .is_validation()
        );
        assert!(
            SessionFilter::new()
                .updated_between(Some(10), Some(5))
                .validate()
                .is_err()
        );
        assert!(
            SessionFilter::new()
                .created_between(Some(5), Some(5))
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_deserialize_from_camel_case() {
        let filter: SessionFilter = serde_json::from_str(
            r#"{"name":"git","tags":["prod"],"updated":{"from":1},"limit":10}"#,
        )
        .unwrap();
        assert_eq!(filter.name.as_deref(), Some("git"));
        assert_eq!(filter.updated, Some(TimeRange::new(Some(1), None)));
        assert_eq!(filter.offset, None);
    }
}
