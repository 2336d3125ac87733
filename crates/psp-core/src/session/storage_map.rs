//! Two-level origin → key → value storage structure.

use std::collections::BTreeMap;

/// Entries stored for a single origin, keyed by storage key.
pub type OriginEntries = BTreeMap<String, String>;

/// The captured contents of `localStorage` or `sessionStorage` for every
/// origin visited during a session.
///
/// The outer level is keyed by origin (`https://app.example.com`), the inner
/// level by storage key. All values are strings, exactly as the Web Storage
/// API exposes them. A missing origin simply means no entries were captured
/// for it.
///
/// Serialization goes through [`crate::codec::storage_map`] so every backend
/// shares one JSON representation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageMap(BTreeMap<String, OriginEntries>);

impl StorageMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entries captured for `origin`, if any.
    pub fn get(&self, origin: &str) -> Option<&OriginEntries> {
        self.0.get(origin)
    }

    /// Returns a single stored value.
    pub fn get_item(&self, origin: &str, key: &str) -> Option<&str> {
        self.0
            .get(origin)
            .and_then(|entries| entries.get(key))
            .map(String::as_str)
    }

    /// Sets a value, creating the origin entry on first use.
    ///
    /// Returns the previous value for the key, if any.
    pub fn set_item(
        &mut self,
        origin: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        self.0
            .entry(origin.into())
            .or_default()
            .insert(key.into(), value.into())
    }

    /// Replaces every entry for `origin`.
    pub fn insert_origin(&mut self, origin: impl Into<String>, entries: OriginEntries) {
        self.0.insert(origin.into(), entries);
    }

    pub fn remove_origin(&mut self, origin: &str) -> Option<OriginEntries> {
        self.0.remove(origin)
    }

    pub fn origins(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &OriginEntries)> {
        self.0.iter()
    }

    /// Number of origins with captured entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the first empty origin or storage key, if one exists.
    ///
    /// Used by the save path to reject maps that violate the non-empty key
    /// invariant before anything is written.
    pub fn find_empty_key(&self) -> Option<EmptyKey<'_>> {
        for (origin, entries) in &self.0 {
            if origin.is_empty() {
                return Some(EmptyKey::Origin);
            }
            if entries.contains_key("") {
                return Some(EmptyKey::StorageKey { origin });
            }
        }
        None
    }
}

/// Location of an empty key found by [`StorageMap::find_empty_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyKey<'a> {
    Origin,
    StorageKey { origin: &'a str },
}

impl From<BTreeMap<String, OriginEntries>> for StorageMap {
    fn from(map: BTreeMap<String, OriginEntries>) -> Self {
        Self(map)
    }
}

impl From<StorageMap> for BTreeMap<String, OriginEntries> {
    fn from(map: StorageMap) -> Self {
        map.0
    }
}

impl<O, K, V> FromIterator<(O, K, V)> for StorageMap
where
    O: Into<String>,
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (O, K, V)>>(iter: I) -> Self {
        let mut map = StorageMap::new();
        for (origin, key, value) in iter {
            map.set_item(origin, key, value);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get_item() {
        let mut map = StorageMap::new();
        assert!(map.set_item("https://a.com", "k", "v").is_none());
        assert_eq!(
            map.set_item("https://a.com", "k", "v2"),
            Some("v".to_string())
        );

        assert_eq!(map.get_item("https://a.com", "k"), Some("v2"));
        assert_eq!(map.get_item("https://b.com", "k"), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_missing_origin_is_not_an_error() {
        let map = StorageMap::new();
        assert!(map.get("https://nowhere.test").is_none());
        assert!(map.is_empty());
    }

    #[test]
    fn test_find_empty_key() {
        let mut map: StorageMap = [("https://a.com", "k", "v")].into_iter().collect();
        assert_eq!(map.find_empty_key(), None);

        map.set_item("https://a.com", "", "x");
        assert_eq!(
            map.find_empty_key(),
            Some(EmptyKey::StorageKey {
                origin: "https://a.com"
            })
        );

        let mut map = StorageMap::new();
        map.insert_origin("", OriginEntries::new());
        assert_eq!(map.find_empty_key(), Some(EmptyKey::Origin));
    }

    #[test]
    fn test_remove_origin() {
        let mut map: StorageMap = [("https://a.com", "k", "v"), ("https://b.com", "k", "v")]
            .into_iter()
            .collect();
        assert!(map.remove_origin("https://a.com").is_some());
        assert_eq!(map.origins().collect::<Vec<_>>(), vec!["https://b.com"]);
    }
}
