//! Behaviour every StorageProvider must share, run against each backend.

#![allow(dead_code)]

use psp_core::{
    BrowserSessionState, Cookie, RawPayload, SameSite, SessionFilter, SessionMetadata, StorageMap,
    StorageProvider, StoredSession, session::now_millis,
};

pub fn create_test_session(id: &str, name: &str, tags: &[&str]) -> StoredSession {
    let mut local = StorageMap::new();
    local.set_item("https://a.com", "k", "v");

    StoredSession::new(
        SessionMetadata::with_id(id, name).with_tags(tags.iter().copied()),
        BrowserSessionState::new("https://a.com").with_local_storage(local),
    )
}

/// A session whose `updated_at` is pinned `offset_ms` into the future, so
/// saves keep it and ordering can be asserted deterministically.
pub fn session_updated_in(id: &str, offset_ms: i64) -> StoredSession {
    let mut session = create_test_session(id, &format!("Session {id}"), &[]);
    session.metadata.updated_at = now_millis() + offset_ms;
    session
}

fn ids(sessions: &[SessionMetadata]) -> Vec<&str> {
    sessions.iter().map(|m| m.id.as_str()).collect()
}

pub async fn check_scenario(provider: &dyn StorageProvider, id: &str) {
    provider
        .save(create_test_session(id, "Test", &["x"]))
        .await
        .unwrap();
    assert!(provider.exists(id).await.unwrap());

    let loaded = provider.load(id).await.unwrap();
    assert_eq!(
        loaded.state.storage.local_storage.get_item("https://a.com", "k"),
        Some("v")
    );

    provider.delete(id).await.unwrap();
    assert!(!provider.exists(id).await.unwrap());
    assert!(provider.load(id).await.unwrap_err().is_not_found());
}

pub async fn check_round_trip(provider: &dyn StorageProvider, id: &str) {
    let mut local = StorageMap::new();
    local.set_item("https://a.com", "k", "v");
    local.set_item("https://a.com", "empty", "");
    local.set_item("http://localhost:8080", "a:b.c", "{\"nested\":[1,2]}");
    let mut session_storage = StorageMap::new();
    session_storage.set_item("https://b.example.org", "step", "3");

    let mut state = BrowserSessionState::new("https://a.com")
        .with_cookies(vec![
            Cookie {
                expires: Some(1_893_456_000.5),
                http_only: true,
                secure: true,
                same_site: SameSite::None,
                ..Cookie::new("sid", "abc", ".a.com")
            },
            Cookie::new("sid", "dup", ".a.com"),
        ])
        .with_local_storage(local)
        .with_session_storage(session_storage);
    state.version = "9.9.9-custom".to_string();
    let history = r#"{"currentUrl":"https://a.com/x","currentIndex":0}"#;
    state.history = Some(RawPayload::from_json(history).unwrap());
    state.extensions = Some(
        RawPayload::from_json(r#"{"visionState":{"zeta":1,"alpha":2.50,"elements":[]}}"#).unwrap(),
    );

    let original = StoredSession::new(
        SessionMetadata::with_id(id, "Round trip")
            .with_description("all the fields")
            .with_tags(["zeta", "alpha", "mid"]),
        state,
    );

    let saved = provider.save(original.clone()).await.unwrap();
    assert!(saved.metadata.updated_at >= original.metadata.updated_at);

    let loaded = provider.load(id).await.unwrap();
    assert_eq!(loaded, saved);
    assert_eq!(loaded.state, original.state);
    assert_eq!(
        loaded.state.extensions.as_ref().map(RawPayload::as_str),
        Some(r#"{"visionState":{"zeta":1,"alpha":2.50,"elements":[]}}"#)
    );
    assert_eq!(loaded.metadata.tags, vec!["zeta", "alpha", "mid"]);

    let mut expected = original.metadata.clone();
    expected.updated_at = loaded.metadata.updated_at;
    assert_eq!(loaded.metadata, expected);

    provider.delete(id).await.unwrap();
}

pub async fn check_overwrite(provider: &dyn StorageProvider, id: &str) {
    provider
        .save(create_test_session(id, "Before", &["old", "shared"]))
        .await
        .unwrap();
    provider
        .save(create_test_session(id, "After", &["shared", "new"]))
        .await
        .unwrap();

    assert_eq!(provider.load(id).await.unwrap().metadata.name, "After");

    let old = provider
        .list(&SessionFilter::new().with_tags(["old"]))
        .await
        .unwrap();
    assert!(!ids(&old).contains(&id));

    let renamed = provider
        .list(&SessionFilter::new().with_name("before"))
        .await
        .unwrap();
    assert!(!ids(&renamed).contains(&id));

    let new = provider
        .list(&SessionFilter::new().with_tags(["shared", "new"]))
        .await
        .unwrap();
    assert_eq!(ids(&new), vec![id]);

    provider.delete(id).await.unwrap();
}

/// Expects an otherwise empty provider.
pub async fn check_list_semantics(provider: &dyn StorageProvider) {
    provider.save(session_updated_in("A", 100_000)).await.unwrap();
    provider.save(session_updated_in("B", 300_000)).await.unwrap();
    provider.save(session_updated_in("C", 200_000)).await.unwrap();

    let all = provider.list(&SessionFilter::default()).await.unwrap();
    assert_eq!(ids(&all), vec!["B", "C", "A"]);

    provider.save(session_updated_in("D", 400_000)).await.unwrap();
    provider.save(session_updated_in("E", 500_000)).await.unwrap();

    let page = provider
        .list(&SessionFilter::new().with_limit(2).with_offset(1))
        .await
        .unwrap();
    assert_eq!(ids(&page), vec!["D", "B"]);

    let named = provider
        .list(&SessionFilter::new().with_name("SESSION c"))
        .await
        .unwrap();
    assert_eq!(ids(&named), vec!["C"]);

    let b_updated = all[0].updated_at;
    let window = provider
        .list(&SessionFilter::new().updated_between(Some(b_updated), Some(b_updated)))
        .await
        .unwrap();
    assert_eq!(ids(&window), vec!["B"]);

    for id in ["A", "B", "C", "D", "E"] {
        provider.delete(id).await.unwrap();
    }
    assert!(provider.list(&SessionFilter::default()).await.unwrap().is_empty());
}

pub async fn check_tag_intersection(provider: &dyn StorageProvider) {
    provider
        .save(create_test_session("tagged", "Tagged", &["prod", "auth"]))
        .await
        .unwrap();
    provider
        .save(create_test_session("prod-only", "Prod only", &["prod"]))
        .await
        .unwrap();

    let both = provider
        .list(&SessionFilter::new().with_tags(["prod", "auth"]))
        .await
        .unwrap();
    assert_eq!(ids(&both), vec!["tagged"]);

    let staging = provider
        .list(&SessionFilter::new().with_tags(["prod", "staging"]))
        .await
        .unwrap();
    assert!(staging.is_empty());

    let prod = provider
        .list(&SessionFilter::new().with_tags(["prod"]))
        .await
        .unwrap();
    assert_eq!(prod.len(), 2);

    provider.delete("tagged").await.unwrap();
    let after_delete = provider
        .list(&SessionFilter::new().with_tags(["auth"]))
        .await
        .unwrap();
    assert!(after_delete.is_empty());

    provider.delete("prod-only").await.unwrap();
}

pub async fn check_validation(provider: &dyn StorageProvider) {
    let err = provider
        .save(create_test_session("", "No id", &[]))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = provider
        .list(&SessionFilter::new().created_between(Some(10), Some(1)))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    for reserved in ["metadata", "index:name", "tags:prod"] {
        let err = provider
            .save(create_test_session(reserved, "Reserved", &["prod"]))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(provider.delete(reserved).await.unwrap_err().is_validation());
        assert!(provider.exists(reserved).await.unwrap_err().is_validation());
        assert!(provider.load(reserved).await.unwrap_err().is_validation());
    }

    provider.delete("nonexistent-id").await.unwrap();
}
