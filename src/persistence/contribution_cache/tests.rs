//! Tests for the contribution cache.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use rstest::{fixture, rstest};

use super::{
    CACHE_KEY_PREFIX, CacheKey, CachePolicy, CacheScope, ContributionCache,
};
use crate::contributions::model::{Contributor, ContributionSet, ContributorRecords};
use crate::github::locator::RepositorySlug;
use crate::persistence::PersistenceError;
use crate::persistence::store::{KeyValueStore, MemoryKeyValueStore, MockKeyValueStore};

fn at(raw: &str) -> DateTime<Utc> {
    raw.parse().expect("timestamp should parse")
}

fn repository(slug: &str) -> RepositorySlug {
    RepositorySlug::parse(slug).expect("slug should parse")
}

fn sample_set(logins: &[&str]) -> ContributionSet {
    ContributionSet::assemble(
        &Contributor::unique(logins),
        ContributorRecords::new(),
        ContributorRecords::new(),
        ContributorRecords::new(),
        ContributorRecords::new(),
    )
}

fn key_for(logins: &[&str]) -> CacheKey {
    CacheKey::new(&repository("o/r"), &Contributor::unique(logins))
}

#[fixture]
fn store() -> Arc<MemoryKeyValueStore> {
    Arc::new(MemoryKeyValueStore::new())
}

fn cache_over(store: &Arc<MemoryKeyValueStore>) -> ContributionCache {
    ContributionCache::new(store.clone(), CachePolicy::default())
}

#[rstest]
fn key_ignores_contributor_order() {
    assert_eq!(key_for(&["bob", "alice"]), key_for(&["alice", "bob"]));
}

#[rstest]
fn key_changes_with_every_input() {
    let base = key_for(&["alice", "bob"]);
    let contributors = Contributor::unique(["alice", "bob"]);

    assert_ne!(base, key_for(&["alice"]));
    assert_ne!(base, CacheKey::new(&repository("o/other"), &contributors));
    assert_ne!(
        base,
        CacheKey::with_schema_version(&repository("o/r"), &contributors, "v3")
    );
}

#[rstest]
fn fresh_entries_are_served_until_threshold(store: Arc<MemoryKeyValueStore>) {
    let cache = cache_over(&store);
    let key = key_for(&["alice"]);
    let written = at("2025-06-01T10:00:00Z");
    cache
        .set(&key, &sample_set(&["alice"]), written)
        .expect("write should succeed");

    let at_threshold = written + TimeDelta::hours(1);
    let past_threshold = at_threshold + TimeDelta::milliseconds(1);

    let entry = cache.get(&key, at_threshold).expect("entry should be fresh");
    assert_eq!(entry.data, sample_set(&["alice"]));
    assert_eq!(entry.timestamp, written.timestamp_millis());
    assert!(cache.get(&key, past_threshold).is_none());
    assert!(
        cache.get_stale(&key).is_some(),
        "expired entries remain available as a fallback"
    );
}

#[rstest]
fn stored_envelope_carries_data_and_timestamp(store: Arc<MemoryKeyValueStore>) {
    let cache = cache_over(&store);
    let key = key_for(&["alice"]);
    let written = at("2025-06-01T10:00:00Z");
    cache
        .set(&key, &sample_set(&["alice"]), written)
        .expect("write should succeed");

    let raw = store
        .read(key.as_str())
        .expect("read should succeed")
        .expect("entry should exist");
    let envelope: serde_json::Value = serde_json::from_str(&raw).expect("payload is JSON");

    assert_eq!(envelope["timestamp"], written.timestamp_millis());
    assert!(envelope["data"]["summary"]["alice"].is_object());
}

#[rstest]
fn corrupt_entries_are_removed_on_read(store: Arc<MemoryKeyValueStore>) {
    let cache = cache_over(&store);
    let key = key_for(&["alice"]);
    store
        .write(key.as_str(), "{not json")
        .expect("write should succeed");

    assert!(cache.get_stale(&key).is_none());
    assert_eq!(store.read(key.as_str()).expect("read should succeed"), None);
}

#[rstest]
fn sweep_removes_expired_and_malformed_entries(store: Arc<MemoryKeyValueStore>) {
    let cache = cache_over(&store);
    let now = at("2025-06-02T12:00:00Z");
    let old = key_for(&["old"]);
    let recent = key_for(&["recent"]);
    cache
        .set(&old, &sample_set(&["old"]), now - TimeDelta::hours(25))
        .expect("write should succeed");
    cache
        .set(&recent, &sample_set(&["recent"]), now - TimeDelta::hours(2))
        .expect("write should succeed");
    store
        .write(&format!("{CACHE_KEY_PREFIX}broken"), "[]")
        .expect("write should succeed");
    store
        .write("unrelated", "[]")
        .expect("write should succeed");

    assert_eq!(cache.sweep(now), 2);
    assert!(cache.get_stale(&old).is_none());
    assert!(cache.get_stale(&recent).is_some());
    assert!(store.read("unrelated").expect("read should succeed").is_some());
}

#[rstest]
fn quota_exhaustion_sweeps_then_retries() {
    let now = at("2025-06-02T12:00:00Z");
    let old = key_for(&["old"]);
    let fresh = key_for(&["fresh"]);
    let unbounded = Arc::new(MemoryKeyValueStore::new());
    cache_over(&unbounded)
        .set(&old, &sample_set(&["old"]), now - TimeDelta::days(2))
        .expect("write should succeed");
    let old_payload = unbounded
        .read(old.as_str())
        .expect("read should succeed")
        .expect("entry should exist");

    let quota = old.as_str().len() + old_payload.len() + 64;
    let bounded = Arc::new(MemoryKeyValueStore::with_quota_bytes(quota));
    bounded
        .write(old.as_str(), &old_payload)
        .expect("old entry fits");
    let cache = cache_over(&bounded);

    cache
        .set(&fresh, &sample_set(&["fresh"]), now)
        .expect("write should succeed after the sweep");

    assert!(cache.get_stale(&old).is_none());
    assert!(cache.get(&fresh, now).is_some());
}

#[rstest]
fn persistent_quota_failure_is_reported() {
    let mut store = MockKeyValueStore::new();
    store
        .expect_write()
        .times(2)
        .returning(|_, _| Err(PersistenceError::QuotaExceeded));
    store
        .expect_keys_with_prefix()
        .times(1)
        .returning(|_| Ok(Vec::new()));
    let cache = ContributionCache::new(Arc::new(store), CachePolicy::default());

    let result = cache.set(
        &key_for(&["alice"]),
        &sample_set(&["alice"]),
        at("2025-06-01T00:00:00Z"),
    );

    assert!(matches!(result, Err(PersistenceError::CacheWriteFailed { .. })));
}

#[rstest]
fn read_failures_count_as_misses() {
    let mut store = MockKeyValueStore::new();
    store.expect_read().returning(|_| {
        Err(PersistenceError::QueryFailed {
            message: "disk I/O error".to_owned(),
        })
    });
    let cache = ContributionCache::new(Arc::new(store), CachePolicy::default());

    assert!(
        cache
            .get(&key_for(&["alice"]), at("2025-06-01T00:00:00Z"))
            .is_none()
    );
}

#[rstest]
fn clear_removes_one_key_or_every_key(store: Arc<MemoryKeyValueStore>) {
    let cache = cache_over(&store);
    let now = at("2025-06-01T00:00:00Z");
    let alice = key_for(&["alice"]);
    let bob = key_for(&["bob"]);
    for (key, login) in [(&alice, "alice"), (&bob, "bob")] {
        cache
            .set(key, &sample_set(&[login]), now)
            .expect("write should succeed");
    }

    assert_eq!(cache.clear(&CacheScope::Key(alice.clone())).expect("clear"), 1);
    assert!(cache.get_stale(&alice).is_none());
    assert!(cache.get_stale(&bob).is_some());

    assert_eq!(cache.clear(&CacheScope::All).expect("clear"), 1);
    assert!(cache.get_stale(&bob).is_none());
}

#[rstest]
fn custom_policy_controls_freshness(store: Arc<MemoryKeyValueStore>) {
    let policy = CachePolicy {
        freshness: Duration::from_secs(60),
        retention: Duration::from_secs(120),
    };
    let cache = ContributionCache::new(store, policy);
    let key = key_for(&["alice"]);
    let written = at("2025-06-01T00:00:00Z");
    cache
        .set(&key, &sample_set(&["alice"]), written)
        .expect("write should succeed");

    assert!(cache.get(&key, written + TimeDelta::seconds(60)).is_some());
    assert!(cache.get(&key, written + TimeDelta::seconds(61)).is_none());
    assert_eq!(cache.sweep(written + TimeDelta::seconds(121)), 1);
}
