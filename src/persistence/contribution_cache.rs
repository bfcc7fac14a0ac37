//! Time-boxed cache of contribution aggregates.
//!
//! Entries are stored as the JSON envelope `{"data": ..., "timestamp": ...}`
//! with the timestamp in Unix milliseconds. An entry is served on normal reads
//! while its age is within the freshness threshold, stays readable as a stale
//! fallback until a sweep removes it past the retention ceiling, and is
//! removed eagerly when it cannot be parsed.
//!
//! Caching is best-effort: reads that fail count as misses and failed writes
//! are reported as [`PersistenceError::CacheWriteFailed`] for the caller to
//! log.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PersistenceError;
use super::store::KeyValueStore;
use crate::contributions::model::{Contributor, ContributionSet};
use crate::github::locator::RepositorySlug;

/// Prefix shared by every contribution cache key.
pub const CACHE_KEY_PREFIX: &str = "tally_contributions_";

/// Schema tag embedded in cache keys; bump it when [`ContributionSet`]
/// changes shape.
pub const CACHE_SCHEMA_VERSION: &str = "v2";

/// Default age after which entries are ignored on normal reads.
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(60 * 60);

/// Default age after which entries are purged by a sweep.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

/// Deterministic key scoping a cached aggregate to its inputs.
///
/// # Example
///
/// ```
/// use tally::contributions::Contributor;
/// use tally::github::RepositorySlug;
/// use tally::persistence::CacheKey;
///
/// let repository = RepositorySlug::parse("o/r").expect("slug should parse");
/// let key = CacheKey::new(&repository, &Contributor::unique(["bob", "alice"]));
/// assert_eq!(key.as_str(), "tally_contributions_v2_o/r_alice,bob");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for the current schema version.
    #[must_use]
    pub fn new(repository: &RepositorySlug, contributors: &[Contributor]) -> Self {
        Self::with_schema_version(repository, contributors, CACHE_SCHEMA_VERSION)
    }

    /// Key for an explicit schema version.
    ///
    /// Contributor order does not matter; logins are sorted before joining.
    #[must_use]
    pub fn with_schema_version(
        repository: &RepositorySlug,
        contributors: &[Contributor],
        schema_version: &str,
    ) -> Self {
        let mut logins: Vec<&str> = contributors.iter().map(Contributor::login).collect();
        logins.sort_unstable();
        Self(format!(
            "{CACHE_KEY_PREFIX}{schema_version}_{repository}_{}",
            logins.join(",")
        ))
    }

    /// Borrow the key.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Which entries [`ContributionCache::clear`] removes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheScope {
    /// One key.
    Key(CacheKey),
    /// Every key under [`CACHE_KEY_PREFIX`].
    All,
}

/// Freshness threshold and retention ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Entries older than this are ignored on normal reads.
    pub freshness: Duration,
    /// Entries older than this are purged by a sweep.
    pub retention: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            freshness: DEFAULT_FRESHNESS,
            retention: DEFAULT_RETENTION,
        }
    }
}

/// A cached aggregate with its write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cached aggregate.
    pub data: ContributionSet,
    /// Write time in Unix milliseconds.
    pub timestamp: i64,
}

impl CacheEntry {
    /// Age of the entry at `now` in milliseconds; negative under clock skew.
    #[must_use]
    pub const fn age_millis(&self, now_millis: i64) -> i64 {
        now_millis.saturating_sub(self.timestamp)
    }

    fn is_within(&self, limit: Duration, now_millis: i64) -> bool {
        let limit_millis = i64::try_from(limit.as_millis()).unwrap_or(i64::MAX);
        self.age_millis(now_millis) <= limit_millis
    }
}

#[derive(Serialize)]
struct EntryRef<'data> {
    data: &'data ContributionSet,
    timestamp: i64,
}

/// Contribution cache over a [`KeyValueStore`].
#[derive(Clone)]
pub struct ContributionCache {
    store: Arc<dyn KeyValueStore>,
    policy: CachePolicy,
}

impl fmt::Debug for ContributionCache {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ContributionCache")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ContributionCache {
    /// Creates a cache over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, policy: CachePolicy) -> Self {
        Self { store, policy }
    }

    /// Active freshness and retention settings.
    #[must_use]
    pub const fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Returns the entry for `key` when it is still fresh at `now`.
    #[must_use]
    pub fn get(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<CacheEntry> {
        let entry = self.load(key.as_str())?;
        if entry.is_within(self.policy.freshness, now.timestamp_millis()) {
            tracing::debug!(key = %key, "fresh cache hit");
            Some(entry)
        } else {
            tracing::debug!(key = %key, "cache entry expired");
            None
        }
    }

    /// Returns the entry for `key` regardless of age.
    #[must_use]
    pub fn get_stale(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.load(key.as_str())
    }

    /// Writes `data` under `key` stamped with `now`.
    ///
    /// When the store reports [`PersistenceError::QuotaExceeded`] the cache
    /// sweeps expired entries once and retries.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::CacheWriteFailed`] when the write (or its
    /// retry) fails. Callers are expected to log and continue.
    pub fn set(
        &self,
        key: &CacheKey,
        data: &ContributionSet,
        now: DateTime<Utc>,
    ) -> Result<(), PersistenceError> {
        let payload = serde_json::to_string(&EntryRef {
            data,
            timestamp: now.timestamp_millis(),
        })
        .map_err(|error| PersistenceError::CacheWriteFailed {
            message: error.to_string(),
        })?;

        let outcome = match self.store.write(key.as_str(), &payload) {
            Err(PersistenceError::QuotaExceeded) => {
                let removed = self.sweep(now);
                tracing::debug!(key = %key, removed, "quota exceeded; retrying after sweep");
                self.store.write(key.as_str(), &payload)
            }
            other => other,
        };

        outcome.map_err(|error| PersistenceError::CacheWriteFailed {
            message: error.to_string(),
        })
    }

    /// Removes entries older than the retention ceiling and entries that do
    /// not parse. Returns the number removed.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let keys = match self.store.keys_with_prefix(CACHE_KEY_PREFIX) {
            Ok(keys) => keys,
            Err(error) => {
                tracing::warn!(error = %error, "cache sweep could not list keys");
                return 0;
            }
        };

        let now_millis = now.timestamp_millis();
        let mut removed = 0;
        for key in keys {
            let expired = match self.store.read(&key) {
                Ok(Some(raw)) => !serde_json::from_str::<CacheEntry>(&raw)
                    .is_ok_and(|entry| entry.is_within(self.policy.retention, now_millis)),
                Ok(None) => false,
                Err(error) => {
                    tracing::debug!(key, error = %error, "cache sweep skipped unreadable key");
                    false
                }
            };
            if expired && self.remove_quietly(&key) {
                removed += 1;
            }
        }
        removed
    }

    /// Removes the entries selected by `scope`. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the store cannot be listed or an
    /// entry cannot be removed.
    pub fn clear(&self, scope: &CacheScope) -> Result<usize, PersistenceError> {
        match scope {
            CacheScope::Key(key) => {
                let existed = self.store.read(key.as_str())?.is_some();
                self.store.remove(key.as_str())?;
                Ok(usize::from(existed))
            }
            CacheScope::All => {
                let keys = self.store.keys_with_prefix(CACHE_KEY_PREFIX)?;
                for key in &keys {
                    self.store.remove(key)?;
                }
                Ok(keys.len())
            }
        }
    }

    fn load(&self, key: &str) -> Option<CacheEntry> {
        let raw = match self.store.read(key) {
            Ok(raw) => raw?,
            Err(error) => {
                tracing::warn!(key, error = %error, "cache read failed; treating as miss");
                return None;
            }
        };

        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => Some(entry),
            Err(error) => {
                let corrupt = PersistenceError::CacheCorrupt {
                    key: key.to_owned(),
                    message: error.to_string(),
                };
                tracing::warn!(error = %corrupt, "removing corrupt cache entry");
                self.remove_quietly(key);
                None
            }
        }
    }

    fn remove_quietly(&self, key: &str) -> bool {
        match self.store.remove(key) {
            Ok(()) => true,
            Err(error) => {
                tracing::debug!(key, error = %error, "could not remove cache entry");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests;
