//! Cache store selection and clearing.

use std::io::Write;
use std::sync::Arc;

use chrono::Utc;
use tally::persistence::{
    CacheScope, ContributionCache, MemoryKeyValueStore, open_cache_store,
};
use tally::telemetry::NoopTelemetrySink;
use tally::{ContributionAggregator, ForgeError, TallyConfig};

use super::CliError;

/// Opens the contribution cache and purges expired entries.
///
/// With a `database_url` the database is migrated first and the cache
/// persists across runs; without one it lives in memory for this process.
///
/// # Errors
///
/// Returns [`ForgeError::Configuration`] for an invalid cache policy and the
/// persistence error when the database cannot be migrated.
pub fn open(config: &TallyConfig) -> Result<ContributionCache, CliError> {
    let policy = config.cache_policy()?;
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::debug!("no database_url configured; caching in memory");
        return Ok(ContributionCache::new(
            Arc::new(MemoryKeyValueStore::new()),
            policy,
        ));
    };

    let store = open_cache_store(database_url, &NoopTelemetrySink)?;
    let cache = ContributionCache::new(Arc::new(store), policy);
    let purged = cache.sweep(Utc::now());
    if purged > 0 {
        tracing::debug!(purged, "expired cache entries purged");
    }
    Ok(cache)
}

/// Removes the cached aggregate for the configured repository and
/// contributors, or every aggregate when no contributors are configured.
///
/// # Errors
///
/// Returns [`ForgeError`] when contributors are configured without a valid
/// repository, and the persistence error when the store cannot be updated.
pub fn clear<W: Write>(
    config: &TallyConfig,
    cache: &ContributionCache,
    writer: &mut W,
) -> Result<(), CliError> {
    let scope = clear_scope(config)?;
    let removed = cache.clear(&scope)?;
    writeln!(writer, "Removed {removed} cached aggregate(s)")?;
    Ok(())
}

fn clear_scope(config: &TallyConfig) -> Result<CacheScope, ForgeError> {
    if config.contributor_list().is_empty() {
        return Ok(CacheScope::All);
    }
    let request = config.fetch_request()?;
    Ok(CacheScope::Key(ContributionAggregator::cache_key(&request)))
}
