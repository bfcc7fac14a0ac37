//! Local persistence for cached contribution aggregates.
//!
//! Aggregates are cached in a key-value store: a local `SQLite` database when
//! one is configured, process memory otherwise. The `SQLite` schema is managed
//! with embedded Diesel migrations so the database can be created and
//! upgraded consistently across machines.

mod contribution_cache;
mod error;
mod migrator;
mod store;

pub use contribution_cache::{
    CACHE_KEY_PREFIX, CACHE_SCHEMA_VERSION, CacheEntry, CacheKey, CachePolicy, CacheScope,
    ContributionCache, DEFAULT_FRESHNESS, DEFAULT_RETENTION,
};
pub use error::PersistenceError;
pub use migrator::{
    CURRENT_SCHEMA_VERSION, MIGRATIONS, SchemaVersion, migrate_database, open_cache_store,
};
pub use store::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
