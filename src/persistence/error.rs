//! Error types for local persistence operations.

use thiserror::Error;

/// Errors returned by the cache stores and the `SQLite` migrator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PersistenceError {
    /// The database URL/path was present but blank.
    #[error("database URL must not be blank")]
    BlankDatabaseUrl,

    /// Establishing a `SQLite` connection failed.
    #[error("failed to connect to SQLite database: {message}")]
    ConnectionFailed {
        /// Error detail from Diesel.
        message: String,
    },

    /// Running pending migrations failed.
    #[error("failed to run database migrations: {message}")]
    MigrationFailed {
        /// Error detail from Diesel migrations.
        message: String,
    },

    /// Applying a connection PRAGMA failed.
    #[error("failed to configure SQLite connection: {message}")]
    PragmaFailed {
        /// Error detail from the PRAGMA execution.
        message: String,
    },

    /// Reading the schema version from the migration table failed.
    #[error("failed to read schema version after migrations: {message}")]
    SchemaVersionQueryFailed {
        /// Error detail from Diesel query execution.
        message: String,
    },

    /// The migrations completed but no schema version could be found.
    #[error("no schema version recorded after migrations ran")]
    MissingSchemaVersion,

    /// The cache table does not exist yet.
    #[error("cache schema is missing; run with --migrate-db first")]
    SchemaNotInitialised,

    /// Reading from the store failed.
    #[error("cache query failed: {message}")]
    QueryFailed {
        /// Error detail from the store.
        message: String,
    },

    /// Writing to the store failed for a reason other than quota.
    #[error("cache write failed: {message}")]
    WriteFailed {
        /// Error detail from the store.
        message: String,
    },

    /// The store has no room for the value.
    #[error("cache storage quota exceeded")]
    QuotaExceeded,

    /// A stored entry could not be parsed.
    #[error("cache entry {key} is corrupt: {message}")]
    CacheCorrupt {
        /// Key of the malformed entry.
        key: String,
        /// Parser error detail.
        message: String,
    },

    /// A cache write was abandoned after the sweep-and-retry also failed.
    #[error("cache write abandoned: {message}")]
    CacheWriteFailed {
        /// Error from the final attempt.
        message: String,
    },
}
