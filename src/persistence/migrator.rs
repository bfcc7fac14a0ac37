//! Diesel-backed schema management for the cache database.

use diesel::Connection;
use diesel::OptionalExtension;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::Text;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use crate::telemetry::{TelemetryEvent, TelemetrySink};

use super::PersistenceError;
use super::store::SqliteKeyValueStore;

/// Embedded Diesel migrations shipped with the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Schema version recorded by the newest embedded migration.
pub const CURRENT_SCHEMA_VERSION: &str = "20260105000000";

/// A Diesel migration version string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaVersion(String);

impl SchemaVersion {
    /// Returns the inner version string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when this is the newest schema this build knows about.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.0 == CURRENT_SCHEMA_VERSION
    }
}

/// Creates or upgrades the cache schema and records the resulting schema
/// version in telemetry. Running it against an up-to-date database is a
/// no-op apart from the telemetry event.
///
/// # Errors
///
/// Returns [`PersistenceError`] when the database cannot be opened, migrations
/// fail, or the resulting schema version cannot be read.
pub fn migrate_database(
    database_url: &str,
    telemetry: &dyn TelemetrySink,
) -> Result<SchemaVersion, PersistenceError> {
    let database_url_trimmed = database_url.trim();
    if database_url_trimmed.is_empty() {
        return Err(PersistenceError::BlankDatabaseUrl);
    }

    let mut connection = SqliteConnection::establish(database_url_trimmed).map_err(|error| {
        PersistenceError::ConnectionFailed {
            message: error.to_string(),
        }
    })?;

    let applied = connection
        .run_pending_migrations(MIGRATIONS)
        .map_err(|error| PersistenceError::MigrationFailed {
            message: error.to_string(),
        })?;
    tracing::debug!(applied = applied.len(), "cache migrations applied");

    let schema_version = read_schema_version(&mut connection)?;
    telemetry.record(TelemetryEvent::SchemaVersionRecorded {
        schema_version: schema_version.as_str().to_owned(),
    });

    Ok(schema_version)
}

/// Migrates `database_url` and returns a store over it.
///
/// # Errors
///
/// Returns [`PersistenceError`] when migration fails.
pub fn open_cache_store(
    database_url: &str,
    telemetry: &dyn TelemetrySink,
) -> Result<SqliteKeyValueStore, PersistenceError> {
    migrate_database(database_url, telemetry)?;
    SqliteKeyValueStore::new(database_url.trim())
}

fn read_schema_version(
    connection: &mut SqliteConnection,
) -> Result<SchemaVersion, PersistenceError> {
    #[derive(Debug, QueryableByName)]
    struct Row {
        #[diesel(sql_type = Text)]
        version: String,
    }

    let result: Option<Row> =
        sql_query("SELECT version FROM __diesel_schema_migrations ORDER BY version DESC LIMIT 1;")
            .get_result(connection)
            .optional()
            .map_err(|error| PersistenceError::SchemaVersionQueryFailed {
                message: error.to_string(),
            })?;

    let Some(row) = result else {
        return Err(PersistenceError::MissingSchemaVersion);
    };

    Ok(SchemaVersion(row.version))
}
