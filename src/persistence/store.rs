//! Narrow key-value stores behind the contribution cache.
//!
//! The cache only needs string reads, writes, deletes, and a prefix listing,
//! so storage is hidden behind [`KeyValueStore`]. [`SqliteKeyValueStore`]
//! persists entries across runs; [`MemoryKeyValueStore`] keeps them for the
//! lifetime of the process and backs the tests.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use diesel::Connection;
use diesel::OptionalExtension;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::connection::SimpleConnection;
use diesel::result::Error as DieselError;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};
use diesel::sqlite::SqliteConnection;

use super::PersistenceError;

const CONTRIBUTION_CACHE_TABLE: &str = "contribution_cache";

/// String key-value storage used by the contribution cache.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the store cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::QuotaExceeded`] when the store is full, or
    /// another [`PersistenceError`] when the write fails.
    fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Removes `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the delete fails.
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;

    /// Lists every key starting with `prefix`, in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the store cannot be read.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, PersistenceError>;
}

/// SQLite-backed store using the `contribution_cache` table.
///
/// Each operation opens its own connection, so the store is cheap to share
/// and never holds the database open between runs.
#[derive(Debug, Clone)]
pub struct SqliteKeyValueStore {
    database_url: String,
    max_page_count: Option<u32>,
}

impl SqliteKeyValueStore {
    /// Create a store targeting the configured `database_url`.
    ///
    /// The schema must already exist; see
    /// [`migrate_database`](super::migrate_database).
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::BlankDatabaseUrl`] when the URL is blank.
    pub fn new(database_url: impl Into<String>) -> Result<Self, PersistenceError> {
        let database_url_string = database_url.into();
        if database_url_string.trim().is_empty() {
            return Err(PersistenceError::BlankDatabaseUrl);
        }
        Ok(Self {
            database_url: database_url_string,
            max_page_count: None,
        })
    }

    /// Caps the database size in pages, turning `SQLITE_FULL` into
    /// [`PersistenceError::QuotaExceeded`] once the cap is reached.
    ///
    /// `SQLite` never lowers the cap below the current database size.
    #[must_use]
    pub const fn with_max_page_count(mut self, pages: u32) -> Self {
        self.max_page_count = Some(pages);
        self
    }

    fn establish_connection(&self) -> Result<SqliteConnection, PersistenceError> {
        let mut connection = SqliteConnection::establish(&self.database_url).map_err(|error| {
            PersistenceError::ConnectionFailed {
                message: error.to_string(),
            }
        })?;

        if let Some(pages) = self.max_page_count {
            connection
                .batch_execute(&format!("PRAGMA max_page_count = {pages};"))
                .map_err(|error| PersistenceError::PragmaFailed {
                    message: error.to_string(),
                })?;
        }

        Ok(connection)
    }

    fn cache_table_exists(connection: &mut SqliteConnection) -> Result<bool, DieselError> {
        #[derive(Debug, QueryableByName)]
        struct Row {
            #[diesel(sql_type = BigInt)]
            count: i64,
        }

        let row: Row = sql_query(
            "SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = ?;",
        )
        .bind::<Text, _>(CONTRIBUTION_CACHE_TABLE)
        .get_result(connection)?;

        Ok(row.count > 0)
    }

    fn map_error_with_schema_check<F>(
        connection: &mut SqliteConnection,
        error: &DieselError,
        create_error: F,
    ) -> PersistenceError
    where
        F: Fn(String) -> PersistenceError,
    {
        match Self::cache_table_exists(connection) {
            Ok(false) => PersistenceError::SchemaNotInitialised,
            Ok(true) => create_error(error.to_string()),
            Err(check_error) => create_error(format!(
                "schema presence check failed: {check_error}; original error: {error}"
            )),
        }
    }

    fn map_query_error(connection: &mut SqliteConnection, error: &DieselError) -> PersistenceError {
        Self::map_error_with_schema_check(connection, error, |message| {
            PersistenceError::QueryFailed { message }
        })
    }

    fn map_write_error(connection: &mut SqliteConnection, error: &DieselError) -> PersistenceError {
        if is_storage_full(error) {
            return PersistenceError::QuotaExceeded;
        }
        Self::map_error_with_schema_check(connection, error, |message| {
            PersistenceError::WriteFailed { message }
        })
    }
}

/// `SQLITE_FULL` surfaces as "database or disk is full".
fn is_storage_full(error: &DieselError) -> bool {
    matches!(error, DieselError::DatabaseError(_, info) if info.message().contains("is full"))
}

impl KeyValueStore for SqliteKeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        #[derive(Debug, QueryableByName)]
        struct Row {
            #[diesel(sql_type = Text)]
            payload: String,
        }

        let mut connection = self.establish_connection()?;

        let row: Option<Row> =
            sql_query("SELECT payload FROM contribution_cache WHERE cache_key = ? LIMIT 1;")
                .bind::<Text, _>(key)
                .get_result(&mut connection)
                .optional()
                .map_err(|error| Self::map_query_error(&mut connection, &error))?;

        Ok(row.map(|found| found.payload))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut connection = self.establish_connection()?;

        sql_query(
            "INSERT INTO contribution_cache (cache_key, payload) VALUES (?, ?) \
             ON CONFLICT(cache_key) DO UPDATE SET \
               payload = excluded.payload, \
               updated_at = CURRENT_TIMESTAMP;",
        )
        .bind::<Text, _>(key)
        .bind::<Text, _>(value)
        .execute(&mut connection)
        .map(drop)
        .map_err(|error| Self::map_write_error(&mut connection, &error))
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        let mut connection = self.establish_connection()?;

        sql_query("DELETE FROM contribution_cache WHERE cache_key = ?;")
            .bind::<Text, _>(key)
            .execute(&mut connection)
            .map(drop)
            .map_err(|error| Self::map_write_error(&mut connection, &error))
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, PersistenceError> {
        #[derive(Debug, QueryableByName)]
        struct Row {
            #[diesel(sql_type = Text)]
            cache_key: String,
        }

        let mut connection = self.establish_connection()?;

        let rows: Vec<Row> = sql_query(
            "SELECT cache_key FROM contribution_cache \
             WHERE instr(cache_key, ?) = 1 \
             ORDER BY cache_key;",
        )
        .bind::<Text, _>(prefix)
        .load(&mut connection)
        .map_err(|error| Self::map_query_error(&mut connection, &error))?;

        Ok(rows.into_iter().map(|row| row.cache_key).collect())
    }
}

/// Process-local store with an optional byte quota.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryKeyValueStore {
    /// Creates an empty, unbounded store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store holding at most `bytes` of keys and values.
    #[must_use]
    pub fn with_quota_bytes(bytes: usize) -> Self {
        Self {
            entries: Mutex::default(),
            quota_bytes: Some(bytes),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>, PersistenceError> {
        self.entries.lock().map_err(|_| PersistenceError::QueryFailed {
            message: "memory store lock poisoned".to_owned(),
        })
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut entries = self.lock()?;

        if let Some(quota) = self.quota_bytes {
            let others: usize = entries
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(existing, stored)| existing.len() + stored.len())
                .sum();
            if others + key.len() + value.len() > quota {
                return Err(PersistenceError::QuotaExceeded);
            }
        }

        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, PersistenceError> {
        Ok(self
            .lock()?
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{KeyValueStore, MemoryKeyValueStore};
    use crate::persistence::PersistenceError;

    #[rstest]
    fn memory_store_round_trips_and_lists_by_prefix() {
        let store = MemoryKeyValueStore::new();
        store.write("p_b", "2").expect("write should succeed");
        store.write("p_a", "1").expect("write should succeed");
        store.write("q_a", "3").expect("write should succeed");

        assert_eq!(store.read("p_a").expect("read should succeed"), Some("1".to_owned()));
        assert_eq!(
            store.keys_with_prefix("p_").expect("listing should succeed"),
            vec!["p_a".to_owned(), "p_b".to_owned()]
        );

        store.remove("p_a").expect("remove should succeed");
        store.remove("missing").expect("removing a missing key is fine");
        assert_eq!(store.read("p_a").expect("read should succeed"), None);
    }

    #[rstest]
    fn memory_store_enforces_quota_excluding_replaced_value() {
        let store = MemoryKeyValueStore::with_quota_bytes(10);
        store.write("k", "123456789").expect("fits exactly");

        store.write("k", "987654321").expect("replacing frees the old value");

        assert_eq!(store.write("x", "1"), Err(PersistenceError::QuotaExceeded));
    }
}
