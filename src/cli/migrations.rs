//! Database migration operation.

use tally::ForgeError;
use tally::TallyConfig;
use tally::persistence::migrate_database;
use tally::telemetry::StderrJsonlTelemetrySink;

use super::CliError;

/// Runs database migrations.
///
/// # Errors
///
/// Returns [`ForgeError::Configuration`] if the database URL is missing, and
/// the persistence error for blank URLs, connection, or migration failures.
pub fn run(config: &TallyConfig) -> Result<(), CliError> {
    let database_url =
        config
            .database_url
            .as_deref()
            .ok_or_else(|| ForgeError::Configuration {
                message: "database_url is required for --migrate-db (use --database-url)"
                    .to_owned(),
            })?;

    let schema_version = migrate_database(database_url, &StderrJsonlTelemetrySink)?;
    tracing::info!(schema_version = schema_version.as_str(), "database migrated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use tally::TallyConfig;
    use tally::persistence::PersistenceError;

    use super::run;
    use crate::cli::CliError;

    #[rstest]
    fn missing_database_url_is_a_configuration_error() {
        let result = run(&TallyConfig::default());

        assert!(
            matches!(result, Err(CliError::Forge(ref error)) if error.to_string().contains("--database-url")),
            "unexpected result: {result:?}"
        );
    }

    #[rstest]
    fn blank_database_url_is_rejected() {
        let config = TallyConfig {
            database_url: Some("  ".to_owned()),
            ..Default::default()
        };

        let result = run(&config);

        assert!(
            matches!(
                result,
                Err(CliError::Persistence(PersistenceError::BlankDatabaseUrl))
            ),
            "unexpected result: {result:?}"
        );
    }

    #[rstest]
    fn migrates_a_fresh_database() {
        let temp_dir = tempfile::TempDir::new().expect("temp dir should be created");
        let path = temp_dir.path().join("tally.sqlite");
        let config = TallyConfig {
            database_url: Some(path.to_string_lossy().into_owned()),
            ..Default::default()
        };

        run(&config).expect("migration should succeed");

        assert!(path.exists(), "database file should be created");
    }
}
