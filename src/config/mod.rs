//! Application configuration loaded from CLI, environment, and files.
//!
//! Values are merged with ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in application defaults
//! 2. **Configuration file** – `.tally.toml` in current directory, home
//!    directory, or XDG config directory
//! 3. **Environment variables** – `TALLY_REPOSITORY`, `TALLY_TOKEN`, or
//!    `GITHUB_TOKEN` as a token fallback
//! 4. **Command-line arguments** – `--repository`/`-r`, `--contributors`/`-c`,
//!    and `--token`/`-t`
//!
//! # Configuration File
//!
//! ```toml
//! repository = "stellar/stellar-docs"
//! contributors = "alice,bob"
//! token = "ghp_example"
//! database_url = "tally.sqlite"
//! window_start = "2025-01-01T00:00:00Z"
//! ```

use std::env;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::contributions::collectors::DEFAULT_MAX_REVIEW_PULLS;
use crate::contributions::{AggregatorSettings, Contributor, FetchRequest};
use crate::github::error::ForgeError;
use crate::github::gateway::DEFAULT_API_BASE;
use crate::github::locator::RepositorySlug;
use crate::github::pagination::{DEFAULT_MAX_PAGES, DEFAULT_PER_PAGE, PaginationLimits};
use crate::persistence::{CachePolicy, DEFAULT_FRESHNESS, DEFAULT_RETENTION};

/// Environment variable consulted when no token is configured.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

const DEFAULT_WINDOW_START: &str = "2025-01-01T00:00:00Z";

/// Operation mode determined by CLI arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    /// Apply database migrations and exit.
    MigrateDatabase,
    /// Remove cached aggregates and exit.
    ClearCache,
    /// Fetch contributions and print the report.
    Report,
}

/// Application configuration supporting CLI, environment, and file sources.
///
/// # Example
///
/// ```no_run
/// use ortho_config::OrthoConfig;
/// use tally::TallyConfig;
///
/// let config = TallyConfig::load().expect("failed to load configuration");
/// let request = config.fetch_request().expect("repository and contributors required");
/// println!("{} contributors", request.contributors.len());
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "TALLY",
    discovery(
        dotfile_name = ".tally.toml",
        config_file_name = "tally.toml",
        app_name = "tally"
    )
)]
pub struct TallyConfig {
    /// Repository to aggregate, as `owner/name`.
    ///
    /// Can be provided via:
    /// - CLI: `--repository <SLUG>` or `-r <SLUG>`
    /// - Environment: `TALLY_REPOSITORY`
    /// - Config file: `repository = "..."`
    #[ortho_config(cli_short = 'r')]
    pub repository: Option<String>,

    /// Comma-separated contributor logins.
    ///
    /// Can be provided via:
    /// - CLI: `--contributors <LOGINS>` or `-c <LOGINS>`
    /// - Environment: `TALLY_CONTRIBUTORS`
    /// - Config file: `contributors = "alice,bob"`
    #[ortho_config(cli_short = 'c')]
    pub contributors: Option<String>,

    /// Personal access token for GitHub API authentication.
    ///
    /// Can be provided via:
    /// - CLI: `--token <TOKEN>` or `-t <TOKEN>`
    /// - Environment: `TALLY_TOKEN` or `GITHUB_TOKEN`
    /// - Config file: `token = "..."`
    #[ortho_config(cli_short = 't')]
    pub token: Option<String>,

    /// Root of the GitHub REST API.
    #[ortho_config()]
    pub api_base: String,

    /// Local `SQLite` database path for the contribution cache.
    ///
    /// Without it the cache lives in memory for the current process only.
    #[ortho_config()]
    pub database_url: Option<String>,

    /// Runs database migrations and exits.
    ///
    /// Note: `ortho_config` does not load boolean values from the
    /// environment, so this flag is CLI or file only.
    #[ortho_config()]
    pub migrate_db: bool,

    /// Removes cached aggregates and exits.
    ///
    /// Clears the entry for the configured repository and contributors, or
    /// every entry when no contributors are configured.
    #[ortho_config()]
    pub clear_cache: bool,

    /// Ignores fresh cache entries and refetches.
    #[ortho_config()]
    pub refresh: bool,

    /// Skips the advisory `GET /user` token probe.
    #[ortho_config()]
    pub skip_token_check: bool,

    /// First instant of the lookback window, in RFC 3339.
    #[ortho_config()]
    pub window_start: String,

    /// Age after which a cached aggregate is refetched, in seconds.
    #[ortho_config()]
    pub cache_ttl_seconds: u64,

    /// Age after which a cached aggregate is purged, in seconds.
    #[ortho_config()]
    pub cache_retention_seconds: u64,

    /// Page cap for every collection walk.
    #[ortho_config()]
    pub max_pages: u32,

    /// Items requested per page (1 to 100).
    #[ortho_config()]
    pub per_page: u8,

    /// Number of most recent pull requests whose reviews are fetched.
    #[ortho_config()]
    pub max_review_pulls: usize,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            repository: None,
            contributors: None,
            token: None,
            api_base: DEFAULT_API_BASE.to_owned(),
            database_url: None,
            migrate_db: false,
            clear_cache: false,
            refresh: false,
            skip_token_check: false,
            window_start: DEFAULT_WINDOW_START.to_owned(),
            cache_ttl_seconds: DEFAULT_FRESHNESS.as_secs(),
            cache_retention_seconds: DEFAULT_RETENTION.as_secs(),
            max_pages: DEFAULT_MAX_PAGES,
            per_page: DEFAULT_PER_PAGE,
            max_review_pulls: DEFAULT_MAX_REVIEW_PULLS,
        }
    }
}

impl TallyConfig {
    /// Determines the operation mode. Migration wins over cache clearing,
    /// which wins over reporting.
    #[must_use]
    pub const fn operation_mode(&self) -> OperationMode {
        if self.migrate_db {
            OperationMode::MigrateDatabase
        } else if self.clear_cache {
            OperationMode::ClearCache
        } else {
            OperationMode::Report
        }
    }

    /// Resolves the token from configuration or the `GITHUB_TOKEN`
    /// environment variable.
    ///
    /// Blank values count as absent. Placeholder values are returned as-is
    /// and rejected later by the aggregator.
    #[must_use]
    pub fn resolve_token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| env::var(GITHUB_TOKEN_ENV).ok())
            .filter(|token| !token.trim().is_empty())
    }

    /// Returns the configured repository.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError::Configuration`] when no repository is configured
    /// and [`ForgeError::InvalidRepository`] when it is not `owner/name`.
    pub fn require_repository(&self) -> Result<RepositorySlug, ForgeError> {
        let raw = self
            .repository
            .as_deref()
            .ok_or_else(|| ForgeError::Configuration {
                message: "repository is required (use --repository or -r)".to_owned(),
            })?;
        RepositorySlug::parse(raw)
    }

    /// Parses the comma-separated contributor list.
    ///
    /// Blank entries are dropped and case-insensitive duplicates collapse
    /// to their first spelling.
    #[must_use]
    pub fn contributor_list(&self) -> Vec<Contributor> {
        self.contributors
            .as_deref()
            .map(|raw| Contributor::unique(raw.split(',')))
            .unwrap_or_default()
    }

    /// Returns the contributor list, requiring at least one login.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError::Configuration`] when the list is empty.
    pub fn require_contributors(&self) -> Result<Vec<Contributor>, ForgeError> {
        let contributors = self.contributor_list();
        if contributors.is_empty() {
            return Err(ForgeError::Configuration {
                message: "at least one contributor is required (use --contributors or -c)"
                    .to_owned(),
            });
        }
        Ok(contributors)
    }

    /// Parses the window start.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError::Configuration`] when the value is not RFC 3339.
    pub fn window_start(&self) -> Result<DateTime<Utc>, ForgeError> {
        DateTime::parse_from_rfc3339(self.window_start.trim())
            .map(|start| start.with_timezone(&Utc))
            .map_err(|error| ForgeError::Configuration {
                message: format!(
                    "window_start must be an RFC 3339 timestamp, got {:?}: {error}",
                    self.window_start
                ),
            })
    }

    /// Validated page size and page cap.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError::InvalidPagination`] when either limit is out of
    /// range.
    pub fn pagination_limits(&self) -> Result<PaginationLimits, ForgeError> {
        PaginationLimits::new(self.per_page, self.max_pages)
    }

    /// Cache freshness and retention.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError::Configuration`] when retention is shorter than
    /// freshness.
    pub fn cache_policy(&self) -> Result<CachePolicy, ForgeError> {
        if self.cache_retention_seconds < self.cache_ttl_seconds {
            return Err(ForgeError::Configuration {
                message: format!(
                    "cache_retention_seconds ({}) must not be shorter than cache_ttl_seconds ({})",
                    self.cache_retention_seconds, self.cache_ttl_seconds
                ),
            });
        }
        Ok(CachePolicy {
            freshness: Duration::from_secs(self.cache_ttl_seconds),
            retention: Duration::from_secs(self.cache_retention_seconds),
        })
    }

    /// Aggregator settings derived from this configuration.
    ///
    /// # Errors
    ///
    /// Returns the first invalid window, pagination, or review setting.
    pub fn aggregator_settings(&self) -> Result<AggregatorSettings, ForgeError> {
        if self.max_review_pulls == 0 {
            return Err(ForgeError::Configuration {
                message: "max_review_pulls must be at least 1".to_owned(),
            });
        }
        Ok(AggregatorSettings {
            window_start: self.window_start()?,
            now: None,
            limits: self.pagination_limits()?,
            max_review_pulls: self.max_review_pulls,
            api_base: self.api_base.clone(),
            default_token: self.resolve_token(),
            validate_token: !self.skip_token_check,
        })
    }

    /// Builds the fetch request for the configured repository and
    /// contributors. The token travels in [`Self::aggregator_settings`].
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError`] when the repository or contributors are missing
    /// or invalid.
    pub fn fetch_request(&self) -> Result<FetchRequest, ForgeError> {
        let request = FetchRequest::new(self.require_repository()?, self.require_contributors()?);
        Ok(if self.refresh {
            request.bypassing_cache()
        } else {
            request
        })
    }
}

#[cfg(test)]
mod tests;
