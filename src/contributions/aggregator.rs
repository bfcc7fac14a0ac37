//! Cache-aware aggregation of the four collectors.
//!
//! [`ContributionAggregator::fetch`] serves a fresh cache entry when one
//! exists, otherwise runs the commit, pull request, issue, and review
//! collectors concurrently and writes the merged result through to the cache.
//! When a collector fails with a systemic error the aggregator falls back to
//! any cached entry for the same key, however old, before giving up.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::collectors::{
    CollectorScope, DEFAULT_MAX_REVIEW_PULLS, collect_commits, collect_issues,
    collect_pull_requests, collect_reviews,
};
use super::model::{Contributor, ContributionSet};
use super::window::{DateWindow, default_window_start};
use crate::github::error::ForgeError;
use crate::github::gateway::{DEFAULT_API_BASE, ForgeGateway, OctocrabForgeGateway};
use crate::github::locator::{PersonalAccessToken, RepositorySlug};
use crate::github::pagination::PaginationLimits;
use crate::github::token::{TokenValidation, TokenValidator};
use crate::persistence::{CacheKey, CacheScope, ContributionCache, PersistenceError};
use crate::telemetry::{ContributionSource, NoopTelemetrySink, TelemetryEvent, TelemetrySink};

/// Inputs of one aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Repository to aggregate.
    pub repository: RepositorySlug,
    /// Contributors to report on. Case-insensitive duplicates are ignored.
    pub contributors: Vec<Contributor>,
    /// Token overriding the configured default.
    pub token: Option<String>,
    /// When false, a fresh cache entry is ignored and data is refetched.
    pub use_cache: bool,
}

impl FetchRequest {
    /// A cached, unauthenticated-by-default request.
    #[must_use]
    pub const fn new(repository: RepositorySlug, contributors: Vec<Contributor>) -> Self {
        Self {
            repository,
            contributors,
            token: None,
            use_cache: true,
        }
    }

    /// Sets an explicit token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Ignores fresh cache entries for this request.
    #[must_use]
    pub const fn bypassing_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }
}

/// Construction-time settings for the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorSettings {
    /// First instant of the lookback window.
    pub window_start: DateTime<Utc>,
    /// Fixed clock; `None` uses the system time once per run.
    pub now: Option<DateTime<Utc>>,
    /// Page size and page cap for every collection walk.
    pub limits: PaginationLimits,
    /// Number of pull requests whose reviews are fetched.
    pub max_review_pulls: usize,
    /// API root used by [`ContributionAggregator::fetch`].
    pub api_base: String,
    /// Token used when a request carries none.
    pub default_token: Option<String>,
    /// Probe `GET /user` before collecting when a token is present.
    pub validate_token: bool,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            window_start: default_window_start(),
            now: None,
            limits: PaginationLimits::default(),
            max_review_pulls: DEFAULT_MAX_REVIEW_PULLS,
            api_base: DEFAULT_API_BASE.to_owned(),
            default_token: None,
            validate_token: true,
        }
    }
}

/// Aggregates contributions for a repository and contributor set.
pub struct ContributionAggregator {
    cache: ContributionCache,
    settings: AggregatorSettings,
    telemetry: Arc<dyn TelemetrySink>,
}

impl ContributionAggregator {
    /// Creates an aggregator that discards telemetry.
    #[must_use]
    pub fn new(cache: ContributionCache, settings: AggregatorSettings) -> Self {
        Self {
            cache,
            settings,
            telemetry: Arc::new(NoopTelemetrySink),
        }
    }

    /// Sends telemetry events to `telemetry`.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Active settings.
    #[must_use]
    pub const fn settings(&self) -> &AggregatorSettings {
        &self.settings
    }

    /// Cache key the request would be stored under.
    #[must_use]
    pub fn cache_key(request: &FetchRequest) -> CacheKey {
        CacheKey::new(&request.repository, &unique(&request.contributors))
    }

    /// Fetches contributions over GitHub using the effective token.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError::Configuration`] when no client can be built, or
    /// the systemic error of a failed collection, in either case only when no
    /// cached entry exists for the request.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<ContributionSet, ForgeError> {
        let token = self.effective_token(request);
        match OctocrabForgeGateway::for_token(token.as_ref(), &self.settings.api_base) {
            Ok(gateway) => self.fetch_with_gateway(&gateway, request).await,
            Err(error) => {
                let contributors = unique(&request.contributors);
                let key = CacheKey::new(&request.repository, &contributors);
                let now = self.settings.now.unwrap_or_else(Utc::now);
                if let Some(set) = self.serve_fresh(request, &key, contributors.len(), now) {
                    return Ok(set);
                }
                self.serve_stale_or(request, &key, contributors.len(), now, error)
            }
        }
    }

    /// Same as [`Self::fetch`] over any gateway.
    ///
    /// The gateway is expected to carry the effective token already; the
    /// token is only consulted here to decide whether to validate it.
    ///
    /// # Errors
    ///
    /// Returns the systemic error of a failed collection when no cached entry
    /// exists for the request.
    pub async fn fetch_with_gateway(
        &self,
        gateway: &dyn ForgeGateway,
        request: &FetchRequest,
    ) -> Result<ContributionSet, ForgeError> {
        let contributors = unique(&request.contributors);
        let key = CacheKey::new(&request.repository, &contributors);
        let now = self.settings.now.unwrap_or_else(Utc::now);

        if let Some(set) = self.serve_fresh(request, &key, contributors.len(), now) {
            return Ok(set);
        }

        if self.settings.validate_token {
            if let Some(token) = self.effective_token(request) {
                let outcome = TokenValidator::new(gateway)
                    .validate(Some(token.value()))
                    .await;
                report_validation(outcome);
            }
        }

        match self
            .collect(gateway, &request.repository, &contributors, now)
            .await
        {
            Ok(set) => {
                if let Err(error) = self.cache.set(&key, &set, now) {
                    tracing::warn!(key = %key, error = %error, "contributions not cached");
                }
                self.record_served(request, contributors.len(), ContributionSource::Live);
                Ok(set)
            }
            Err(error) => self.serve_stale_or(request, &key, contributors.len(), now, error),
        }
    }

    /// Removes cached aggregates. Returns the number of entries removed.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the store cannot be updated.
    pub fn clear_cache(&self, scope: &CacheScope) -> Result<usize, PersistenceError> {
        self.cache.clear(scope)
    }

    fn serve_fresh(
        &self,
        request: &FetchRequest,
        key: &CacheKey,
        contributors: usize,
        now: DateTime<Utc>,
    ) -> Option<ContributionSet> {
        if !request.use_cache {
            return None;
        }
        let entry = self.cache.get(key, now)?;
        self.record_served(request, contributors, ContributionSource::FreshCache);
        Some(entry.data)
    }

    fn serve_stale_or(
        &self,
        request: &FetchRequest,
        key: &CacheKey,
        contributors: usize,
        now: DateTime<Utc>,
        error: ForgeError,
    ) -> Result<ContributionSet, ForgeError> {
        let Some(entry) = self.cache.get_stale(key) else {
            return Err(error);
        };
        tracing::warn!(
            key = %key,
            error = %error,
            age_ms = entry.age_millis(now.timestamp_millis()),
            "collection failed; serving stale cached contributions"
        );
        self.record_served(request, contributors, ContributionSource::StaleCache);
        Ok(entry.data)
    }

    fn effective_token(&self, request: &FetchRequest) -> Option<PersonalAccessToken> {
        PersonalAccessToken::from_optional(request.token.as_deref()).or_else(|| {
            PersonalAccessToken::from_optional(self.settings.default_token.as_deref())
        })
    }

    async fn collect(
        &self,
        gateway: &dyn ForgeGateway,
        repository: &RepositorySlug,
        contributors: &[Contributor],
        now: DateTime<Utc>,
    ) -> Result<ContributionSet, ForgeError> {
        let scope = CollectorScope {
            gateway,
            repository,
            contributors,
            window: DateWindow::new(self.settings.window_start, now),
            limits: self.settings.limits,
            max_review_pulls: self.settings.max_review_pulls,
        };

        let (commits, pull_requests, issues, reviews) = tokio::join!(
            collect_commits(&scope),
            collect_pull_requests(&scope),
            collect_issues(&scope),
            collect_reviews(&scope),
        );

        Ok(ContributionSet::assemble(
            contributors,
            commits?,
            pull_requests?,
            issues?,
            reviews?,
        ))
    }

    fn record_served(&self, request: &FetchRequest, contributors: usize, source: ContributionSource) {
        tracing::info!(repository = %request.repository, ?source, "contributions served");
        self.telemetry.record(TelemetryEvent::ContributionsServed {
            repository: request.repository.to_string(),
            contributors,
            source,
        });
    }
}

fn unique(contributors: &[Contributor]) -> Vec<Contributor> {
    Contributor::unique(contributors.iter().map(Contributor::login))
}

fn report_validation(outcome: TokenValidation) {
    match outcome {
        TokenValidation::Valid { login, rate_limit } => tracing::debug!(
            login = %login,
            remaining = rate_limit.map(|info| info.remaining()),
            "token accepted"
        ),
        negative => tracing::warn!(
            reason = negative.reason().unwrap_or_default(),
            "token validation failed; continuing with the request"
        ),
    }
}
