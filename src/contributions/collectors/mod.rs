//! Resource collectors for commits, pull requests, issues, and reviews.
//!
//! Each collector walks one GitHub collection once per run, then slices the
//! records per contributor by login and by the run's [`DateWindow`]. Failures
//! are isolated as narrowly as possible:
//!
//! - a record that matches a contributor but cannot be projected empties that
//!   contributor's slice only;
//! - a non-systemic fetch failure (see [`ForgeError::is_systemic`]) empties
//!   every slice of that collector;
//! - systemic failures propagate so the aggregator can fall back to a cached
//!   aggregate.

mod commits;
mod issues;
mod pull_requests;
mod reviews;

pub use commits::collect_commits;
pub use issues::collect_issues;
pub use pull_requests::collect_pull_requests;
pub use reviews::collect_reviews;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use super::model::{Contributor, ContributorRecords};
use super::window::DateWindow;
use crate::github::error::ForgeError;
use crate::github::gateway::ForgeGateway;
use crate::github::locator::RepositorySlug;
use crate::github::pagination::{PaginationLimits, fetch_all_pages};

/// Default number of pull requests whose reviews are fetched.
pub const DEFAULT_MAX_REVIEW_PULLS: usize = 50;

/// Read-only inputs shared by the four collectors of one run.
#[derive(Clone, Copy)]
pub struct CollectorScope<'run> {
    /// Transport used for every request.
    pub gateway: &'run dyn ForgeGateway,
    /// Repository being aggregated.
    pub repository: &'run RepositorySlug,
    /// Contributors to slice records for.
    pub contributors: &'run [Contributor],
    /// Accepted record timestamps.
    pub window: DateWindow,
    /// Page size and page cap for each collection walk.
    pub limits: PaginationLimits,
    /// Number of pull requests whose reviews are fetched.
    pub max_review_pulls: usize,
}

impl CollectorScope<'_> {
    fn empty_slices<T>(&self) -> ContributorRecords<T> {
        self.contributors
            .iter()
            .map(|contributor| (contributor.login().to_owned(), Vec::new()))
            .collect()
    }
}

/// Reasons a matching record could not be turned into a typed record.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub(crate) enum ProjectionError {
    #[error("required field `{field}` is missing")]
    MissingField { field: &'static str },

    #[error("timestamp {value:?} is not RFC 3339: {message}")]
    InvalidTimestamp { value: String, message: String },

    #[error("field `{field}` has unexpected value {value:?}")]
    UnexpectedValue { field: &'static str, value: String },
}

/// A decoded API record that can be sliced per contributor.
pub(crate) trait Projection {
    type Record;

    /// False for records that belong to another resource kind.
    fn is_eligible(&self) -> bool {
        true
    }

    fn is_authored_by(&self, contributor: &Contributor) -> bool;

    /// Raw timestamp used for window filtering; `None` is outside the window.
    fn timestamp(&self) -> Option<&str>;

    fn project(&self, date: DateTime<Utc>) -> Result<Self::Record, ProjectionError>;
}

/// Login carried by `user`, `author`, and `committer` objects.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ApiAccount {
    pub(crate) login: Option<String>,
}

impl ApiAccount {
    pub(crate) fn is(account: Option<&Self>, contributor: &Contributor) -> bool {
        account
            .and_then(|value| value.login.as_deref())
            .is_some_and(|login| contributor.matches(login))
    }
}

pub(crate) fn required<T: Clone>(value: Option<&T>, field: &'static str) -> Result<T, ProjectionError> {
    value.cloned().ok_or(ProjectionError::MissingField { field })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ProjectionError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| ProjectionError::InvalidTimestamp {
            value: raw.to_owned(),
            message: error.to_string(),
        })
}

/// Walks a collection, absorbing non-systemic failures as `None`.
async fn fetch_collection(
    scope: &CollectorScope<'_>,
    kind: &'static str,
    path: &str,
    query: &[(String, String)],
) -> Result<Option<Vec<Value>>, ForgeError> {
    match fetch_all_pages(scope.gateway, path, query, scope.limits).await {
        Ok(paged) => Ok(Some(paged.records)),
        Err(error) if error.is_systemic() => Err(error),
        Err(error) => {
            tracing::warn!(
                kind,
                repository = %scope.repository,
                error = %error,
                "fetch failed; {kind} left empty for every contributor"
            );
            Ok(None)
        }
    }
}

/// Decodes records, skipping any that do not match the expected shape.
fn decode_records<A: DeserializeOwned>(kind: &'static str, records: &[Value]) -> Vec<A> {
    records
        .iter()
        .filter_map(|record| match A::deserialize(record) {
            Ok(decoded) => Some(decoded),
            Err(error) => {
                tracing::debug!(kind, error = %error, "skipping undecodable record");
                None
            }
        })
        .collect()
}

/// Slices decoded records per contributor, isolating projection failures.
fn partition<P: Projection>(
    kind: &'static str,
    items: &[P],
    contributors: &[Contributor],
    window: &DateWindow,
) -> ContributorRecords<P::Record> {
    contributors
        .iter()
        .map(|contributor| {
            let slice = project_slice(items, contributor, window).unwrap_or_else(|error| {
                tracing::warn!(
                    kind,
                    contributor = contributor.login(),
                    error = %error,
                    "malformed record; {kind} left empty for contributor"
                );
                Vec::new()
            });
            (contributor.login().to_owned(), slice)
        })
        .collect()
}

fn project_slice<P: Projection>(
    items: &[P],
    contributor: &Contributor,
    window: &DateWindow,
) -> Result<Vec<P::Record>, ProjectionError> {
    let mut records = Vec::new();
    for item in items
        .iter()
        .filter(|item| item.is_eligible() && item.is_authored_by(contributor))
    {
        let Some(raw) = item.timestamp() else {
            continue;
        };
        let date = parse_timestamp(raw)?;
        if window.contains(date) {
            records.push(item.project(date)?);
        }
    }
    Ok(records)
}
