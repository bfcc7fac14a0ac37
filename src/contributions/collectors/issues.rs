//! Issues opened by each contributor.
//!
//! GitHub's issues endpoint also lists pull requests; those carry a
//! `pull_request` object and are excluded here.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::pull_requests::state_all;
use super::{
    ApiAccount, CollectorScope, Projection, ProjectionError, decode_records, fetch_collection,
    partition, required,
};
use crate::contributions::model::{Contributor, ContributorRecords, IssueRecord};
use crate::github::error::ForgeError;

const KIND: &str = "issues";

#[derive(Debug, Deserialize)]
struct ApiIssue {
    number: Option<u64>,
    title: Option<String>,
    state: Option<String>,
    created_at: Option<String>,
    html_url: Option<String>,
    user: Option<ApiAccount>,
    pull_request: Option<Value>,
}

impl Projection for ApiIssue {
    type Record = IssueRecord;

    fn is_eligible(&self) -> bool {
        self.pull_request.is_none()
    }

    fn is_authored_by(&self, contributor: &Contributor) -> bool {
        ApiAccount::is(self.user.as_ref(), contributor)
    }

    fn timestamp(&self) -> Option<&str> {
        self.created_at.as_deref()
    }

    fn project(&self, date: DateTime<Utc>) -> Result<IssueRecord, ProjectionError> {
        Ok(IssueRecord {
            number: required(self.number.as_ref(), "number")?,
            title: required(self.title.as_ref(), "title")?,
            state: required(self.state.as_ref(), "state")?,
            date,
            url: required(self.html_url.as_ref(), "html_url")?,
        })
    }
}

/// Collects issues in any state created within the window.
///
/// # Errors
///
/// Returns systemic [`ForgeError`]s; other fetch failures yield empty slices.
pub async fn collect_issues(
    scope: &CollectorScope<'_>,
) -> Result<ContributorRecords<IssueRecord>, ForgeError> {
    let Some(records) =
        fetch_collection(scope, KIND, &scope.repository.issues_path(), &state_all()).await?
    else {
        return Ok(scope.empty_slices());
    };

    let issues: Vec<ApiIssue> = decode_records(KIND, &records);
    Ok(partition(KIND, &issues, scope.contributors, &scope.window))
}
