//! Pull requests opened by each contributor.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{
    ApiAccount, CollectorScope, Projection, ProjectionError, decode_records, fetch_collection,
    partition, required,
};
use crate::contributions::model::{
    Contributor, ContributorRecords, PullRequestRecord, PullRequestState,
};
use crate::github::error::ForgeError;

const KIND: &str = "pull requests";

/// Pull request payload shared with the review collector.
#[derive(Debug, Deserialize)]
pub(super) struct ApiPullRequest {
    pub(super) number: Option<u64>,
    pub(super) title: Option<String>,
    pub(super) html_url: Option<String>,
    state: Option<String>,
    created_at: Option<String>,
    merged_at: Option<String>,
    user: Option<ApiAccount>,
}

fn parse_state(raw: &str) -> Result<PullRequestState, ProjectionError> {
    match raw {
        "open" => Ok(PullRequestState::Open),
        "closed" => Ok(PullRequestState::Closed),
        other => Err(ProjectionError::UnexpectedValue {
            field: "state",
            value: other.to_owned(),
        }),
    }
}

impl Projection for ApiPullRequest {
    type Record = PullRequestRecord;

    fn is_authored_by(&self, contributor: &Contributor) -> bool {
        ApiAccount::is(self.user.as_ref(), contributor)
    }

    fn timestamp(&self) -> Option<&str> {
        self.created_at.as_deref()
    }

    fn project(&self, date: DateTime<Utc>) -> Result<PullRequestRecord, ProjectionError> {
        let state = required(self.state.as_ref(), "state")?;
        Ok(PullRequestRecord {
            number: required(self.number.as_ref(), "number")?,
            title: required(self.title.as_ref(), "title")?,
            state: parse_state(&state)?,
            date,
            url: required(self.html_url.as_ref(), "html_url")?,
            merged: self.merged_at.is_some(),
        })
    }
}

pub(super) fn state_all() -> [(String, String); 1] {
    [("state".to_owned(), "all".to_owned())]
}

/// Collects pull requests in any state created within the window.
///
/// # Errors
///
/// Returns systemic [`ForgeError`]s; other fetch failures yield empty slices.
pub async fn collect_pull_requests(
    scope: &CollectorScope<'_>,
) -> Result<ContributorRecords<PullRequestRecord>, ForgeError> {
    let Some(records) =
        fetch_collection(scope, KIND, &scope.repository.pulls_path(), &state_all()).await?
    else {
        return Ok(scope.empty_slices());
    };

    let pulls: Vec<ApiPullRequest> = decode_records(KIND, &records);
    Ok(partition(KIND, &pulls, scope.contributors, &scope.window))
}
