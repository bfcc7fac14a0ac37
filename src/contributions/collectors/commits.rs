//! Commits authored or committed by each contributor.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{
    ApiAccount, CollectorScope, Projection, ProjectionError, decode_records, fetch_collection,
    partition, required,
};
use crate::contributions::model::{CommitRecord, Contributor, ContributorRecords};
use crate::github::error::ForgeError;

const KIND: &str = "commits";

#[derive(Debug, Deserialize)]
struct ApiCommit {
    sha: Option<String>,
    html_url: Option<String>,
    commit: Option<ApiCommitDetail>,
    author: Option<ApiAccount>,
    committer: Option<ApiAccount>,
}

#[derive(Debug, Deserialize)]
struct ApiCommitDetail {
    message: Option<String>,
    author: Option<ApiSignature>,
}

#[derive(Debug, Deserialize)]
struct ApiSignature {
    name: Option<String>,
    date: Option<String>,
}

impl ApiCommit {
    fn signature(&self) -> Option<&ApiSignature> {
        self.commit.as_ref().and_then(|detail| detail.author.as_ref())
    }
}

impl Projection for ApiCommit {
    type Record = CommitRecord;

    fn is_authored_by(&self, contributor: &Contributor) -> bool {
        ApiAccount::is(self.author.as_ref(), contributor)
            || ApiAccount::is(self.committer.as_ref(), contributor)
    }

    fn timestamp(&self) -> Option<&str> {
        self.signature().and_then(|signature| signature.date.as_deref())
    }

    fn project(&self, date: DateTime<Utc>) -> Result<CommitRecord, ProjectionError> {
        let message = required(
            self.commit.as_ref().and_then(|detail| detail.message.as_ref()),
            "commit.message",
        )?;
        let author = self
            .author
            .as_ref()
            .and_then(|account| account.login.clone())
            .or_else(|| self.signature().and_then(|signature| signature.name.clone()))
            .ok_or(ProjectionError::MissingField {
                field: "commit.author.name",
            })?;

        Ok(CommitRecord {
            sha: required(self.sha.as_ref(), "sha")?,
            message: message.lines().next().unwrap_or_default().to_owned(),
            date,
            url: required(self.html_url.as_ref(), "html_url")?,
            author,
        })
    }
}

/// Collects commits since the window start, sliced per contributor.
///
/// A commit counts for a contributor when either its linked author or its
/// linked committer matches the login.
///
/// # Errors
///
/// Returns systemic [`ForgeError`]s; other fetch failures yield empty slices.
pub async fn collect_commits(
    scope: &CollectorScope<'_>,
) -> Result<ContributorRecords<CommitRecord>, ForgeError> {
    let query = [("since".to_owned(), scope.window.since_parameter())];
    let Some(records) =
        fetch_collection(scope, KIND, &scope.repository.commits_path(), &query).await?
    else {
        return Ok(scope.empty_slices());
    };

    let commits: Vec<ApiCommit> = decode_records(KIND, &records);
    Ok(partition(KIND, &commits, scope.contributors, &scope.window))
}
