//! Reviews submitted by each contributor.
//!
//! Reviews are only reachable per pull request, so this collector walks the
//! pull request list, keeps the first `max_review_pulls` entries, and pages
//! each one's reviews in turn. A failed review fetch for one pull request is
//! logged and skipped without affecting the others.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::pull_requests::{ApiPullRequest, state_all};
use super::{
    ApiAccount, CollectorScope, Projection, ProjectionError, decode_records, fetch_collection,
    partition, required,
};
use crate::contributions::model::{Contributor, ContributorRecords, ReviewRecord};
use crate::github::error::ForgeError;
use crate::github::pagination::fetch_all_pages;

const KIND: &str = "reviews";

#[derive(Debug, Deserialize)]
struct ApiReview {
    user: Option<ApiAccount>,
    state: Option<String>,
    submitted_at: Option<String>,
    body: Option<String>,
}

/// A review paired with the pull request it was left on.
struct ReviewOnPull<'pull> {
    review: ApiReview,
    number: u64,
    pull: &'pull ApiPullRequest,
}

impl Projection for ReviewOnPull<'_> {
    type Record = ReviewRecord;

    fn is_authored_by(&self, contributor: &Contributor) -> bool {
        ApiAccount::is(self.review.user.as_ref(), contributor)
    }

    fn timestamp(&self) -> Option<&str> {
        self.review.submitted_at.as_deref()
    }

    fn project(&self, date: DateTime<Utc>) -> Result<ReviewRecord, ProjectionError> {
        Ok(ReviewRecord {
            pull_request_number: self.number,
            pull_request_title: required(self.pull.title.as_ref(), "pull_request.title")?,
            state: required(self.review.state.as_ref(), "state")?,
            date,
            url: required(self.pull.html_url.as_ref(), "pull_request.html_url")?,
            body: self.review.body.clone().unwrap_or_default(),
        })
    }
}

/// Collects reviews on the first `max_review_pulls` pull requests.
///
/// # Errors
///
/// Returns systemic [`ForgeError`]s from the pull request walk; other
/// failures of that walk yield empty slices. Review walks never fail the
/// collector.
pub async fn collect_reviews(
    scope: &CollectorScope<'_>,
) -> Result<ContributorRecords<ReviewRecord>, ForgeError> {
    let Some(records) =
        fetch_collection(scope, KIND, &scope.repository.pulls_path(), &state_all()).await?
    else {
        return Ok(scope.empty_slices());
    };

    let pulls: Vec<ApiPullRequest> = decode_records(KIND, &records);
    let mut reviews = Vec::new();
    for pull in pulls.iter().take(scope.max_review_pulls) {
        let Some(number) = pull.number else {
            tracing::debug!("skipping pull request without a number");
            continue;
        };

        let path = scope.repository.reviews_path(number);
        match fetch_all_pages(scope.gateway, &path, &[], scope.limits).await {
            Ok(paged) => reviews.extend(
                decode_records::<ApiReview>(KIND, &paged.records)
                    .into_iter()
                    .map(|review| ReviewOnPull {
                        review,
                        number,
                        pull,
                    }),
            ),
            Err(error) => tracing::warn!(
                pull_request = number,
                error = %error,
                "could not fetch reviews; skipping pull request"
            ),
        }
    }

    Ok(partition(KIND, &reviews, scope.contributors, &scope.window))
}
