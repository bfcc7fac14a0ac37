//! Contribution records and the per-contributor aggregate.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Records of one kind grouped by contributor login.
pub type ContributorRecords<T> = BTreeMap<String, Vec<T>>;

/// A tracked identity, matched case-insensitively against API logins.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Contributor(String);

impl Contributor {
    /// Wraps a login, trimming surrounding whitespace.
    ///
    /// Returns `None` for blank input.
    #[must_use]
    pub fn new(login: &str) -> Option<Self> {
        let trimmed = login.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_owned()))
    }

    /// Builds a contributor list, dropping blanks and case-insensitive
    /// duplicates. The first spelling of a login wins.
    ///
    /// # Example
    ///
    /// ```
    /// use tally::contributions::Contributor;
    ///
    /// let list = Contributor::unique(["Alice", "bob", "alice", " "]);
    /// let logins: Vec<&str> = list.iter().map(Contributor::login).collect();
    /// assert_eq!(logins, ["Alice", "bob"]);
    /// ```
    #[must_use]
    pub fn unique<I, S>(logins: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut contributors: Vec<Self> = Vec::new();
        for login in logins {
            let Some(candidate) = Self::new(login.as_ref()) else {
                continue;
            };
            if !contributors
                .iter()
                .any(|existing| existing.matches(candidate.login()))
            {
                contributors.push(candidate);
            }
        }
        contributors
    }

    /// Login as supplied by the caller.
    #[must_use]
    pub const fn login(&self) -> &str {
        self.0.as_str()
    }

    /// Returns true when `login` names this contributor, ignoring case.
    #[must_use]
    pub fn matches(&self, login: &str) -> bool {
        self.0.eq_ignore_ascii_case(login)
    }
}

impl fmt::Display for Contributor {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// A commit authored or committed by a contributor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Commit SHA.
    pub sha: String,
    /// First line of the commit message.
    pub message: String,
    /// Git author date.
    pub date: DateTime<Utc>,
    /// Web URL of the commit.
    pub url: String,
    /// Linked account login, or the git author name when unlinked.
    pub author: String,
}

/// Pull request lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestState {
    /// Still open.
    Open,
    /// Closed, merged or not.
    Closed,
}

/// A pull request opened by a contributor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRecord {
    /// Pull request number.
    pub number: u64,
    /// Pull request title.
    pub title: String,
    /// Open or closed.
    pub state: PullRequestState,
    /// Creation time.
    pub date: DateTime<Utc>,
    /// Web URL of the pull request.
    pub url: String,
    /// True when the pull request was merged.
    pub merged: bool,
}

/// An issue opened by a contributor. Never a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    /// Issue number.
    pub number: u64,
    /// Issue title.
    pub title: String,
    /// Issue state as reported by GitHub.
    pub state: String,
    /// Creation time.
    pub date: DateTime<Utc>,
    /// Web URL of the issue.
    pub url: String,
}

/// A review submitted by a contributor on a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Number of the reviewed pull request.
    pub pull_request_number: u64,
    /// Title of the reviewed pull request.
    pub pull_request_title: String,
    /// Review state, e.g. `APPROVED` or `COMMENTED`.
    pub state: String,
    /// Submission time.
    pub date: DateTime<Utc>,
    /// Web URL of the reviewed pull request.
    pub url: String,
    /// Review body; empty when none was written.
    pub body: String,
}

/// Per-contributor counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorSummary {
    /// Commits in the window.
    pub commits: usize,
    /// Pull requests opened in the window.
    pub pull_requests: usize,
    /// Issues opened in the window.
    pub issues: usize,
    /// Reviews submitted in the window.
    pub reviews: usize,
    /// Unweighted sum of the four counts.
    pub total: usize,
}

impl ContributorSummary {
    /// Builds a summary whose total is the sum of the given counts.
    #[must_use]
    pub const fn from_counts(
        commits: usize,
        pull_requests: usize,
        issues: usize,
        reviews: usize,
    ) -> Self {
        Self {
            commits,
            pull_requests,
            issues,
            reviews,
            total: commits + pull_requests + issues + reviews,
        }
    }
}

/// Aggregated contributions for one repository and contributor set.
///
/// Every contributor of the originating request has an entry in every map,
/// possibly empty. Maps are ordered so serialisation is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionSet {
    /// Commits per contributor.
    pub commits: ContributorRecords<CommitRecord>,
    /// Pull requests per contributor.
    pub pull_requests: ContributorRecords<PullRequestRecord>,
    /// Issues per contributor.
    pub issues: ContributorRecords<IssueRecord>,
    /// Reviews per contributor.
    pub reviews: ContributorRecords<ReviewRecord>,
    /// Counts per contributor.
    pub summary: BTreeMap<String, ContributorSummary>,
}

impl ContributionSet {
    /// Assembles the aggregate from the four collector outputs.
    ///
    /// Contributors absent from a collector output receive an empty slice.
    /// Entries for logins outside `contributors` are discarded.
    #[must_use]
    pub fn assemble(
        contributors: &[Contributor],
        mut commits: ContributorRecords<CommitRecord>,
        mut pull_requests: ContributorRecords<PullRequestRecord>,
        mut issues: ContributorRecords<IssueRecord>,
        mut reviews: ContributorRecords<ReviewRecord>,
    ) -> Self {
        let mut set = Self::default();
        for contributor in contributors {
            let login = contributor.login();
            let commit_slice = commits.remove(login).unwrap_or_default();
            let pull_slice = pull_requests.remove(login).unwrap_or_default();
            let issue_slice = issues.remove(login).unwrap_or_default();
            let review_slice = reviews.remove(login).unwrap_or_default();

            set.summary.insert(
                login.to_owned(),
                ContributorSummary::from_counts(
                    commit_slice.len(),
                    pull_slice.len(),
                    issue_slice.len(),
                    review_slice.len(),
                ),
            );
            set.commits.insert(login.to_owned(), commit_slice);
            set.pull_requests.insert(login.to_owned(), pull_slice);
            set.issues.insert(login.to_owned(), issue_slice);
            set.reviews.insert(login.to_owned(), review_slice);
        }
        set
    }
}
