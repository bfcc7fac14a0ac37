//! Contribution aggregation for a fixed set of contributors.
//!
//! Collectors page through a repository's commits, pull requests, issues,
//! and reviews, keep the records each contributor authored within the
//! lookback window, and the aggregator merges them into a cached
//! [`ContributionSet`].

pub mod aggregator;
pub mod collectors;
pub mod model;
pub mod report;
pub mod window;

#[cfg(test)]
mod mock_gateway;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use aggregator::{AggregatorSettings, ContributionAggregator, FetchRequest};
pub use model::{
    CommitRecord, ContributionSet, Contributor, ContributorRecords, ContributorSummary,
    IssueRecord, PullRequestRecord, PullRequestState, ReviewRecord,
};
pub use report::MonthlyCommits;
pub use window::{DateWindow, default_window_start};
