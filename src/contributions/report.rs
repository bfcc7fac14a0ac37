//! Derived views over an aggregate: ranking, totals, monthly activity, and
//! each contributor's most recent work.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::model::{
    CommitRecord, ContributionSet, ContributorRecords, ContributorSummary, PullRequestRecord,
};

/// Commit counts keyed by `YYYY-MM`, then by contributor login.
pub type MonthlyCommits = BTreeMap<String, BTreeMap<String, usize>>;

impl ContributionSet {
    /// Contributors ordered by total contributions, highest first.
    ///
    /// Ties are broken by login so the order is stable.
    #[must_use]
    pub fn ranked(&self) -> Vec<(&str, &ContributorSummary)> {
        let mut ranking: Vec<(&str, &ContributorSummary)> = self
            .summary
            .iter()
            .map(|(login, summary)| (login.as_str(), summary))
            .collect();
        ranking.sort_by(|(left_login, left), (right_login, right)| {
            right
                .total
                .cmp(&left.total)
                .then_with(|| left_login.cmp(right_login))
        });
        ranking
    }

    /// Sum of every contributor's total.
    #[must_use]
    pub fn grand_total(&self) -> usize {
        self.summary.values().map(|summary| summary.total).sum()
    }

    /// Number of commits per month and contributor.
    ///
    /// Months without commits are omitted; contributors without commits in
    /// a listed month are omitted from that month.
    #[must_use]
    pub fn commits_by_month(&self) -> MonthlyCommits {
        let mut months = MonthlyCommits::new();
        for (login, commits) in &self.commits {
            for commit in commits {
                let month = commit.date.format("%Y-%m").to_string();
                *months
                    .entry(month)
                    .or_default()
                    .entry(login.clone())
                    .or_default() += 1;
            }
        }
        months
    }

    /// Up to `limit` of the contributor's commits, newest first.
    #[must_use]
    pub fn recent_commits(&self, login: &str, limit: usize) -> Vec<&CommitRecord> {
        newest(&self.commits, login, limit, |commit| commit.date)
    }

    /// Up to `limit` of the contributor's pull requests, newest first.
    #[must_use]
    pub fn recent_pull_requests(&self, login: &str, limit: usize) -> Vec<&PullRequestRecord> {
        newest(&self.pull_requests, login, limit, |pull| pull.date)
    }
}

fn newest<'set, T>(
    records: &'set ContributorRecords<T>,
    login: &str,
    limit: usize,
    date: impl Fn(&T) -> DateTime<Utc>,
) -> Vec<&'set T> {
    let mut selected: Vec<&T> = records.get(login).into_iter().flatten().collect();
    selected.sort_by_key(|record| Reverse(date(*record)));
    selected.truncate(limit);
    selected
}
