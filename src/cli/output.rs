//! Output formatting utilities for CLI operations.

use std::io::Write;

use chrono::{DateTime, Utc};
use tally::{ContributionSet, RepositorySlug};

use super::CliError;

/// Number of commits and pull requests listed per contributor.
const RECENT_ACTIVITY_LIMIT: usize = 5;

/// Writes the contribution report for `set` to the given writer.
///
/// Contributors are ranked by total, followed by the grand total, the
/// monthly commit breakdown, and each contributor's latest commits and pull
/// requests.
pub fn write_report<W: Write>(
    writer: &mut W,
    repository: &RepositorySlug,
    window_start: DateTime<Utc>,
    set: &ContributionSet,
) -> Result<(), CliError> {
    writeln!(
        writer,
        "Contributions to {repository} since {}:",
        window_start.format("%Y-%m-%d")
    )?;
    writeln!(writer)?;

    for (rank, (login, summary)) in set.ranked().into_iter().enumerate() {
        writeln!(
            writer,
            "  {}. {login}: {} total ({} commits, {} pull requests, {} issues, {} reviews)",
            rank + 1,
            summary.total,
            summary.commits,
            summary.pull_requests,
            summary.issues,
            summary.reviews
        )?;
    }

    writeln!(writer)?;
    writeln!(writer, "Total contributions: {}", set.grand_total())?;
    writeln!(writer)?;
    writeln!(writer, "Commits by month:")?;

    let months = set.commits_by_month();
    if months.is_empty() {
        writeln!(writer, "  (none)")?;
    }
    for (month, counts) in &months {
        let line = counts
            .iter()
            .map(|(login, count)| format!("{login} {count}"))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(writer, "  {month}: {line}")?;
    }

    write_recent_activity(writer, set)
}

fn write_recent_activity<W: Write>(writer: &mut W, set: &ContributionSet) -> Result<(), CliError> {
    writeln!(writer)?;
    writeln!(writer, "Recent activity:")?;

    let mut listed_any = false;
    for (login, _) in set.ranked() {
        let commits = set.recent_commits(login, RECENT_ACTIVITY_LIMIT);
        let pulls = set.recent_pull_requests(login, RECENT_ACTIVITY_LIMIT);
        if commits.is_empty() && pulls.is_empty() {
            continue;
        }
        listed_any = true;
        writeln!(writer, "  {login}")?;
        for commit in commits {
            let short_sha = commit.sha.get(..7).unwrap_or(&commit.sha);
            writeln!(
                writer,
                "    {} commit {short_sha} {}",
                commit.date.format("%Y-%m-%d"),
                commit.message
            )?;
        }
        for pull in pulls {
            writeln!(
                writer,
                "    {} pull request #{} {}",
                pull.date.format("%Y-%m-%d"),
                pull.number,
                pull.title
            )?;
        }
    }
    if !listed_any {
        writeln!(writer, "  (none)")?;
    }

    Ok(())
}
