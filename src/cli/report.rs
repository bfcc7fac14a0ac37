//! Contribution report operation.

use std::io::Write;

use tally::persistence::ContributionCache;
use tally::{ContributionAggregator, TallyConfig};

use super::CliError;
use super::output::write_report;

/// Fetches contributions for the configured repository and contributors and
/// writes the report.
///
/// # Errors
///
/// Returns [`tally::ForgeError`] when configuration is missing or invalid, or
/// when collection fails and no cached aggregate exists.
pub async fn run<W: Write>(
    config: &TallyConfig,
    cache: ContributionCache,
    writer: &mut W,
) -> Result<(), CliError> {
    let request = config.fetch_request()?;
    let settings = config.aggregator_settings()?;
    let window_start = settings.window_start;

    let aggregator = ContributionAggregator::new(cache, settings);
    let set = aggregator.fetch(&request).await?;

    write_report(writer, &request.repository, window_start, &set)
}
