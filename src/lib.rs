//! Tally library crate aggregating GitHub contributions.
//!
//! The library pages through a repository's commits, pull requests, issues,
//! and reviews with Octocrab, keeps what a fixed set of contributors authored
//! within a lookback window, and caches the merged result locally so repeat
//! requests avoid the API.

pub mod config;
pub mod contributions;
pub mod github;
pub mod persistence;
pub mod telemetry;

pub use config::{OperationMode, TallyConfig};
pub use contributions::{
    AggregatorSettings, ContributionAggregator, ContributionSet, Contributor, FetchRequest,
};
pub use github::{ForgeError, OctocrabForgeGateway, PersonalAccessToken, RepositorySlug};
