//! GitHub REST access: paging, credentials, and status mapping.
//!
//! This module wraps Octocrab behind the [`ForgeGateway`] trait so collectors
//! can walk paginated collections, validate personal access tokens, and
//! receive structured errors without depending on Octocrab internals.

pub mod error;
pub mod gateway;
pub mod locator;
pub mod pagination;
pub mod rate_limit;
pub mod token;

pub use error::ForgeError;
pub use gateway::{AuthenticatedUser, ForgeGateway, OctocrabForgeGateway};
pub use locator::{PersonalAccessToken, RepositoryName, RepositoryOwner, RepositorySlug};
pub use pagination::{PagedRecords, PaginationLimits, fetch_all_pages};
pub use rate_limit::RateLimitInfo;
pub use token::{TokenValidation, TokenValidator};

#[cfg(test)]
pub use gateway::MockForgeGateway;
