//! Gateways for reading GitHub collections through Octocrab.
//!
//! The [`ForgeGateway`] trait is the seam between the contribution collectors
//! and the network. Collectors and the paginated fetcher only ever see
//! undecoded pages, which keeps them testable with a mock gateway while
//! [`OctocrabForgeGateway`] handles real HTTP requests.

mod client;
mod error_mapping;
mod forge;
mod http_utils;

pub use forge::{DEFAULT_API_BASE, OctocrabForgeGateway};

use async_trait::async_trait;

use crate::github::error::ForgeError;
use crate::github::pagination::{PageRequest, RawPage};
use crate::github::rate_limit::RateLimitInfo;

/// Identity returned by the authenticated-user endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Login of the token owner.
    pub login: String,
    /// Quota snapshot from the response headers.
    pub rate_limit: Option<RateLimitInfo>,
}

/// Gateway that can read paged collections and the token owner.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ForgeGateway: Send + Sync {
    /// Fetch a single page of a collection endpoint.
    async fn get_page(&self, request: &PageRequest) -> Result<RawPage, ForgeError>;

    /// Fetch the identity of the token owner (`GET /user`).
    async fn authenticated_user(&self) -> Result<AuthenticatedUser, ForgeError>;
}
