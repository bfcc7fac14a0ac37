//! Error types exposed by the GitHub access layer.

use thiserror::Error;

use super::rate_limit::RateLimitInfo;

/// Errors surfaced while talking to the GitHub REST API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ForgeError {
    /// The API quota is exhausted (403 with zero remaining, or 429).
    #[error("GitHub API rate limit exceeded: {message}; add a token or wait for the quota to reset")]
    RateLimitExceeded {
        /// HTTP status that signalled the limit (403 or 429).
        status: u16,
        /// Rate limit snapshot taken from the response headers.
        rate_limit: Option<RateLimitInfo>,
        /// Seconds to wait according to the `Retry-After` header.
        retry_after_seconds: Option<u64>,
        /// Error message from GitHub.
        message: String,
    },

    /// The request was forbidden while quota remained (403).
    #[error("GitHub refused the request: {message}; check the token scope")]
    AuthorizationInsufficient {
        /// Rate limit snapshot taken from the response headers.
        rate_limit: Option<RateLimitInfo>,
        /// Error message from GitHub.
        message: String,
    },

    /// The credential was rejected (401).
    #[error("GitHub authentication failed: {message}; check that the token is valid")]
    AuthenticationFailed {
        /// Error message from GitHub.
        message: String,
    },

    /// Any other non-success status.
    #[error("GitHub API error {status}: {message}")]
    GenericHttp {
        /// HTTP status code.
        status: u16,
        /// Status text and GitHub message.
        message: String,
    },

    /// Networking failed while calling GitHub.
    #[error("network error talking to GitHub: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// A response body could not be decoded.
    #[error("unexpected GitHub response: {message}")]
    Decode {
        /// Decoder error detail.
        message: String,
    },

    /// The repository identifier is not `owner/name`.
    #[error("repository must be given as owner/name: {message}")]
    InvalidRepository {
        /// Details about the rejected input.
        message: String,
    },

    /// Invalid pagination parameters.
    #[error("invalid pagination: {message}")]
    InvalidPagination {
        /// Description of the invalid parameter.
        message: String,
    },

    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {message}")]
    Configuration {
        /// Details about the configuration failure.
        message: String,
    },
}

impl ForgeError {
    /// Returns true for failures that affect every request made with the same
    /// credential, so retrying other resources cannot succeed.
    ///
    /// Collectors propagate systemic errors and absorb the rest.
    #[must_use]
    pub const fn is_systemic(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded { .. }
                | Self::AuthorizationInsufficient { .. }
                | Self::AuthenticationFailed { .. }
        )
    }
}
