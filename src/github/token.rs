//! Advisory validation of personal access tokens.
//!
//! Validation is diagnostic only. The outcome is logged by the aggregator and
//! never stops a fetch, so every failure mode here becomes a negative
//! [`TokenValidation`] instead of an error.

use super::error::ForgeError;
use super::gateway::ForgeGateway;
use super::locator::PersonalAccessToken;
use super::rate_limit::RateLimitInfo;

/// Outcome of probing the API with a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenValidation {
    /// No usable token was supplied; nothing was sent.
    Missing,
    /// GitHub accepted the token.
    Valid {
        /// Login of the token owner.
        login: String,
        /// Quota reported with the identity response.
        rate_limit: Option<RateLimitInfo>,
    },
    /// GitHub rejected the token or answered with an unexpected status.
    Invalid {
        /// Human-readable reason.
        reason: String,
    },
    /// The token lacks the scopes needed to read the identity endpoint.
    InsufficientScope {
        /// Message returned by GitHub.
        reason: String,
    },
    /// The identity endpoint could not be reached or understood.
    Unreachable {
        /// Transport or decoding detail.
        reason: String,
    },
}

impl TokenValidation {
    /// Returns true only for [`TokenValidation::Valid`].
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    /// Returns the reason for a negative outcome, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Missing => Some("no token configured"),
            Self::Valid { .. } => None,
            Self::Invalid { reason }
            | Self::InsufficientScope { reason }
            | Self::Unreachable { reason } => Some(reason.as_str()),
        }
    }
}

/// Probes the identity endpoint with the gateway's credential.
pub struct TokenValidator<'client, Gateway>
where
    Gateway: ForgeGateway + ?Sized,
{
    client: &'client Gateway,
}

impl<'client, Gateway> TokenValidator<'client, Gateway>
where
    Gateway: ForgeGateway + ?Sized,
{
    /// Create a validator using the provided gateway.
    ///
    /// The gateway must already carry the token being validated.
    #[must_use]
    pub const fn new(client: &'client Gateway) -> Self {
        Self { client }
    }

    /// Validates `token` with one call to `GET /user`.
    ///
    /// Blank and placeholder tokens short-circuit to
    /// [`TokenValidation::Missing`] without any network activity.
    pub async fn validate(&self, token: Option<&str>) -> TokenValidation {
        if PersonalAccessToken::from_optional(token).is_none() {
            return TokenValidation::Missing;
        }

        match self.client.authenticated_user().await {
            Ok(user) => TokenValidation::Valid {
                login: user.login,
                rate_limit: user.rate_limit,
            },
            Err(ForgeError::AuthenticationFailed { .. }) => TokenValidation::Invalid {
                reason: "token is invalid or expired".to_owned(),
            },
            Err(
                ForgeError::AuthorizationInsufficient { message, .. }
                | ForgeError::RateLimitExceeded {
                    status: 403,
                    message,
                    ..
                },
            ) => TokenValidation::InsufficientScope { reason: message },
            Err(
                ForgeError::GenericHttp { status, message }
                | ForgeError::RateLimitExceeded {
                    status, message, ..
                },
            ) => TokenValidation::Invalid {
                reason: format!("unexpected status {status}: {message}"),
            },
            Err(other) => TokenValidation::Unreachable {
                reason: other.to_string(),
            },
        }
    }
}
