//! Octocrab client construction for the forge gateway.

use http::Uri;
use octocrab::Octocrab;
use octocrab::service::middleware::retry::RetryConfig;

use crate::github::error::ForgeError;
use crate::github::locator::PersonalAccessToken;

/// Builds an Octocrab client for the API base URL.
///
/// With a token the client sends it as a bearer credential; without one the
/// client is anonymous and subject to GitHub's lower unauthenticated quota.
/// Octocrab's built-in retry layer is disabled: every request is sent once
/// and failures surface to the caller unchanged.
///
/// # Errors
///
/// Returns [`ForgeError::Configuration`] when the base URI cannot be parsed
/// or Octocrab fails to construct a client.
pub(super) fn build_octocrab_client(
    token: Option<&PersonalAccessToken>,
    api_base: &str,
) -> Result<Octocrab, ForgeError> {
    let base_uri: Uri = api_base
        .parse::<Uri>()
        .map_err(|error| ForgeError::Configuration {
            message: format!("invalid API base {api_base:?}: {error}"),
        })?;

    let builder = Octocrab::builder().add_retry_config(RetryConfig::None);
    let builder = match token {
        Some(personal_token) => builder.personal_token(personal_token.value()),
        None => builder,
    };

    builder
        .base_uri(base_uri)
        .map_err(|error| ForgeError::Configuration {
            message: format!("build client failed: {error}"),
        })?
        .build()
        .map_err(|error| ForgeError::Configuration {
            message: format!("build client failed: {error}"),
        })
}
