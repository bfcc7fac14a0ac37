//! Octocrab implementation of the forge gateway.

use async_trait::async_trait;
use http::{StatusCode, Uri};
use octocrab::Octocrab;
use serde::Deserialize;
use serde_json::Value;

use crate::github::error::ForgeError;
use crate::github::locator::PersonalAccessToken;
use crate::github::pagination::{PageRequest, RawPage};
use crate::github::rate_limit::RateLimitInfo;

use super::client::build_octocrab_client;
use super::error_mapping::{map_http_error, map_octocrab_error};
use super::http_utils::{build_request_headers, extract_github_message, path_with_query};
use super::{AuthenticatedUser, ForgeGateway};

/// Public GitHub API base.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

#[derive(Debug, Deserialize)]
struct ApiUser {
    login: String,
}

struct RawResponse {
    status: StatusCode,
    headers: http::HeaderMap,
    body: String,
}

/// Octocrab-backed gateway.
///
/// Requests go through Octocrab's raw `_get_with_headers` so the status code
/// and `X-RateLimit-*` headers stay visible on every response.
pub struct OctocrabForgeGateway {
    client: Octocrab,
}

impl OctocrabForgeGateway {
    /// Creates a new gateway from an Octocrab client.
    #[must_use]
    pub const fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Builds a gateway for the API base, authenticated when a token is given.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError::Configuration`] when the base URI cannot be
    /// parsed or Octocrab fails to construct a client.
    pub fn for_token(
        token: Option<&PersonalAccessToken>,
        api_base: &str,
    ) -> Result<Self, ForgeError> {
        let octocrab = build_octocrab_client(token, api_base)?;
        Ok(Self::new(octocrab))
    }

    async fn get_raw(&self, operation: &str, path_and_query: &str) -> Result<RawResponse, ForgeError> {
        let uri: Uri = path_and_query
            .parse::<Uri>()
            .map_err(|error| ForgeError::Configuration {
                message: format!("invalid request path {path_and_query:?}: {error}"),
            })?;

        let response = self
            .client
            ._get_with_headers(uri, Some(build_request_headers()))
            .await
            .map_err(|error| map_octocrab_error(operation, &error))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = self
            .client
            .body_to_string(response)
            .await
            .map_err(|error| ForgeError::Network {
                message: format!("{operation} response could not be read: {error}"),
            })?;

        if !status.is_success() {
            return Err(map_http_error(
                operation,
                status,
                &headers,
                extract_github_message(&body),
            ));
        }

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl ForgeGateway for OctocrabForgeGateway {
    async fn get_page(&self, request: &PageRequest) -> Result<RawPage, ForgeError> {
        let mut query = request.query.clone();
        query.push(("page".to_owned(), request.page.to_string()));
        query.push(("per_page".to_owned(), request.per_page.to_string()));
        let operation = format!("GET {}", request.path);

        let response = self
            .get_raw(&operation, &path_with_query(&request.path, &query))
            .await?;

        let records: Vec<Value> =
            serde_json::from_str(&response.body).map_err(|error| ForgeError::Decode {
                message: format!(
                    "{operation} page {page} (status {status}) is not a JSON array: {error}",
                    page = request.page,
                    status = response.status
                ),
            })?;

        Ok(RawPage {
            records,
            rate_limit: RateLimitInfo::from_headers(&response.headers),
        })
    }

    async fn authenticated_user(&self) -> Result<AuthenticatedUser, ForgeError> {
        let response = self.get_raw("GET /user", "/user").await?;

        let user: ApiUser =
            serde_json::from_str(&response.body).map_err(|error| ForgeError::Decode {
                message: format!("GET /user returned an unexpected body: {error}"),
            })?;

        Ok(AuthenticatedUser {
            login: user.login,
            rate_limit: RateLimitInfo::from_headers(&response.headers),
        })
    }
}
