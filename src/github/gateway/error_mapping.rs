//! Status and transport error mapping for the forge gateway.

use http::{HeaderMap, StatusCode};

use crate::github::error::ForgeError;
use crate::github::rate_limit::{RateLimitInfo, retry_after_seconds};

/// Checks if an octocrab error represents a network/transport issue.
pub(super) const fn is_network_error(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Http { .. }
            | octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. }
    )
}

pub(super) fn map_octocrab_error(operation: &str, error: &octocrab::Error) -> ForgeError {
    if is_network_error(error) {
        return ForgeError::Network {
            message: format!("{operation} failed: {error}"),
        };
    }

    if matches!(error, octocrab::Error::Serde { .. }) {
        return ForgeError::Decode {
            message: format!("{operation} failed: {error}"),
        };
    }

    ForgeError::Configuration {
        message: format!("{operation} request could not be built: {error}"),
    }
}

/// Maps a non-success response into the matching [`ForgeError`].
///
/// A 403 counts as rate limiting only when the quota headers report zero
/// remaining requests; otherwise it is a scope problem. A 429 is always rate
/// limiting.
pub(super) fn map_http_error(
    operation: &str,
    status: StatusCode,
    headers: &HeaderMap,
    maybe_message: Option<String>,
) -> ForgeError {
    let reason = status.canonical_reason().unwrap_or("unknown status");
    let detailed = maybe_message
        .as_deref()
        .map_or_else(|| reason.to_owned(), |text| format!("{reason}: {text}"));
    let message = maybe_message.unwrap_or_else(|| reason.to_owned());
    let rate_limit = RateLimitInfo::from_headers(headers);

    match status {
        StatusCode::UNAUTHORIZED => ForgeError::AuthenticationFailed {
            message: format!("{operation} failed: {message}"),
        },
        StatusCode::FORBIDDEN if rate_limit.is_some_and(|info| info.is_exhausted()) => {
            rate_limited(operation, status, headers, rate_limit, &message)
        }
        StatusCode::TOO_MANY_REQUESTS => {
            rate_limited(operation, status, headers, rate_limit, &message)
        }
        StatusCode::FORBIDDEN => ForgeError::AuthorizationInsufficient {
            rate_limit,
            message: format!("{operation} failed: {message}"),
        },
        _ => ForgeError::GenericHttp {
            status: status.as_u16(),
            message: format!("{operation} failed: {detailed}"),
        },
    }
}

fn rate_limited(
    operation: &str,
    status: StatusCode,
    headers: &HeaderMap,
    rate_limit: Option<RateLimitInfo>,
    message: &str,
) -> ForgeError {
    let base_message = format!("{operation} failed: {message}");
    let full_message = match &rate_limit {
        Some(info) => format!(
            "{base_message} (resets at {reset})",
            reset = info.reset_at()
        ),
        None => base_message,
    };

    ForgeError::RateLimitExceeded {
        status: status.as_u16(),
        rate_limit,
        retry_after_seconds: retry_after_seconds(headers),
        message: full_message,
    }
}

#[cfg(test)]
mod tests {
    use http::{HeaderMap, HeaderValue, StatusCode};
    use rstest::rstest;

    use super::map_http_error;
    use crate::github::error::ForgeError;
    use crate::github::rate_limit::RateLimitInfo;

    fn quota_headers(remaining: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-limit", HeaderValue::from_static("60"));
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static(remaining));
        headers.insert("x-ratelimit-reset", HeaderValue::from_static("1700000000"));
        headers
    }

    #[rstest]
    fn forbidden_with_exhausted_quota_is_rate_limit() {
        let mut headers = quota_headers("0");
        headers.insert("retry-after", HeaderValue::from_static("30"));

        let error = map_http_error(
            "list commits",
            StatusCode::FORBIDDEN,
            &headers,
            Some("API rate limit exceeded".to_owned()),
        );

        assert_eq!(
            error,
            ForgeError::RateLimitExceeded {
                status: 403,
                rate_limit: Some(RateLimitInfo::new(60, 0, 1_700_000_000)),
                retry_after_seconds: Some(30),
                message: "list commits failed: API rate limit exceeded (resets at 1700000000)"
                    .to_owned(),
            }
        );
    }

    #[rstest]
    #[case::quota_left(quota_headers("12"))]
    #[case::no_quota_headers(HeaderMap::new())]
    fn forbidden_with_quota_left_is_authorization(#[case] headers: HeaderMap) {
        let error = map_http_error("list pulls", StatusCode::FORBIDDEN, &headers, None);

        assert!(
            matches!(error, ForgeError::AuthorizationInsufficient { .. }),
            "expected AuthorizationInsufficient, got {error:?}"
        );
    }

    #[rstest]
    fn too_many_requests_is_rate_limit() {
        let error = map_http_error(
            "list issues",
            StatusCode::TOO_MANY_REQUESTS,
            &HeaderMap::new(),
            None,
        );

        assert!(matches!(error, ForgeError::RateLimitExceeded { .. }));
    }

    #[rstest]
    fn unauthorised_is_authentication_failure() {
        let error = map_http_error(
            "user",
            StatusCode::UNAUTHORIZED,
            &HeaderMap::new(),
            Some("Bad credentials".to_owned()),
        );

        assert_eq!(
            error,
            ForgeError::AuthenticationFailed {
                message: "user failed: Bad credentials".to_owned(),
            }
        );
    }

    #[rstest]
    fn other_status_is_generic_with_code_and_text() {
        let error = map_http_error(
            "list pulls",
            StatusCode::BAD_GATEWAY,
            &HeaderMap::new(),
            None,
        );

        assert_eq!(
            error,
            ForgeError::GenericHttp {
                status: 502,
                message: "list pulls failed: Bad Gateway".to_owned(),
            }
        );
    }
}
