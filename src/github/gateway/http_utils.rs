//! Shared HTTP utilities for the forge gateway.

use http::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};

/// Versioned media type requested on every call.
pub(super) const GITHUB_MEDIA_TYPE: &str = "application/vnd.github.v3+json";

/// REST API version pinned on every call.
pub(super) const GITHUB_API_VERSION: &str = "2022-11-28";

const API_VERSION_HEADER: HeaderName = HeaderName::from_static("x-github-api-version");

pub(super) fn build_request_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
    headers.insert(
        API_VERSION_HEADER,
        HeaderValue::from_static(GITHUB_API_VERSION),
    );
    headers
}

/// Appends `key=value` pairs to a path, percent-encoding the values.
pub(super) fn path_with_query(path: &str, query: &[(String, String)]) -> String {
    if query.is_empty() {
        return path.to_owned();
    }

    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(query.iter().map(|(key, value)| (key.as_str(), value.as_str())))
        .finish();
    format!("{path}?{encoded}")
}

pub(super) fn extract_github_message(body: &str) -> Option<String> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return None;
    };
    value
        .get("message")
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
}
