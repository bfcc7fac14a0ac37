//! Tests for repository, contributor, and token resolution.

use rstest::rstest;

use crate::TallyConfig;
use crate::github::error::ForgeError;

#[rstest]
fn configured_token_wins_over_github_token() {
    let _guard = env_lock::lock_env([("GITHUB_TOKEN", Some("env-token"))]);
    let config = TallyConfig {
        token: Some("config-token".to_owned()),
        ..Default::default()
    };

    assert_eq!(config.resolve_token().as_deref(), Some("config-token"));
}

#[rstest]
fn github_token_is_the_fallback() {
    let _guard = env_lock::lock_env([("GITHUB_TOKEN", Some("env-token"))]);
    let config = TallyConfig::default();

    assert_eq!(config.resolve_token().as_deref(), Some("env-token"));
}

#[rstest]
fn blank_token_counts_as_absent() {
    let _guard = env_lock::lock_env([("GITHUB_TOKEN", None::<&str>)]);
    let config = TallyConfig {
        token: Some("   ".to_owned()),
        ..Default::default()
    };

    assert_eq!(config.resolve_token(), None);
}

#[rstest]
fn missing_repository_is_a_configuration_error() {
    let result = TallyConfig::default().require_repository();

    assert!(
        matches!(result, Err(ForgeError::Configuration { ref message }) if message.contains("--repository")),
        "unexpected result: {result:?}"
    );
}

#[rstest]
#[case::no_slash("stellar")]
#[case::empty_owner("/docs")]
#[case::extra_segment("a/b/c")]
fn malformed_repository_is_rejected(#[case] raw: &str) {
    let config = TallyConfig {
        repository: Some(raw.to_owned()),
        ..Default::default()
    };

    let result = config.require_repository();

    assert!(
        matches!(result, Err(ForgeError::InvalidRepository { .. })),
        "expected {raw:?} to be rejected, got {result:?}"
    );
}

#[rstest]
fn contributor_list_trims_and_dedupes() {
    let config = TallyConfig {
        contributors: Some(" alice, ,Bob,ALICE,carol ".to_owned()),
        ..Default::default()
    };

    let logins: Vec<String> = config
        .contributor_list()
        .iter()
        .map(|contributor| contributor.login().to_owned())
        .collect();

    assert_eq!(logins, ["alice", "Bob", "carol"]);
}

#[rstest]
#[case::unset(None)]
#[case::only_separators(Some(" , ,"))]
fn empty_contributor_list_is_rejected(#[case] raw: Option<&str>) {
    let config = TallyConfig {
        contributors: raw.map(str::to_owned),
        ..Default::default()
    };

    assert!(matches!(
        config.require_contributors(),
        Err(ForgeError::Configuration { .. })
    ));
}

#[rstest]
fn fetch_request_honours_refresh() {
    let config = TallyConfig {
        repository: Some("o/r".to_owned()),
        contributors: Some("alice".to_owned()),
        refresh: true,
        ..Default::default()
    };

    let request = config.fetch_request().expect("request should build");

    assert_eq!(request.repository.to_string(), "o/r");
    assert_eq!(request.contributors.len(), 1);
    assert!(!request.use_cache);
    assert_eq!(request.token, None);
}
