//! End-to-end aggregation against a mocked GitHub REST API.
//!
//! These tests drive [`ContributionAggregator::fetch`] through the Octocrab
//! gateway so pagination, error mapping, filtering, and caching are exercised
//! together over HTTP.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use tally::contributions::test_support::{
    commit_json, issue_json, pull_request_json, pull_request_marker, review_json,
};
use tally::contributions::ContributorRecords;
use tally::github::PaginationLimits;
use tally::persistence::{CachePolicy, ContributionCache, MemoryKeyValueStore};
use tally::{
    AggregatorSettings, ContributionAggregator, ContributionSet, Contributor, FetchRequest,
    ForgeError, RepositorySlug,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn now() -> DateTime<Utc> {
    "2025-06-01T00:00:00Z"
        .parse()
        .expect("timestamp should parse")
}

struct Harness {
    server: MockServer,
    cache: ContributionCache,
}

impl Harness {
    fn aggregator(&self) -> ContributionAggregator {
        self.aggregator_with(AggregatorSettings::default())
    }

    fn aggregator_with(&self, settings: AggregatorSettings) -> ContributionAggregator {
        ContributionAggregator::new(
            self.cache.clone(),
            AggregatorSettings {
                now: Some(now()),
                api_base: self.server.uri(),
                validate_token: false,
                ..settings
            },
        )
    }

    async fn serve(&self, route: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    async fn reject(&self, route: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_json(json!({ "message": "Bad credentials" })),
            )
            .mount(&self.server)
            .await;
    }

    async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or_default()
    }
}

#[fixture]
async fn harness() -> Harness {
    Harness {
        server: MockServer::start().await,
        cache: ContributionCache::new(Arc::new(MemoryKeyValueStore::new()), CachePolicy::default()),
    }
}

fn request() -> FetchRequest {
    FetchRequest::new(
        RepositorySlug::parse("o/r").expect("slug should parse"),
        Contributor::unique(["alice", "bob"]),
    )
}

async fn serve_alice_and_bob(harness: &Harness) {
    harness
        .serve(
            "/repos/o/r/commits",
            json!([
                commit_json("a1", "alice", "2025-01-15T00:00:00Z"),
                commit_json("a2", "alice", "2025-03-15T00:00:00Z"),
                commit_json("a0", "alice", "2024-12-31T23:59:59Z"),
                commit_json("c1", "carol", "2025-02-01T00:00:00Z"),
            ]),
        )
        .await;
    harness
        .serve(
            "/repos/o/r/pulls",
            json!([pull_request_json(3, "bob", "2025-02-01T00:00:00Z", true)]),
        )
        .await;
    harness
        .serve(
            "/repos/o/r/issues",
            json!([
                issue_json(9, "alice", "2025-04-01T00:00:00Z"),
                pull_request_marker(issue_json(3, "bob", "2025-02-01T00:00:00Z")),
            ]),
        )
        .await;
    harness
        .serve(
            "/repos/o/r/pulls/3/reviews",
            json!([review_json("alice", "APPROVED", "2025-02-02T00:00:00Z")]),
        )
        .await;
}

#[rstest]
#[tokio::test]
async fn aggregates_each_contributor(#[future] harness: Harness) {
    let harness = harness.await;
    serve_alice_and_bob(&harness).await;

    let set = harness
        .aggregator()
        .fetch(&request())
        .await
        .expect("aggregation should succeed");

    let alice = set.summary.get("alice").expect("alice summary");
    assert_eq!(
        (alice.commits, alice.pull_requests, alice.issues, alice.reviews, alice.total),
        (2, 0, 1, 1, 4)
    );
    let bob = set.summary.get("bob").expect("bob summary");
    assert_eq!(
        (bob.commits, bob.pull_requests, bob.issues, bob.reviews, bob.total),
        (0, 1, 0, 0, 1)
    );
    assert!(!set.summary.contains_key("carol"));
    assert!(set.pull_requests.get("bob").is_some_and(|pulls| pulls[0].merged));
    assert_eq!(set.reviews["alice"][0].pull_request_number, 3);
}

#[rstest]
#[tokio::test]
async fn repeated_fetch_is_served_from_cache(#[future] harness: Harness) {
    let harness = harness.await;
    serve_alice_and_bob(&harness).await;
    let aggregator = harness.aggregator();

    let first = aggregator.fetch(&request()).await.expect("first fetch");
    let after_first = harness.request_count().await;
    let second = aggregator.fetch(&request()).await.expect("second fetch");

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).expect("serialise"),
        serde_json::to_string(&second).expect("serialise")
    );
    assert_eq!(harness.request_count().await, after_first);
}

#[rstest]
#[tokio::test]
async fn rejected_credentials_fall_back_to_expired_cache(#[future] harness: Harness) {
    let harness = harness.await;
    harness.reject("/repos/o/r/commits", 401).await;
    harness.serve("/repos/o/r/pulls", json!([])).await;
    harness.serve("/repos/o/r/issues", json!([])).await;
    let stale = ContributionSet::assemble(
        &request().contributors,
        ContributorRecords::new(),
        ContributorRecords::new(),
        ContributorRecords::new(),
        ContributorRecords::new(),
    );
    harness
        .cache
        .set(
            &ContributionAggregator::cache_key(&request()),
            &stale,
            now() - TimeDelta::hours(5),
        )
        .expect("seed should succeed");

    let set = harness
        .aggregator()
        .fetch(&request().with_token("ghp_revoked"))
        .await
        .expect("stale entry should be served");

    assert_eq!(set, stale);
}

#[rstest]
#[tokio::test]
async fn rejected_credentials_without_cache_fail(#[future] harness: Harness) {
    let harness = harness.await;
    harness.reject("/repos/o/r/commits", 401).await;
    harness.serve("/repos/o/r/pulls", json!([])).await;
    harness.serve("/repos/o/r/issues", json!([])).await;

    let result = harness.aggregator().fetch(&request()).await;

    assert!(
        matches!(result, Err(ForgeError::AuthenticationFailed { .. })),
        "unexpected result: {result:?}"
    );
}

#[rstest]
#[tokio::test]
async fn missing_resource_leaves_other_kinds_intact(#[future] harness: Harness) {
    let harness = harness.await;
    harness
        .serve(
            "/repos/o/r/commits",
            json!([commit_json("a1", "alice", "2025-01-15T00:00:00Z")]),
        )
        .await;
    harness.reject("/repos/o/r/pulls", 500).await;
    harness.serve("/repos/o/r/issues", json!([])).await;

    let set = harness
        .aggregator()
        .fetch(&request())
        .await
        .expect("isolated failures do not fail the run");

    assert_eq!(set.summary["alice"].commits, 1);
    assert!(set.pull_requests.values().all(Vec::is_empty));
    assert!(set.reviews.values().all(Vec::is_empty));
}

#[rstest]
#[case::server_error(500)]
#[case::too_many_requests(429)]
#[tokio::test]
async fn failed_pages_are_requested_once(#[future] harness: Harness, #[case] status: u16) {
    let harness = harness.await;
    harness.serve("/repos/o/r/commits", json!([])).await;
    harness.reject("/repos/o/r/pulls", status).await;
    harness.serve("/repos/o/r/issues", json!([])).await;

    let _outcome = harness.aggregator().fetch(&request()).await;

    let pulls_requests = harness
        .server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|received| received.url.path() == "/repos/o/r/pulls")
        .count();
    // One walk for pull requests and one for the review candidates.
    assert_eq!(pulls_requests, 2, "status {status} must not be retried");
}

#[rstest]
#[tokio::test]
async fn page_walk_stops_at_the_cap(#[future] harness: Harness) {
    let harness = harness.await;
    Mock::given(method("GET"))
        .and(path("/repos/o/r/commits"))
        .and(query_param("per_page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            commit_json("a1", "alice", "2025-01-15T00:00:00Z"),
            commit_json("a2", "alice", "2025-01-16T00:00:00Z"),
        ])))
        .expect(10)
        .mount(&harness.server)
        .await;
    harness.serve("/repos/o/r/pulls", json!([])).await;
    harness.serve("/repos/o/r/issues", json!([])).await;

    let set = harness
        .aggregator_with(AggregatorSettings {
            limits: PaginationLimits::new(2, 10).expect("limits should be valid"),
            ..AggregatorSettings::default()
        })
        .fetch(&request())
        .await
        .expect("aggregation should succeed");

    assert_eq!(set.summary["alice"].commits, 20);
}

#[rstest]
#[tokio::test]
async fn token_probe_failure_does_not_block(#[future] harness: Harness) {
    let harness = harness.await;
    serve_alice_and_bob(&harness).await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Bad credentials" })),
        )
        .expect(1)
        .mount(&harness.server)
        .await;
    let aggregator = ContributionAggregator::new(
        harness.cache.clone(),
        AggregatorSettings {
            now: Some(now()),
            api_base: harness.server.uri(),
            ..AggregatorSettings::default()
        },
    );

    let set = aggregator
        .fetch(&request().with_token("ghp_expired"))
        .await
        .expect("validation is advisory");

    assert_eq!(set.summary["alice"].total, 4);
}
