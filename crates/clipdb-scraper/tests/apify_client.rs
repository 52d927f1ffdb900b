//! Integration tests for `ApifyClient`.
//!
//! Uses `wiremock` to stand up a local HTTP server so no real network
//! traffic is made. Covers run launch, status polling, and each dataset
//! outcome the fetcher distinguishes (items, not-ready, hard failure).

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{bearer_token, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use clipdb_core::Platform;
use clipdb_scraper::{
    fetch_dataset, start, ActorIds, ApifyClient, RemoteScraper, RemoteStatus, RetryPolicy,
    ScraperError,
};

fn test_client(server: &MockServer) -> ApifyClient {
    ApifyClient::new(
        "test-token",
        &server.uri(),
        ActorIds::default(),
        5,
        "clipdb-test/0.1",
    )
    .expect("failed to build test ApifyClient")
}

fn run_json(id: &str, status: &str) -> serde_json::Value {
    json!({
        "data": {
            "id": id,
            "status": status,
            "defaultDatasetId": "ds1",
            "startedAt": "2024-01-01T00:00:00.000Z",
            "finishedAt": null
        }
    })
}

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        delay: Duration::ZERO,
    }
}

#[tokio::test]
async fn launch_posts_actor_input_with_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/acts/clockworks~tiktok-scraper/runs"))
        .and(bearer_token("test-token"))
        .and(body_partial_json(json!({"profiles": ["creator"], "resultsPerPage": 20})))
        .respond_with(ResponseTemplate::new(201).set_body_json(run_json("run-1", "READY")))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let handle = start(&client, Platform::TikTok, "@Creator", 20)
        .await
        .expect("launch should succeed");

    assert_eq!(handle.remote_id, "run-1");
    assert_eq!(handle.status, RemoteStatus::Ready);
}

#[tokio::test]
async fn launch_rejection_is_wrapped_as_remote_launch() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/acts/apify~instagram-scraper/runs"))
        .respond_with(ResponseTemplate::new(402).set_body_string("monthly usage exceeded"))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = start(&client, Platform::Instagram, "creator", 10)
        .await
        .unwrap_err();

    match err {
        ScraperError::RemoteLaunch { platform, message } => {
            assert_eq!(platform, Platform::Instagram);
            assert!(message.contains("monthly usage exceeded"), "{message}");
        }
        other => panic!("expected RemoteLaunch, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_input_never_reaches_the_server() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(run_json("x", "READY")))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = start(&client, Platform::TikTok, "   ", 10).await.unwrap_err();
    assert!(matches!(err, ScraperError::InvalidInput { .. }));
    let err = start(&client, Platform::TikTok, "creator", 101)
        .await
        .unwrap_err();
    assert!(matches!(err, ScraperError::InvalidInput { .. }));
}

#[tokio::test]
async fn get_status_maps_remote_vocabulary() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/actor-runs/run-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_json("run-2", "SUCCEEDED")))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let status = client.get_status("run-2").await.unwrap();
    assert_eq!(status.status, RemoteStatus::Succeeded);
    assert!(status.started_at.is_some());
    assert!(status.finished_at.is_none());
}

#[tokio::test]
async fn dataset_items_are_returned_raw() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/actor-runs/run-3/dataset/items"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "1", "playCount": 5},
            {"id": "2", "playCount": 6}
        ])))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let items = client.get_dataset_items("run-3").await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1]["playCount"], 6);
}

#[tokio::test]
async fn dataset_404_is_not_ready() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/actor-runs/run-4/dataset/items"))
        .respond_with(ResponseTemplate::new(404).set_body_string("record-not-found"))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client.get_dataset_items("run-4").await.unwrap_err();
    assert!(err.is_not_ready(), "expected NotReady, got {err:?}");
}

#[tokio::test]
async fn dataset_unauthorized_is_a_hard_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/actor-runs/run-5/dataset/items"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client.get_dataset_items("run-5").await.unwrap_err();
    assert!(matches!(err, ScraperError::Api { status: 401, .. }));
}

#[tokio::test]
async fn fetcher_recovers_after_conflict_responses() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/actor-runs/run-6/dataset/items"))
        .respond_with(ResponseTemplate::new(409).set_body_string("dataset locked"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/actor-runs/run-6/dataset/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "9"}])))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let items = fetch_dataset(&client, "run-6", fast_policy(3)).await.unwrap();
    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn fetcher_fails_fast_on_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/actor-runs/run-7/dataset/items"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = fetch_dataset(&client, "run-7", fast_policy(3))
        .await
        .unwrap_err();
    assert!(matches!(err, ScraperError::RemoteFatal { .. }), "{err:?}");
}
