use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::Request;
use clipdb_jobs::{MemoryStore, ServiceSettings};
use clipdb_scraper::testing::ScriptedScraper;
use clipdb_scraper::{RemoteStatus, RetryPolicy, ScraperError};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::*;

struct TestApp {
    remote: Arc<ScriptedScraper>,
    state: AppState,
}

fn test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let remote = Arc::new(ScriptedScraper::new());
    let settings = ServiceSettings {
        dataset_retry: RetryPolicy::new(1, Duration::ZERO),
        ..ServiceSettings::default()
    };
    let state = AppState {
        service: AnalyticsService::new(store, remote.clone(), settings),
        pool: None,
        expose_internal_errors: true,
    };
    TestApp { remote, state }
}

fn router(app: &TestApp) -> Router {
    build_app(app.state.clone(), AuthState::disabled(), None)
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("json parse")
    };
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

#[test]
fn normalize_limit_applies_defaults_and_bounds() {
    assert_eq!(normalize_limit(None), 50);
    assert_eq!(normalize_limit(Some(0)), 1);
    assert_eq!(normalize_limit(Some(1_000)), 200);
    assert_eq!(normalize_limit(Some(25)), 25);
}

#[test]
fn api_error_codes_map_to_statuses() {
    let cases = [
        ("validation_error", StatusCode::BAD_REQUEST),
        ("not_found", StatusCode::NOT_FOUND),
        ("remote_launch_failed", StatusCode::BAD_GATEWAY),
        ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, expected) in cases {
        let response = ApiError::new("req-1", code, "message").into_response();
        assert_eq!(response.status(), expected, "{code}");
    }
}

#[tokio::test]
async fn health_without_database_is_ok() {
    let app = test_app();
    let (status, json) = send(router(&app), get("/api/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "ok");
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn request_id_header_is_echoed() {
    let app = test_app();
    let response = router(&app)
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("x-request-id", "req-abc")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "req-abc"
    );
}

#[tokio::test]
async fn analysis_then_poll_until_completed() {
    let app = test_app();

    let (status, json) = send(
        router(&app),
        post_json(
            "/api/v1/analyses",
            &json!({"platform": "tiktok", "identifier": "@creator", "result_limit": 10}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["data"]["source"], "job");
    assert_eq!(json["data"]["job"]["status"], "running");
    let job_id = json["data"]["job"]["jobId"].as_str().unwrap().to_string();

    let (status, json) = send(router(&app), get(&format!("/api/v1/scrape-jobs/{job_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "running");
    assert!(json["data"].get("resultCount").is_none());

    app.remote.set_status("run-1", RemoteStatus::Succeeded);
    app.remote.push_dataset(Ok(vec![json!({
        "webVideoUrl": "https://www.tiktok.com/@creator/video/123",
        "diggCount": 10,
        "playCount": 100,
        "commentCount": 2,
        "shareCount": 1
    })]));

    let (status, json) = send(router(&app), get(&format!("/api/v1/scrape-jobs/{job_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "completed");
    assert_eq!(json["data"]["resultCount"], 1);

    let (status, json) = send(
        router(&app),
        get("/api/v1/profiles/tiktok/creator/videos?limit=5"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"][0]["video_id"], "123");
    let rate = json["data"][0]["engagement_rate"].as_f64().unwrap();
    assert!((rate - 13.0).abs() < 1e-9);

    let (status, json) = send(router(&app), get("/api/v1/profiles/tiktok/creator")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["stored_videos"], 1);
    assert_eq!(json["data"]["summary"]["total_views"], 100);

    let (status, json) = send(router(&app), get("/api/v1/profiles/tiktok/creator/jobs")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"][0]["status"], "completed");
}

#[tokio::test]
async fn second_request_for_fresh_profile_is_served_from_cache() {
    let app = test_app();
    let body = json!({"platform": "tiktok", "username": "creator"});

    let (_, json) = send(router(&app), post_json("/api/v1/analyses", &body)).await;
    let job_id = json["data"]["job"]["jobId"].as_str().unwrap().to_string();
    app.remote.set_status("run-1", RemoteStatus::Succeeded);
    app.remote
        .push_dataset(Ok(vec![json!({"id": "55", "playCount": 9, "diggCount": 1})]));
    send(router(&app), get(&format!("/api/v1/scrape-jobs/{job_id}"))).await;

    let (status, json) = send(router(&app), post_json("/api/v1/analyses", &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["source"], "cache");
    assert_eq!(json["data"]["videos"][0]["video_id"], "55");
    assert_eq!(app.remote.launch_calls(), 1);
}

#[tokio::test]
async fn invalid_limit_is_a_validation_error() {
    let app = test_app();
    let (status, json) = send(
        router(&app),
        post_json(
            "/api/v1/analyses",
            &json!({"platform": "instagram", "identifier": "creator", "result_limit": 0}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
    assert_eq!(app.remote.launch_calls(), 0);
}

#[tokio::test]
async fn unknown_platform_is_a_validation_error() {
    let app = test_app();
    let (status, json) = send(
        router(&app),
        post_json(
            "/api/v1/analyses",
            &json!({"platform": "myspace", "identifier": "creator"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn launch_rejection_is_bad_gateway() {
    let app = test_app();
    app.remote.push_launch(Err(ScraperError::Api {
        status: 402,
        message: "quota exhausted".to_string(),
    }));

    let (status, json) = send(
        router(&app),
        post_json(
            "/api/v1/analyses",
            &json!({"platform": "youtube", "identifier": "SomeChannel"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"]["code"], "remote_launch_failed");
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("quota exhausted"));
}

#[tokio::test]
async fn production_hides_upstream_launch_text() {
    let mut app = test_app();
    app.state.expose_internal_errors = false;
    app.remote.push_launch(Err(ScraperError::Api {
        status: 500,
        message: "stack trace here".to_string(),
    }));

    let (status, json) = send(
        router(&app),
        post_json(
            "/api/v1/analyses",
            &json!({"platform": "tiktok", "identifier": "creator"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(!json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("stack trace"));
}

#[tokio::test]
async fn unknown_job_is_not_found_and_bad_id_is_rejected() {
    let app = test_app();
    let (status, _) = send(
        router(&app),
        get(&format!("/api/v1/scrape-jobs/{}", uuid::Uuid::new_v4())),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = send(router(&app), get("/api/v1/scrape-jobs/not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn unknown_profile_is_not_found() {
    let app = test_app();
    let (status, json) = send(router(&app), get("/api/v1/profiles/instagram/nobody")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
}

#[tokio::test]
async fn protected_routes_require_bearer_token_when_enabled() {
    let app = test_app();
    let auth = AuthState::from_keys(&["secret".to_string()], false).expect("auth");
    let router = build_app(app.state.clone(), auth, None);

    let (status, json) = send(router.clone(), get("/api/v1/profiles/tiktok/creator")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"]["code"], "unauthorized");
    assert!(json["meta"]["request_id"].is_string());

    let (status, _) = send(
        router.clone(),
        Request::builder()
            .uri("/api/v1/profiles/tiktok/creator")
            .header(header::AUTHORIZATION, "Bearer secret")
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(router, get("/api/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn rate_limit_applies_only_when_configured() {
    let app = test_app();
    let limited = build_app(
        app.state.clone(),
        AuthState::disabled(),
        Some(RateLimitState::new(1, Duration::from_secs(60))),
    );
    let (first, _) = send(limited.clone(), get("/api/v1/profiles/tiktok/nobody")).await;
    let (second, json) = send(limited, get("/api/v1/profiles/tiktok/nobody")).await;
    assert_eq!(first, StatusCode::NOT_FOUND);
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"]["code"], "rate_limited");
    assert!(json["meta"]["request_id"].is_string());

    let unlimited = router(&app);
    for _ in 0..3 {
        let (status, _) = send(unlimited.clone(), get("/api/v1/profiles/tiktok/nobody")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
