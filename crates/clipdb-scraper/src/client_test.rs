use super::*;

fn client(base_url: &str) -> ApifyClient {
    ApifyClient::new("token", base_url, ActorIds::default(), 5, "clipdb-test/0.1").unwrap()
}

#[test]
fn runs_url_uses_actor_for_platform() {
    let c = client("https://api.apify.com/v2");
    assert_eq!(
        c.runs_url(Platform::TikTok),
        "https://api.apify.com/v2/acts/clockworks~tiktok-scraper/runs"
    );
    assert_eq!(
        c.runs_url(Platform::YouTube),
        "https://api.apify.com/v2/acts/streamers~youtube-scraper/runs"
    );
}

#[test]
fn base_url_trailing_slash_is_dropped() {
    let c = client("http://127.0.0.1:9000/v2/");
    assert_eq!(c.run_url("abc"), "http://127.0.0.1:9000/v2/actor-runs/abc");
}

#[test]
fn dataset_url_requests_clean_json() {
    let c = client("https://api.apify.com/v2");
    assert_eq!(
        c.dataset_url("run1"),
        "https://api.apify.com/v2/actor-runs/run1/dataset/items?format=json&clean=true"
    );
}

#[test]
fn actor_ids_default_to_community_actors() {
    let ids = ActorIds::default();
    assert_eq!(ids.for_platform(Platform::Instagram), "apify~instagram-scraper");
}

#[test]
fn not_ready_body_detection() {
    assert!(is_not_ready_body(r#"{"error":{"message":"Dataset is not ready"}}"#));
    assert!(is_not_ready_body("Record not yet available"));
    assert!(!is_not_ready_body(r#"{"error":{"type":"unauthorized"}}"#));
}
