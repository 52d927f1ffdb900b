use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clipdb_core::{PartialProfile, Platform, ScrapeJob};
use clipdb_scraper::testing::{run_status, ScriptedScraper};
use clipdb_scraper::{RemoteStatus, ScraperError};
use serde_json::{json, Value};

use super::*;
use crate::store::MemoryStore;
use crate::transition::PROFILE_ONLY_ADVISORY;

struct Harness {
    store: Arc<MemoryStore>,
    remote: Arc<ScriptedScraper>,
    reconciler: Reconciler,
    job: ScrapeJob,
}

async fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let remote = Arc::new(ScriptedScraper::new());
    let profile = store
        .get_or_create_profile("creator", Platform::TikTok)
        .await
        .unwrap();
    let mut job = ScrapeJob::pending(None, profile.id, Platform::TikTok, 10);
    job.status = JobStatus::Running;
    job.remote_job_id = Some("run-1".to_string());
    store.put_job(job.clone());

    let reconciler = Reconciler::new(
        store.clone(),
        remote.clone(),
        RetryPolicy::new(3, Duration::ZERO),
    );
    Harness {
        store,
        remote,
        reconciler,
        job,
    }
}

fn tiktok_item(id: &str) -> Value {
    json!({
        "webVideoUrl": format!("https://www.tiktok.com/@creator/video/{id}"),
        "diggCount": 10,
        "playCount": 100,
        "commentCount": 2,
        "shareCount": 1,
        "createTimeISO": "2024-01-01T00:00:00Z",
        "authorMeta": {"name": "creator", "nickName": "The Creator", "fans": 1200}
    })
}

fn profile_item() -> Value {
    json!({
        "authorMeta": {
            "name": "creator",
            "nickName": "The Creator",
            "fans": 1200
        }
    })
}

#[tokio::test]
async fn running_remote_leaves_job_untouched() {
    let h = harness().await;
    h.remote.set_status("run-1", RemoteStatus::Running);

    let report = h.reconciler.reconcile(h.job.id).await.unwrap();

    assert_eq!(report.status, JobStatus::Running);
    assert_eq!(h.remote.dataset_calls(), 0);
    assert_eq!(h.store.profile_upsert_calls(), 0);
}

#[tokio::test]
async fn succeeded_remote_harvests_and_completes() {
    let h = harness().await;
    h.remote.set_status("run-1", RemoteStatus::Succeeded);
    h.remote
        .push_dataset(Ok(vec![tiktok_item("1"), tiktok_item("2")]));

    let report = h.reconciler.reconcile(h.job.id).await.unwrap();

    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(report.result_count, Some(2));
    assert!(report.error_message.is_none());
    assert_eq!(h.store.count_videos(h.job.subject_profile_id).await.unwrap(), 2);

    let profile = h
        .store
        .get_profile(h.job.subject_profile_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.display_name.as_deref(), Some("The Creator"));
    assert_eq!(profile.follower_count, Some(1200));
    assert!(profile.last_scraped_at.is_some());

    let stored = h.store.get_scrape_job(h.job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Completed);
    assert!(stored.completed_at.is_some());
}

#[tokio::test]
async fn reconciling_twice_does_not_duplicate_or_refetch() {
    let h = harness().await;
    h.remote.set_status("run-1", RemoteStatus::Succeeded);
    h.remote
        .push_dataset(Ok(vec![tiktok_item("1"), tiktok_item("2")]));

    let first = h.reconciler.reconcile(h.job.id).await.unwrap();
    let videos_after_first = h
        .store
        .list_videos(h.job.subject_profile_id, 100)
        .await
        .unwrap();
    let second = h.reconciler.reconcile(h.job.id).await.unwrap();
    let videos_after_second = h
        .store
        .list_videos(h.job.subject_profile_id, 100)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(videos_after_first, videos_after_second);
    assert_eq!(h.remote.dataset_calls(), 1);
    assert_eq!(h.remote.status_calls(), 1);
    assert_eq!(h.store.video_upsert_calls(), 1);
}

#[tokio::test]
async fn overlapping_harvests_settle_once_without_duplicates() {
    let h = harness().await;
    h.remote.set_status("run-1", RemoteStatus::Succeeded);
    h.remote.push_dataset(Ok(vec![tiktok_item("1")]));
    h.remote.push_dataset(Ok(vec![tiktok_item("1")]));

    let (a, b) = tokio::join!(
        h.reconciler.reconcile(h.job.id),
        h.reconciler.reconcile(h.job.id)
    );

    assert_eq!(a.unwrap().status, JobStatus::Completed);
    assert_eq!(b.unwrap().status, JobStatus::Completed);
    assert_eq!(h.store.count_videos(h.job.subject_profile_id).await.unwrap(), 1);
}

#[tokio::test]
async fn profile_only_dataset_completes_with_advisory_and_skips_video_upsert() {
    let h = harness().await;
    h.remote.set_status("run-1", RemoteStatus::Succeeded);
    h.remote.push_dataset(Ok(vec![profile_item(); 5]));

    let report = h.reconciler.reconcile(h.job.id).await.unwrap();

    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(report.result_count, Some(0));
    assert_eq!(report.error_message.as_deref(), Some(PROFILE_ONLY_ADVISORY));
    assert_eq!(h.store.video_upsert_calls(), 0);
    assert_eq!(h.store.profile_upsert_calls(), 1);

    let profile = h
        .store
        .get_profile(h.job.subject_profile_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.follower_count, Some(1200));
}

#[tokio::test]
async fn dataset_failure_marks_job_failed() {
    let h = harness().await;
    h.remote.set_status("run-1", RemoteStatus::Succeeded);
    h.remote.push_dataset(Err(ScraperError::Api {
        status: 500,
        message: "internal error".to_string(),
    }));

    let report = h.reconciler.reconcile(h.job.id).await.unwrap();

    assert_eq!(report.status, JobStatus::Failed);
    assert!(report
        .error_message
        .as_deref()
        .unwrap()
        .contains("internal error"));
    assert_eq!(h.remote.dataset_calls(), 1);

    let stored = h.store.get_scrape_job(h.job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
}

#[tokio::test]
async fn persistence_failure_marks_job_failed() {
    let h = harness().await;
    h.remote.set_status("run-1", RemoteStatus::Succeeded);
    h.remote.push_dataset(Ok(vec![tiktok_item("1")]));
    h.store.fail_video_upserts(true);

    let report = h.reconciler.reconcile(h.job.id).await.unwrap();

    assert_eq!(report.status, JobStatus::Failed);
    assert!(report
        .error_message
        .as_deref()
        .unwrap()
        .contains("video upserts disabled"));
    let stored = h.store.get_scrape_job(h.job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
}

#[tokio::test]
async fn failed_harvest_keeps_old_videos_stale() {
    let h = harness().await;
    let scraped_at = Utc::now() - chrono::Duration::hours(72);
    h.store
        .upsert_profile(h.job.subject_profile_id, &PartialProfile::default(), scraped_at)
        .await
        .unwrap();
    h.store
        .upsert_videos(
            h.job.subject_profile_id,
            None,
            Platform::TikTok,
            &map_items(Platform::TikTok, &[tiktok_item("old")]).videos,
        )
        .await
        .unwrap();

    h.remote.set_status("run-1", RemoteStatus::Succeeded);
    h.remote.push_dataset(Ok(vec![tiktok_item("1")]));
    h.store.fail_video_upserts(true);

    let report = h.reconciler.reconcile(h.job.id).await.unwrap();
    assert_eq!(report.status, JobStatus::Failed);

    let profile = h
        .store
        .get_profile(h.job.subject_profile_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.last_scraped_at, Some(scraped_at));
    let cached = crate::cache::usable_cached_results(h.store.as_ref(), &profile, 48, 10, Utc::now())
        .await
        .unwrap();
    assert!(cached.is_none());
}

#[tokio::test]
async fn failing_status_write_is_reported_not_thrown() {
    let h = harness().await;
    h.remote.set_status("run-1", RemoteStatus::Succeeded);
    h.remote.push_dataset(Ok(vec![tiktok_item("1")]));
    h.store.fail_job_updates(true);

    let report = h.reconciler.reconcile(h.job.id).await.unwrap();

    assert_eq!(report.status, JobStatus::Failed);
    assert!(report
        .error_message
        .as_deref()
        .unwrap()
        .contains("failed to record job outcome"));
}

#[tokio::test]
async fn aborted_remote_fails_job_without_fetching() {
    let h = harness().await;
    h.remote.set_status("run-1", RemoteStatus::Aborted);

    let report = h.reconciler.reconcile(h.job.id).await.unwrap();

    assert_eq!(report.status, JobStatus::Failed);
    assert!(report.error_message.as_deref().unwrap().contains("aborted"));
    assert_eq!(h.remote.dataset_calls(), 0);
}

#[tokio::test]
async fn unreadable_remote_status_reports_current_state() {
    let h = harness().await;
    h.remote.push_status(Err(ScraperError::Api {
        status: 503,
        message: "unavailable".to_string(),
    }));

    let report = h.reconciler.reconcile(h.job.id).await.unwrap();

    assert_eq!(report.status, JobStatus::Running);
    let stored = h.store.get_scrape_job(h.job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Running);
}

#[tokio::test]
async fn terminal_job_is_reported_without_remote_calls() {
    let h = harness().await;
    let mut done = h.job.clone();
    done.status = JobStatus::Failed;
    done.error_message = Some("earlier failure".to_string());
    h.store.put_job(done);

    let report = h.reconciler.reconcile(h.job.id).await.unwrap();

    assert_eq!(report.status, JobStatus::Failed);
    assert_eq!(report.error_message.as_deref(), Some("earlier failure"));
    assert_eq!(h.remote.status_calls(), 0);
}

#[tokio::test]
async fn unknown_job_is_an_error() {
    let h = harness().await;
    let missing = Uuid::new_v4();
    let err = h.reconciler.reconcile(missing).await.unwrap_err();
    assert!(matches!(err, JobError::JobNotFound(id) if id == missing));
}

#[tokio::test]
async fn succeeded_status_queued_after_running_is_picked_up_later() {
    let h = harness().await;
    h.remote.push_status(Ok(run_status(RemoteStatus::Running)));
    h.remote.push_status(Ok(run_status(RemoteStatus::Succeeded)));
    h.remote.push_dataset(Ok(vec![tiktok_item("9")]));

    let first = h.reconciler.reconcile(h.job.id).await.unwrap();
    let second = h.reconciler.reconcile(h.job.id).await.unwrap();

    assert_eq!(first.status, JobStatus::Running);
    assert_eq!(second.status, JobStatus::Completed);
    assert_eq!(second.result_count, Some(1));
}
