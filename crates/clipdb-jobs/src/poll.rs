//! Client-driven polling: reconcile at a fixed interval until the job settles
//! or the attempt cap is reached.

use std::time::Duration;

use clipdb_core::{AppConfig, JobStatusReport};
use uuid::Uuid;

use crate::error::JobError;
use crate::reconciler::Reconciler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Values below 1 are treated as 1.
    pub max_attempts: u32,
}

impl PollPolicy {
    #[must_use]
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Duration::from_secs(config.poll_interval_secs),
            config.poll_max_attempts,
        )
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), 60)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The job reached `completed` or `failed`.
    Finished(JobStatusReport),
    /// The cap was hit first. The job is left as it was and a later poll may
    /// still see it finish.
    TimedOut {
        last: JobStatusReport,
        attempts: u32,
    },
}

/// Polls job `job_id` until it settles. `on_report` sees every intermediate
/// report, which the CLI uses for progress output.
///
/// # Errors
///
/// Propagates [`JobError`] from the reconciler (unknown job, unreadable
/// store).
pub async fn poll_until_settled<F>(
    reconciler: &Reconciler,
    job_id: Uuid,
    policy: PollPolicy,
    mut on_report: F,
) -> Result<PollOutcome, JobError>
where
    F: FnMut(&JobStatusReport, u32),
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;
    loop {
        let report = reconciler.reconcile(job_id).await?;
        on_report(&report, attempt);
        if report.status.is_terminal() {
            return Ok(PollOutcome::Finished(report));
        }
        if attempt >= max_attempts {
            tracing::warn!(%job_id, attempts = attempt, status = %report.status, "polling gave up");
            return Ok(PollOutcome::TimedOut {
                last: report,
                attempts: attempt,
            });
        }
        attempt += 1;
        tokio::time::sleep(policy.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use clipdb_core::{JobStatus, Platform, ScrapeJob};
    use clipdb_scraper::testing::{run_status, ScriptedScraper};
    use clipdb_scraper::{RemoteStatus, RetryPolicy};
    use serde_json::json;

    use super::*;
    use crate::store::{JobStore, MemoryStore};

    async fn running_job(store: &MemoryStore) -> ScrapeJob {
        let profile = store
            .get_or_create_profile("creator", Platform::TikTok)
            .await
            .unwrap();
        let mut job = ScrapeJob::pending(None, profile.id, Platform::TikTok, 5);
        job.status = JobStatus::Running;
        job.remote_job_id = Some("run-1".to_string());
        store.put_job(job.clone());
        job
    }

    fn reconciler(store: Arc<MemoryStore>, remote: Arc<ScriptedScraper>) -> Reconciler {
        Reconciler::new(store, remote, RetryPolicy::new(1, Duration::ZERO))
    }

    #[tokio::test]
    async fn finishes_once_remote_succeeds() {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(ScriptedScraper::new());
        let job = running_job(&store).await;
        remote.push_status(Ok(run_status(RemoteStatus::Running)));
        remote.push_status(Ok(run_status(RemoteStatus::Running)));
        remote.push_status(Ok(run_status(RemoteStatus::Succeeded)));
        remote.push_dataset(Ok(vec![json!({"id": "1", "playCount": 3})]));

        let mut seen = Vec::new();
        let outcome = poll_until_settled(
            &reconciler(store, remote.clone()),
            job.id,
            PollPolicy::new(Duration::ZERO, 10),
            |report, attempt| seen.push((report.status, attempt)),
        )
        .await
        .unwrap();

        let PollOutcome::Finished(report) = outcome else {
            panic!("expected the job to finish");
        };
        assert_eq!(report.status, JobStatus::Completed);
        assert_eq!(seen.len(), 3);
        assert_eq!(remote.status_calls(), 3);
    }

    #[tokio::test]
    async fn cap_is_a_timeout_and_leaves_job_running() {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(ScriptedScraper::new());
        let job = running_job(&store).await;
        remote.set_status("run-1", RemoteStatus::Running);

        let outcome = poll_until_settled(
            &reconciler(store.clone(), remote),
            job.id,
            PollPolicy::new(Duration::ZERO, 4),
            |_, _| {},
        )
        .await
        .unwrap();

        assert!(matches!(outcome, PollOutcome::TimedOut { attempts: 4, .. }));
        let stored = store.get_scrape_job(job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Running);
    }
}
