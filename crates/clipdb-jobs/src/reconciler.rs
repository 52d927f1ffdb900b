//! Poll-and-report reconciliation of one scrape job against its remote run.

use std::sync::Arc;

use chrono::Utc;
use clipdb_core::{JobStatus, JobStatusReport, ScrapeJob};
use clipdb_scraper::{fetch_dataset, map_items, MappedBatch, RemoteScraper, RetryPolicy};
use uuid::Uuid;

use crate::error::JobError;
use crate::store::JobStore;
use crate::transition::{apply_update, transition, DatasetOutcome, JobUpdate, Transition};

/// Brings a local job in line with what the remote service reports.
///
/// No lock is held across a reconcile. Two overlapping calls for the same job
/// may both harvest the dataset; the video upsert key absorbs the duplicate
/// write and the guarded status update lets only one of them settle the job.
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn JobStore>,
    remote: Arc<dyn RemoteScraper>,
    retry: RetryPolicy,
}

impl Reconciler {
    #[must_use]
    pub fn new(store: Arc<dyn JobStore>, remote: Arc<dyn RemoteScraper>, retry: RetryPolicy) -> Self {
        Self {
            store,
            remote,
            retry,
        }
    }

    /// Reconciles job `job_id` once and returns its caller-facing status.
    ///
    /// Terminal jobs are reported as stored without contacting the remote
    /// service. A remote status that cannot be read is logged and the
    /// current local status is reported. Any failure while harvesting a
    /// succeeded run ends the job as `failed`.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::JobNotFound`] for an unknown id, or
    /// [`JobError::Store`] if the job cannot be read.
    pub async fn reconcile(&self, job_id: Uuid) -> Result<JobStatusReport, JobError> {
        let job = self
            .store
            .get_scrape_job(job_id)
            .await?
            .ok_or(JobError::JobNotFound(job_id))?;

        if job.status.is_terminal() {
            return Ok(job.report());
        }
        let Some(remote_id) = job.remote_job_id.clone() else {
            tracing::debug!(%job_id, "job has no remote run yet");
            return Ok(job.report());
        };

        let remote_status = match self.remote.get_status(&remote_id).await {
            Ok(status) => status.status,
            Err(e) => {
                tracing::warn!(%job_id, remote_id, error = %e, "remote status unavailable");
                return Ok(job.report());
            }
        };
        tracing::debug!(%job_id, remote_id, remote_status = %remote_status, "remote status read");

        let update = match transition(job.status, remote_status, None) {
            Transition::Unchanged => return Ok(job.report()),
            Transition::Update(update) => update,
            Transition::NeedsDataset => {
                let harvested = self.harvest(&job, &remote_id).await;
                let message: String;
                let outcome = match &harvested {
                    Ok(batch) => DatasetOutcome::Mapped(batch),
                    Err(e) => {
                        message = e.to_string();
                        DatasetOutcome::Failed(&message)
                    }
                };
                match transition(job.status, remote_status, Some(outcome)) {
                    Transition::Update(update) => update,
                    Transition::Unchanged | Transition::NeedsDataset => return Ok(job.report()),
                }
            }
        };

        Ok(self.settle(&job, update).await)
    }

    /// Fetches, maps and stores the dataset of a succeeded run.
    ///
    /// Videos are written before the profile, so `last_scraped_at` only
    /// advances once the batch is stored. A batch without videos skips the
    /// video upsert but still refreshes profile metadata.
    async fn harvest(&self, job: &ScrapeJob, remote_id: &str) -> Result<MappedBatch, JobError> {
        let items = fetch_dataset(self.remote.as_ref(), remote_id, self.retry).await?;
        let batch = map_items(job.platform, &items);
        for skip in &batch.skips {
            tracing::debug!(job_id = %job.id, reason = %skip, "dataset item skipped");
        }

        if batch.videos.is_empty() {
            tracing::info!(
                job_id = %job.id,
                raw_count = batch.raw_count,
                profile_only = batch.is_profile_only(),
                "dataset held no videos"
            );
        } else {
            let written = self
                .store
                .upsert_videos(
                    job.subject_profile_id,
                    Some(job.id),
                    job.platform,
                    &batch.videos,
                )
                .await?;
            tracing::debug!(job_id = %job.id, written, "videos upserted");
        }

        self.store
            .upsert_profile(job.subject_profile_id, &batch.profile, Utc::now())
            .await?;
        Ok(batch)
    }

    /// Writes `update` and reports the job afterwards.
    async fn settle(&self, job: &ScrapeJob, update: JobUpdate) -> JobStatusReport {
        match self.store.update_scrape_job(job.id, &update).await {
            Ok(true) => {
                log_settled(job, &update);
                apply_update(job, &update, Utc::now())
                    .unwrap_or_else(|| job.clone())
                    .report()
            }
            Ok(false) => self.current_report(job).await,
            Err(e) => match update {
                JobUpdate::Failed { message } => {
                    tracing::error!(job_id = %job.id, error = %e, "failed to mark job as failed");
                    failed_report(job, message)
                }
                _ => {
                    let message = format!("failed to record job outcome: {e}");
                    self.fail_best_effort(job, message).await
                }
            },
        }
    }

    /// Marks `job` failed. A failing write is logged and never re-thrown.
    async fn fail_best_effort(&self, job: &ScrapeJob, message: String) -> JobStatusReport {
        let update = JobUpdate::Failed {
            message: message.clone(),
        };
        match self.store.update_scrape_job(job.id, &update).await {
            Ok(true) => {
                log_settled(job, &update);
                failed_report(job, message)
            }
            Ok(false) => self.current_report(job).await,
            Err(mark_err) => {
                tracing::error!(job_id = %job.id, error = %mark_err, "failed to mark job as failed");
                failed_report(job, message)
            }
        }
    }

    /// Another writer settled the job first; report what it wrote.
    async fn current_report(&self, job: &ScrapeJob) -> JobStatusReport {
        match self.store.get_scrape_job(job.id).await {
            Ok(Some(current)) => current.report(),
            Ok(None) => job.report(),
            Err(e) => {
                tracing::warn!(job_id = %job.id, error = %e, "could not re-read settled job");
                job.report()
            }
        }
    }
}

fn failed_report(job: &ScrapeJob, message: String) -> JobStatusReport {
    JobStatusReport {
        job_id: job.id,
        status: JobStatus::Failed,
        result_count: None,
        error_message: Some(message),
    }
}

fn log_settled(job: &ScrapeJob, update: &JobUpdate) {
    match update {
        JobUpdate::Completed {
            result_count,
            message,
        } => tracing::info!(
            job_id = %job.id,
            platform = %job.platform,
            result_count,
            advisory = message.as_deref().unwrap_or(""),
            "scrape job completed"
        ),
        JobUpdate::Failed { message } => tracing::info!(
            job_id = %job.id,
            platform = %job.platform,
            error = %message,
            "scrape job failed"
        ),
        JobUpdate::Running { .. } => {}
    }
}

#[cfg(test)]
#[path = "reconciler_test.rs"]
mod tests;
