//! Entry points used by the HTTP API and the CLI.

use std::sync::Arc;

use chrono::Utc;
use clipdb_core::{
    summarize_videos, AppConfig, CanonicalVideo, CreatorProfile, JobStatusReport, Platform,
    ProfileSummary, ScrapeJob, StoredVideo,
};
use clipdb_scraper::{normalize_identifier, start, validate_result_limit, RemoteScraper, RetryPolicy};
use serde::Serialize;
use uuid::Uuid;

use crate::cache::{usable_cached_results, DEFAULT_FRESHNESS_HOURS};
use crate::error::JobError;
use crate::reconciler::Reconciler;
use crate::store::JobStore;
use crate::transition::JobUpdate;

/// Videos considered when summarizing a profile.
const SUMMARY_VIDEO_CAP: u32 = 500;
const SUMMARY_TOP_N: usize = 5;

/// Tunables for [`AnalyticsService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    pub cache_freshness_hours: u32,
    pub default_result_limit: u32,
    pub dataset_retry: RetryPolicy,
}

impl ServiceSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            cache_freshness_hours: config.cache_freshness_hours,
            default_result_limit: config.default_result_limit,
            dataset_retry: RetryPolicy::from_config(config),
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            cache_freshness_hours: DEFAULT_FRESHNESS_HOURS,
            default_result_limit: 30,
            dataset_retry: RetryPolicy::default(),
        }
    }
}

/// A request to analyse one creator.
#[derive(Debug, Clone)]
pub struct AnalyticsRequest {
    pub platform: Platform,
    /// Handle, `@handle`, or profile URL.
    pub identifier: String,
    /// Falls back to the configured default when `None`.
    pub result_limit: Option<u32>,
    pub user_id: Option<String>,
    /// Skip the cache gate and always start a new job.
    pub force_refresh: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsOutcome {
    /// Stored results were fresh; no job was created.
    Cached {
        profile: CreatorProfile,
        videos: Vec<CanonicalVideo>,
    },
    /// A remote run was launched; poll the job for its outcome.
    Started {
        job: JobStatusReport,
        profile: CreatorProfile,
    },
}

/// A profile together with a summary of its stored videos.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileOverview {
    pub profile: CreatorProfile,
    pub stored_videos: u64,
    pub summary: ProfileSummary,
}

#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<dyn JobStore>,
    remote: Arc<dyn RemoteScraper>,
    reconciler: Reconciler,
    settings: ServiceSettings,
}

impl AnalyticsService {
    #[must_use]
    pub fn new(
        store: Arc<dyn JobStore>,
        remote: Arc<dyn RemoteScraper>,
        settings: ServiceSettings,
    ) -> Self {
        let reconciler = Reconciler::new(store.clone(), remote.clone(), settings.dataset_retry);
        Self {
            store,
            remote,
            reconciler,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> ServiceSettings {
        self.settings
    }

    /// Answers from cache when possible, otherwise creates a job and launches
    /// the remote run.
    ///
    /// # Errors
    ///
    /// - [`JobError::InvalidInput`]: bad identifier or limit; nothing is
    ///   stored.
    /// - [`JobError::Launch`]: the remote service refused the run; the job is
    ///   recorded as `failed` with the same message.
    /// - [`JobError::Store`]: persistence failed.
    pub async fn request_analytics(
        &self,
        request: AnalyticsRequest,
    ) -> Result<AnalyticsOutcome, JobError> {
        let platform = request.platform;
        let limit = validate_result_limit(
            request
                .result_limit
                .unwrap_or(self.settings.default_result_limit),
        )?;
        let handle = normalize_identifier(platform, &request.identifier)?;

        let profile = self.store.get_or_create_profile(&handle, platform).await?;

        if !request.force_refresh {
            if let Some(videos) = usable_cached_results(
                self.store.as_ref(),
                &profile,
                self.settings.cache_freshness_hours,
                limit,
                Utc::now(),
            )
            .await?
            {
                tracing::info!(
                    %platform,
                    username = %profile.username,
                    count = videos.len(),
                    "serving cached results"
                );
                return Ok(AnalyticsOutcome::Cached { profile, videos });
            }
        }

        let mut job = ScrapeJob::pending(request.user_id, profile.id, platform, limit);
        self.store.create_scrape_job(&job).await?;
        tracing::info!(job_id = %job.id, %platform, username = %handle, limit, "scrape job created");

        let remote = match start(self.remote.as_ref(), platform, &handle, limit).await {
            Ok(remote) => remote,
            Err(e) => {
                let message = e.to_string();
                self.fail_job_best_effort(job.id, &message).await;
                return Err(JobError::Launch {
                    job_id: job.id,
                    message,
                });
            }
        };

        let update = JobUpdate::Running {
            remote_job_id: remote.remote_id.clone(),
        };
        if let Err(e) = self.store.update_scrape_job(job.id, &update).await {
            self.fail_job_best_effort(
                job.id,
                &format!("failed to record remote run {}: {e}", remote.remote_id),
            )
            .await;
            return Err(e.into());
        }
        job.status = update.status();
        job.remote_job_id = Some(remote.remote_id);

        Ok(AnalyticsOutcome::Started {
            job: job.report(),
            profile,
        })
    }

    /// Reconciles the job once and reports its status.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::JobNotFound`] for an unknown id, or
    /// [`JobError::Store`] if the job cannot be read.
    pub async fn job_status(&self, job_id: Uuid) -> Result<JobStatusReport, JobError> {
        self.reconciler.reconcile(job_id).await
    }

    #[must_use]
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// # Errors
    ///
    /// Returns [`JobError::InvalidInput`] for a malformed username,
    /// [`JobError::ProfileNotFound`] if the creator was never requested, or
    /// [`JobError::Store`] if persistence fails.
    pub async fn profile_overview(
        &self,
        platform: Platform,
        username: &str,
    ) -> Result<ProfileOverview, JobError> {
        let profile = self.find_profile(platform, username).await?;
        let stored_videos = self.store.count_videos(profile.id).await?;
        let videos: Vec<CanonicalVideo> = self
            .store
            .list_videos(profile.id, SUMMARY_VIDEO_CAP)
            .await?
            .into_iter()
            .map(|v| v.video)
            .collect();
        let summary = summarize_videos(&videos, SUMMARY_TOP_N);
        Ok(ProfileOverview {
            profile,
            stored_videos,
            summary,
        })
    }

    /// Stored videos for a creator, newest post first.
    ///
    /// # Errors
    ///
    /// Same as [`AnalyticsService::profile_overview`].
    pub async fn profile_videos(
        &self,
        platform: Platform,
        username: &str,
        limit: u32,
    ) -> Result<Vec<StoredVideo>, JobError> {
        let profile = self.find_profile(platform, username).await?;
        Ok(self.store.list_videos(profile.id, limit).await?)
    }

    /// Job history for a creator, newest first.
    ///
    /// # Errors
    ///
    /// Same as [`AnalyticsService::profile_overview`].
    pub async fn profile_jobs(
        &self,
        platform: Platform,
        username: &str,
        limit: u32,
    ) -> Result<Vec<ScrapeJob>, JobError> {
        let profile = self.find_profile(platform, username).await?;
        Ok(self.store.list_scrape_jobs(profile.id, limit).await?)
    }

    async fn find_profile(
        &self,
        platform: Platform,
        username: &str,
    ) -> Result<CreatorProfile, JobError> {
        let handle = normalize_identifier(platform, username)?;
        self.store
            .get_profile_by_username(&handle, platform)
            .await?
            .ok_or_else(|| JobError::ProfileNotFound(format!("{platform}/{handle}")))
    }

    async fn fail_job_best_effort(&self, job_id: Uuid, message: &str) {
        let update = JobUpdate::Failed {
            message: message.to_string(),
        };
        match self.store.update_scrape_job(job_id, &update).await {
            Ok(_) => tracing::info!(%job_id, error = %message, "scrape job failed"),
            Err(mark_err) => {
                tracing::error!(%job_id, error = %mark_err, "failed to mark scrape job as failed");
            }
        }
    }
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;
