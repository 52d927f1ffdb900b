//! The persistence seam used by the job lifecycle.
//!
//! [`PgStore`] is the production implementation over `clipdb-db`;
//! [`MemoryStore`] keeps everything in process for tests and enforces the same
//! guards as the SQL (terminal jobs are never rewritten, videos are unique on
//! `(video_id, platform)`).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clipdb_core::{CanonicalVideo, CreatorProfile, PartialProfile, Platform, ScrapeJob, StoredVideo};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::transition::{apply_update, JobUpdate};

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Returns the profile for `(username, platform)`, creating it on first
    /// sight. Usernames are stored lowercase.
    async fn get_or_create_profile(
        &self,
        username: &str,
        platform: Platform,
    ) -> Result<CreatorProfile, StoreError>;

    async fn get_profile(&self, id: Uuid) -> Result<Option<CreatorProfile>, StoreError>;

    async fn get_profile_by_username(
        &self,
        username: &str,
        platform: Platform,
    ) -> Result<Option<CreatorProfile>, StoreError>;

    /// Writes non-null metadata fields and advances `last_scraped_at`.
    async fn upsert_profile(
        &self,
        id: Uuid,
        update: &PartialProfile,
        scraped_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn create_scrape_job(&self, job: &ScrapeJob) -> Result<(), StoreError>;

    async fn get_scrape_job(&self, id: Uuid) -> Result<Option<ScrapeJob>, StoreError>;

    /// Applies `update` if the lifecycle allows it. Returns `false` when the
    /// job had already moved on (for example a concurrent reconcile settled
    /// it first).
    async fn update_scrape_job(&self, id: Uuid, update: &JobUpdate) -> Result<bool, StoreError>;

    /// Newest first.
    async fn list_scrape_jobs(
        &self,
        profile_id: Uuid,
        limit: u32,
    ) -> Result<Vec<ScrapeJob>, StoreError>;

    /// Inserts or refreshes videos keyed on `(video_id, platform)`.
    async fn upsert_videos(
        &self,
        profile_id: Uuid,
        scrape_job_id: Option<Uuid>,
        platform: Platform,
        videos: &[CanonicalVideo],
    ) -> Result<u64, StoreError>;

    /// Newest post first.
    async fn list_videos(
        &self,
        profile_id: Uuid,
        limit: u32,
    ) -> Result<Vec<StoredVideo>, StoreError>;

    async fn count_videos(&self, profile_id: Uuid) -> Result<u64, StoreError>;
}

/// [`JobStore`] backed by Postgres.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl JobStore for PgStore {
    async fn get_or_create_profile(
        &self,
        username: &str,
        platform: Platform,
    ) -> Result<CreatorProfile, StoreError> {
        let row = clipdb_db::get_or_create_profile(&self.pool, username, platform).await?;
        Ok(row.into_profile()?)
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<CreatorProfile>, StoreError> {
        let row = clipdb_db::get_profile(&self.pool, id).await?;
        Ok(row.map(clipdb_db::CreatorProfileRow::into_profile).transpose()?)
    }

    async fn get_profile_by_username(
        &self,
        username: &str,
        platform: Platform,
    ) -> Result<Option<CreatorProfile>, StoreError> {
        let row = clipdb_db::get_profile_by_username(&self.pool, username, platform).await?;
        Ok(row.map(clipdb_db::CreatorProfileRow::into_profile).transpose()?)
    }

    async fn upsert_profile(
        &self,
        id: Uuid,
        update: &PartialProfile,
        scraped_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        clipdb_db::update_profile_metadata(&self.pool, id, update, scraped_at).await?;
        Ok(())
    }

    async fn create_scrape_job(&self, job: &ScrapeJob) -> Result<(), StoreError> {
        clipdb_db::create_scrape_job(&self.pool, job).await?;
        Ok(())
    }

    async fn get_scrape_job(&self, id: Uuid) -> Result<Option<ScrapeJob>, StoreError> {
        let row = clipdb_db::get_scrape_job(&self.pool, id).await?;
        Ok(row.map(clipdb_db::ScrapeJobRow::into_job).transpose()?)
    }

    async fn update_scrape_job(&self, id: Uuid, update: &JobUpdate) -> Result<bool, StoreError> {
        let applied = match update {
            JobUpdate::Running { remote_job_id } => {
                clipdb_db::mark_scrape_job_running(&self.pool, id, remote_job_id).await?
            }
            JobUpdate::Completed {
                result_count,
                message,
            } => {
                clipdb_db::complete_scrape_job(&self.pool, id, *result_count, message.as_deref())
                    .await?
            }
            JobUpdate::Failed { message } => {
                clipdb_db::fail_scrape_job(&self.pool, id, message).await?
            }
        };
        Ok(applied)
    }

    async fn list_scrape_jobs(
        &self,
        profile_id: Uuid,
        limit: u32,
    ) -> Result<Vec<ScrapeJob>, StoreError> {
        let rows =
            clipdb_db::list_scrape_jobs_for_profile(&self.pool, profile_id, i64::from(limit))
                .await?;
        rows.into_iter()
            .map(|row| row.into_job().map_err(StoreError::from))
            .collect()
    }

    async fn upsert_videos(
        &self,
        profile_id: Uuid,
        scrape_job_id: Option<Uuid>,
        platform: Platform,
        videos: &[CanonicalVideo],
    ) -> Result<u64, StoreError> {
        Ok(clipdb_db::upsert_videos(&self.pool, profile_id, scrape_job_id, platform, videos).await?)
    }

    async fn list_videos(
        &self,
        profile_id: Uuid,
        limit: u32,
    ) -> Result<Vec<StoredVideo>, StoreError> {
        let rows =
            clipdb_db::list_videos_for_profile(&self.pool, profile_id, i64::from(limit)).await?;
        rows.into_iter()
            .map(|row| row.into_stored().map_err(StoreError::from))
            .collect()
    }

    async fn count_videos(&self, profile_id: Uuid) -> Result<u64, StoreError> {
        Ok(clipdb_db::count_videos_for_profile(&self.pool, profile_id).await?)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    profiles: HashMap<Uuid, CreatorProfile>,
    jobs: HashMap<Uuid, ScrapeJob>,
    /// Keyed on `(video_id, platform)`, mirroring the table's unique index.
    videos: HashMap<(String, Platform), StoredVideo>,
}

/// In-process [`JobStore`] for tests and local experiments.
///
/// Failure switches make a particular write return
/// [`StoreError::Unavailable`] so error paths can be exercised.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    fail_video_upserts: AtomicBool,
    fail_job_updates: AtomicBool,
    video_upsert_calls: AtomicUsize,
    profile_upsert_calls: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_video_upserts(&self, fail: bool) {
        self.fail_video_upserts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_job_updates(&self, fail: bool) {
        self.fail_job_updates.store(fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn video_upsert_calls(&self) -> usize {
        self.video_upsert_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn profile_upsert_calls(&self) -> usize {
        self.profile_upsert_calls.load(Ordering::SeqCst)
    }

    /// Inserts or replaces a profile as-is.
    pub fn put_profile(&self, profile: CreatorProfile) {
        self.lock().profiles.insert(profile.id, profile);
    }

    /// Inserts or replaces a job as-is, bypassing lifecycle guards.
    pub fn put_job(&self, job: ScrapeJob) {
        self.lock().jobs.insert(job.id, job);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn get_or_create_profile(
        &self,
        username: &str,
        platform: Platform,
    ) -> Result<CreatorProfile, StoreError> {
        let username = username.to_lowercase();
        let mut state = self.lock();
        if let Some(existing) = state
            .profiles
            .values()
            .find(|p| p.username == username && p.platform == platform)
        {
            return Ok(existing.clone());
        }
        let profile = CreatorProfile::new(&username, platform);
        state.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<CreatorProfile>, StoreError> {
        Ok(self.lock().profiles.get(&id).cloned())
    }

    async fn get_profile_by_username(
        &self,
        username: &str,
        platform: Platform,
    ) -> Result<Option<CreatorProfile>, StoreError> {
        let username = username.to_lowercase();
        Ok(self
            .lock()
            .profiles
            .values()
            .find(|p| p.username == username && p.platform == platform)
            .cloned())
    }

    async fn upsert_profile(
        &self,
        id: Uuid,
        update: &PartialProfile,
        scraped_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.profile_upsert_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        let profile = state
            .profiles
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("creator profile {id}")))?;
        profile.apply(update);
        profile.last_scraped_at = Some(scraped_at);
        Ok(())
    }

    async fn create_scrape_job(&self, job: &ScrapeJob) -> Result<(), StoreError> {
        self.lock().jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn get_scrape_job(&self, id: Uuid) -> Result<Option<ScrapeJob>, StoreError> {
        Ok(self.lock().jobs.get(&id).cloned())
    }

    async fn update_scrape_job(&self, id: Uuid, update: &JobUpdate) -> Result<bool, StoreError> {
        if self.fail_job_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("job updates disabled".to_string()));
        }
        let mut state = self.lock();
        let Some(job) = state.jobs.get(&id) else {
            return Ok(false);
        };
        match apply_update(job, update, Utc::now()) {
            Some(next) => {
                state.jobs.insert(id, next);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_scrape_jobs(
        &self,
        profile_id: Uuid,
        limit: u32,
    ) -> Result<Vec<ScrapeJob>, StoreError> {
        let mut jobs: Vec<ScrapeJob> = self
            .lock()
            .jobs
            .values()
            .filter(|j| j.subject_profile_id == profile_id)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        jobs.truncate(limit as usize);
        Ok(jobs)
    }

    async fn upsert_videos(
        &self,
        profile_id: Uuid,
        scrape_job_id: Option<Uuid>,
        platform: Platform,
        videos: &[CanonicalVideo],
    ) -> Result<u64, StoreError> {
        self.video_upsert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_video_upserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("video upserts disabled".to_string()));
        }
        let now = Utc::now();
        let mut state = self.lock();
        for video in videos {
            state.videos.insert(
                (video.video_id.clone(), platform),
                StoredVideo {
                    profile_id,
                    scrape_job_id,
                    platform,
                    video: video.clone(),
                    updated_at: now,
                },
            );
        }
        Ok(videos.len() as u64)
    }

    async fn list_videos(
        &self,
        profile_id: Uuid,
        limit: u32,
    ) -> Result<Vec<StoredVideo>, StoreError> {
        let mut videos: Vec<StoredVideo> = self
            .lock()
            .videos
            .values()
            .filter(|v| v.profile_id == profile_id)
            .cloned()
            .collect();
        // Newest post first, undated posts last.
        videos.sort_by(|a, b| match (a.video.posted_at, b.video.posted_at) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.video.video_id.cmp(&b.video.video_id),
        });
        videos.truncate(limit as usize);
        Ok(videos)
    }

    async fn count_videos(&self, profile_id: Uuid) -> Result<u64, StoreError> {
        Ok(self
            .lock()
            .videos
            .values()
            .filter(|v| v.profile_id == profile_id)
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str, views: u64) -> CanonicalVideo {
        CanonicalVideo {
            video_id: id.to_string(),
            video_url: format!("https://www.tiktok.com/@u/video/{id}"),
            description: None,
            thumbnail_url: None,
            views,
            likes: 0,
            comments: 0,
            shares: 0,
            posted_at: None,
            duration_seconds: None,
            engagement_rate: 0.0,
        }
    }

    #[tokio::test]
    async fn profiles_are_unique_per_lowercase_username_and_platform() {
        let store = MemoryStore::new();
        let a = store
            .get_or_create_profile("Creator", Platform::TikTok)
            .await
            .unwrap();
        let b = store
            .get_or_create_profile("creator", Platform::TikTok)
            .await
            .unwrap();
        let c = store
            .get_or_create_profile("creator", Platform::YouTube)
            .await
            .unwrap();
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }

    #[tokio::test]
    async fn video_upserts_never_duplicate() {
        let store = MemoryStore::new();
        let profile = store
            .get_or_create_profile("creator", Platform::TikTok)
            .await
            .unwrap();
        store
            .upsert_videos(profile.id, None, Platform::TikTok, &[video("1", 1), video("2", 2)])
            .await
            .unwrap();
        store
            .upsert_videos(profile.id, None, Platform::TikTok, &[video("1", 10)])
            .await
            .unwrap();

        assert_eq!(store.count_videos(profile.id).await.unwrap(), 2);
        let listed = store.list_videos(profile.id, 10).await.unwrap();
        let first = listed.iter().find(|v| v.video.video_id == "1").unwrap();
        assert_eq!(first.video.views, 10);
    }

    #[tokio::test]
    async fn settled_jobs_reject_further_updates() {
        let store = MemoryStore::new();
        let job = ScrapeJob::pending(None, Uuid::new_v4(), Platform::TikTok, 5);
        store.create_scrape_job(&job).await.unwrap();

        let failed = JobUpdate::Failed {
            message: "boom".to_string(),
        };
        assert!(store.update_scrape_job(job.id, &failed).await.unwrap());
        let completed = JobUpdate::Completed {
            result_count: 1,
            message: None,
        };
        assert!(!store.update_scrape_job(job.id, &completed).await.unwrap());
        assert!(!store
            .update_scrape_job(Uuid::new_v4(), &completed)
            .await
            .unwrap());
    }
}
