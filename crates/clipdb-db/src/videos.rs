//! Database operations for `videos`.

use chrono::{DateTime, Utc};
use clipdb_core::{CanonicalVideo, Platform, StoredVideo};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{from_db_count, to_db_count, DbError};

/// A row from the `videos` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VideoRow {
    pub id: i64,
    pub video_id: String,
    pub platform: String,
    pub profile_id: Uuid,
    pub scrape_job_id: Option<Uuid>,
    pub video_url: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub posted_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i32>,
    pub engagement_rate: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoRow {
    /// # Errors
    ///
    /// Returns [`DbError::InvalidRow`] if `platform` holds an unknown value.
    pub fn into_stored(self) -> Result<StoredVideo, DbError> {
        let platform = self
            .platform
            .parse::<Platform>()
            .map_err(|e| DbError::InvalidRow {
                table: "videos",
                reason: e.to_string(),
            })?;
        Ok(StoredVideo {
            profile_id: self.profile_id,
            scrape_job_id: self.scrape_job_id,
            platform,
            video: CanonicalVideo {
                video_id: self.video_id,
                video_url: self.video_url,
                description: self.description,
                thumbnail_url: self.thumbnail_url,
                views: from_db_count(self.views),
                likes: from_db_count(self.likes),
                comments: from_db_count(self.comments),
                shares: from_db_count(self.shares),
                posted_at: self.posted_at,
                duration_seconds: self.duration_seconds.and_then(|d| u32::try_from(d).ok()),
                engagement_rate: self.engagement_rate,
            },
            updated_at: self.updated_at,
        })
    }
}

/// Upserts `videos` for a profile in one transaction.
///
/// Conflicts on `(video_id, platform)` refresh the metrics and metadata in
/// place, so replaying the same batch never creates duplicates. Returns the
/// number of rows written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; nothing is written then.
pub async fn upsert_videos(
    pool: &PgPool,
    profile_id: Uuid,
    scrape_job_id: Option<Uuid>,
    platform: Platform,
    videos: &[CanonicalVideo],
) -> Result<u64, DbError> {
    let mut tx = pool.begin().await?;
    let mut written = 0u64;

    for video in videos {
        let result = sqlx::query(
            "INSERT INTO videos \
                 (video_id, platform, profile_id, scrape_job_id, video_url, description, \
                  thumbnail_url, views, likes, comments, shares, posted_at, duration_seconds, \
                  engagement_rate) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             ON CONFLICT (video_id, platform) DO UPDATE SET \
                 profile_id       = EXCLUDED.profile_id, \
                 scrape_job_id    = EXCLUDED.scrape_job_id, \
                 video_url        = EXCLUDED.video_url, \
                 description      = COALESCE(EXCLUDED.description, videos.description), \
                 thumbnail_url    = COALESCE(EXCLUDED.thumbnail_url, videos.thumbnail_url), \
                 views            = EXCLUDED.views, \
                 likes            = EXCLUDED.likes, \
                 comments         = EXCLUDED.comments, \
                 shares           = EXCLUDED.shares, \
                 posted_at        = COALESCE(EXCLUDED.posted_at, videos.posted_at), \
                 duration_seconds = COALESCE(EXCLUDED.duration_seconds, videos.duration_seconds), \
                 engagement_rate  = EXCLUDED.engagement_rate, \
                 updated_at       = NOW()",
        )
        .bind(&video.video_id)
        .bind(platform.as_str())
        .bind(profile_id)
        .bind(scrape_job_id)
        .bind(&video.video_url)
        .bind(video.description.as_deref())
        .bind(video.thumbnail_url.as_deref())
        .bind(to_db_count(video.views))
        .bind(to_db_count(video.likes))
        .bind(to_db_count(video.comments))
        .bind(to_db_count(video.shares))
        .bind(video.posted_at)
        .bind(
            video
                .duration_seconds
                .map(|d| i32::try_from(d).unwrap_or(i32::MAX)),
        )
        .bind(video.engagement_rate)
        .execute(&mut *tx)
        .await?;
        written += result.rows_affected();
    }

    tx.commit().await?;
    Ok(written)
}

/// Returns up to `limit` videos for a profile, newest post first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_videos_for_profile(
    pool: &PgPool,
    profile_id: Uuid,
    limit: i64,
) -> Result<Vec<VideoRow>, DbError> {
    let rows = sqlx::query_as::<_, VideoRow>(
        "SELECT id, video_id, platform, profile_id, scrape_job_id, video_url, description, \
                thumbnail_url, views, likes, comments, shares, posted_at, duration_seconds, \
                engagement_rate, created_at, updated_at \
         FROM videos \
         WHERE profile_id = $1 \
         ORDER BY posted_at DESC NULLS LAST, id DESC \
         LIMIT $2",
    )
    .bind(profile_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Counts stored videos for a profile.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_videos_for_profile(pool: &PgPool, profile_id: Uuid) -> Result<u64, DbError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos WHERE profile_id = $1")
        .bind(profile_id)
        .fetch_one(pool)
        .await?;
    Ok(from_db_count(count))
}
