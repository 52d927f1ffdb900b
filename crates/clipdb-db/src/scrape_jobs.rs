//! Database operations for `scrape_jobs`.
//!
//! Status updates are guarded on the current status, so a job leaves
//! `pending`/`running` at most once. Each update reports whether it applied;
//! a `false` means another writer settled the job first.

use chrono::{DateTime, Utc};
use clipdb_core::{JobStatus, Platform, ScrapeJob};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `scrape_jobs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScrapeJobRow {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub subject_profile_id: Uuid,
    pub platform: String,
    pub remote_job_id: Option<String>,
    pub status: String,
    pub requested_result_limit: i32,
    pub result_count: Option<i32>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ScrapeJobRow {
    /// # Errors
    ///
    /// Returns [`DbError::InvalidRow`] if `platform` or `status` holds an
    /// unknown value.
    pub fn into_job(self) -> Result<ScrapeJob, DbError> {
        let invalid = |reason: String| DbError::InvalidRow {
            table: "scrape_jobs",
            reason,
        };
        let platform = self
            .platform
            .parse::<Platform>()
            .map_err(|e| invalid(e.to_string()))?;
        let status = self
            .status
            .parse::<JobStatus>()
            .map_err(|e| invalid(e.to_string()))?;

        Ok(ScrapeJob {
            id: self.id,
            user_id: self.user_id,
            subject_profile_id: self.subject_profile_id,
            platform,
            remote_job_id: self.remote_job_id,
            status,
            requested_result_limit: u32::try_from(self.requested_result_limit).unwrap_or(0),
            result_count: self.result_count.and_then(|c| u32::try_from(c).ok()),
            error_message: self.error_message,
            created_at: self.created_at,
            completed_at: self.completed_at,
        })
    }
}

const JOB_COLUMNS: &str = "id, user_id, subject_profile_id, platform, remote_job_id, status, \
                           requested_result_limit, result_count, error_message, \
                           created_at, completed_at";

fn to_db_int(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Inserts `job` as given (normally a fresh `pending` job).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_scrape_job(pool: &PgPool, job: &ScrapeJob) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO scrape_jobs \
             (id, user_id, subject_profile_id, platform, remote_job_id, status, \
              requested_result_limit, result_count, error_message, created_at, completed_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(job.id)
    .bind(job.user_id.as_deref())
    .bind(job.subject_profile_id)
    .bind(job.platform.as_str())
    .bind(job.remote_job_id.as_deref())
    .bind(job.status.as_str())
    .bind(to_db_int(job.requested_result_limit))
    .bind(job.result_count.map(to_db_int))
    .bind(job.error_message.as_deref())
    .bind(job.created_at)
    .bind(job.completed_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetches a job by `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_scrape_job(pool: &PgPool, id: Uuid) -> Result<Option<ScrapeJobRow>, DbError> {
    let sql = format!("SELECT {JOB_COLUMNS} FROM scrape_jobs WHERE id = $1");
    let row = sqlx::query_as::<_, ScrapeJobRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Records the remote run id and moves `pending` to `running`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn mark_scrape_job_running(
    pool: &PgPool,
    id: Uuid,
    remote_job_id: &str,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE scrape_jobs \
         SET status = 'running', remote_job_id = $1 \
         WHERE id = $2 AND status = 'pending'",
    )
    .bind(remote_job_id)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Settles a job as `completed`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn complete_scrape_job(
    pool: &PgPool,
    id: Uuid,
    result_count: u32,
    message: Option<&str>,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE scrape_jobs \
         SET status = 'completed', completed_at = NOW(), result_count = $1, error_message = $2 \
         WHERE id = $3 AND status IN ('pending', 'running')",
    )
    .bind(to_db_int(result_count))
    .bind(message)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Settles a job as `failed`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn fail_scrape_job(pool: &PgPool, id: Uuid, error_message: &str) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE scrape_jobs \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status IN ('pending', 'running')",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Returns the newest `limit` jobs for a profile.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scrape_jobs_for_profile(
    pool: &PgPool,
    profile_id: Uuid,
    limit: i64,
) -> Result<Vec<ScrapeJobRow>, DbError> {
    let sql = format!(
        "SELECT {JOB_COLUMNS} FROM scrape_jobs \
         WHERE subject_profile_id = $1 \
         ORDER BY created_at DESC, id DESC \
         LIMIT $2"
    );
    let rows = sqlx::query_as::<_, ScrapeJobRow>(&sql)
        .bind(profile_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
