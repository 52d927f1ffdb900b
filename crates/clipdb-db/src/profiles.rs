//! Database operations for `creator_profiles`.

use chrono::{DateTime, Utc};
use clipdb_core::{CreatorProfile, PartialProfile, Platform};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{from_db_count, to_db_count, DbError};

/// A row from the `creator_profiles` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CreatorProfileRow {
    pub id: Uuid,
    pub username: String,
    pub platform: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub follower_count: Option<i64>,
    pub last_scraped_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CreatorProfileRow {
    /// # Errors
    ///
    /// Returns [`DbError::InvalidRow`] if `platform` holds an unknown value.
    pub fn into_profile(self) -> Result<CreatorProfile, DbError> {
        let platform = self
            .platform
            .parse::<Platform>()
            .map_err(|e| DbError::InvalidRow {
                table: "creator_profiles",
                reason: e.to_string(),
            })?;
        Ok(CreatorProfile {
            id: self.id,
            username: self.username,
            platform,
            display_name: self.display_name,
            avatar_url: self.avatar_url,
            follower_count: self.follower_count.map(from_db_count),
            last_scraped_at: self.last_scraped_at,
        })
    }
}

const PROFILE_COLUMNS: &str = "id, username, platform, display_name, avatar_url, \
                               follower_count, last_scraped_at, created_at, updated_at";

/// Returns the profile for `(username, platform)`, creating an empty one on
/// first sight. `username` is lowercased before lookup.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn get_or_create_profile(
    pool: &PgPool,
    username: &str,
    platform: Platform,
) -> Result<CreatorProfileRow, DbError> {
    // The no-op DO UPDATE makes RETURNING yield the existing row on conflict.
    let sql = format!(
        "INSERT INTO creator_profiles (id, username, platform) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (username, platform) DO UPDATE SET username = EXCLUDED.username \
         RETURNING {PROFILE_COLUMNS}"
    );
    let row = sqlx::query_as::<_, CreatorProfileRow>(&sql)
        .bind(Uuid::new_v4())
        .bind(username.to_lowercase())
        .bind(platform.as_str())
        .fetch_one(pool)
        .await?;

    Ok(row)
}

/// Fetches a profile by its `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_profile(pool: &PgPool, id: Uuid) -> Result<Option<CreatorProfileRow>, DbError> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM creator_profiles WHERE id = $1");
    let row = sqlx::query_as::<_, CreatorProfileRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Fetches a profile by `(username, platform)`; `username` is lowercased.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_profile_by_username(
    pool: &PgPool,
    username: &str,
    platform: Platform,
) -> Result<Option<CreatorProfileRow>, DbError> {
    let sql = format!(
        "SELECT {PROFILE_COLUMNS} FROM creator_profiles \
         WHERE username = $1 AND platform = $2"
    );
    let row = sqlx::query_as::<_, CreatorProfileRow>(&sql)
        .bind(username.to_lowercase())
        .bind(platform.as_str())
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Applies freshly scraped metadata. Null fields in `update` leave the stored
/// value untouched; `last_scraped_at` is always advanced.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no profile has the given `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_profile_metadata(
    pool: &PgPool,
    id: Uuid,
    update: &PartialProfile,
    scraped_at: DateTime<Utc>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE creator_profiles SET \
             display_name    = COALESCE($2, display_name), \
             avatar_url      = COALESCE($3, avatar_url), \
             follower_count  = COALESCE($4, follower_count), \
             last_scraped_at = $5, \
             updated_at      = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(update.display_name.as_deref())
    .bind(update.avatar_url.as_deref())
    .bind(update.follower_count.map(to_db_count))
    .bind(scraped_at)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
