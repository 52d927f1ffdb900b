use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Platform;

/// One piece of scraped content in platform-agnostic form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalVideo {
    /// Platform-native id: numeric for TikTok, shortcode for Instagram,
    /// 11-character id for YouTube.
    pub video_id: String,
    pub video_url: String,
    /// At most 500 characters.
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub posted_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<u32>,
    /// See [`crate::engagement_rate`].
    pub engagement_rate: f64,
}

/// Creator metadata gleaned from a dataset. Every field is optional because
/// upstream actors disagree on what they report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialProfile {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub follower_count: Option<u64>,
}

impl PartialProfile {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.populated_fields() == 0
    }

    #[must_use]
    pub fn populated_fields(&self) -> usize {
        usize::from(self.username.is_some())
            + usize::from(self.display_name.is_some())
            + usize::from(self.avatar_url.is_some())
            + usize::from(self.follower_count.is_some())
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.populated_fields() == 4
    }

    /// Copies fields from `other` into the ones still empty here. Populated
    /// fields are never overwritten, so the first source seen wins.
    pub fn fill_missing_from(&mut self, other: &PartialProfile) {
        if self.username.is_none() {
            self.username.clone_from(&other.username);
        }
        if self.display_name.is_none() {
            self.display_name.clone_from(&other.display_name);
        }
        if self.avatar_url.is_none() {
            self.avatar_url.clone_from(&other.avatar_url);
        }
        if self.follower_count.is_none() {
            self.follower_count = other.follower_count;
        }
    }
}

/// A creator on one platform. Unique on `(username, platform)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorProfile {
    pub id: Uuid,
    /// Always lowercase.
    pub username: String,
    pub platform: Platform,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub follower_count: Option<u64>,
    pub last_scraped_at: Option<DateTime<Utc>>,
}

impl CreatorProfile {
    #[must_use]
    pub fn new(username: &str, platform: Platform) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.to_lowercase(),
            platform,
            display_name: None,
            avatar_url: None,
            follower_count: None,
            last_scraped_at: None,
        }
    }

    /// Overwrites metadata with every non-null field of `update`; null fields
    /// leave the stored value alone.
    pub fn apply(&mut self, update: &PartialProfile) {
        if let Some(name) = &update.display_name {
            self.display_name = Some(name.clone());
        }
        if let Some(avatar) = &update.avatar_url {
            self.avatar_url = Some(avatar.clone());
        }
        if let Some(followers) = update.follower_count {
            self.follower_count = Some(followers);
        }
    }
}

/// A persisted video together with its ownership links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredVideo {
    pub profile_id: Uuid,
    /// The job that last wrote this row.
    pub scrape_job_id: Option<Uuid>,
    pub platform: Platform,
    #[serde(flatten)]
    pub video: CanonicalVideo,
    pub updated_at: DateTime<Utc>,
}
