//! Apify REST API shapes and actor inputs.
//!
//! ## Run status vocabulary
//! Apify reports `READY`, `RUNNING`, `SUCCEEDED`, `FAILED`, `ABORTED`,
//! `TIMED-OUT`, plus the transitional `TIMING-OUT` and `ABORTING`. The
//! transitional states are still in flight and are modelled as
//! [`RemoteStatus::Running`]. Anything unrecognised is treated the same way so
//! a new upstream state keeps the client polling instead of failing the job.
//!
//! ## Actor inputs
//! Each platform uses a different community actor, and each actor names its
//! input fields differently:
//! - TikTok (`clockworks/tiktok-scraper`): `profiles` + `resultsPerPage`.
//! - Instagram (`apify/instagram-scraper`): `directUrls` + `resultsType` +
//!   `resultsLimit`. `addParentData` asks for owner metadata on every post.
//! - YouTube (`streamers/youtube-scraper`): `startUrls` + `maxResults`.

use chrono::{DateTime, Utc};
use clipdb_core::Platform;
use serde::{Deserialize, Serialize};

/// Wrapper for Apify API responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// Apify actor run metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct RunData {
    pub id: String,
    pub status: String,
    #[serde(rename = "defaultDatasetId", default)]
    pub default_dataset_id: Option<String>,
    #[serde(rename = "startedAt", default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "finishedAt", default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(rename = "statusMessage", default)]
    pub status_message: Option<String>,
}

/// Remote run state as reported by the scraping service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemoteStatus {
    Ready,
    Running,
    Succeeded,
    Failed,
    Aborted,
    TimedOut,
}

impl RemoteStatus {
    /// Parses an upstream status string. Unknown values map to `Running`.
    #[must_use]
    pub fn from_remote(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "READY" => RemoteStatus::Ready,
            "SUCCEEDED" => RemoteStatus::Succeeded,
            "FAILED" => RemoteStatus::Failed,
            "ABORTED" => RemoteStatus::Aborted,
            "TIMED-OUT" | "TIMED_OUT" => RemoteStatus::TimedOut,
            _ => RemoteStatus::Running,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RemoteStatus::Ready => "READY",
            RemoteStatus::Running => "RUNNING",
            RemoteStatus::Succeeded => "SUCCEEDED",
            RemoteStatus::Failed => "FAILED",
            RemoteStatus::Aborted => "ABORTED",
            RemoteStatus::TimedOut => "TIMED-OUT",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RemoteStatus::Succeeded
                | RemoteStatus::Failed
                | RemoteStatus::Aborted
                | RemoteStatus::TimedOut
        )
    }
}

impl std::fmt::Display for RemoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle returned when a remote run is started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobHandle {
    pub remote_id: String,
    pub status: RemoteStatus,
}

/// Point-in-time status of a remote run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStatus {
    pub status: RemoteStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status_message: Option<String>,
}

impl From<RunData> for RunStatus {
    fn from(run: RunData) -> Self {
        Self {
            status: RemoteStatus::from_remote(&run.status),
            started_at: run.started_at,
            finished_at: run.finished_at,
            status_message: run.status_message,
        }
    }
}

/// Input for the clockworks/tiktok-scraper actor (profile-based).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TikTokScraperInput {
    pub profiles: Vec<String>,
    #[serde(rename = "resultsPerPage")]
    pub results_per_page: u32,
    #[serde(rename = "shouldDownloadVideos")]
    pub should_download_videos: bool,
}

/// Input for the apify/instagram-scraper actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstagramScraperInput {
    #[serde(rename = "directUrls")]
    pub direct_urls: Vec<String>,
    #[serde(rename = "resultsType")]
    pub results_type: String,
    #[serde(rename = "resultsLimit")]
    pub results_limit: u32,
    #[serde(rename = "addParentData")]
    pub add_parent_data: bool,
}

/// A start URL entry for actor inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartUrl {
    pub url: String,
}

/// Input for the streamers/youtube-scraper actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YouTubeScraperInput {
    #[serde(rename = "startUrls")]
    pub start_urls: Vec<StartUrl>,
    #[serde(rename = "maxResults")]
    pub max_results: u32,
}

/// A platform-specific actor input, serialized as the bare input object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ActorInput {
    TikTok(TikTokScraperInput),
    Instagram(InstagramScraperInput),
    YouTube(YouTubeScraperInput),
}

impl ActorInput {
    #[must_use]
    pub fn platform(&self) -> Platform {
        match self {
            ActorInput::TikTok(_) => Platform::TikTok,
            ActorInput::Instagram(_) => Platform::Instagram,
            ActorInput::YouTube(_) => Platform::YouTube,
        }
    }
}
