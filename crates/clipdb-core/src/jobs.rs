use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CoreError, Platform};

/// Local lifecycle of a scrape job: `pending -> running -> completed | failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// `completed` and `failed` are absorbing.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(CoreError::UnknownJobStatus(other.to_string())),
        }
    }
}

/// A request to scrape one creator, tracked until the remote run settles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeJob {
    pub id: Uuid,
    /// Opaque id of the requesting user; auth lives outside this system.
    pub user_id: Option<String>,
    pub subject_profile_id: Uuid,
    pub platform: Platform,
    pub remote_job_id: Option<String>,
    pub status: JobStatus,
    pub requested_result_limit: u32,
    pub result_count: Option<u32>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ScrapeJob {
    /// Builds a fresh `pending` job.
    #[must_use]
    pub fn pending(
        user_id: Option<String>,
        subject_profile_id: Uuid,
        platform: Platform,
        requested_result_limit: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            subject_profile_id,
            platform,
            remote_job_id: None,
            status: JobStatus::Pending,
            requested_result_limit,
            result_count: None,
            error_message: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    #[must_use]
    pub fn report(&self) -> JobStatusReport {
        JobStatusReport {
            job_id: self.id,
            status: self.status,
            result_count: self.result_count,
            error_message: self.error_message.clone(),
        }
    }
}

/// What polling clients see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusReport {
    pub job_id: Uuid,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}
