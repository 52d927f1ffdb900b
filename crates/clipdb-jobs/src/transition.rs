//! The scrape-job state machine as pure functions.
//!
//! ```text
//! pending ──launch──▶ running ──remote SUCCEEDED + dataset──▶ completed
//!    │                   │
//!    └──launch error─────┴──remote FAILED/ABORTED/TIMED-OUT──▶ failed
//! ```
//!
//! `completed` and `failed` are absorbing. [`transition`] takes the local
//! status, the remote status, and (once fetched) the dataset outcome, and says
//! what should happen next. [`apply_update`] computes the resulting job. No
//! I/O happens here.

use chrono::{DateTime, Utc};
use clipdb_core::{JobStatus, ScrapeJob};
use clipdb_scraper::{MappedBatch, RemoteStatus};

/// Message stored when the dataset held only creator metadata.
pub const PROFILE_ONLY_ADVISORY: &str =
    "scrape completed: profile metadata was found but the creator has no public videos";

/// Message stored when the dataset came back with no items at all.
pub const EMPTY_DATASET_ADVISORY: &str =
    "scrape completed: the remote run returned no items for this creator";

/// A write to apply to a job record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobUpdate {
    Running {
        remote_job_id: String,
    },
    Completed {
        result_count: u32,
        /// Advisory note for empty outcomes; `None` for a normal completion.
        message: Option<String>,
    },
    Failed {
        message: String,
    },
}

impl JobUpdate {
    #[must_use]
    pub fn status(&self) -> JobStatus {
        match self {
            JobUpdate::Running { .. } => JobStatus::Running,
            JobUpdate::Completed { .. } => JobStatus::Completed,
            JobUpdate::Failed { .. } => JobStatus::Failed,
        }
    }
}

/// What dataset retrieval produced for a succeeded run.
#[derive(Debug, Clone, Copy)]
pub enum DatasetOutcome<'a> {
    Mapped(&'a MappedBatch),
    /// Fetch, mapping, or persistence failed with this message.
    Failed(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Nothing to write.
    Unchanged,
    /// The remote run succeeded; fetch its dataset and call again.
    NeedsDataset,
    Update(JobUpdate),
}

/// Maps the remote vocabulary onto the local lifecycle.
#[must_use]
pub fn map_remote_status(remote: RemoteStatus) -> JobStatus {
    match remote {
        RemoteStatus::Succeeded => JobStatus::Completed,
        RemoteStatus::Failed | RemoteStatus::Aborted | RemoteStatus::TimedOut => JobStatus::Failed,
        RemoteStatus::Ready | RemoteStatus::Running => JobStatus::Running,
    }
}

fn remote_failure_message(remote: RemoteStatus) -> String {
    match remote {
        RemoteStatus::Aborted => "remote scrape job was aborted".to_string(),
        RemoteStatus::TimedOut => "remote scrape job timed out".to_string(),
        _ => "remote scrape job failed".to_string(),
    }
}

/// Decides the next step for a job whose remote run reports `remote`.
#[must_use]
pub fn transition(
    local: JobStatus,
    remote: RemoteStatus,
    dataset: Option<DatasetOutcome<'_>>,
) -> Transition {
    if local.is_terminal() {
        return Transition::Unchanged;
    }
    match map_remote_status(remote) {
        JobStatus::Pending | JobStatus::Running => Transition::Unchanged,
        JobStatus::Failed => Transition::Update(JobUpdate::Failed {
            message: remote_failure_message(remote),
        }),
        JobStatus::Completed => match dataset {
            None => Transition::NeedsDataset,
            Some(DatasetOutcome::Mapped(batch)) => Transition::Update(settle(batch)),
            Some(DatasetOutcome::Failed(message)) => Transition::Update(JobUpdate::Failed {
                message: message.to_string(),
            }),
        },
    }
}

/// The completion write for a mapped dataset.
#[must_use]
pub fn settle(batch: &MappedBatch) -> JobUpdate {
    if batch.raw_count == 0 {
        return JobUpdate::Completed {
            result_count: 0,
            message: Some(EMPTY_DATASET_ADVISORY.to_string()),
        };
    }
    if batch.videos.is_empty() {
        return JobUpdate::Completed {
            result_count: 0,
            message: Some(PROFILE_ONLY_ADVISORY.to_string()),
        };
    }
    JobUpdate::Completed {
        result_count: u32::try_from(batch.videos.len()).unwrap_or(u32::MAX),
        message: None,
    }
}

/// Applies `update` to `job`, or returns `None` when the lifecycle forbids
/// it: terminal jobs never change, and only `pending` jobs may start running.
#[must_use]
pub fn apply_update(job: &ScrapeJob, update: &JobUpdate, now: DateTime<Utc>) -> Option<ScrapeJob> {
    let mut next = job.clone();
    match update {
        JobUpdate::Running { remote_job_id } => {
            if job.status != JobStatus::Pending {
                return None;
            }
            next.status = JobStatus::Running;
            next.remote_job_id = Some(remote_job_id.clone());
        }
        JobUpdate::Completed {
            result_count,
            message,
        } => {
            if job.status.is_terminal() {
                return None;
            }
            next.status = JobStatus::Completed;
            next.result_count = Some(*result_count);
            next.error_message.clone_from(message);
            next.completed_at = Some(now);
        }
        JobUpdate::Failed { message } => {
            if job.status.is_terminal() {
                return None;
            }
            next.status = JobStatus::Failed;
            next.error_message = Some(message.clone());
            next.completed_at = Some(now);
        }
    }
    Some(next)
}
