//! Scripted stand-in for the remote scraping service (tests, no network).

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ScraperError;
use crate::remote::RemoteScraper;
use crate::types::{ActorInput, JobHandle, RemoteStatus, RunStatus};

type Script<T> = Mutex<VecDeque<Result<T, ScraperError>>>;

/// Replays queued answers in order. Status answers may also be pinned per
/// run with [`ScriptedScraper::set_status`], which is what polling tests use.
///
/// An exhausted launch queue hands out `run-1`, `run-2`, ... in `READY`; an
/// exhausted dataset queue returns an empty list.
#[derive(Default)]
pub struct ScriptedScraper {
    launches: Script<JobHandle>,
    statuses: Script<RunStatus>,
    pinned_status: Mutex<HashMap<String, RemoteStatus>>,
    datasets: Script<Vec<Value>>,
    launched_inputs: Mutex<Vec<ActorInput>>,
    launch_calls: AtomicU32,
    status_calls: AtomicU32,
    dataset_calls: AtomicU32,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedScraper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_launch(&self, outcome: Result<JobHandle, ScraperError>) {
        lock(&self.launches).push_back(outcome);
    }

    pub fn push_status(&self, outcome: Result<RunStatus, ScraperError>) {
        lock(&self.statuses).push_back(outcome);
    }

    pub fn push_dataset(&self, outcome: Result<Vec<Value>, ScraperError>) {
        lock(&self.datasets).push_back(outcome);
    }

    /// Answers every status query for `remote_id` with `status` once the
    /// queued status answers are used up.
    pub fn set_status(&self, remote_id: &str, status: RemoteStatus) {
        lock(&self.pinned_status).insert(remote_id.to_string(), status);
    }

    #[must_use]
    pub fn launched_inputs(&self) -> Vec<ActorInput> {
        lock(&self.launched_inputs).clone()
    }

    #[must_use]
    pub fn launch_calls(&self) -> u32 {
        self.launch_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn dataset_calls(&self) -> u32 {
        self.dataset_calls.load(Ordering::SeqCst)
    }
}

/// A bare status answer with no timestamps.
#[must_use]
pub fn run_status(status: RemoteStatus) -> RunStatus {
    RunStatus {
        status,
        started_at: None,
        finished_at: None,
        status_message: None,
    }
}

#[async_trait]
impl RemoteScraper for ScriptedScraper {
    async fn launch(&self, input: &ActorInput) -> Result<JobHandle, ScraperError> {
        let n = self.launch_calls.fetch_add(1, Ordering::SeqCst) + 1;
        lock(&self.launched_inputs).push(input.clone());
        lock(&self.launches).pop_front().unwrap_or_else(|| {
            Ok(JobHandle {
                remote_id: format!("run-{n}"),
                status: RemoteStatus::Ready,
            })
        })
    }

    async fn get_status(&self, remote_id: &str) -> Result<RunStatus, ScraperError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(queued) = lock(&self.statuses).pop_front() {
            return queued;
        }
        let pinned = lock(&self.pinned_status)
            .get(remote_id)
            .copied()
            .unwrap_or(RemoteStatus::Running);
        Ok(run_status(pinned))
    }

    async fn get_dataset_items(&self, _remote_id: &str) -> Result<Vec<Value>, ScraperError> {
        self.dataset_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.datasets).pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}
