use async_trait::async_trait;
use serde_json::Value;

use crate::error::ScraperError;
use crate::types::{ActorInput, JobHandle, RunStatus};

/// The third-party scraping service as the rest of the system sees it.
///
/// [`crate::ApifyClient`] talks to the real service;
/// [`crate::testing::ScriptedScraper`] replays canned answers in tests.
#[async_trait]
pub trait RemoteScraper: Send + Sync {
    /// Starts a run for `input` and returns immediately.
    async fn launch(&self, input: &ActorInput) -> Result<JobHandle, ScraperError>;

    /// Reports the current state of run `remote_id`.
    async fn get_status(&self, remote_id: &str) -> Result<RunStatus, ScraperError>;

    /// Returns the raw dataset items produced by run `remote_id`.
    ///
    /// Implementations signal eventual-consistency gaps with
    /// [`ScraperError::NotReady`]; retrying is the caller's job.
    async fn get_dataset_items(&self, remote_id: &str) -> Result<Vec<Value>, ScraperError>;
}
