use clipdb_core::Platform;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Bad identifier or result limit. No job is created.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// The remote service refused to start a run.
    #[error("failed to launch {platform} scrape: {message}")]
    RemoteLaunch { platform: Platform, message: String },

    /// The run's dataset is not queryable yet. Retried internally.
    #[error("dataset for run {remote_id} is not ready: {message}")]
    NotReady { remote_id: String, message: String },

    /// Dataset retrieval gave up, either after retries or on a hard error.
    #[error("dataset retrieval failed for run {remote_id}: {message}")]
    RemoteFatal { remote_id: String, message: String },
}

impl ScraperError {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        ScraperError::InvalidInput {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn is_not_ready(&self) -> bool {
        matches!(self, ScraperError::NotReady { .. })
    }
}
