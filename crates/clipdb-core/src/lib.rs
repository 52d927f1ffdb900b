pub mod analytics;
pub mod app_config;
pub mod config;
pub mod engagement;
pub mod jobs;
pub mod platform;
pub mod videos;

pub use analytics::{summarize_videos, ProfileSummary};
pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use engagement::engagement_rate;
pub use jobs::{JobStatus, JobStatusReport, ScrapeJob};
pub use platform::Platform;
pub use videos::{CanonicalVideo, CreatorProfile, PartialProfile, StoredVideo};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("unknown job status: {0}")]
    UnknownJobStatus(String),
}
