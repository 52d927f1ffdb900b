use clipdb_db::DbError;
use clipdb_scraper::ScraperError;
use thiserror::Error;
use uuid::Uuid;

/// Failures of the persistence seam.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("{0} not found")]
    NotFound(String),

    /// Raised by non-database stores (the in-memory one uses it for injected
    /// failures).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum JobError {
    /// Bad identifier or limit. No job was created.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("scrape job {0} not found")]
    JobNotFound(Uuid),

    #[error("profile {0} not found")]
    ProfileNotFound(String),

    /// The remote service refused the run. The local job is already marked
    /// `failed` with the same message.
    #[error("scrape job {job_id} could not be launched: {message}")]
    Launch { job_id: Uuid, message: String },

    #[error(transparent)]
    Scraper(ScraperError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ScraperError> for JobError {
    fn from(err: ScraperError) -> Self {
        match err {
            ScraperError::InvalidInput { reason } => JobError::InvalidInput(reason),
            other => JobError::Scraper(other),
        }
    }
}

impl From<DbError> for JobError {
    fn from(err: DbError) -> Self {
        JobError::Store(StoreError::Db(err))
    }
}
