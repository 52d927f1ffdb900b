//! Scrape-job lifecycle: launching, reconciling against the remote service,
//! caching, and polling.

pub mod cache;
pub mod error;
pub mod poll;
pub mod reconciler;
pub mod service;
pub mod store;
pub mod transition;

pub use cache::{is_fresh, usable_cached_results};
pub use error::{JobError, StoreError};
pub use poll::{poll_until_settled, PollOutcome, PollPolicy};
pub use reconciler::Reconciler;
pub use service::{
    AnalyticsOutcome, AnalyticsRequest, AnalyticsService, ProfileOverview, ServiceSettings,
};
pub use store::{JobStore, MemoryStore, PgStore};
pub use transition::{apply_update, map_remote_status, transition, JobUpdate, Transition};
