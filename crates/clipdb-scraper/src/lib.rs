pub mod client;
pub mod dataset;
pub mod error;
pub mod extract;
pub mod launcher;
pub mod normalize;
pub mod remote;
pub mod retry;
pub mod testing;
pub mod types;

pub use client::{ActorIds, ApifyClient};
pub use dataset::fetch_dataset;
pub use error::ScraperError;
pub use extract::{extract, extract_count, extract_string};
pub use launcher::{build_actor_input, normalize_identifier, start, validate_result_limit};
pub use normalize::{map_items, MappedBatch, MappingSkip};
pub use remote::RemoteScraper;
pub use retry::{retry_fixed, RetryPolicy};
pub use types::{ActorInput, JobHandle, RemoteStatus, RunStatus};
