//! Cache gate: decides whether stored results may answer a request.

use chrono::{DateTime, Duration, Utc};
use clipdb_core::{CanonicalVideo, CreatorProfile};

use crate::error::StoreError;
use crate::store::JobStore;

pub const DEFAULT_FRESHNESS_HOURS: u32 = 48;

/// True when `profile` was scraped within the last `window_hours`.
#[must_use]
pub fn is_fresh(profile: &CreatorProfile, window_hours: u32, now: DateTime<Utc>) -> bool {
    profile
        .last_scraped_at
        .is_some_and(|at| now.signed_duration_since(at) < Duration::hours(i64::from(window_hours)))
}

/// Returns up to `limit` stored videos when `profile` is fresh and at least
/// one video is stored for it. An empty store never counts as a cache hit,
/// however fresh the profile.
///
/// # Errors
///
/// Returns [`StoreError`] if the stored videos cannot be read.
pub async fn usable_cached_results(
    store: &dyn JobStore,
    profile: &CreatorProfile,
    window_hours: u32,
    limit: u32,
    now: DateTime<Utc>,
) -> Result<Option<Vec<CanonicalVideo>>, StoreError> {
    if !is_fresh(profile, window_hours, now) {
        return Ok(None);
    }
    let videos = store.list_videos(profile.id, limit).await?;
    if videos.is_empty() {
        tracing::debug!(
            profile_id = %profile.id,
            "profile is fresh but has no stored videos; cache bypassed"
        );
        return Ok(None);
    }
    Ok(Some(videos.into_iter().map(|v| v.video).collect()))
}
