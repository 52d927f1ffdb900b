//! Starting remote runs: identifier normalisation, input validation, and the
//! per-platform actor input.

use clipdb_core::Platform;

use crate::error::ScraperError;
use crate::remote::RemoteScraper;
use crate::types::{
    ActorInput, InstagramScraperInput, JobHandle, StartUrl, TikTokScraperInput,
    YouTubeScraperInput,
};

pub const MIN_RESULT_LIMIT: u32 = 1;
pub const MAX_RESULT_LIMIT: u32 = 100;

const MAX_IDENTIFIER_LEN: usize = 100;

/// Reduces a caller-supplied creator identifier to a bare handle.
///
/// Accepts `name`, `@name`, and profile URLs such as
/// `https://www.tiktok.com/@name`, `instagram.com/name/`,
/// `https://youtube.com/@name` or `https://youtube.com/channel/UC...`.
/// The handle is lowercased on platforms whose handles are case-insensitive.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidInput`] if nothing usable remains or the
/// handle contains characters no platform allows.
pub fn normalize_identifier(platform: Platform, raw: &str) -> Result<String, ScraperError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ScraperError::invalid_input("identifier must not be empty"));
    }

    let handle = handle_from_url(trimmed).unwrap_or(trimmed);
    let handle = handle.trim_start_matches('@').trim();

    if handle.is_empty() {
        return Err(ScraperError::invalid_input("identifier must not be empty"));
    }
    if handle.chars().count() > MAX_IDENTIFIER_LEN {
        return Err(ScraperError::invalid_input(format!(
            "identifier longer than {MAX_IDENTIFIER_LEN} characters"
        )));
    }
    if let Some(bad) = handle
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(ScraperError::invalid_input(format!(
            "identifier contains invalid character {bad:?}"
        )));
    }

    Ok(if platform.is_case_insensitive() {
        handle.to_ascii_lowercase()
    } else {
        handle.to_string()
    })
}

/// Pulls the handle segment out of a profile URL. Returns `None` for input
/// that does not look like a URL.
fn handle_from_url(input: &str) -> Option<&str> {
    let without_scheme = input
        .strip_prefix("https://")
        .or_else(|| input.strip_prefix("http://"))
        .unwrap_or(input);

    let (host, path) = without_scheme.split_once('/')?;
    if !host.contains('.') {
        return None;
    }

    let path = path.split(['?', '#']).next().unwrap_or_default();
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let first = segments.next()?;
    match first {
        "channel" | "c" | "user" => segments.next(),
        _ => Some(first),
    }
}

/// Checks that `limit` is within `1..=100`.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidInput`] when it is not.
pub fn validate_result_limit(limit: u32) -> Result<u32, ScraperError> {
    if (MIN_RESULT_LIMIT..=MAX_RESULT_LIMIT).contains(&limit) {
        Ok(limit)
    } else {
        Err(ScraperError::invalid_input(format!(
            "result limit {limit} is outside {MIN_RESULT_LIMIT}..={MAX_RESULT_LIMIT}"
        )))
    }
}

/// Builds the actor input for an already-normalised `handle`.
#[must_use]
pub fn build_actor_input(platform: Platform, handle: &str, limit: u32) -> ActorInput {
    match platform {
        Platform::TikTok => ActorInput::TikTok(TikTokScraperInput {
            profiles: vec![handle.to_string()],
            results_per_page: limit,
            should_download_videos: false,
        }),
        Platform::Instagram => ActorInput::Instagram(InstagramScraperInput {
            direct_urls: vec![format!("{}/{handle}/", platform.origin())],
            results_type: "posts".to_string(),
            results_limit: limit,
            add_parent_data: true,
        }),
        Platform::YouTube => {
            let url = if handle.starts_with("UC") && handle.len() == 24 {
                format!("{}/channel/{handle}", platform.origin())
            } else {
                format!("{}/@{handle}", platform.origin())
            };
            ActorInput::YouTube(YouTubeScraperInput {
                start_urls: vec![StartUrl { url }],
                max_results: limit,
            })
        }
    }
}

/// Validates the request and starts a remote run.
///
/// # Errors
///
/// - [`ScraperError::InvalidInput`]: empty or malformed identifier, or a
///   limit outside `1..=100`. Nothing is sent upstream.
/// - [`ScraperError::RemoteLaunch`]: the remote service rejected the run or
///   could not be reached; the upstream error text is kept in `message`.
pub async fn start<R>(
    remote: &R,
    platform: Platform,
    identifier: &str,
    result_limit: u32,
) -> Result<JobHandle, ScraperError>
where
    R: RemoteScraper + ?Sized,
{
    let handle = normalize_identifier(platform, identifier)?;
    let limit = validate_result_limit(result_limit)?;
    let input = build_actor_input(platform, &handle, limit);

    match remote.launch(&input).await {
        Ok(job) => {
            tracing::info!(
                %platform,
                username = %handle,
                remote_id = %job.remote_id,
                limit,
                "remote run launched"
            );
            Ok(job)
        }
        Err(e) => {
            tracing::warn!(%platform, username = %handle, error = %e, "remote run launch rejected");
            Err(ScraperError::RemoteLaunch {
                platform,
                message: e.to_string(),
            })
        }
    }
}
