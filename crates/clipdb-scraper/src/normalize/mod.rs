//! Mapping raw dataset items onto [`CanonicalVideo`] and [`PartialProfile`].
//!
//! Each platform is described by a [`Schema`]: ordered candidate lists per
//! field plus the two URL helpers that differ per platform. The mapping
//! algorithm itself is shared:
//!
//! 1. Items are split into profile-only and video items, by an explicit
//!    `type` value where one is present, otherwise by video marker fields or
//!    a resolvable post id or post URL.
//!    Profile-only items may embed posts (`latestPosts`), which join the
//!    video items.
//! 2. Profile fields are filled from profile-only items first, then from
//!    video items, first value wins.
//! 3. Each video item needs an id or a URL. A missing id is parsed out of
//!    the URL; a missing URL is synthesised from the id. Items with neither
//!    are skipped.
//! 4. Remaining fields are read through the candidate lists, URLs are made
//!    absolute, descriptions are cut to 500 characters, and the engagement
//!    rate is computed.
//!
//! Problems with one item never affect another: they become a
//! [`MappingSkip`] and the batch carries on.

mod fields;
mod instagram;
mod tiktok;
mod youtube;

use std::collections::HashSet;

use clipdb_core::{engagement_rate, CanonicalVideo, PartialProfile, Platform};
use serde_json::Value;
use thiserror::Error;

use crate::extract::{as_string, extract_count, extract_map, extract_string, resolve};

pub use fields::{absolutize_url, parse_duration, parse_timestamp, truncate_chars};

pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Fields that may carry an explicit item kind.
const TYPE_FIELDS: &[&str] = &["type", "resultType", "kind", "dataType"];

/// Field candidates and URL helpers for one platform.
pub struct Schema {
    pub platform: Platform,
    /// `type` values (lowercase) that mark an item as creator metadata only.
    pub profile_types: &'static [&'static str],
    /// `type` values (lowercase) that mark an item as a post.
    pub video_types: &'static [&'static str],
    /// Fields whose presence marks an untyped item as a post.
    pub video_markers: &'static [&'static str],
    /// Arrays of posts embedded in profile-only items.
    pub nested_posts: &'static [&'static str],
    pub id: &'static [&'static str],
    pub url: &'static [&'static str],
    /// Pulls the platform id out of a post URL.
    pub id_from_url: fn(&str) -> Option<String>,
    /// Builds a post URL from an id and, when known, the author handle.
    pub url_from_id: fn(&str, Option<&str>) -> String,
    pub description: &'static [&'static str],
    /// Array-of-images paths come before singular fields.
    pub thumbnail: &'static [&'static str],
    pub views: &'static [&'static str],
    pub likes: &'static [&'static str],
    pub comments: &'static [&'static str],
    pub shares: &'static [&'static str],
    pub posted_at: &'static [&'static str],
    pub duration: &'static [&'static str],
    pub username: &'static [&'static str],
    pub display_name: &'static [&'static str],
    pub avatar: &'static [&'static str],
    pub followers: &'static [&'static str],
}

#[must_use]
pub fn schema_for(platform: Platform) -> &'static Schema {
    match platform {
        Platform::TikTok => &tiktok::SCHEMA,
        Platform::Instagram => &instagram::SCHEMA,
        Platform::YouTube => &youtube::SCHEMA,
    }
}

/// Why a single raw item produced no video. Logged and counted, never
/// propagated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingSkip {
    #[error("item {index} is not a JSON object")]
    NotAnObject { index: usize },

    #[error("item {index} has neither a video id nor a video URL")]
    MissingIdentity { index: usize },

    #[error("item {index} repeats video {video_id}")]
    Duplicate { index: usize, video_id: String },
}

/// Output of mapping one dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedBatch {
    pub videos: Vec<CanonicalVideo>,
    pub profile: PartialProfile,
    /// Number of top-level items in the dataset.
    pub raw_count: usize,
    /// Top-level items recognised as creator metadata only.
    pub profile_only_count: usize,
    pub skips: Vec<MappingSkip>,
}

impl MappedBatch {
    /// True when the dataset held items but none of them were posts.
    #[must_use]
    pub fn is_profile_only(&self) -> bool {
        self.videos.is_empty() && self.raw_count > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemKind {
    ProfileOnly,
    Video,
}

fn classify(schema: &Schema, item: &Value) -> ItemKind {
    if let Some(kind) = extract_string(item, TYPE_FIELDS) {
        let kind = kind.to_ascii_lowercase();
        if schema.profile_types.contains(&kind.as_str()) {
            return ItemKind::ProfileOnly;
        }
        if schema.video_types.contains(&kind.as_str()) {
            return ItemKind::Video;
        }
    }
    if schema
        .video_markers
        .iter()
        .any(|marker| resolve(item, marker).is_some())
        || has_post_identity(schema, item)
    {
        ItemKind::Video
    } else {
        ItemKind::ProfileOnly
    }
}

/// A post id, or a URL the platform recognises as a post.
fn has_post_identity(schema: &Schema, item: &Value) -> bool {
    extract_string(item, schema.id).is_some_and(|id| !id.is_empty())
        || extract_string(item, schema.url)
            .and_then(|url| (schema.id_from_url)(&url))
            .is_some()
}

/// Maps one dataset for `platform`.
#[must_use]
pub fn map_items(platform: Platform, items: &[Value]) -> MappedBatch {
    let schema = schema_for(platform);
    let mut batch = MappedBatch {
        raw_count: items.len(),
        ..MappedBatch::default()
    };

    let mut profile_items: Vec<&Value> = Vec::new();
    let mut video_items: Vec<(usize, &Value)> = Vec::new();

    for (index, item) in items.iter().enumerate() {
        if !item.is_object() {
            batch.skips.push(MappingSkip::NotAnObject { index });
            continue;
        }
        match classify(schema, item) {
            ItemKind::Video => video_items.push((index, item)),
            ItemKind::ProfileOnly => {
                batch.profile_only_count += 1;
                profile_items.push(item);
                for path in schema.nested_posts {
                    if let Some(Value::Array(posts)) = resolve(item, path) {
                        video_items.extend(
                            posts
                                .iter()
                                .filter(|post| post.is_object())
                                .map(|post| (index, post)),
                        );
                    }
                }
            }
        }
    }

    for item in profile_items
        .iter()
        .copied()
        .chain(video_items.iter().map(|(_, item)| *item))
    {
        if batch.profile.is_complete() {
            break;
        }
        batch.profile.fill_missing_from(&profile_of(schema, item));
    }

    let mut seen: HashSet<String> = HashSet::new();
    for (index, item) in video_items {
        match map_video(schema, item, batch.profile.username.as_deref()) {
            Some(video) => {
                if seen.insert(video.video_id.clone()) {
                    batch.videos.push(video);
                } else {
                    batch.skips.push(MappingSkip::Duplicate {
                        index,
                        video_id: video.video_id,
                    });
                }
            }
            None => batch.skips.push(MappingSkip::MissingIdentity { index }),
        }
    }

    for skip in &batch.skips {
        tracing::debug!(%platform, reason = %skip, "skipped dataset item");
    }

    batch
}

fn strip_handle(raw: String) -> String {
    match raw.strip_prefix('@') {
        Some(rest) => rest.to_string(),
        None => raw,
    }
}

fn profile_of(schema: &Schema, item: &Value) -> PartialProfile {
    let origin = schema.platform.origin();
    PartialProfile {
        username: extract_string(item, schema.username)
            .map(strip_handle)
            .filter(|u| !u.is_empty()),
        display_name: extract_string(item, schema.display_name),
        avatar_url: extract_map(item, schema.avatar, as_string)
            .and_then(|raw| absolutize_url(&raw, origin)),
        follower_count: extract_count(item, schema.followers),
    }
}

/// Last non-empty path segment of `url`, ignoring query and fragment.
fn last_path_segment(url: &str) -> Option<String> {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = without_scheme.split_once('/')?.1;
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.rsplit('/')
        .find(|s| !s.is_empty())
        .filter(|s| !s.starts_with('@'))
        .map(str::to_string)
}

fn map_video(schema: &Schema, item: &Value, profile_username: Option<&str>) -> Option<CanonicalVideo> {
    let origin = schema.platform.origin();

    let url = extract_string(item, schema.url).and_then(|raw| absolutize_url(&raw, origin));
    let video_id = extract_string(item, schema.id)
        .or_else(|| url.as_deref().and_then(schema.id_from_url))
        .or_else(|| url.as_deref().and_then(last_path_segment))?;

    let video_url = url.unwrap_or_else(|| {
        let author = extract_string(item, schema.username).map(strip_handle);
        (schema.url_from_id)(&video_id, author.as_deref().or(profile_username))
    });

    let description = extract_string(item, schema.description)
        .map(|text| truncate_chars(&text, MAX_DESCRIPTION_CHARS));
    let thumbnail_url = extract_map(item, schema.thumbnail, as_string)
        .and_then(|raw| absolutize_url(&raw, origin));

    let views = extract_count(item, schema.views).unwrap_or(0);
    let likes = extract_count(item, schema.likes).unwrap_or(0);
    let comments = extract_count(item, schema.comments).unwrap_or(0);
    let shares = extract_count(item, schema.shares).unwrap_or(0);

    Some(CanonicalVideo {
        video_id,
        video_url,
        description,
        thumbnail_url,
        views,
        likes,
        comments,
        shares,
        posted_at: extract_map(item, schema.posted_at, parse_timestamp),
        duration_seconds: extract_map(item, schema.duration, parse_duration),
        engagement_rate: engagement_rate(views, likes, comments, shares),
    })
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
