use std::sync::LazyLock;

use clipdb_core::Platform;
use regex::Regex;

use super::Schema;

static VIDEO_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[?&]v=|youtu\.be/|/shorts/|/embed/|/live/)([A-Za-z0-9_-]{11})")
        .expect("valid regex")
});

fn id_from_url(url: &str) -> Option<String> {
    VIDEO_ID_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn url_from_id(id: &str, _author: Option<&str>) -> String {
    format!("{}/watch?v={id}", Platform::YouTube.origin())
}

/// streamers/youtube-scraper. Durations arrive as `HH:MM:SS` strings; channel
/// fields are repeated on every video and also sent as a `channel` record.
pub(super) static SCHEMA: Schema = Schema {
    platform: Platform::YouTube,
    profile_types: &["channel", "user", "profile", "about"],
    video_types: &["video", "shorts", "short", "stream"],
    video_markers: &["viewCount", "duration", "likes", "commentsCount"],
    nested_posts: &[],
    id: &["id", "videoId"],
    url: &["url", "videoUrl", "link"],
    id_from_url,
    url_from_id,
    description: &["title", "text", "description"],
    thumbnail: &["thumbnails.0.url", "thumbnailUrl", "thumbnail"],
    views: &["viewCount", "views"],
    likes: &["likes", "likeCount"],
    comments: &["commentsCount", "commentCount", "numberOfComments"],
    shares: &["shareCount"],
    posted_at: &["date", "publishedAt", "uploadDate"],
    duration: &["duration", "lengthSeconds"],
    username: &[
        "channelUsername",
        "channelHandle",
        "aboutChannelInfo.channelUsername",
    ],
    display_name: &["channelName", "aboutChannelInfo.channelName"],
    avatar: &[
        "channelAvatarUrl",
        "aboutChannelInfo.channelAvatarUrl",
        "avatarUrl",
    ],
    followers: &[
        "numberOfSubscribers",
        "aboutChannelInfo.numberOfSubscribers",
        "subscriberCount",
    ],
};
