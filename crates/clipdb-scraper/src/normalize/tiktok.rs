use std::sync::LazyLock;

use clipdb_core::Platform;
use regex::Regex;

use super::Schema;

static VIDEO_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(?:video|photo)/(\d+)").expect("valid regex"));

fn id_from_url(url: &str) -> Option<String> {
    VIDEO_ID_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn url_from_id(id: &str, author: Option<&str>) -> String {
    let origin = Platform::TikTok.origin();
    match author.filter(|a| !a.is_empty()) {
        Some(author) => format!("{origin}/@{author}/video/{id}"),
        None => format!("{origin}/video/{id}"),
    }
}

/// clockworks/tiktok-scraper. Older runs nest stats under `stats` and the
/// author under `author`; current runs use `authorMeta` and flat counts.
pub(super) static SCHEMA: Schema = Schema {
    platform: Platform::TikTok,
    profile_types: &["user", "profile", "author", "authormeta"],
    video_types: &["video", "post", "photo"],
    video_markers: &[
        "webVideoUrl",
        "videoMeta",
        "playCount",
        "diggCount",
        "stats.playCount",
        "createTimeISO",
    ],
    nested_posts: &[],
    id: &["id", "videoId", "aweme_id"],
    url: &["webVideoUrl", "videoUrl", "shareUrl", "url"],
    id_from_url,
    url_from_id,
    description: &["text", "desc", "description"],
    thumbnail: &[
        "covers.0",
        "videoMeta.coverUrl",
        "videoMeta.originalCoverUrl",
        "video.cover",
        "coverUrl",
    ],
    views: &["playCount", "stats.playCount", "viewCount"],
    likes: &["diggCount", "stats.diggCount", "likeCount", "likes"],
    comments: &["commentCount", "stats.commentCount", "comments"],
    shares: &["shareCount", "stats.shareCount", "shares"],
    posted_at: &["createTimeISO", "createTime", "createdAt"],
    duration: &["videoMeta.duration", "video.duration", "duration"],
    username: &[
        "authorMeta.name",
        "authorMeta.uniqueId",
        "author.uniqueId",
        "uniqueId",
        "username",
        "name",
    ],
    display_name: &[
        "authorMeta.nickName",
        "authorMeta.nickname",
        "author.nickname",
        "nickName",
        "nickname",
    ],
    avatar: &[
        "authorMeta.avatar",
        "author.avatarLarger",
        "author.avatarThumb",
        "avatarLarger",
        "avatar",
    ],
    followers: &[
        "authorMeta.fans",
        "authorStats.followerCount",
        "fans",
        "followerCount",
    ],
};
