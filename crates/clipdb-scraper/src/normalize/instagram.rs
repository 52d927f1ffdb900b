use std::sync::LazyLock;

use clipdb_core::Platform;
use regex::Regex;

use super::Schema;

static SHORTCODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(?:p|reel|reels|tv)/([A-Za-z0-9_-]+)").expect("valid regex"));

fn id_from_url(url: &str) -> Option<String> {
    SHORTCODE_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn url_from_id(shortcode: &str, _author: Option<&str>) -> String {
    format!("{}/p/{shortcode}/", Platform::Instagram.origin())
}

/// apify/instagram-scraper. Posts carry `shortCode`; profile detail records
/// carry `followersCount` and may embed `latestPosts`. Image posts report no
/// views, so their engagement rate uses the likes+comments fallback.
pub(super) static SCHEMA: Schema = Schema {
    platform: Platform::Instagram,
    profile_types: &["user", "profile", "details", "owner"],
    video_types: &["video", "image", "sidecar", "reel", "clips"],
    video_markers: &["shortCode", "shortcode", "displayUrl", "videoUrl", "likesCount"],
    nested_posts: &["latestPosts", "posts"],
    id: &["shortCode", "shortcode", "code"],
    url: &["url", "postUrl", "permalink"],
    id_from_url,
    url_from_id,
    description: &["caption", "text", "alt", "description"],
    thumbnail: &["images.0", "displayUrl", "thumbnailUrl", "thumbnail_src"],
    views: &["videoViewCount", "videoPlayCount", "viewCount", "playCount"],
    likes: &["likesCount", "likeCount", "edge_liked_by.count"],
    comments: &["commentsCount", "commentCount", "edge_media_to_comment.count"],
    shares: &["sharesCount", "reshareCount"],
    posted_at: &["timestamp", "takenAtTimestamp", "taken_at"],
    duration: &["videoDuration", "video_duration", "duration"],
    username: &["ownerUsername", "owner.username", "username"],
    display_name: &["ownerFullName", "owner.full_name", "owner.fullName", "fullName"],
    avatar: &[
        "owner.profile_pic_url",
        "ownerProfilePicUrl",
        "profilePicUrlHD",
        "profilePicUrl",
    ],
    followers: &[
        "followersCount",
        "ownerFollowersCount",
        "owner.edge_followed_by.count",
        "owner.followersCount",
    ],
};
