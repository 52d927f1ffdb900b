//! Aggregate metrics over a creator's stored videos.

use serde::Serialize;

use crate::engagement::round2;
use crate::CanonicalVideo;

/// Per-profile rollup shown next to the video list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSummary {
    pub video_count: usize,
    pub total_views: u64,
    pub average_views: u64,
    pub total_likes: u64,
    pub average_engagement_rate: f64,
    /// Highest engagement rate first; ties broken by views.
    pub top_videos: Vec<CanonicalVideo>,
}

/// Summarizes `videos`, keeping the `top_n` best performers.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize_videos(videos: &[CanonicalVideo], top_n: usize) -> ProfileSummary {
    let video_count = videos.len();
    let total_views = videos.iter().fold(0u64, |acc, v| acc.saturating_add(v.views));
    let total_likes = videos.iter().fold(0u64, |acc, v| acc.saturating_add(v.likes));

    let (average_views, average_engagement_rate) = if video_count == 0 {
        (0, 0.0)
    } else {
        let rate_sum: f64 = videos.iter().map(|v| v.engagement_rate).sum();
        (
            total_views / video_count as u64,
            round2(rate_sum / video_count as f64),
        )
    };

    let mut ranked: Vec<CanonicalVideo> = videos.to_vec();
    ranked.sort_by(|a, b| {
        b.engagement_rate
            .total_cmp(&a.engagement_rate)
            .then_with(|| b.views.cmp(&a.views))
    });
    ranked.truncate(top_n);

    ProfileSummary {
        video_count,
        total_views,
        average_views,
        total_likes,
        average_engagement_rate,
        top_videos: ranked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engagement_rate;

    fn video(id: &str, views: u64, likes: u64) -> CanonicalVideo {
        CanonicalVideo {
            video_id: id.to_string(),
            video_url: format!("https://www.tiktok.com/@u/video/{id}"),
            description: None,
            thumbnail_url: None,
            views,
            likes,
            comments: 0,
            shares: 0,
            posted_at: None,
            duration_seconds: None,
            engagement_rate: engagement_rate(views, likes, 0, 0),
        }
    }

    #[test]
    fn empty_input_yields_zeroes() {
        let summary = summarize_videos(&[], 5);
        assert_eq!(summary.video_count, 0);
        assert_eq!(summary.average_views, 0);
        assert!(summary.average_engagement_rate.abs() < f64::EPSILON);
        assert!(summary.top_videos.is_empty());
    }

    #[test]
    fn ranks_by_engagement_and_truncates() {
        let videos = vec![video("1", 100, 1), video("2", 100, 50), video("3", 100, 10)];
        let summary = summarize_videos(&videos, 2);
        assert_eq!(summary.video_count, 3);
        assert_eq!(summary.total_views, 300);
        assert_eq!(summary.average_views, 100);
        assert_eq!(summary.total_likes, 61);
        let ids: Vec<&str> = summary.top_videos.iter().map(|v| v.video_id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);
        // (1 + 50 + 10) / 3
        assert!((summary.average_engagement_rate - 20.33).abs() < f64::EPSILON);
    }
}
