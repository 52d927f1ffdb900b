//! Engagement-rate arithmetic shared by every platform mapper.

/// Computes `(likes + comments + shares) / base * 100`, rounded to two decimals.
///
/// `base` is `views` when the platform reported any, otherwise
/// `max(likes + comments, 1)`. The fallback keeps image posts (which carry no
/// view count) rankable, at the cost of rates that are not comparable with
/// view-based ones. Stored data depends on this, so it stays as is.
///
/// The result is always finite and non-negative.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn engagement_rate(views: u64, likes: u64, comments: u64, shares: u64) -> f64 {
    let interactions = likes.saturating_add(comments).saturating_add(shares);
    let base = if views > 0 {
        views
    } else {
        likes.saturating_add(comments).max(1)
    };
    round2(interactions as f64 / base as f64 * 100.0)
}

/// Rounds half away from zero to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_views_as_base_when_present() {
        assert!((engagement_rate(100, 10, 2, 1) - 13.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rounds_to_two_decimals() {
        // 7 / 3000 * 100 = 0.2333..
        assert!((engagement_rate(3000, 5, 1, 1) - 0.23).abs() < f64::EPSILON);
    }

    #[test]
    fn falls_back_to_likes_plus_comments_without_views() {
        // (40 + 10 + 0) / 50 * 100
        assert!((engagement_rate(0, 40, 10, 0) - 100.0).abs() < f64::EPSILON);
        // shares count in the numerator but not the fallback base
        assert!((engagement_rate(0, 40, 10, 5) - 110.0).abs() < f64::EPSILON);
    }

    #[test]
    fn all_zero_is_zero_not_nan() {
        let rate = engagement_rate(0, 0, 0, 0);
        assert!(rate.is_finite());
        assert!(rate.abs() < f64::EPSILON);
    }

    #[test]
    fn shares_only_without_views_uses_base_of_one() {
        assert!((engagement_rate(0, 0, 0, 3) - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn huge_counts_do_not_overflow() {
        let rate = engagement_rate(u64::MAX, u64::MAX, u64::MAX, u64::MAX);
        assert!(rate.is_finite());
        assert!(rate >= 0.0);
    }

    #[test]
    fn round2_maps_non_finite_to_zero() {
        assert!(round2(f64::NAN).abs() < f64::EPSILON);
        assert!(round2(f64::INFINITY).abs() < f64::EPSILON);
    }
}
