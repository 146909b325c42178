use trendwatch_core::{EngagementCounters, Platform};

/// Platform-specific engagement score.
///
/// Twitter weighs a retweet as two likes; every other platform sums score
/// and comment count. Counters are floored at zero first, so the result is
/// never negative and never decreases when a counter grows.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn engagement_score(platform: &Platform, counters: &EngagementCounters) -> f64 {
    let floor = |n: i64| n.max(0) as f64;
    match platform {
        Platform::Twitter => floor(counters.likes) + 2.0 * floor(counters.retweets),
        Platform::Reddit | Platform::Other(_) => {
            floor(counters.score) + floor(counters.num_comments)
        }
    }
}
