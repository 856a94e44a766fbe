//! Simulated engagement growth.

use chrono::Utc;
use dex_core::EngagementMetrics;
use rand::Rng;

/// Grows each count by a random fraction: likes up to 5%, retweets up to 8%,
/// replies up to 3%. Counts are floored and never shrink.
pub fn simulate_metrics_growth<R: Rng>(current: &EngagementMetrics, rng: &mut R) -> EngagementMetrics {
    let grow = |count: u64, max_pct: f64, rng: &mut R| -> u64 {
        (count as f64 * (1.0 + rng.gen::<f64>() * max_pct)).floor() as u64
    };

    EngagementMetrics {
        likes: grow(current.likes, 0.05, &mut *rng),
        retweets: grow(current.retweets, 0.08, &mut *rng),
        replies: grow(current.replies, 0.03, &mut *rng),
        timestamp: Utc::now(),
    }
}
