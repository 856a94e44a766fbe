//! Engagement-based momentum scoring for tweets.
//!
//! Converts raw engagement counts into a weighted score, a momentum
//! percentage between two snapshots, a trend label and a price multiplier.
//! Nothing here feeds the bonding curve directly; callers can consult the
//! multiplier when making their own market-making decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const LIKE_WEIGHT: f64 = 1.0;
pub const RETWEET_WEIGHT: f64 = 3.0;
pub const REPLY_WEIGHT: f64 = 2.0;

/// Momentum above this (in percent) is rising, below its negation falling.
pub const TREND_THRESHOLD_PCT: f64 = 5.0;

/// Engagement snapshot for a tweet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub likes: u64,
    pub retweets: u64,
    pub replies: u64,
    pub timestamp: DateTime<Utc>,
}

impl EngagementMetrics {
    #[must_use]
    pub const fn new(likes: u64, retweets: u64, replies: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            likes,
            retweets,
            replies,
            timestamp,
        }
    }
}

/// Direction of engagement momentum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Rising => write!(f, "rising"),
            Trend::Falling => write!(f, "falling"),
            Trend::Stable => write!(f, "stable"),
        }
    }
}

/// Derived virality figures for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViralityScore {
    pub score: f64,
    pub momentum_pct: f64,
    pub trend: Trend,
    pub multiplier: f64,
}

/// Weighted engagement: likes x1, retweets x3, replies x2.
#[must_use]
pub fn engagement_score(metrics: &EngagementMetrics) -> f64 {
    metrics.likes as f64 * LIKE_WEIGHT
        + metrics.retweets as f64 * RETWEET_WEIGHT
        + metrics.replies as f64 * REPLY_WEIGHT
}

/// Percentage growth of the engagement score from `previous` to `current`.
///
/// Returns 0 when the previous score is zero.
#[must_use]
pub fn momentum_pct(current: &EngagementMetrics, previous: &EngagementMetrics) -> f64 {
    let previous_score = engagement_score(previous);
    if previous_score == 0.0 {
        return 0.0;
    }
    (engagement_score(current) - previous_score) / previous_score * 100.0
}

#[must_use]
pub fn classify_trend(momentum_pct: f64) -> Trend {
    if momentum_pct > TREND_THRESHOLD_PCT {
        Trend::Rising
    } else if momentum_pct < -TREND_THRESHOLD_PCT {
        Trend::Falling
    } else {
        Trend::Stable
    }
}

/// `1 + max(0, momentum / 100)`. Negative momentum never discounts.
#[must_use]
pub fn virality_multiplier(momentum_pct: f64) -> f64 {
    1.0 + (momentum_pct / 100.0).max(0.0)
}

/// Scores `current` against the most recent entry of `history`.
///
/// With an empty history the momentum is 0, so the trend is stable and the
/// multiplier is 1.
#[must_use]
pub fn analyze_virality(current: &EngagementMetrics, history: &[EngagementMetrics]) -> ViralityScore {
    let momentum = history
        .last()
        .map_or(0.0, |previous| momentum_pct(current, previous));

    ViralityScore {
        score: engagement_score(current),
        momentum_pct: momentum,
        trend: classify_trend(momentum),
        multiplier: virality_multiplier(momentum),
    }
}

/// Rough probability that a tweet goes viral given its engagement so far.
///
/// Buckets the hourly engagement rate (age floored at one hour):
/// above 1000 -> 0.9, above 500 -> 0.7, above 100 -> 0.5, otherwise 0.2.
#[must_use]
pub fn predict_virality_probability(metrics: &EngagementMetrics, age_in_hours: f64) -> f64 {
    let rate = engagement_score(metrics) / age_in_hours.max(1.0);
    if rate > 1000.0 {
        0.9
    } else if rate > 500.0 {
        0.7
    } else if rate > 100.0 {
        0.5
    } else {
        0.2
    }
}
