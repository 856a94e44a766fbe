//! Mock trending tweet markets.

use chrono::Utc;
use dex_core::{EngagementMetrics, MarketConfig, Result, TweetInfo, TweetMarket};
use rand::Rng;
use rust_decimal::Decimal;

/// Static description of a demo tweet.
#[derive(Debug, Clone, Copy)]
pub struct MockTweet {
    pub text: &'static str,
    pub author: &'static str,
    pub name: &'static str,
    pub likes: u64,
    pub retweets: u64,
    pub replies: u64,
}

pub const MOCK_TWEETS: [MockTweet; 5] = [
    MockTweet {
        text: "Just shipped the biggest update to our platform. This changes everything. 🚀",
        author: "sama",
        name: "Sam Altman",
        likes: 45000,
        retweets: 8500,
        replies: 2300,
    },
    MockTweet {
        text: "Breaking: New AI model just dropped. It's actually insane what it can do.",
        author: "elonmusk",
        name: "Elon Musk",
        likes: 230000,
        retweets: 52000,
        replies: 12000,
    },
    MockTweet {
        text: "Market prediction: We're going to see major moves in the next 24h. Screenshot this.",
        author: "APompliano",
        name: "Anthony Pompliano",
        likes: 12000,
        retweets: 3200,
        replies: 890,
    },
    MockTweet {
        text: "Unpopular opinion: Most people are sleeping on this opportunity right now.",
        author: "naval",
        name: "Naval",
        likes: 34000,
        retweets: 7800,
        replies: 1900,
    },
    MockTweet {
        text: "This is the most bullish thing I've seen all year. Let that sink in.",
        author: "VitalikButerin",
        name: "Vitalik Buterin",
        likes: 67000,
        retweets: 14500,
        replies: 3400,
    },
];

/// Builds one market per mock tweet, ids `tweet-0` .. `tweet-4`.
///
/// Pools start at the configured virtual liquidity. 24h volume (10k-60k),
/// 24h price change (-30%..+30%) and holder count (100-1099) are random.
///
/// # Errors
/// `InvalidReserves` if the configured initial reserves are not positive.
pub fn trending_markets<R: Rng>(config: &MarketConfig, rng: &mut R) -> Result<Vec<TweetMarket>> {
    let pool = config.initial_pool()?;

    Ok(MOCK_TWEETS
        .iter()
        .enumerate()
        .map(|(index, tweet)| {
            let metrics = EngagementMetrics::new(tweet.likes, tweet.retweets, tweet.replies, Utc::now());
            let mut market = TweetMarket::initialize(
                format!("tweet-{index}"),
                TweetInfo {
                    url: format!("https://twitter.com/{}/status/123456789{index}", tweet.author),
                    text: tweet.text.to_string(),
                    author_handle: tweet.author.to_string(),
                    author_name: tweet.name.to_string(),
                },
                metrics,
                pool,
            );

            // Cents, to keep volume exact
            market.volume_24h = Decimal::new(rng.gen_range(1_000_000..6_000_000), 2);
            market.price_change_24h = (rng.gen::<f64>() - 0.5) * 60.0;
            market.holders = rng.gen_range(100..1100);
            market
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng_from_seed;
    use rust_decimal_macros::dec;

    #[test]
    fn builds_five_markets_at_launch_price() {
        let mut rng = rng_from_seed(Some(7));
        let markets = trending_markets(&MarketConfig::default(), &mut rng).unwrap();

        assert_eq!(markets.len(), 5);
        for (i, market) in markets.iter().enumerate() {
            assert_eq!(market.id, format!("tweet-{i}"));
            assert_eq!(market.current_price().unwrap(), dec!(0.001));
            assert!(market.volume_24h >= dec!(10000) && market.volume_24h < dec!(60000));
            assert!(market.price_change_24h.abs() <= 30.0);
            assert!((100..1100).contains(&market.holders));
        }
        assert_eq!(markets[1].tweet.author_handle, "elonmusk");
        assert_eq!(markets[1].metrics.retweets, 52000);
    }

    #[test]
    fn same_seed_same_markets() {
        let a = trending_markets(&MarketConfig::default(), &mut rng_from_seed(Some(42))).unwrap();
        let b = trending_markets(&MarketConfig::default(), &mut rng_from_seed(Some(42))).unwrap();
        let volumes = |m: &[TweetMarket]| m.iter().map(|x| x.volume_24h).collect::<Vec<_>>();
        assert_eq!(volumes(&a), volumes(&b));
    }
}
