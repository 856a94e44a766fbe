//! Markets CLI command.
//!
//! Lists the seeded trending markets with spot price, market cap and a
//! virality read taken after one step of simulated engagement growth.
//! `--history` adds a synthetic 24h price path per market.

use anyhow::Result;
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;

use dex_core::{
    analyze_virality, predict_virality_probability, DexConfig, Trend, TweetMarket,
};
use dex_sim::{
    generate_price_history, rng_from_seed, simulate_metrics_growth, trending_markets, PricePoint,
};

/// Arguments for the markets command.
#[derive(Args, Debug, Clone)]
pub struct MarketsArgs {
    /// RNG seed for reproducible mock data
    #[arg(long)]
    pub seed: Option<u64>,

    /// Tweet age in hours used for the virality prediction
    #[arg(long, default_value = "1.0")]
    pub age_hours: f64,

    /// Number of synthetic 24h price points to generate per market
    #[arg(long)]
    pub history: Option<usize>,

    /// Per-step volatility of the synthetic price path
    #[arg(long, default_value = "0.08")]
    pub volatility: f64,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Serialize)]
struct MarketRow {
    id: String,
    author: String,
    price: Decimal,
    market_cap: Decimal,
    volume_24h: Decimal,
    holders: u32,
    engagement: f64,
    momentum_pct: f64,
    trend: Trend,
    multiplier: f64,
    viral_probability: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    history: Vec<PricePoint>,
}

/// Low, high and percent change over a price path.
fn history_range(history: &[PricePoint]) -> Option<(Decimal, Decimal, Decimal)> {
    let first = history.first()?.price;
    let last = history.last()?.price;
    let low = history.iter().map(|p| p.price).min()?;
    let high = history.iter().map(|p| p.price).max()?;
    let change_pct = (last - first) / first * Decimal::ONE_HUNDRED;
    Some((low, high, change_pct))
}

fn market_row(
    market: &TweetMarket,
    next_metrics: &dex_core::EngagementMetrics,
    config: &DexConfig,
    age_hours: f64,
) -> Result<MarketRow> {
    let virality = analyze_virality(next_metrics, &[market.metrics]);
    Ok(MarketRow {
        id: market.id.clone(),
        author: market.tweet.author_handle.clone(),
        price: market.current_price()?,
        market_cap: market.pool.market_cap(config.engine.total_supply)?,
        volume_24h: market.volume_24h,
        holders: market.holders,
        engagement: virality.score,
        momentum_pct: virality.momentum_pct,
        trend: virality.trend,
        multiplier: virality.multiplier,
        viral_probability: predict_virality_probability(next_metrics, age_hours),
        history: Vec::new(),
    })
}

/// Runs the markets command.
///
/// # Errors
/// Returns an error if the configured reserves are invalid.
pub fn run_markets(args: MarketsArgs, config: &DexConfig) -> Result<()> {
    let mut rng = rng_from_seed(args.seed);
    let markets = trending_markets(&config.market, &mut rng)?;

    let rows = markets
        .iter()
        .map(|market| {
            let next = simulate_metrics_growth(&market.metrics, &mut rng);
            let mut row = market_row(market, &next, config, args.age_hours)?;
            if let Some(points) = args.history {
                row.history = generate_price_history(row.price, args.volatility, points, &mut rng);
            }
            Ok(row)
        })
        .collect::<Result<Vec<_>>>()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!(
        "{:<9} {:<16} {:>10} {:>10} {:>11} {:>8} {:>10} {:>8} {:>6}",
        "ID", "AUTHOR", "PRICE", "MCAP", "VOL 24H", "HOLDERS", "MOMENTUM", "TREND", "P(V)"
    );
    println!("{}", "-".repeat(96));
    for row in &rows {
        println!(
            "{:<9} {:<16} {:>10} {:>10} {:>11} {:>8} {:>9.2}% {:>8} {:>6.2}",
            row.id,
            row.author,
            row.price.round_dp(6),
            row.market_cap.round_dp(2),
            row.volume_24h.round_dp(2),
            row.holders,
            row.momentum_pct,
            row.trend,
            row.viral_probability,
        );
    }

    if args.history.is_some() {
        println!();
        println!("{:<9} {:>12} {:>12} {:>10}", "ID", "24H LOW", "24H HIGH", "24H CHG");
        for row in &rows {
            if let Some((low, high, change_pct)) = history_range(&row.history) {
                println!(
                    "{:<9} {:>12} {:>12} {:>9}%",
                    row.id,
                    low.round_dp(8),
                    high.round_dp(8),
                    change_pct.round_dp(2),
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dex_core::EngagementMetrics;
    use rust_decimal_macros::dec;

    #[test]
    fn row_reflects_launch_pool_and_growth() {
        let config = DexConfig::default();
        let markets = trending_markets(&config.market, &mut rng_from_seed(Some(3))).unwrap();
        let market = &markets[0];
        let next = EngagementMetrics::new(
            market.metrics.likes * 2,
            market.metrics.retweets * 2,
            market.metrics.replies * 2,
            Utc::now(),
        );

        let row = market_row(market, &next, &config, 1.0).unwrap();
        assert_eq!(row.price, dec!(0.001));
        assert_eq!(row.market_cap, dec!(1000));
        assert!((row.momentum_pct - 100.0).abs() < 1e-9);
        assert_eq!(row.trend, Trend::Rising);
        assert!((row.multiplier - 2.0).abs() < 1e-9);
        assert_eq!(row.viral_probability, 0.9);
        assert!(row.history.is_empty());
    }

    #[test]
    fn history_range_spans_the_path() {
        let history = generate_price_history(dec!(0.001), 0.08, 50, &mut rng_from_seed(Some(5)));
        let (low, high, change_pct) = history_range(&history).unwrap();

        assert!(history.iter().all(|p| p.price >= low && p.price <= high));
        let expected = (history[49].price - history[0].price) / history[0].price * dec!(100);
        assert_eq!(change_pct, expected);
        assert!(history_range(&[]).is_none());
    }
}
