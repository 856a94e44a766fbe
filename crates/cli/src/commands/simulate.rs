//! Simulate CLI command.
//!
//! Registers the mock trending markets in one shared registry and lets
//! several random traders hit them at the same time, each on its own
//! blocking task with its own session. Reports each trader's outcome and how
//! far every pool's `x * y` drifted from launch.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Args;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use dex_core::{DexConfig, MarketRegistry, TradingSession};
use dex_sim::{rng_from_seed, trending_markets, RandomTrader, TraderConfig, TraderReport};

/// Arguments for the simulate command.
#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Number of concurrent traders
    #[arg(long, default_value = "4")]
    pub traders: usize,

    /// Trade attempts per trader
    #[arg(long, default_value = "200")]
    pub steps: usize,

    /// Largest single buy in base currency
    #[arg(long, default_value = "250")]
    pub max_spend: Decimal,

    /// Probability of selling when holding a position
    #[arg(long, default_value = "0.4")]
    pub sell_probability: f64,

    /// RNG seed; trader n uses seed + n
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct PoolDrift {
    id: String,
    price: Decimal,
    volume_24h: Decimal,
    holders: u32,
    relative_drift: Decimal,
}

#[derive(Debug, Serialize)]
struct SimulationSummary {
    traders: Vec<TraderReport>,
    pools: Vec<PoolDrift>,
}

async fn simulate(args: &SimulateArgs, config: &DexConfig) -> Result<SimulationSummary> {
    let registry = Arc::new(MarketRegistry::new());
    for market in trending_markets(&config.market, &mut rng_from_seed(args.seed))? {
        registry.register(market)?;
    }
    let ids = registry.ids();
    let launch_k = config.market.initial_pool()?.invariant_product();

    let trader_config = TraderConfig {
        steps: args.steps,
        max_spend: args.max_spend,
        sell_probability: args.sell_probability.clamp(0.0, 1.0),
    };

    info!(traders = args.traders, steps = args.steps, markets = ids.len(), "Starting simulation");

    let mut handles = Vec::with_capacity(args.traders);
    for n in 0..args.traders {
        let registry = Arc::clone(&registry);
        let ids = ids.clone();
        let config = config.clone();
        let trader = RandomTrader::new(trader_config.clone());
        let seed = args.seed.map(|s| s.wrapping_add(n as u64 + 1));

        handles.push(tokio::task::spawn_blocking(move || {
            let mut session = TradingSession::new(registry, format!("trader-{n}"), &config)?;
            trader.run(&mut session, &ids, &mut rng_from_seed(seed))
        }));
    }

    let mut traders = Vec::with_capacity(handles.len());
    for handle in handles {
        let report = handle
            .await
            .map_err(|e| anyhow!("Trader task failed: {}", e))??;
        traders.push(report);
    }

    let pools = registry
        .snapshots()
        .into_iter()
        .map(|market| {
            let k = market.pool.invariant_product();
            Ok(PoolDrift {
                price: market.current_price()?,
                relative_drift: ((k - launch_k) / launch_k).abs(),
                id: market.id,
                volume_24h: market.volume_24h,
                holders: market.holders,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SimulationSummary { traders, pools })
}

/// Runs the simulate command.
///
/// # Errors
/// Returns an error if configuration is invalid or a trader hits an
/// unexpected engine error.
pub async fn run_simulate(args: SimulateArgs, config: &DexConfig) -> Result<()> {
    let summary = simulate(&args, config).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!();
    println!("===============================================================");
    println!("                    SIMULATION RESULTS                         ");
    println!("===============================================================");
    println!(
        "{:<10} {:>6} {:>6} {:>9} {:>12} {:>12} {:>12}",
        "TRADER", "BUYS", "SELLS", "REJECTED", "CASH", "VALUE", "REALIZED"
    );
    println!("{}", "-".repeat(72));
    for (n, report) in summary.traders.iter().enumerate() {
        println!(
            "{:<10} {:>6} {:>6} {:>9} {:>12} {:>12} {:>12}",
            format!("trader-{n}"),
            report.buys,
            report.sells,
            report.rejected,
            report.cash.round_dp(2),
            report.stats.total_value.round_dp(2),
            report.realized_pnl.round_dp(2),
        );
    }

    println!();
    println!("{:<9} {:>12} {:>12} {:>8} {:>14}", "MARKET", "PRICE", "VOLUME", "HOLDERS", "K DRIFT");
    println!("{}", "-".repeat(59));
    for pool in &summary.pools {
        println!(
            "{:<9} {:>12} {:>12} {:>8} {:>14.2e}",
            pool.id,
            pool.price.round_dp(8),
            pool.volume_24h.round_dp(2),
            pool.holders,
            pool.relative_drift.to_f64().unwrap_or(f64::NAN),
        );
    }
    println!();

    Ok(())
}
