//! Quote CLI command.
//!
//! Previews a trade against a pool without executing anything.

use anyhow::Result;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;

use dex_core::{BondingCurve, DexConfig, LiquidityPool, TradeQuote};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QuoteSide {
    /// Spend base currency on tokens
    Buy,
    /// Sell tokens for base currency
    Sell,
}

/// Arguments for the quote command.
#[derive(Args, Debug, Clone)]
pub struct QuoteArgs {
    /// Trade direction
    #[arg(long, value_enum)]
    pub side: QuoteSide,

    /// Base currency to spend (buy) or tokens to sell (sell)
    #[arg(long)]
    pub amount: Decimal,

    /// Token reserve of the pool (defaults to the configured launch reserve)
    #[arg(long)]
    pub reserve_tokens: Option<Decimal>,

    /// Base reserve of the pool (defaults to the configured launch reserve)
    #[arg(long)]
    pub reserve_base: Option<Decimal>,
}

fn quote(args: &QuoteArgs, config: &DexConfig) -> Result<(LiquidityPool, TradeQuote)> {
    let pool = LiquidityPool::new(
        args.reserve_tokens.unwrap_or(config.market.initial_reserve_tokens),
        args.reserve_base.unwrap_or(config.market.initial_reserve_base),
    )?;
    let curve: BondingCurve = config.engine.curve()?;
    let quote = match args.side {
        QuoteSide::Buy => curve.quote_buy(&pool, args.amount)?,
        QuoteSide::Sell => curve.quote_sell(&pool, args.amount)?,
    };
    Ok((pool, quote))
}

/// Runs the quote command.
///
/// # Errors
/// Returns an error for invalid reserves, fee rate or amount.
pub fn run_quote(args: QuoteArgs, config: &DexConfig) -> Result<()> {
    let (pool, q) = quote(&args, config)?;
    let (input_unit, output_unit) = match args.side {
        QuoteSide::Buy => ("base", "tokens"),
        QuoteSide::Sell => ("tokens", "base"),
    };

    println!();
    println!("Pool:          {} tokens / {} base", pool.reserve_instrument(), pool.reserve_base());
    println!("Spot price:    {}", pool.current_price()?.round_dp(8));
    println!("Fee rate:      {}%", config.engine.fee_rate * Decimal::ONE_HUNDRED);
    println!("---------------------------------------------");
    println!("Input:         {} {}", args.amount, input_unit);
    println!("Output:        {} {}", q.output_amount.round_dp(6), output_unit);
    println!("Fee:           {} base", q.fee.round_dp(6));
    println!("New price:     {}", q.new_price.round_dp(8));
    println!("Price impact:  {}%", q.price_impact_pct.round_dp(4));
    println!("Slippage:      {}%", q.slippage_pct.round_dp(4));
    println!();

    Ok(())
}
