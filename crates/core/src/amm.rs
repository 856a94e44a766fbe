//! Constant-product bonding curve for tweet markets.
//!
//! Every instrument is backed by a virtual liquidity pool holding instrument
//! tokens and base currency. Prices follow `x * y = k`:
//!
//! ```text
//! buy:  tokens_out = (x * net_in) / (y + net_in)      net_in  = base_in * (1 - f)
//! sell: base_out   = (y * tokens_in) / (x + tokens_in) net_out = base_out * (1 - f)
//! ```
//!
//! The fee is charged on the input of a buy and on the output of a sell, the
//! same placement a Uniswap V2 style pool uses. The pool only ever receives
//! `net_in` and only ever pays out the gross `base_out`, so `k` is conserved
//! by every trade up to decimal rounding.
//!
//! All functions are pure: executing a trade returns a new [`LiquidityPool`]
//! and leaves the input untouched. Committing the new pool is the caller's job.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{checked, EngineError, Result};

/// Default trading fee (0.3%).
pub const DEFAULT_FEE_RATE: Decimal = dec!(0.003);

/// Fixed token supply used for market capitalisation.
pub const DEFAULT_TOTAL_SUPPLY: Decimal = dec!(1000000);

const HUNDRED: Decimal = dec!(100);

/// AMM state for a single instrument.
///
/// Reserves are strictly positive and `invariant_product` always equals
/// `reserve_instrument * reserve_base` for the current reserves. Fields are
/// private so the product can never go stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PoolReserves")]
pub struct LiquidityPool {
    reserve_instrument: Decimal,
    reserve_base: Decimal,
    invariant_product: Decimal,
}

/// Serialized form of a pool; the product is recomputed on load.
#[derive(Debug, Clone, Copy, Deserialize)]
struct PoolReserves {
    reserve_instrument: Decimal,
    reserve_base: Decimal,
}

impl TryFrom<PoolReserves> for LiquidityPool {
    type Error = EngineError;

    fn try_from(raw: PoolReserves) -> Result<Self> {
        Self::new(raw.reserve_instrument, raw.reserve_base)
    }
}

impl LiquidityPool {
    /// Creates a pool from its two reserves.
    ///
    /// # Errors
    /// `InvalidReserves` if either reserve is not strictly positive,
    /// `ArithmeticOverflow` if their product is not representable.
    pub fn new(reserve_instrument: Decimal, reserve_base: Decimal) -> Result<Self> {
        if reserve_instrument <= Decimal::ZERO || reserve_base <= Decimal::ZERO {
            return Err(EngineError::InvalidReserves {
                reserve_instrument,
                reserve_base,
            });
        }
        let invariant_product = checked::mul(reserve_instrument, reserve_base, "invariant product")?;
        Ok(Self {
            reserve_instrument,
            reserve_base,
            invariant_product,
        })
    }

    /// Instrument tokens held by the pool.
    #[must_use]
    pub const fn reserve_instrument(&self) -> Decimal {
        self.reserve_instrument
    }

    /// Base currency held by the pool.
    #[must_use]
    pub const fn reserve_base(&self) -> Decimal {
        self.reserve_base
    }

    /// `reserve_instrument * reserve_base` for the current reserves.
    #[must_use]
    pub const fn invariant_product(&self) -> Decimal {
        self.invariant_product
    }

    /// Spot price of one token in base currency.
    ///
    /// # Errors
    /// `DivisionByZero` if the instrument reserve is zero. A pool built through
    /// [`LiquidityPool::new`] cannot reach that state, but the check stays.
    pub fn current_price(&self) -> Result<Decimal> {
        checked::div(self.reserve_base, self.reserve_instrument, "current price")
    }

    /// Market capitalisation at the current spot price.
    ///
    /// # Errors
    /// Propagates [`LiquidityPool::current_price`] errors and overflow.
    pub fn market_cap(&self, total_supply: Decimal) -> Result<Decimal> {
        checked::mul(self.current_price()?, total_supply, "market cap")
    }
}

/// Preview of a trade against a pool. Not stored anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeQuote {
    /// Tokens received for a buy, net base received for a sell.
    pub output_amount: Decimal,
    /// Percentage move of the spot price caused by the trade.
    pub price_impact_pct: Decimal,
    /// Percentage gap between the pre-trade spot price and the realized price.
    pub slippage_pct: Decimal,
    /// Spot price implied by the post-trade reserves.
    pub new_price: Decimal,
    /// Fee charged, in base currency.
    pub fee: Decimal,
}

/// Constant-product curve with a fixed fee rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondingCurve {
    fee_rate: Decimal,
}

impl Default for BondingCurve {
    fn default() -> Self {
        Self {
            fee_rate: DEFAULT_FEE_RATE,
        }
    }
}

impl BondingCurve {
    /// Creates a curve charging `fee_rate` (e.g. `0.003` for 0.3%).
    ///
    /// # Errors
    /// `InvalidAmount` if the rate is negative or not below one.
    pub fn new(fee_rate: Decimal) -> Result<Self> {
        if fee_rate < Decimal::ZERO || fee_rate >= Decimal::ONE {
            return Err(EngineError::InvalidAmount(fee_rate));
        }
        Ok(Self { fee_rate })
    }

    #[must_use]
    pub const fn fee_rate(&self) -> Decimal {
        self.fee_rate
    }

    /// Quotes spending `base_amount_in` on tokens.
    ///
    /// # Errors
    /// `InvalidAmount` for non-positive input, `PoolDrained` if the output
    /// would reach the whole token reserve, arithmetic errors otherwise.
    pub fn quote_buy(&self, pool: &LiquidityPool, base_amount_in: Decimal) -> Result<TradeQuote> {
        self.buy_transition(pool, base_amount_in).map(|(quote, _)| quote)
    }

    /// Quotes selling `token_amount_in` tokens for base currency.
    ///
    /// # Errors
    /// `InvalidAmount` for non-positive input, `PoolDrained` if the gross output
    /// would reach the whole base reserve, arithmetic errors otherwise.
    pub fn quote_sell(&self, pool: &LiquidityPool, token_amount_in: Decimal) -> Result<TradeQuote> {
        self.sell_transition(pool, token_amount_in).map(|(quote, _)| quote)
    }

    /// Executes a buy, returning the quote and the next pool state.
    ///
    /// # Errors
    /// Same as [`BondingCurve::quote_buy`].
    pub fn execute_buy(
        &self,
        pool: &LiquidityPool,
        base_amount_in: Decimal,
    ) -> Result<(TradeQuote, LiquidityPool)> {
        let (quote, next) = self.buy_transition(pool, base_amount_in)?;
        debug!(
            base_in = %base_amount_in,
            tokens_out = %quote.output_amount,
            fee = %quote.fee,
            new_price = %quote.new_price,
            "Executed buy against pool"
        );
        Ok((quote, next))
    }

    /// Executes a sell, returning the quote and the next pool state.
    ///
    /// # Errors
    /// Same as [`BondingCurve::quote_sell`].
    pub fn execute_sell(
        &self,
        pool: &LiquidityPool,
        token_amount_in: Decimal,
    ) -> Result<(TradeQuote, LiquidityPool)> {
        let (quote, next) = self.sell_transition(pool, token_amount_in)?;
        debug!(
            tokens_in = %token_amount_in,
            base_out = %quote.output_amount,
            fee = %quote.fee,
            new_price = %quote.new_price,
            "Executed sell against pool"
        );
        Ok((quote, next))
    }

    fn buy_transition(
        &self,
        pool: &LiquidityPool,
        base_amount_in: Decimal,
    ) -> Result<(TradeQuote, LiquidityPool)> {
        if base_amount_in <= Decimal::ZERO {
            return Err(EngineError::InvalidAmount(base_amount_in));
        }

        // Fee comes off the input
        let fee = checked::mul(base_amount_in, self.fee_rate, "buy fee")?;
        let net_in = checked::sub(base_amount_in, fee, "buy net input")?;

        let numerator = checked::mul(pool.reserve_instrument, net_in, "buy numerator")?;
        let denominator = checked::add(pool.reserve_base, net_in, "buy denominator")?;
        let tokens_out = checked::div(numerator, denominator, "buy output")?;

        if tokens_out >= pool.reserve_instrument {
            return Err(EngineError::PoolDrained {
                output: tokens_out,
                reserve: pool.reserve_instrument,
            });
        }

        let next = LiquidityPool::new(
            checked::sub(pool.reserve_instrument, tokens_out, "buy token reserve")?,
            checked::add(pool.reserve_base, net_in, "buy base reserve")?,
        )?;

        let old_price = pool.current_price()?;
        let new_price = next.current_price()?;
        let realized_price = checked::div(base_amount_in, tokens_out, "buy realized price")?;

        let quote = TradeQuote {
            output_amount: tokens_out,
            price_impact_pct: pct_of(checked::sub(new_price, old_price, "buy impact")?, old_price)?,
            slippage_pct: pct_of(checked::sub(realized_price, old_price, "buy slippage")?, old_price)?,
            new_price,
            fee,
        };
        Ok((quote, next))
    }

    fn sell_transition(
        &self,
        pool: &LiquidityPool,
        token_amount_in: Decimal,
    ) -> Result<(TradeQuote, LiquidityPool)> {
        if token_amount_in <= Decimal::ZERO {
            return Err(EngineError::InvalidAmount(token_amount_in));
        }

        let numerator = checked::mul(pool.reserve_base, token_amount_in, "sell numerator")?;
        let denominator = checked::add(pool.reserve_instrument, token_amount_in, "sell denominator")?;
        let base_out = checked::div(numerator, denominator, "sell output")?;

        if base_out >= pool.reserve_base {
            return Err(EngineError::PoolDrained {
                output: base_out,
                reserve: pool.reserve_base,
            });
        }

        // Fee comes off the output
        let fee = checked::mul(base_out, self.fee_rate, "sell fee")?;
        let net_out = checked::sub(base_out, fee, "sell net output")?;

        let next = LiquidityPool::new(
            checked::add(pool.reserve_instrument, token_amount_in, "sell token reserve")?,
            checked::sub(pool.reserve_base, base_out, "sell base reserve")?,
        )?;

        let old_price = pool.current_price()?;
        let new_price = next.current_price()?;
        let realized_price = checked::div(net_out, token_amount_in, "sell realized price")?;

        // Sell-side impact and slippage are reported as positive magnitudes
        let quote = TradeQuote {
            output_amount: net_out,
            price_impact_pct: pct_of(checked::sub(old_price, new_price, "sell impact")?, old_price)?,
            slippage_pct: pct_of(checked::sub(old_price, realized_price, "sell slippage")?, old_price)?,
            new_price,
            fee,
        };
        Ok((quote, next))
    }
}

/// `diff` as a percentage of the pre-trade `reference` price.
fn pct_of(diff: Decimal, reference: Decimal) -> Result<Decimal> {
    let ratio = checked::div(diff, reference, "percentage")?;
    checked::mul(ratio, HUNDRED, "percentage")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_pool() -> LiquidityPool {
        LiquidityPool::new(dec!(1000000), dec!(1000)).unwrap()
    }

    fn assert_close(actual: Decimal, expected: Decimal, tol: Decimal) {
        assert!(
            (actual - expected).abs() < tol,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn new_pool_computes_invariant() {
        let pool = default_pool();
        assert_eq!(pool.invariant_product(), dec!(1000000000));
        assert_eq!(pool.current_price().unwrap(), dec!(0.001));
    }

    #[test]
    fn new_pool_rejects_non_positive_reserves() {
        assert!(matches!(
            LiquidityPool::new(Decimal::ZERO, dec!(1000)),
            Err(EngineError::InvalidReserves { .. })
        ));
        assert!(matches!(
            LiquidityPool::new(dec!(1000), dec!(-1)),
            Err(EngineError::InvalidReserves { .. })
        ));
    }

    #[test]
    fn market_cap_uses_spot_price() {
        let pool = default_pool();
        assert_eq!(pool.market_cap(DEFAULT_TOTAL_SUPPLY).unwrap(), dec!(1000));
    }

    #[test]
    fn quote_buy_reference_scenario() {
        let curve = BondingCurve::default();
        let pool = default_pool();
        let quote = curve.quote_buy(&pool, dec!(100)).unwrap();

        assert_eq!(quote.fee, dec!(0.3));
        // 1_000_000 * 99.7 / 1099.7
        assert_close(quote.output_amount, dec!(90661.0893880149), dec!(0.0000001));
        assert!(quote.new_price > dec!(0.001));
        assert_close(quote.new_price, dec!(0.00120934009), dec!(0.0000000001));
        assert_close(quote.price_impact_pct, dec!(20.934009), dec!(0.000001));
        assert_close(quote.slippage_pct, dec!(10.3009027081), dec!(0.000001));
    }

    #[test]
    fn buy_fee_plus_net_equals_input() {
        let curve = BondingCurve::default();
        let pool = default_pool();
        for amount in [dec!(0.01), dec!(1), dec!(37.5), dec!(100), dec!(5000)] {
            let quote = curve.quote_buy(&pool, amount).unwrap();
            let (_, next) = curve.execute_buy(&pool, amount).unwrap();
            let net_in = next.reserve_base() - pool.reserve_base();
            assert_eq!(quote.fee + net_in, amount);
        }
    }

    #[test]
    fn quote_buy_rejects_non_positive() {
        let curve = BondingCurve::default();
        let pool = default_pool();
        assert_eq!(
            curve.quote_buy(&pool, Decimal::ZERO),
            Err(EngineError::InvalidAmount(Decimal::ZERO))
        );
        assert_eq!(
            curve.quote_buy(&pool, dec!(-5)),
            Err(EngineError::InvalidAmount(dec!(-5)))
        );
    }

    #[test]
    fn quote_sell_rejects_non_positive() {
        let curve = BondingCurve::default();
        let pool = default_pool();
        assert_eq!(
            curve.quote_sell(&pool, Decimal::ZERO),
            Err(EngineError::InvalidAmount(Decimal::ZERO))
        );
    }

    #[test]
    fn quote_sell_applies_fee_to_output() {
        let curve = BondingCurve::default();
        let pool = default_pool();
        let quote = curve.quote_sell(&pool, dec!(50000)).unwrap();

        // gross = 1000 * 50000 / 1050000
        let gross = dec!(1000) * dec!(50000) / dec!(1050000);
        assert_eq!(quote.fee, gross * dec!(0.003));
        assert_eq!(quote.output_amount, gross - quote.fee);
        assert_close(quote.output_amount, dec!(47.4761904761904762), dec!(0.0000000001));
        // 952.380952... / 1_050_000
        assert_close(quote.new_price, dec!(0.000907029478458), dec!(0.000000000001));
        assert_close(quote.price_impact_pct, dec!(9.297052154195), dec!(0.000001));
        // net / 50_000 = 0.000949523809523...
        assert_close(quote.slippage_pct, dec!(5.047619047619), dec!(0.000001));
    }

    #[test]
    fn execute_buy_moves_reserves_and_leaves_input_untouched() {
        let curve = BondingCurve::default();
        let pool = default_pool();
        let before = pool;
        let (quote, next) = curve.execute_buy(&pool, dec!(100)).unwrap();

        assert_eq!(pool, before);
        assert!(next.reserve_instrument() < pool.reserve_instrument());
        assert!(next.reserve_base() > pool.reserve_base());
        assert_eq!(
            next.reserve_instrument(),
            pool.reserve_instrument() - quote.output_amount
        );
        assert_eq!(next.reserve_base(), dec!(1099.7));
        assert_eq!(
            next.invariant_product(),
            next.reserve_instrument() * next.reserve_base()
        );
        assert_eq!(next.current_price().unwrap(), quote.new_price);
    }

    #[test]
    fn execute_sell_moves_reserves_the_other_way() {
        let curve = BondingCurve::default();
        let pool = default_pool();
        let (quote, next) = curve.execute_sell(&pool, dec!(50000)).unwrap();

        assert_eq!(next.reserve_instrument(), dec!(1050000));
        assert!(next.reserve_base() < pool.reserve_base());
        // Pool pays out the gross amount; the fee is withheld from the seller
        let paid_out = pool.reserve_base() - next.reserve_base();
        assert_close(paid_out, quote.output_amount + quote.fee, dec!(0.000000000001));
        assert_eq!(
            next.invariant_product(),
            next.reserve_instrument() * next.reserve_base()
        );
    }

    #[test]
    fn huge_buy_never_drains_pool() {
        let curve = BondingCurve::default();
        let pool = default_pool();
        let (quote, next) = curve.execute_buy(&pool, dec!(1000000000000)).unwrap();
        assert!(quote.output_amount < pool.reserve_instrument());
        assert!(next.reserve_instrument() > Decimal::ZERO);
    }

    #[test]
    fn fee_rate_must_be_below_one() {
        assert!(BondingCurve::new(dec!(0)).is_ok());
        assert!(BondingCurve::new(dec!(0.01)).is_ok());
        assert!(BondingCurve::new(dec!(1)).is_err());
        assert!(BondingCurve::new(dec!(-0.1)).is_err());
    }

    #[test]
    fn zero_fee_buy_has_no_fee() {
        let curve = BondingCurve::new(Decimal::ZERO).unwrap();
        let quote = curve.quote_buy(&default_pool(), dec!(10)).unwrap();
        assert_eq!(quote.fee, Decimal::ZERO);
    }

    #[test]
    fn pool_deserialization_recomputes_product() {
        let json = r#"{"reserve_instrument":"2000","reserve_base":"3","invariant_product":"1"}"#;
        let pool: LiquidityPool = serde_json::from_str(json).unwrap();
        assert_eq!(pool.invariant_product(), dec!(6000));
    }

    #[test]
    fn pool_deserialization_rejects_empty_reserve() {
        let json = r#"{"reserve_instrument":"0","reserve_base":"3"}"#;
        assert!(serde_json::from_str::<LiquidityPool>(json).is_err());
    }
}
