//! A single user's trading session over a shared market registry.
//!
//! The session is the caller that owns state: its cash balance, its
//! [`Ledger`] and its [`TradeHistory`]. Pool state lives in the shared
//! [`MarketRegistry`]; every trade runs under that market's lock so sessions
//! on different threads can trade the same market safely.
//!
//! A trade is validated completely before anything is committed. The new
//! position, cash balance and trade record are all computed under the market
//! lock; the pool is written back only once every one of them succeeded, and
//! the session then stores them without any further fallible step.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::amm::{BondingCurve, TradeQuote};
use crate::config::DexConfig;
use crate::error::{checked, EngineError, Result};
use crate::ledger::Ledger;
use crate::market::{MarketRegistry, TweetMarket};
use crate::position::PortfolioStats;
use crate::trade::{Trade, TradeHistory, TradeSide};

pub struct TradingSession {
    registry: Arc<MarketRegistry>,
    curve: BondingCurve,
    ledger: Ledger,
    history: TradeHistory,
    cash: Decimal,
}

impl TradingSession {
    /// Opens a session for `owner` using the configured fee, dust threshold
    /// and starting balance.
    ///
    /// # Errors
    /// `InvalidAmount` if the configured fee rate is invalid.
    pub fn new(registry: Arc<MarketRegistry>, owner: impl Into<String>, config: &DexConfig) -> Result<Self> {
        Ok(Self::with_parts(
            registry,
            config.engine.curve()?,
            Ledger::with_dust_threshold(owner, config.engine.dust_threshold),
            config.session.starting_balance,
        ))
    }

    #[must_use]
    pub fn with_parts(
        registry: Arc<MarketRegistry>,
        curve: BondingCurve,
        ledger: Ledger,
        starting_balance: Decimal,
    ) -> Self {
        Self {
            registry,
            curve,
            ledger,
            history: TradeHistory::new(),
            cash: starting_balance,
        }
    }

    /// Settlement currency available to spend.
    #[must_use]
    pub const fn cash(&self) -> Decimal {
        self.cash
    }

    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    #[must_use]
    pub const fn history(&self) -> &TradeHistory {
        &self.history
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<MarketRegistry> {
        &self.registry
    }

    /// Quotes a buy against the market's current pool without trading.
    ///
    /// The quote is a snapshot; the pool may move before a later [`buy`].
    ///
    /// [`buy`]: TradingSession::buy
    ///
    /// # Errors
    /// `UnknownMarket` or any curve error.
    pub fn preview_buy(&self, market_id: &str, base_amount_in: Decimal) -> Result<TradeQuote> {
        let pool = self.registry.snapshot(market_id)?.pool;
        self.curve.quote_buy(&pool, base_amount_in)
    }

    /// Quotes a sell against the market's current pool without trading.
    ///
    /// # Errors
    /// `InsufficientBalance` if the position is smaller than `token_amount_in`,
    /// otherwise as [`TradingSession::preview_buy`].
    pub fn preview_sell(&self, market_id: &str, token_amount_in: Decimal) -> Result<TradeQuote> {
        self.check_holdings(market_id, token_amount_in)?;
        let pool = self.registry.snapshot(market_id)?.pool;
        self.curve.quote_sell(&pool, token_amount_in)
    }

    /// Spends `base_amount_in` on tokens of `market_id`.
    ///
    /// # Errors
    /// `InsufficientFunds` if the amount exceeds cash, `UnknownMarket`, or any
    /// curve or ledger error. Nothing changes on error.
    pub fn buy(&mut self, market_id: &str, base_amount_in: Decimal) -> Result<Trade> {
        if base_amount_in > self.cash {
            warn!(
                market = market_id,
                requested = %base_amount_in,
                cash = %self.cash,
                "Rejected buy: insufficient funds"
            );
            return Err(EngineError::InsufficientFunds {
                requested: base_amount_in,
                available: self.cash,
            });
        }

        let curve = self.curve;
        let ledger = &self.ledger;
        let cash = self.cash;
        let (quote, position, cash_after, trade) = self.registry.transact(market_id, |market| {
            let (quote, pool) = curve.execute_buy(&market.pool, base_amount_in)?;
            let execution_price = checked::div(base_amount_in, quote.output_amount, "execution price")?;
            // Everything fallible runs before the pool is committed
            let position =
                ledger.preview_buy(market_id, quote.output_amount, base_amount_in, execution_price)?;
            let cash_after = checked::sub(cash, base_amount_in, "cash")?;
            let trade = Trade::new(
                market_id,
                TradeSide::Buy,
                quote.output_amount,
                base_amount_in,
                quote.slippage_pct,
            )?;

            let holders = if ledger.position(market_id).is_none() {
                market.holders.saturating_add(1)
            } else {
                market.holders
            };
            let next = TweetMarket {
                pool,
                volume_24h: checked::add(market.volume_24h, base_amount_in, "volume")?,
                holders,
                ..market.clone()
            };
            Ok((next, (quote, position, cash_after, trade)))
        })?;

        self.ledger.commit_buy(position);
        self.cash = cash_after;
        info!(
            market = market_id,
            base_in = %base_amount_in,
            tokens_out = %quote.output_amount,
            price = %trade.execution_price,
            slippage_pct = %quote.slippage_pct.round_dp(4),
            "Buy executed"
        );
        self.history.record(trade.clone());
        Ok(trade)
    }

    /// Sells `token_amount_in` tokens of `market_id`.
    ///
    /// The position is pruned once what remains is dust.
    ///
    /// # Errors
    /// `InsufficientBalance` if the position is too small, `UnknownMarket`, or
    /// any curve error. Nothing changes on error.
    pub fn sell(&mut self, market_id: &str, token_amount_in: Decimal) -> Result<Trade> {
        if let Err(e) = self.check_holdings(market_id, token_amount_in) {
            warn!(
                market = market_id,
                requested = %token_amount_in,
                error = %e,
                "Rejected sell"
            );
            return Err(e);
        }

        let curve = self.curve;
        let ledger = &self.ledger;
        let cash = self.cash;
        let (quote, staged, cash_after, trade) = self.registry.transact(market_id, |market| {
            let (quote, pool) = curve.execute_sell(&market.pool, token_amount_in)?;
            let staged = ledger.stage_sell(market_id, token_amount_in, quote.output_amount)?;
            let cash_after = checked::add(cash, quote.output_amount, "cash")?;
            let trade = Trade::new(
                market_id,
                TradeSide::Sell,
                token_amount_in,
                quote.output_amount,
                quote.slippage_pct,
            )?;

            let holders = if staged.closes_position() {
                market.holders.saturating_sub(1)
            } else {
                market.holders
            };
            let next = TweetMarket {
                pool,
                volume_24h: checked::add(market.volume_24h, quote.output_amount, "volume")?,
                holders,
                ..market.clone()
            };
            Ok((next, (quote, staged, cash_after, trade)))
        })?;

        let outcome = self.ledger.commit_sell(staged);
        self.cash = cash_after;
        info!(
            market = market_id,
            tokens_in = %token_amount_in,
            base_out = %quote.output_amount,
            realized_pnl = %outcome.realized_pnl,
            closed = outcome.position.is_none(),
            "Sell executed"
        );
        self.history.record(trade.clone());
        Ok(trade)
    }

    /// Marks every open position to its market's current price and aggregates.
    ///
    /// # Errors
    /// `UnknownMarket` or the pool's price error for any held market, or
    /// arithmetic overflow.
    pub fn portfolio_stats(&self) -> Result<PortfolioStats> {
        self.ledger.stats(self.registry.as_ref())
    }

    fn check_holdings(&self, market_id: &str, token_amount_in: Decimal) -> Result<()> {
        if token_amount_in <= Decimal::ZERO {
            return Err(EngineError::InvalidAmount(token_amount_in));
        }
        let available = self.ledger.balance(market_id);
        if token_amount_in > available {
            return Err(EngineError::InsufficientBalance {
                requested: token_amount_in,
                available,
            });
        }
        Ok(())
    }
}
