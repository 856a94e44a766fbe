//! Per-user ledger of open positions.
//!
//! The ledger exclusively owns every position of one user. Callers get shared
//! references or marked copies, never a mutable handle to an individual
//! position; all changes go through [`Ledger::apply_buy`] and
//! [`Ledger::apply_sell`], which compute the new position with the pure
//! functions in [`crate::position`] before replacing the stored one.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{checked, EngineError, Result};
use crate::position::{
    aggregate_portfolio, mark_to_market, open_or_increase_position, reduce_position,
    PortfolioStats, Position, PositionReduction, DEFAULT_DUST_THRESHOLD,
};
use crate::traits::PriceSource;

/// Result of applying a sell to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellOutcome {
    /// Position after the sale, `None` if it was pruned as dust.
    pub position: Option<Position>,
    pub cost_removed: Decimal,
    pub realized_pnl: Decimal,
}

/// A sell that passed validation but has not been applied yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedSell {
    reduction: PositionReduction,
    realized_total: Decimal,
    closes: bool,
}

impl StagedSell {
    /// True when applying the sell prunes the position as dust.
    #[must_use]
    pub const fn closes_position(&self) -> bool {
        self.closes
    }
}

/// All positions of a single user, in the order they were first opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    owner: String,
    positions: Vec<Position>,
    dust_threshold: Decimal,
    realized_pnl: Decimal,
}

impl Ledger {
    #[must_use]
    pub fn new(owner: impl Into<String>) -> Self {
        Self::with_dust_threshold(owner, DEFAULT_DUST_THRESHOLD)
    }

    #[must_use]
    pub fn with_dust_threshold(owner: impl Into<String>, dust_threshold: Decimal) -> Self {
        Self {
            owner: owner.into(),
            positions: Vec::new(),
            dust_threshold,
            realized_pnl: Decimal::ZERO,
        }
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub const fn dust_threshold(&self) -> Decimal {
        self.dust_threshold
    }

    /// Realized P&L accumulated over every sell applied to this ledger.
    #[must_use]
    pub const fn realized_pnl(&self) -> Decimal {
        self.realized_pnl
    }

    #[must_use]
    pub fn position(&self, instrument_id: &str) -> Option<&Position> {
        self.positions.iter().find(|p| p.instrument_id == instrument_id)
    }

    #[must_use]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Token balance held in `instrument_id`, zero if no position is open.
    #[must_use]
    pub fn balance(&self, instrument_id: &str) -> Decimal {
        self.position(instrument_id)
            .map_or(Decimal::ZERO, |p| p.token_balance)
    }

    /// Computes the position that a buy would produce without storing it.
    ///
    /// # Errors
    /// See [`open_or_increase_position`].
    pub fn preview_buy(
        &self,
        instrument_id: &str,
        tokens_acquired: Decimal,
        base_cost: Decimal,
        execution_price: Decimal,
    ) -> Result<Position> {
        open_or_increase_position(
            instrument_id,
            self.position(instrument_id),
            tokens_acquired,
            base_cost,
            execution_price,
        )
    }

    /// Computes the reduction a sell would produce without storing it.
    ///
    /// # Errors
    /// `InsufficientBalance` if no position is open or it is too small.
    pub fn preview_sell(
        &self,
        instrument_id: &str,
        tokens_sold: Decimal,
        base_received: Decimal,
    ) -> Result<PositionReduction> {
        let position = self
            .position(instrument_id)
            .ok_or(EngineError::InsufficientBalance {
                requested: tokens_sold,
                available: Decimal::ZERO,
            })?;
        reduce_position(position, tokens_sold, base_received)
    }

    /// Records a buy and returns the updated position.
    ///
    /// # Errors
    /// See [`open_or_increase_position`]. The ledger is unchanged on error.
    pub fn apply_buy(
        &mut self,
        instrument_id: &str,
        tokens_acquired: Decimal,
        base_cost: Decimal,
        execution_price: Decimal,
    ) -> Result<&Position> {
        let next = self.preview_buy(instrument_id, tokens_acquired, base_cost, execution_price)?;
        Ok(self.commit_buy(next))
    }

    /// Stores a position produced by [`Ledger::preview_buy`].
    pub(crate) fn commit_buy(&mut self, next: Position) -> &Position {
        debug!(
            owner = %self.owner,
            instrument = %next.instrument_id,
            balance = %next.token_balance,
            average_cost = %next.average_cost,
            "Position increased"
        );
        self.store(next)
    }

    /// Validates a sell including the running realized P&L, without storing
    /// anything.
    ///
    /// # Errors
    /// See [`Ledger::preview_sell`], or overflow of the accumulated P&L.
    pub fn stage_sell(
        &self,
        instrument_id: &str,
        tokens_sold: Decimal,
        base_received: Decimal,
    ) -> Result<StagedSell> {
        let reduction = self.preview_sell(instrument_id, tokens_sold, base_received)?;
        let realized_total = checked::add(self.realized_pnl, reduction.realized_pnl, "realized pnl")?;
        let closes = reduction.position.is_dust(self.dust_threshold);
        Ok(StagedSell {
            reduction,
            realized_total,
            closes,
        })
    }

    /// Records a sell, pruning the position once it falls to dust.
    ///
    /// # Errors
    /// See [`Ledger::stage_sell`]. The ledger is unchanged on error.
    pub fn apply_sell(
        &mut self,
        instrument_id: &str,
        tokens_sold: Decimal,
        base_received: Decimal,
    ) -> Result<SellOutcome> {
        let staged = self.stage_sell(instrument_id, tokens_sold, base_received)?;
        Ok(self.commit_sell(staged))
    }

    /// Applies a sell validated by [`Ledger::stage_sell`].
    pub(crate) fn commit_sell(&mut self, staged: StagedSell) -> SellOutcome {
        let StagedSell {
            reduction,
            realized_total,
            closes,
        } = staged;
        self.realized_pnl = realized_total;
        let instrument_id = reduction.position.instrument_id.clone();

        let position = if closes {
            self.positions.retain(|p| p.instrument_id != instrument_id);
            debug!(
                owner = %self.owner,
                instrument = %instrument_id,
                remaining = %reduction.position.token_balance,
                "Position closed"
            );
            None
        } else {
            debug!(
                owner = %self.owner,
                instrument = %instrument_id,
                balance = %reduction.position.token_balance,
                "Position reduced"
            );
            Some(self.store(reduction.position).clone())
        };

        SellOutcome {
            position,
            cost_removed: reduction.cost_removed,
            realized_pnl: reduction.realized_pnl,
        }
    }

    /// Marks every position at the price quoted by `prices`.
    ///
    /// # Errors
    /// The first error `prices` returns, typically `UnknownMarket` for a
    /// position it cannot price, or arithmetic overflow.
    pub fn mark_all<P: PriceSource + ?Sized>(&self, prices: &P) -> Result<Vec<Position>> {
        self.positions
            .iter()
            .map(|p| mark_to_market(p, prices.price_of(&p.instrument_id)?))
            .collect()
    }

    /// Marks all positions and aggregates them.
    ///
    /// # Errors
    /// See [`Ledger::mark_all`].
    pub fn stats<P: PriceSource + ?Sized>(&self, prices: &P) -> Result<PortfolioStats> {
        aggregate_portfolio(&self.mark_all(prices)?)
    }

    fn store(&mut self, position: Position) -> &Position {
        let index = match self
            .positions
            .iter()
            .position(|p| p.instrument_id == position.instrument_id)
        {
            Some(index) => {
                self.positions[index] = position;
                index
            }
            None => {
                self.positions.push(position);
                self.positions.len() - 1
            }
        };
        &self.positions[index]
    }
}
