//! Cost-basis accounting for a single holding.
//!
//! Every function here is pure: it takes a position by reference and returns a
//! new one. Average cost is volume weighted, and selling removes cost basis in
//! proportion to the share of the balance sold, so
//! `total_invested == token_balance * average_cost` holds throughout.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{checked, EngineError, Result};

/// Balances at or below this are dust and get pruned by the ledger.
pub const DEFAULT_DUST_THRESHOLD: Decimal = dec!(0.0001);

const HUNDRED: Decimal = dec!(100);

/// A user's holding in one instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub instrument_id: String,
    pub token_balance: Decimal,
    /// Cost-basis price per token.
    pub average_cost: Decimal,
    /// Cumulative cost basis in base currency.
    pub total_invested: Decimal,
    /// Derived by [`mark_to_market`]. Equal to `total_invested` right after a
    /// trade, until the position is marked again.
    pub current_value: Decimal,
    /// Derived by [`mark_to_market`]. Zero right after a trade.
    pub unrealized_pnl: Decimal,
    /// Derived by [`mark_to_market`]. Zero right after a trade.
    pub unrealized_pnl_pct: Decimal,
}

/// Outcome of selling part of a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionReduction {
    pub position: Position,
    /// Cost basis taken off the books by this sale.
    pub cost_removed: Decimal,
    /// `base_received - cost_removed`.
    pub realized_pnl: Decimal,
}

impl Position {
    /// True when the remaining balance is at or below `threshold`.
    #[must_use]
    pub fn is_dust(&self, threshold: Decimal) -> bool {
        self.token_balance <= threshold
    }

    /// Resets the derived valuation to the cost basis. Values marked against
    /// an older balance must not outlive a trade.
    fn at_cost(self) -> Self {
        Self {
            current_value: self.total_invested,
            unrealized_pnl: Decimal::ZERO,
            unrealized_pnl_pct: Decimal::ZERO,
            ..self
        }
    }
}

/// Opens a position or blends a new purchase into an existing one.
///
/// A new position takes `execution_price` as its average cost. An existing
/// one gets a volume-weighted average regardless of the new trade's price.
///
/// # Errors
/// `InvalidAmount` if `tokens_acquired` or `base_cost` is not positive.
pub fn open_or_increase_position(
    instrument_id: &str,
    existing: Option<&Position>,
    tokens_acquired: Decimal,
    base_cost: Decimal,
    execution_price: Decimal,
) -> Result<Position> {
    if tokens_acquired <= Decimal::ZERO {
        return Err(EngineError::InvalidAmount(tokens_acquired));
    }
    if base_cost <= Decimal::ZERO {
        return Err(EngineError::InvalidAmount(base_cost));
    }

    let Some(existing) = existing else {
        if execution_price <= Decimal::ZERO {
            return Err(EngineError::InvalidAmount(execution_price));
        }
        return Ok(Position {
            instrument_id: instrument_id.to_string(),
            token_balance: tokens_acquired,
            average_cost: execution_price,
            total_invested: base_cost,
            current_value: base_cost,
            unrealized_pnl: Decimal::ZERO,
            unrealized_pnl_pct: Decimal::ZERO,
        });
    };

    let total_invested = checked::add(existing.total_invested, base_cost, "total invested")?;
    let token_balance = checked::add(existing.token_balance, tokens_acquired, "token balance")?;
    let average_cost = checked::div(total_invested, token_balance, "average cost")?;

    Ok(Position {
        token_balance,
        average_cost,
        total_invested,
        ..existing.clone()
    }
    .at_cost())
}

/// Removes `tokens_sold` from a position, taking cost basis off pro rata.
///
/// The average cost is left unchanged.
///
/// # Errors
/// `InvalidAmount` if `tokens_sold` is not positive, `InsufficientBalance` if
/// it exceeds the balance.
pub fn reduce_position(
    position: &Position,
    tokens_sold: Decimal,
    base_received: Decimal,
) -> Result<PositionReduction> {
    if tokens_sold <= Decimal::ZERO {
        return Err(EngineError::InvalidAmount(tokens_sold));
    }
    if tokens_sold > position.token_balance {
        return Err(EngineError::InsufficientBalance {
            requested: tokens_sold,
            available: position.token_balance,
        });
    }

    let (token_balance, total_invested, cost_removed) = if tokens_sold == position.token_balance {
        (Decimal::ZERO, Decimal::ZERO, position.total_invested)
    } else {
        let sold_fraction = checked::div(tokens_sold, position.token_balance, "sold fraction")?;
        let cost_removed = checked::mul(position.total_invested, sold_fraction, "cost removed")?;
        (
            checked::sub(position.token_balance, tokens_sold, "token balance")?,
            checked::sub(position.total_invested, cost_removed, "total invested")?,
            cost_removed,
        )
    };

    Ok(PositionReduction {
        position: Position {
            token_balance,
            total_invested,
            ..position.clone()
        }
        .at_cost(),
        cost_removed,
        realized_pnl: checked::sub(base_received, cost_removed, "realized pnl")?,
    })
}

/// Values a position at `current_price`.
///
/// `unrealized_pnl_pct` is zero when nothing is invested.
///
/// # Errors
/// Arithmetic overflow only.
pub fn mark_to_market(position: &Position, current_price: Decimal) -> Result<Position> {
    let current_value = checked::mul(position.token_balance, current_price, "current value")?;
    let unrealized_pnl = checked::sub(current_value, position.total_invested, "unrealized pnl")?;
    let unrealized_pnl_pct = if position.total_invested.is_zero() {
        Decimal::ZERO
    } else {
        let ratio = checked::div(unrealized_pnl, position.total_invested, "unrealized pnl pct")?;
        checked::mul(ratio, HUNDRED, "unrealized pnl pct")?
    };

    Ok(Position {
        current_value,
        unrealized_pnl,
        unrealized_pnl_pct,
        ..position.clone()
    })
}

/// Aggregate view over a set of marked positions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortfolioStats {
    pub total_value: Decimal,
    pub total_invested: Decimal,
    pub total_pnl: Decimal,
    pub total_pnl_pct: Decimal,
    pub best_performer: Option<Position>,
    pub worst_performer: Option<Position>,
}

/// Sums already-marked positions and picks the best and worst performer by
/// `unrealized_pnl_pct`.
///
/// Ties keep input order: the best performer is the first of the top group,
/// the worst is the last of the bottom group.
///
/// # Errors
/// Arithmetic overflow only.
pub fn aggregate_portfolio(positions: &[Position]) -> Result<PortfolioStats> {
    if positions.is_empty() {
        return Ok(PortfolioStats::default());
    }

    let mut total_value = Decimal::ZERO;
    let mut total_invested = Decimal::ZERO;
    for position in positions {
        total_value = checked::add(total_value, position.current_value, "portfolio value")?;
        total_invested = checked::add(total_invested, position.total_invested, "portfolio invested")?;
    }
    let total_pnl = checked::sub(total_value, total_invested, "portfolio pnl")?;
    let total_pnl_pct = if total_invested > Decimal::ZERO {
        checked::mul(
            checked::div(total_pnl, total_invested, "portfolio pnl pct")?,
            HUNDRED,
            "portfolio pnl pct",
        )?
    } else {
        Decimal::ZERO
    };

    // Stable sort, descending
    let mut ranked: Vec<&Position> = positions.iter().collect();
    ranked.sort_by(|a, b| b.unrealized_pnl_pct.cmp(&a.unrealized_pnl_pct));

    Ok(PortfolioStats {
        total_value,
        total_invested,
        total_pnl,
        total_pnl_pct,
        best_performer: ranked.first().map(|p| (*p).clone()),
        worst_performer: ranked.last().map(|p| (*p).clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(tokens: Decimal, cost: Decimal) -> Position {
        open_or_increase_position("tweet-0", None, tokens, cost, cost / tokens).unwrap()
    }

    fn assert_cost_invariant(p: &Position) {
        let diff = (p.total_invested - p.token_balance * p.average_cost).abs();
        assert!(diff < dec!(0.0000000001), "invariant broken by {diff}: {p:?}");
    }

    #[test]
    fn first_buy_uses_execution_price() {
        let p = open_or_increase_position("tweet-0", None, dec!(1000), dec!(2), dec!(0.002)).unwrap();
        assert_eq!(p.instrument_id, "tweet-0");
        assert_eq!(p.token_balance, dec!(1000));
        assert_eq!(p.average_cost, dec!(0.002));
        assert_eq!(p.total_invested, dec!(2));
        assert_eq!(p.current_value, dec!(2));
        assert_cost_invariant(&p);
    }

    #[test]
    fn second_buy_blends_average_cost() {
        let first = open(dec!(100), dec!(100));
        let second =
            open_or_increase_position("tweet-0", Some(&first), dec!(100), dec!(300), dec!(3)).unwrap();

        assert_eq!(second.token_balance, dec!(200));
        assert_eq!(second.total_invested, dec!(400));
        assert_eq!(second.average_cost, dec!(2));
        assert_cost_invariant(&second);
    }

    #[test]
    fn average_cost_ignores_declared_execution_price_on_increase() {
        let first = open(dec!(10), dec!(10));
        let next =
            open_or_increase_position("tweet-0", Some(&first), dec!(10), dec!(10), dec!(999)).unwrap();
        assert_eq!(next.average_cost, dec!(1));
    }

    #[test]
    fn trades_reset_stale_valuation_to_cost() {
        let marked = mark_to_market(&open(dec!(100), dec!(10)), dec!(0.05)).unwrap();
        assert_eq!(marked.unrealized_pnl_pct, dec!(-50));

        let bought =
            open_or_increase_position("tweet-0", Some(&marked), dec!(100), dec!(30), dec!(0.3)).unwrap();
        assert_eq!(bought.current_value, dec!(40));
        assert_eq!(bought.unrealized_pnl, Decimal::ZERO);
        assert_eq!(bought.unrealized_pnl_pct, Decimal::ZERO);

        let marked = mark_to_market(&bought, dec!(1)).unwrap();
        let sold = reduce_position(&marked, dec!(50), dec!(50)).unwrap().position;
        assert_eq!(sold.current_value, sold.total_invested);
        assert_eq!(sold.unrealized_pnl, Decimal::ZERO);
        assert_eq!(sold.unrealized_pnl_pct, Decimal::ZERO);
    }

    #[test]
    fn many_buys_keep_cost_invariant() {
        let mut p = open(dec!(90661.0893880149), dec!(100));
        for i in 1..50 {
            let tokens = Decimal::from(1000 + i * 37);
            let cost = Decimal::from(i) * dec!(1.3);
            p = open_or_increase_position("tweet-0", Some(&p), tokens, cost, cost / tokens).unwrap();
            assert_cost_invariant(&p);
        }
    }

    #[test]
    fn open_rejects_non_positive_amounts() {
        assert!(matches!(
            open_or_increase_position("x", None, Decimal::ZERO, dec!(1), dec!(1)),
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(
            open_or_increase_position("x", None, dec!(1), dec!(-1), dec!(1)),
            Err(EngineError::InvalidAmount(_))
        ));
    }

    #[test]
    fn partial_sell_removes_cost_pro_rata() {
        let p = open(dec!(1000), dec!(50));
        let r = reduce_position(&p, dec!(250), dec!(20)).unwrap();

        assert_eq!(r.position.token_balance, dec!(750));
        assert_eq!(r.cost_removed, dec!(12.5));
        assert_eq!(r.position.total_invested, dec!(37.5));
        assert_eq!(r.realized_pnl, dec!(7.5));
        assert_eq!(r.position.average_cost, p.average_cost);
        assert_cost_invariant(&r.position);
    }

    #[test]
    fn full_sell_zeroes_position() {
        let p = open(dec!(333), dec!(10));
        let r = reduce_position(&p, dec!(333), dec!(9)).unwrap();
        assert_eq!(r.position.token_balance, Decimal::ZERO);
        assert_eq!(r.position.total_invested, Decimal::ZERO);
        assert_eq!(r.cost_removed, dec!(10));
        assert_eq!(r.realized_pnl, dec!(-1));
        assert!(r.position.is_dust(DEFAULT_DUST_THRESHOLD));
    }

    #[test]
    fn oversell_is_rejected() {
        let p = open(dec!(10), dec!(1));
        assert_eq!(
            reduce_position(&p, dec!(10.5), dec!(1)),
            Err(EngineError::InsufficientBalance {
                requested: dec!(10.5),
                available: dec!(10),
            })
        );
    }

    #[test]
    fn zero_sell_is_rejected() {
        let p = open(dec!(10), dec!(1));
        assert!(matches!(
            reduce_position(&p, Decimal::ZERO, dec!(1)),
            Err(EngineError::InvalidAmount(_))
        ));
    }

    #[test]
    fn mark_to_market_computes_pnl() {
        let p = open(dec!(1000), dec!(1));
        let marked = mark_to_market(&p, dec!(0.0015)).unwrap();
        assert_eq!(marked.current_value, dec!(1.5));
        assert_eq!(marked.unrealized_pnl, dec!(0.5));
        assert_eq!(marked.unrealized_pnl_pct, dec!(50));
    }

    #[test]
    fn mark_to_market_with_nothing_invested_has_zero_pct() {
        let p = open(dec!(10), dec!(1));
        let emptied = reduce_position(&p, dec!(10), dec!(1)).unwrap().position;
        let marked = mark_to_market(&emptied, dec!(5)).unwrap();
        assert_eq!(marked.unrealized_pnl_pct, Decimal::ZERO);
    }

    #[test]
    fn empty_portfolio_is_all_zero() {
        let stats = aggregate_portfolio(&[]).unwrap();
        assert_eq!(stats.total_value, Decimal::ZERO);
        assert_eq!(stats.total_invested, Decimal::ZERO);
        assert_eq!(stats.total_pnl, Decimal::ZERO);
        assert_eq!(stats.total_pnl_pct, Decimal::ZERO);
        assert!(stats.best_performer.is_none());
        assert!(stats.worst_performer.is_none());
    }

    #[test]
    fn aggregate_ranks_by_pnl_pct() {
        let a = mark_to_market(&open(dec!(100), dec!(100)), dec!(1.2)).unwrap(); // +20%
        let mut b = mark_to_market(&open(dec!(100), dec!(100)), dec!(0.5)).unwrap(); // -50%
        b.instrument_id = "tweet-1".into();
        let mut c = mark_to_market(&open(dec!(100), dec!(100)), dec!(3)).unwrap(); // +200%
        c.instrument_id = "tweet-2".into();

        let stats = aggregate_portfolio(&[a, b, c]).unwrap();
        assert_eq!(stats.total_invested, dec!(300));
        assert_eq!(stats.total_value, dec!(470));
        assert_eq!(stats.total_pnl, dec!(170));
        assert_eq!(stats.best_performer.unwrap().instrument_id, "tweet-2");
        assert_eq!(stats.worst_performer.unwrap().instrument_id, "tweet-1");
    }

    #[test]
    fn aggregate_ties_keep_insertion_order() {
        let mut positions = Vec::new();
        for id in ["first", "second", "third"] {
            let mut p = mark_to_market(&open(dec!(10), dec!(10)), dec!(1)).unwrap();
            p.instrument_id = id.into();
            positions.push(p);
        }
        let stats = aggregate_portfolio(&positions).unwrap();
        assert_eq!(stats.best_performer.unwrap().instrument_id, "first");
        assert_eq!(stats.worst_performer.unwrap().instrument_id, "third");
    }
}
