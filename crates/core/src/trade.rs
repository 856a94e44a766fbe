//! Executed trade records and an append-only history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{checked, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "BUY"),
            TradeSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Immutable record of an executed trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub instrument_id: String,
    pub side: TradeSide,
    /// Tokens bought or sold.
    pub token_amount: Decimal,
    /// Base spent on a buy (gross), base received on a sell (net of fee).
    pub base_amount: Decimal,
    /// Realized average price, `base_amount / token_amount`.
    pub execution_price: Decimal,
    pub timestamp: DateTime<Utc>,
    pub slippage_pct: Decimal,
}

impl Trade {
    /// Builds a trade record stamped with a fresh id and the current time.
    ///
    /// # Errors
    /// `DivisionByZero` if `token_amount` is zero.
    pub fn new(
        instrument_id: impl Into<String>,
        side: TradeSide,
        token_amount: Decimal,
        base_amount: Decimal,
        slippage_pct: Decimal,
    ) -> Result<Self> {
        let execution_price = checked::div(base_amount, token_amount, "execution price")?;
        Ok(Self {
            id: Uuid::new_v4(),
            instrument_id: instrument_id.into(),
            side,
            token_amount,
            base_amount,
            execution_price,
            timestamp: Utc::now(),
            slippage_pct,
        })
    }
}

/// Append-only trade log. Records are never mutated or removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradeHistory {
    trades: Vec<Trade>,
}

impl TradeHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.trades.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// Trades in execution order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Trade> {
        self.trades.iter()
    }

    /// Most recent trades first.
    pub fn recent(&self) -> impl Iterator<Item = &Trade> {
        self.trades.iter().rev()
    }

    pub fn for_instrument<'a>(&'a self, instrument_id: &'a str) -> impl Iterator<Item = &'a Trade> {
        self.trades
            .iter()
            .filter(move |t| t.instrument_id == instrument_id)
    }

    /// Sum of `base_amount` over every trade.
    ///
    /// # Errors
    /// `ArithmeticOverflow` if the sum does not fit.
    pub fn total_volume(&self) -> Result<Decimal> {
        self.trades
            .iter()
            .try_fold(Decimal::ZERO, |sum, t| checked::add(sum, t.base_amount, "total volume"))
    }
}
