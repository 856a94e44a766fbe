//! Error types for the pricing engine, portfolio ledger and trading session.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors returned by engine operations.
///
/// Every failure is reported synchronously to the immediate caller. Nothing is
/// retried internally and no partially updated pool or position is ever
/// returned alongside an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Trade or position amount was zero or negative.
    #[error("invalid amount: {0} (must be positive)")]
    InvalidAmount(Decimal),

    /// Pool reserves must both be strictly positive.
    #[error("invalid reserves: instrument={reserve_instrument}, base={reserve_base}")]
    InvalidReserves {
        reserve_instrument: Decimal,
        reserve_base: Decimal,
    },

    /// Attempted to sell more tokens than the position holds.
    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        requested: Decimal,
        available: Decimal,
    },

    /// Attempted to spend more settlement currency than the session holds.
    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        requested: Decimal,
        available: Decimal,
    },

    /// Degenerate denominator (empty reserve or zero balance).
    #[error("division by zero in {0}")]
    DivisionByZero(&'static str),

    /// A checked decimal operation left the representable range.
    #[error("arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),

    /// The trade would take the whole reserve out of the pool.
    #[error("trade would drain pool: output {output} >= reserve {reserve}")]
    PoolDrained { output: Decimal, reserve: Decimal },

    /// No market is registered under this instrument id.
    #[error("unknown market: {0}")]
    UnknownMarket(String),

    /// A market with this instrument id is already registered.
    #[error("market already registered: {0}")]
    DuplicateMarket(String),
}

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Checked decimal helpers that map `None` onto [`EngineError`].
pub(crate) mod checked {
    use super::{EngineError, Result};
    use rust_decimal::Decimal;

    pub fn add(a: Decimal, b: Decimal, ctx: &'static str) -> Result<Decimal> {
        a.checked_add(b).ok_or(EngineError::ArithmeticOverflow(ctx))
    }

    pub fn sub(a: Decimal, b: Decimal, ctx: &'static str) -> Result<Decimal> {
        a.checked_sub(b).ok_or(EngineError::ArithmeticOverflow(ctx))
    }

    pub fn mul(a: Decimal, b: Decimal, ctx: &'static str) -> Result<Decimal> {
        a.checked_mul(b).ok_or(EngineError::ArithmeticOverflow(ctx))
    }

    pub fn div(a: Decimal, b: Decimal, ctx: &'static str) -> Result<Decimal> {
        if b.is_zero() {
            return Err(EngineError::DivisionByZero(ctx));
        }
        a.checked_div(b).ok_or(EngineError::ArithmeticOverflow(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn div_by_zero_is_reported_not_overflow() {
        let err = checked::div(dec!(1), Decimal::ZERO, "test").unwrap_err();
        assert_eq!(err, EngineError::DivisionByZero("test"));
    }

    #[test]
    fn mul_overflow_is_reported() {
        let err = checked::mul(Decimal::MAX, dec!(2), "test").unwrap_err();
        assert_eq!(err, EngineError::ArithmeticOverflow("test"));
    }

    #[test]
    fn display_includes_amounts() {
        let err = EngineError::InsufficientBalance {
            requested: dec!(10),
            available: dec!(4.5),
        };
        assert_eq!(
            err.to_string(),
            "insufficient balance: requested 10, available 4.5"
        );
    }
}
