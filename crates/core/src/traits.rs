use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::error::{EngineError, Result};
use crate::market::MarketRegistry;

/// Anything that can quote a current price per instrument id.
pub trait PriceSource {
    /// # Errors
    /// `UnknownMarket` if the source has no price for `instrument_id`, or
    /// whatever error the source hit while computing it.
    fn price_of(&self, instrument_id: &str) -> Result<Decimal>;
}

impl PriceSource for MarketRegistry {
    fn price_of(&self, instrument_id: &str) -> Result<Decimal> {
        self.current_price(instrument_id)
    }
}

impl PriceSource for HashMap<String, Decimal> {
    fn price_of(&self, instrument_id: &str) -> Result<Decimal> {
        self.get(instrument_id)
            .copied()
            .ok_or_else(|| EngineError::UnknownMarket(instrument_id.to_string()))
    }
}
