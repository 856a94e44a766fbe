use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::amm::{BondingCurve, LiquidityPool, DEFAULT_FEE_RATE, DEFAULT_TOTAL_SUPPLY};
use crate::error::Result;
use crate::position::DEFAULT_DUST_THRESHOLD;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DexConfig {
    pub engine: EngineConfig,
    pub market: MarketConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fraction of each trade kept as fee (0.003 = 0.3%).
    pub fee_rate: Decimal,
    /// Fixed supply used for market cap.
    pub total_supply: Decimal,
    /// Positions at or below this balance are pruned.
    pub dust_threshold: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    pub initial_reserve_tokens: Decimal,
    pub initial_reserve_base: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub starting_balance: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fee_rate: DEFAULT_FEE_RATE,
            total_supply: DEFAULT_TOTAL_SUPPLY,
            dust_threshold: DEFAULT_DUST_THRESHOLD,
        }
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            initial_reserve_tokens: dec!(1000000),
            initial_reserve_base: dec!(1000),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            starting_balance: dec!(10000),
        }
    }
}

impl EngineConfig {
    /// Builds the bonding curve for the configured fee.
    ///
    /// # Errors
    /// `InvalidAmount` if the fee rate is outside `[0, 1)`.
    pub fn curve(&self) -> Result<BondingCurve> {
        BondingCurve::new(self.fee_rate)
    }
}

impl MarketConfig {
    /// Virtual liquidity every new market starts with.
    ///
    /// # Errors
    /// `InvalidReserves` if either configured reserve is not positive.
    pub fn initial_pool(&self) -> Result<LiquidityPool> {
        LiquidityPool::new(self.initial_reserve_tokens, self.initial_reserve_base)
    }
}
