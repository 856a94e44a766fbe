//! Random trader that drives a [`TradingSession`] for demos and soak tests.

use dex_core::{EngineError, PortfolioStats, Result, TradingSession};
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraderConfig {
    /// Number of trade attempts.
    pub steps: usize,
    /// Largest single buy, in base currency.
    pub max_spend: Decimal,
    /// Chance of selling when a position is open.
    pub sell_probability: f64,
}

impl Default for TraderConfig {
    fn default() -> Self {
        Self {
            steps: 100,
            max_spend: dec!(250),
            sell_probability: 0.4,
        }
    }
}

/// What a run did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraderReport {
    pub buys: usize,
    pub sells: usize,
    /// Attempts refused by the session (e.g. out of cash).
    pub rejected: usize,
    pub cash: Decimal,
    pub realized_pnl: Decimal,
    pub stats: PortfolioStats,
}

pub struct RandomTrader {
    config: TraderConfig,
}

impl RandomTrader {
    #[must_use]
    pub const fn new(config: TraderConfig) -> Self {
        Self { config }
    }

    /// Trades randomly across `market_ids`.
    ///
    /// Buys spend between 1% and 100% of `max_spend`; sells dispose of
    /// between 10% and 100% of an open position. Rejections for funds or
    /// balance are counted and skipped.
    ///
    /// # Errors
    /// Any error other than a funds or balance rejection.
    pub fn run<R: Rng>(
        &self,
        session: &mut TradingSession,
        market_ids: &[String],
        rng: &mut R,
    ) -> Result<TraderReport> {
        let mut buys = 0;
        let mut sells = 0;
        let mut rejected = 0;

        for step in 0..self.config.steps {
            let Some(market_id) = market_ids.choose(rng) else {
                break;
            };
            let held = session.ledger().balance(market_id);
            let sell = held > Decimal::ZERO && rng.gen_bool(self.config.sell_probability);

            let result = if sell {
                let fraction = Decimal::new(rng.gen_range(10..=100), 2);
                let amount = if fraction == Decimal::ONE { held } else { held * fraction };
                session.sell(market_id, amount).map(|_| sells += 1)
            } else {
                let fraction = Decimal::new(rng.gen_range(1..=100), 2);
                session
                    .buy(market_id, self.config.max_spend * fraction)
                    .map(|_| buys += 1)
            };

            match result {
                Ok(()) => {}
                Err(EngineError::InsufficientFunds { .. } | EngineError::InsufficientBalance { .. }) => {
                    rejected += 1;
                    debug!(step, market = %market_id, "Trade attempt rejected");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(TraderReport {
            buys,
            sells,
            rejected,
            cash: session.cash(),
            realized_pnl: session.ledger().realized_pnl(),
            stats: session.portfolio_stats()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{rng_from_seed, trending_markets};
    use dex_core::{DexConfig, MarketRegistry};
    use std::sync::Arc;

    fn setup(seed: u64) -> (Arc<MarketRegistry>, Vec<String>) {
        let registry = MarketRegistry::new();
        let markets = trending_markets(&DexConfig::default().market, &mut rng_from_seed(Some(seed))).unwrap();
        for market in markets {
            registry.register(market).unwrap();
        }
        let ids = registry.ids();
        (Arc::new(registry), ids)
    }

    #[test]
    fn run_accounts_for_every_step() {
        let (registry, ids) = setup(5);
        let mut session = TradingSession::new(registry, "bot", &DexConfig::default()).unwrap();
        let trader = RandomTrader::new(TraderConfig::default());

        let report = trader.run(&mut session, &ids, &mut rng_from_seed(Some(5))).unwrap();

        assert_eq!(report.buys + report.sells + report.rejected, 100);
        assert_eq!(session.history().len(), report.buys + report.sells);
        assert!(report.cash >= Decimal::ZERO);
    }

    #[test]
    fn same_seed_same_outcome() {
        let run = |seed| {
            let (registry, ids) = setup(seed);
            let mut session = TradingSession::new(registry, "bot", &DexConfig::default()).unwrap();
            RandomTrader::new(TraderConfig::default())
                .run(&mut session, &ids, &mut rng_from_seed(Some(seed)))
                .unwrap()
        };
        let a = run(21);
        let b = run(21);
        assert_eq!(a.cash, b.cash);
        assert_eq!(a.stats.total_value, b.stats.total_value);
    }

    #[test]
    fn no_markets_no_trades() {
        let registry = Arc::new(MarketRegistry::new());
        let mut session = TradingSession::new(registry, "bot", &DexConfig::default()).unwrap();
        let report = RandomTrader::new(TraderConfig::default())
            .run(&mut session, &[], &mut rng_from_seed(Some(1)))
            .unwrap();
        assert_eq!(report.buys + report.sells, 0);
        assert_eq!(report.stats, PortfolioStats::default());
    }
}
