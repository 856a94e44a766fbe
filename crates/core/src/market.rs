//! Tweet markets and the in-memory registry that serializes trades on them.
//!
//! Each market sits behind its own mutex. A trade runs its whole
//! read-quote-write cycle inside [`MarketRegistry::transact`] while holding
//! that instrument's lock, so two trades racing on the same market cannot
//! lose an update. Trades on different markets never contend.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::amm::LiquidityPool;
use crate::error::{EngineError, Result};
use crate::virality::EngagementMetrics;

/// Descriptive fields of the tweet behind a market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TweetInfo {
    pub url: String,
    pub text: String,
    pub author_handle: String,
    pub author_name: String,
}

/// One tradable tweet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TweetMarket {
    pub id: String,
    pub tweet: TweetInfo,
    pub pool: LiquidityPool,
    /// Latest engagement snapshot.
    pub metrics: EngagementMetrics,
    /// Base currency traded over the last 24h.
    pub volume_24h: Decimal,
    pub price_change_24h: f64,
    pub holders: u32,
    pub created_at: DateTime<Utc>,
}

impl TweetMarket {
    /// Opens a market with no volume and no holders.
    #[must_use]
    pub fn initialize(
        id: impl Into<String>,
        tweet: TweetInfo,
        metrics: EngagementMetrics,
        pool: LiquidityPool,
    ) -> Self {
        Self {
            id: id.into(),
            tweet,
            pool,
            metrics,
            volume_24h: Decimal::ZERO,
            price_change_24h: 0.0,
            holders: 0,
            created_at: Utc::now(),
        }
    }

    /// # Errors
    /// See [`LiquidityPool::current_price`].
    pub fn current_price(&self) -> Result<Decimal> {
        self.pool.current_price()
    }
}

/// Shared registry of markets keyed by instrument id.
#[derive(Debug, Default)]
pub struct MarketRegistry {
    markets: RwLock<BTreeMap<String, Arc<Mutex<TweetMarket>>>>,
}

impl MarketRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a market.
    ///
    /// # Errors
    /// `DuplicateMarket` if the id is already registered.
    pub fn register(&self, market: TweetMarket) -> Result<()> {
        let mut markets = self.markets.write();
        if markets.contains_key(&market.id) {
            return Err(EngineError::DuplicateMarket(market.id));
        }
        info!(
            market = %market.id,
            author = %market.tweet.author_handle,
            reserve_tokens = %market.pool.reserve_instrument(),
            reserve_base = %market.pool.reserve_base(),
            "Registered market"
        );
        markets.insert(market.id.clone(), Arc::new(Mutex::new(market)));
        Ok(())
    }

    /// Registered ids in sorted order.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.markets.read().keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.markets.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markets.read().is_empty()
    }

    /// Copy of the market's current state.
    ///
    /// # Errors
    /// `UnknownMarket` if no such id is registered.
    pub fn snapshot(&self, id: &str) -> Result<TweetMarket> {
        Ok(self.entry(id)?.lock().clone())
    }

    /// Copies of every market, in id order.
    #[must_use]
    pub fn snapshots(&self) -> Vec<TweetMarket> {
        let entries: Vec<_> = self.markets.read().values().cloned().collect();
        entries.iter().map(|m| m.lock().clone()).collect()
    }

    /// Spot price of a market's token.
    ///
    /// # Errors
    /// `UnknownMarket`, or the pool's price error.
    pub fn current_price(&self, id: &str) -> Result<Decimal> {
        let pool = self.entry(id)?.lock().pool;
        pool.current_price()
    }

    /// Runs `f` against the market while holding its lock.
    ///
    /// `f` receives the current state and returns the next state together
    /// with a value for the caller. The next state is committed only if `f`
    /// returns `Ok`; on error the market is left exactly as it was.
    ///
    /// # Errors
    /// `UnknownMarket`, or whatever `f` returns.
    pub fn transact<T, F>(&self, id: &str, f: F) -> Result<T>
    where
        F: FnOnce(&TweetMarket) -> Result<(TweetMarket, T)>,
    {
        let entry = self.entry(id)?;
        let mut market = entry.lock();
        let (next, value) = f(&*market)?;
        *market = next;
        Ok(value)
    }

    fn entry(&self, id: &str) -> Result<Arc<Mutex<TweetMarket>>> {
        self.markets
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownMarket(id.to_string()))
    }
}
