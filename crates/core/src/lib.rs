pub mod amm;
pub mod config;
pub mod config_loader;
pub mod error;
pub mod ledger;
pub mod market;
pub mod position;
pub mod session;
pub mod trade;
pub mod traits;
pub mod virality;

pub use amm::{BondingCurve, LiquidityPool, TradeQuote, DEFAULT_FEE_RATE, DEFAULT_TOTAL_SUPPLY};
pub use config::{DexConfig, EngineConfig, MarketConfig, SessionConfig};
pub use config_loader::ConfigLoader;
pub use error::{EngineError, Result};
pub use ledger::{Ledger, SellOutcome, StagedSell};
pub use market::{MarketRegistry, TweetInfo, TweetMarket};
pub use position::{
    aggregate_portfolio, mark_to_market, open_or_increase_position, reduce_position,
    PortfolioStats, Position, PositionReduction, DEFAULT_DUST_THRESHOLD,
};
pub use session::TradingSession;
pub use trade::{Trade, TradeHistory, TradeSide};
pub use traits::PriceSource;
pub use virality::{
    analyze_virality, classify_trend, engagement_score, momentum_pct,
    predict_virality_probability, virality_multiplier, EngagementMetrics, Trend, ViralityScore,
};
