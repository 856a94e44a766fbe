//! Test-data generation for tweet markets.
//!
//! Nothing here is part of the pricing engine. It produces mock markets,
//! simulated engagement growth, synthetic price paths and random traders for
//! demos and tests. Every generator takes an optional seed so runs can be
//! reproduced.

pub mod markets;
pub mod metrics;
pub mod price_history;
pub mod trader;

pub use markets::{trending_markets, MockTweet, MOCK_TWEETS};
pub use metrics::simulate_metrics_growth;
pub use price_history::{generate_price_history, PricePoint};
pub use trader::{RandomTrader, TraderConfig, TraderReport};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Seeded RNG, or one from entropy when no seed is given.
#[must_use]
pub fn rng_from_seed(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}
