//! Synthetic price paths for charting.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Prices never walk below this.
pub const PRICE_FLOOR: Decimal = dec!(0.0001);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub volume: Decimal,
}

/// Random walk over the last 24 hours ending just before now.
///
/// Each step moves the price by `(u - 0.48) * volatility` with `u` uniform in
/// `[0, 1)`, a slight upward bias. Volume per point is 100-1100.
pub fn generate_price_history<R: Rng>(
    initial_price: Decimal,
    volatility: f64,
    points: usize,
    rng: &mut R,
) -> Vec<PricePoint> {
    if points == 0 {
        return Vec::new();
    }

    let now = Utc::now();
    let interval = Duration::milliseconds(24 * 60 * 60 * 1000 / points as i64);
    let mut price = initial_price;

    (0..points)
        .map(|i| {
            let change = (rng.gen::<f64>() - 0.48) * volatility;
            let factor = Decimal::ONE + Decimal::from_f64_retain(change).unwrap_or_default();
            price = (price * factor).round_dp(12).max(PRICE_FLOOR);

            PricePoint {
                timestamp: now - interval * (points - i) as i32,
                price,
                volume: Decimal::new(rng.gen_range(10_000..110_000), 2),
            }
        })
        .collect()
}
