//! Synthetic candle generation
//!
//! Stands in for the live provider when no API key is configured or a live
//! fetch fails. A Gaussian random walk around a fixed base price; unseeded,
//! so repeated calls agree only in distribution.

use super::types::Candle;
use chrono::{Duration, Utc};
use rand::distributions::Distribution;
use rand::Rng;
use statrs::distribution::Normal;

/// Fixed quote reported while in synthetic mode.
pub const SYNTHETIC_QUOTE: f64 = 150.25;

/// Base price the random walk starts from.
const BASE_PRICE: f64 = 150.0;

/// Generate `count` daily candles ending today, timestamps strictly
/// increasing one day apart. Walk values are clipped to stay positive;
/// open/high/low are jittered independently, so no high >= close >= low
/// relationship is guaranteed.
pub fn candle_series(count: usize) -> Vec<Candle> {
    let mut rng = rand::thread_rng();
    let step = Normal::new(0.0, 2.0).expect("valid normal parameters");
    let jitter = Normal::new(0.0, 0.5).expect("valid normal parameters");
    let shadow = Normal::new(0.0, 1.0).expect("valid normal parameters");

    let end = Utc::now();
    let mut price = BASE_PRICE;

    (0..count)
        .map(|i| {
            price = (price + step.sample(&mut rng)).max(1.0);
            let timestamp = end - Duration::days((count - 1 - i) as i64);

            Candle {
                timestamp,
                open: price + jitter.sample(&mut rng),
                high: price + shadow.sample(&mut rng).abs(),
                low: price - shadow.sample(&mut rng).abs(),
                close: price,
                volume: rng.gen_range(100_000..5_000_000) as f64,
            }
        })
        .collect()
}
