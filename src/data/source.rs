//! Data source with synthetic fallback
//!
//! `DataSource` front-ends the Finnhub client: without a credential it runs
//! permanently in synthetic mode, and a failed live fetch is downgraded to
//! synthetic data for that call (once, no retry). The provider's explicit
//! `no_data` outcome is passed through as `None` so callers can surface it.

use super::finnhub::FinnhubClient;
use super::synthetic;
use super::types::{Candle, Resolution};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::{info, warn};

/// The seam the orchestrator consumes: candle history or an explicit
/// no-data outcome, plus a best-effort current price.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// `None` means the provider explicitly had no data for the symbol.
    async fn daily_candles(&self, symbol: &str, count: usize) -> Option<Vec<Candle>>;

    /// Latest trade price; `None` on lookup failure (caller must skip).
    async fn current_price(&self, symbol: &str) -> Option<f64>;
}

/// Live-or-synthetic candle source.
pub struct DataSource {
    live: Option<FinnhubClient>,
}

impl DataSource {
    /// Build from an explicit credential. Credential sourcing (environment,
    /// CLI flag, dashboard input) happens at the assembly point, never here.
    pub fn new(api_key: Option<String>) -> Self {
        let live = match api_key.filter(|k| !k.trim().is_empty()) {
            Some(key) => Some(FinnhubClient::new(key.trim().to_string())),
            None => {
                warn!("no API key configured, running in synthetic data mode");
                None
            }
        };
        Self { live }
    }

    pub fn is_synthetic(&self) -> bool {
        self.live.is_none()
    }
}

#[async_trait]
impl MarketData for DataSource {
    async fn daily_candles(&self, symbol: &str, count: usize) -> Option<Vec<Candle>> {
        let client = match &self.live {
            Some(client) => client,
            None => return Some(synthetic::candle_series(count)),
        };

        // The window over-fetches (2 calendar days per requested candle) so
        // weekends and holidays still leave `count` trading days.
        let to = Utc::now();
        let from = to - Duration::days(count as i64 * 2);

        match client.candles(symbol, Resolution::Day, from, to).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(symbol, cause = %e, "live fetch failed, falling back to synthetic data");
                Some(synthetic::candle_series(count))
            }
        }
    }

    async fn current_price(&self, symbol: &str) -> Option<f64> {
        let client = match &self.live {
            Some(client) => client,
            None => return Some(synthetic::SYNTHETIC_QUOTE),
        };

        match client.quote(symbol).await {
            Ok(quote) => {
                info!(symbol, price = quote.current, "fetched quote");
                Some(quote.current)
            }
            Err(e) => {
                warn!(symbol, cause = %e, "quote lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn synthetic_mode_without_credential() {
        let source = DataSource::new(None);
        assert!(source.is_synthetic());

        let candles = source.daily_candles("AAPL", 5).await.unwrap();
        assert_eq!(candles.len(), 5);
        for pair in candles.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
        }
        assert!(candles.iter().all(|c| c.close > 0.0));
    }

    #[tokio::test]
    async fn blank_credential_counts_as_absent() {
        let source = DataSource::new(Some("   ".to_string()));
        assert!(source.is_synthetic());
    }

    #[tokio::test]
    async fn synthetic_quote_is_fixed() {
        let source = DataSource::new(None);
        assert_eq!(source.current_price("AAPL").await, Some(150.25));
    }
}
