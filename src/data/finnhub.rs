//! Finnhub REST client for daily stock candles and quotes
//!
//! Uses the free `/stock/candle` and `/quote` endpoints. Candle responses
//! carry parallel arrays plus a status field; `s == "no_data"` is a valid
//! outcome, not an error.

use super::types::{Candle, Resolution};
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Finnhub API base URL
pub const BASE_URL: &str = "https://finnhub.io/api/v1";

/// Errors from the Finnhub API.
///
/// The variants stay distinguishable so the fallback path can log why a
/// live fetch was downgraded to synthetic data.
#[derive(Error, Debug)]
pub enum FinnhubError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API key rejected (401/403)")]
    Unauthorized,

    #[error("rate limit exceeded (429)")]
    RateLimited,

    #[error("API returned status {0}")]
    Status(StatusCode),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Candle response: parallel arrays keyed by single letters.
#[derive(Debug, Deserialize)]
struct CandleResponse {
    /// Status: "ok" or "no_data"
    s: String,
    #[serde(default)]
    t: Vec<i64>,
    #[serde(default)]
    o: Vec<f64>,
    #[serde(default)]
    h: Vec<f64>,
    #[serde(default)]
    l: Vec<f64>,
    #[serde(default)]
    c: Vec<f64>,
    #[serde(default)]
    v: Vec<f64>,
}

/// Latest quote for a symbol.
#[derive(Debug, Clone, Deserialize)]
pub struct Quote {
    /// Current price
    #[serde(rename = "c")]
    pub current: f64,
}

/// Credentialed Finnhub client.
#[derive(Debug, Clone)]
pub struct FinnhubClient {
    client: Client,
    base_url: String,
    token: String,
}

impl FinnhubClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, BASE_URL)
    }

    pub fn with_base_url(token: impl Into<String>, base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.to_string(),
            token: token.into(),
        }
    }

    /// Fetch OHLCV candles for `[from, to]`.
    ///
    /// Returns `Ok(None)` when the provider reports `no_data` for the
    /// symbol/window.
    pub async fn candles(
        &self,
        symbol: &str,
        resolution: Resolution,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<Vec<Candle>>, FinnhubError> {
        let url = format!("{}/stock/candle", self.base_url);

        debug!(symbol, resolution = resolution.as_str(), "fetching candles");

        let from_epoch = from.timestamp().to_string();
        let to_epoch = to.timestamp().to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("resolution", resolution.as_str()),
                ("from", from_epoch.as_str()),
                ("to", to_epoch.as_str()),
                ("token", self.token.as_str()),
            ])
            .send()
            .await?;

        let body: CandleResponse = Self::check_status(response)?.json().await?;

        if body.s == "no_data" {
            info!(symbol, "provider returned no_data");
            return Ok(None);
        }
        if body.s != "ok" {
            return Err(FinnhubError::Malformed(format!(
                "unexpected candle status {:?}",
                body.s
            )));
        }

        let n = body.t.len();
        if [&body.o, &body.h, &body.l, &body.c, &body.v]
            .iter()
            .any(|col| col.len() != n)
        {
            return Err(FinnhubError::Malformed(
                "candle arrays have mismatched lengths".to_string(),
            ));
        }

        let mut candles: Vec<Candle> = (0..n)
            .filter_map(|i| {
                let timestamp = Utc.timestamp_opt(body.t[i], 0).single()?;
                Some(Candle {
                    timestamp,
                    open: body.o[i],
                    high: body.h[i],
                    low: body.l[i],
                    close: body.c[i],
                    volume: body.v[i],
                })
            })
            .collect();

        // Ensure temporal ordering
        candles.sort_by_key(|c| c.timestamp);

        info!(symbol, count = candles.len(), "fetched candles");

        Ok(Some(candles))
    }

    /// Fetch the latest quote for a symbol.
    pub async fn quote(&self, symbol: &str) -> Result<Quote, FinnhubError> {
        let url = format!("{}/quote", self.base_url);

        debug!(symbol, "fetching quote");

        let response = self
            .client
            .get(&url)
            .query(&[("symbol", symbol), ("token", self.token.as_str())])
            .send()
            .await?;

        let quote: Quote = Self::check_status(response)?.json().await?;
        Ok(quote)
    }

    fn check_status(response: reqwest::Response) -> Result<reqwest::Response, FinnhubError> {
        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!("Finnhub rejected the API key");
                Err(FinnhubError::Unauthorized)
            }
            StatusCode::TOO_MANY_REQUESTS => Err(FinnhubError::RateLimited),
            s if !s.is_success() => Err(FinnhubError::Status(s)),
            _ => Ok(response),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_deserializes_current_field() {
        let quote: Quote =
            serde_json::from_str(r#"{"c": 178.25, "h": 180.0, "l": 176.1, "o": 177.0}"#).unwrap();
        assert_eq!(quote.current, 178.25);
    }

    #[test]
    fn candle_response_tolerates_missing_arrays_on_no_data() {
        let body: CandleResponse = serde_json::from_str(r#"{"s": "no_data"}"#).unwrap();
        assert_eq!(body.s, "no_data");
        assert!(body.t.is_empty());
    }
}
