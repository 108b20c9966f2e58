//! Analysis orchestration
//!
//! Runs the full pipeline for one symbol: fetch candles, derive features,
//! train a fresh classifier, infer on the latest row, and threshold the
//! probability into a discrete signal.

use crate::data::MarketData;
use crate::features::{FeatureEngineer, FeatureTable};
use crate::models::{GbmClassifier, GbmParams, ModelError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Candles requested per analysis; enough history for the 50-period SMA
/// with a comfortable training tail.
pub const CANDLE_HISTORY: usize = 300;

/// Discrete trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        };
        f.write_str(s)
    }
}

/// Map an up-probability to a signal. Strict comparisons: exactly 0.6 and
/// exactly 0.4 are HOLD.
pub fn signal_for(probability: f64) -> Signal {
    if probability > 0.6 {
        Signal::Buy
    } else if probability < 0.4 {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

/// Result of analyzing one symbol.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub symbol: String,
    pub current_price: f64,
    pub probability: f64,
    pub signal: Signal,
    pub latest_time: DateTime<Utc>,
    /// Held-out accuracy of the freshly trained model, in [0, 1]
    pub accuracy: f64,
    /// Full-length feature table, kept for charting
    pub table: FeatureTable,
}

/// Why an analysis could not produce a signal.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("No data returned from API (Check symbol or date range)")]
    NoData,

    #[error("Not enough data for indicators")]
    InsufficientHistory,

    #[error("Latest data insufficient for indicators")]
    StaleTail,

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Sequences source -> features -> classifier for a watchlist.
///
/// The classifier is retrained from scratch on every call by design: each
/// analysis adapts to the symbol's own recent history, and nothing is
/// cached between refreshes.
pub struct Predictor {
    source: Box<dyn MarketData>,
    engineer: FeatureEngineer,
    params: GbmParams,
}

impl Predictor {
    pub fn new(source: Box<dyn MarketData>) -> Self {
        Self {
            source,
            engineer: FeatureEngineer::new(),
            params: GbmParams::default(),
        }
    }

    /// Run the full pipeline for one symbol.
    pub async fn analyze(&self, symbol: &str) -> Result<Analysis, AnalysisError> {
        let candles = self
            .source
            .daily_candles(symbol, CANDLE_HISTORY)
            .await
            .ok_or(AnalysisError::NoData)?;

        let table = self
            .engineer
            .prepare(symbol, &candles)
            .ok_or(AnalysisError::NoData)?;

        let training = table.training_rows();
        if training.is_empty() {
            return Err(AnalysisError::InsufficientHistory);
        }

        let (train, test) = training.split_for_validation();
        let mut model = GbmClassifier::with_params(self.params.clone());
        model.fit(&train)?;
        let accuracy = model.evaluate(&test)?;

        // The label is undefined on the most recent rows, but their
        // indicators are not; infer on the very latest row.
        let latest_idx = table.len() - 1;
        let latest_row = table.features_at(latest_idx).ok_or(AnalysisError::StaleTail)?;

        let probability = model.predict_proba(&latest_row)?;
        let signal = signal_for(probability);

        info!(symbol, probability, %signal, accuracy, "analysis complete");

        Ok(Analysis {
            symbol: symbol.to_string(),
            current_price: table.latest_close().unwrap_or_default(),
            probability,
            signal,
            latest_time: table.latest_timestamp().unwrap_or_else(Utc::now),
            accuracy,
            table,
        })
    }

    /// Analyze a watchlist strictly sequentially. A failed symbol never
    /// aborts the batch; its error travels alongside the successes.
    pub async fn analyze_watchlist(
        &self,
        symbols: &[String],
    ) -> Vec<(String, Result<Analysis, AnalysisError>)> {
        let mut results = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let outcome = self.analyze(symbol).await;
            if let Err(e) = &outcome {
                warn!(symbol, error = %e, "analysis failed");
            }
            results.push((symbol.clone(), outcome));
        }
        results
    }
}

/// Normalize a user-entered symbol: trim whitespace and uppercase. The only
/// input validation this system performs.
pub fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Split a comma-separated watchlist into normalized, non-empty symbols.
pub fn parse_watchlist(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(normalize_symbol)
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Candle, DataSource};
    use async_trait::async_trait;

    struct NoDataSource;

    #[async_trait]
    impl MarketData for NoDataSource {
        async fn daily_candles(&self, _symbol: &str, _count: usize) -> Option<Vec<Candle>> {
            None
        }

        async fn current_price(&self, _symbol: &str) -> Option<f64> {
            None
        }
    }

    struct ShortHistorySource;

    #[async_trait]
    impl MarketData for ShortHistorySource {
        async fn daily_candles(&self, _symbol: &str, _count: usize) -> Option<Vec<Candle>> {
            Some(crate::data::synthetic::candle_series(20))
        }

        async fn current_price(&self, _symbol: &str) -> Option<f64> {
            None
        }
    }

    #[test]
    fn signal_thresholds() {
        assert_eq!(signal_for(0.6000001), Signal::Buy);
        assert_eq!(signal_for(0.9), Signal::Buy);
        assert_eq!(signal_for(0.6), Signal::Hold);
        assert_eq!(signal_for(0.5), Signal::Hold);
        assert_eq!(signal_for(0.4), Signal::Hold);
        assert_eq!(signal_for(0.39999), Signal::Sell);
        assert_eq!(signal_for(0.1), Signal::Sell);
    }

    #[test]
    fn signal_display_matches_wire_form() {
        assert_eq!(Signal::Buy.to_string(), "BUY");
        assert_eq!(serde_json::to_string(&Signal::Sell).unwrap(), "\"SELL\"");
    }

    #[test]
    fn watchlist_parsing_trims_and_uppercases() {
        let symbols = parse_watchlist(" aapl, MSFT ,, tsla ");
        assert_eq!(symbols, vec!["AAPL", "MSFT", "TSLA"]);
    }

    #[tokio::test]
    async fn no_data_surfaces_the_exact_error() {
        let predictor = Predictor::new(Box::new(NoDataSource));
        let err = predictor.analyze("AAPL").await.unwrap_err();
        assert!(matches!(err, AnalysisError::NoData));
        assert_eq!(
            err.to_string(),
            "No data returned from API (Check symbol or date range)"
        );
    }

    #[tokio::test]
    async fn short_history_reports_insufficient_indicators() {
        let predictor = Predictor::new(Box::new(ShortHistorySource));
        let err = predictor.analyze("AAPL").await.unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientHistory));
        assert_eq!(err.to_string(), "Not enough data for indicators");
    }

    #[tokio::test]
    async fn synthetic_end_to_end() {
        let predictor = Predictor::new(Box::new(DataSource::new(None)));
        let analysis = predictor.analyze("AAPL").await.unwrap();

        assert_eq!(analysis.symbol, "AAPL");
        assert_eq!(analysis.table.len(), CANDLE_HISTORY);
        assert!((0.0..=1.0).contains(&analysis.probability));
        assert!((0.0..=1.0).contains(&analysis.accuracy));
        assert!(analysis.current_price > 0.0);
        assert_eq!(analysis.signal, signal_for(analysis.probability));
    }

    #[tokio::test]
    async fn watchlist_isolates_failures() {
        let predictor = Predictor::new(Box::new(NoDataSource));
        let results = predictor
            .analyze_watchlist(&["AAPL".to_string(), "MSFT".to_string()])
            .await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|(_, r)| r.is_err()));
    }
}
