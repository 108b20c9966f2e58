//! Feature engineering
//!
//! Extends a candle series with the indicator columns the classifier trains
//! on, plus the forward-looking binary label. The full-length table is kept
//! for charting and latest-row inference; `training_rows` trims to the rows
//! where every feature and the label are defined.

use crate::data::{Candle, Dataset};
use crate::features::technical::{pct_change, rsi, sma};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed feature schema, in training-matrix order.
pub const FEATURE_COLUMNS: [&str; 5] = ["rsi", "sma_20", "sma_50", "returns", "volume_change"];

/// How many periods ahead the label looks.
pub const FORWARD_HORIZON: usize = 3;

const RSI_PERIOD: usize = 14;
const SMA_SHORT: usize = 20;
const SMA_LONG: usize = 50;

/// A candle series with derived columns. All columns have the same length
/// as `candles`; undefined positions are NaN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureTable {
    pub symbol: String,
    pub candles: Vec<Candle>,
    pub rsi: Vec<f64>,
    pub sma_20: Vec<f64>,
    pub sma_50: Vec<f64>,
    pub returns: Vec<f64>,
    pub volume_change: Vec<f64>,
    /// Close price `FORWARD_HORIZON` periods ahead; NaN for the final rows.
    pub future_close: Vec<f64>,
    /// 1.0 when the forward close exceeds the row's close, 0.0 otherwise;
    /// NaN where the forward close is undefined.
    pub labels: Vec<f64>,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// The feature vector at `idx` in `FEATURE_COLUMNS` order, or `None`
    /// when any value is missing.
    pub fn features_at(&self, idx: usize) -> Option<Vec<f64>> {
        if idx >= self.len() {
            return None;
        }
        let row = vec![
            self.rsi[idx],
            self.sma_20[idx],
            self.sma_50[idx],
            self.returns[idx],
            self.volume_change[idx],
        ];
        if row.iter().any(|v| !v.is_finite()) {
            return None;
        }
        Some(row)
    }

    /// Rows where all five features and the label are defined, as a
    /// training matrix. Chronological order is preserved.
    pub fn training_rows(&self) -> Dataset {
        let names = FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect();
        let mut dataset = Dataset::new(names);

        for idx in 0..self.len() {
            let label = self.labels[idx];
            if !label.is_finite() {
                continue;
            }
            if let Some(row) = self.features_at(idx) {
                dataset.push(row, label as u8, self.candles[idx].timestamp);
            }
        }

        dataset
    }

    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.candles.last().map(|c| c.timestamp)
    }

    pub fn latest_close(&self) -> Option<f64> {
        self.candles.last().map(|c| c.close)
    }
}

/// Derives the indicator and label columns for a candle series.
#[derive(Debug, Clone, Default)]
pub struct FeatureEngineer;

impl FeatureEngineer {
    pub fn new() -> Self {
        Self
    }

    /// Build the full feature table. Returns `None` for an empty series so
    /// the caller can short-circuit with its no-data error.
    pub fn prepare(&self, symbol: &str, candles: &[Candle]) -> Option<FeatureTable> {
        if candles.is_empty() {
            return None;
        }

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();
        let n = closes.len();

        let mut future_close = vec![f64::NAN; n];
        let mut labels = vec![f64::NAN; n];
        for i in 0..n.saturating_sub(FORWARD_HORIZON) {
            future_close[i] = closes[i + FORWARD_HORIZON];
            labels[i] = if future_close[i] > closes[i] { 1.0 } else { 0.0 };
        }

        Some(FeatureTable {
            symbol: symbol.to_string(),
            candles: candles.to_vec(),
            rsi: rsi(&closes, RSI_PERIOD),
            sma_20: sma(&closes, SMA_SHORT),
            sma_50: sma(&closes, SMA_LONG),
            returns: pct_change(&closes),
            volume_change: pct_change(&volumes),
            future_close,
            labels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn candles_with_closes(closes: &[f64]) -> Vec<Candle> {
        let start = Utc::now();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                timestamp: start + Duration::days(i as i64),
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000_000.0 + i as f64,
            })
            .collect()
    }

    fn trending_candles(n: usize) -> Vec<Candle> {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + (i as f64 * 0.1).sin() * 10.0).collect();
        candles_with_closes(&closes)
    }

    #[test]
    fn empty_series_yields_none() {
        assert!(FeatureEngineer::new().prepare("AAPL", &[]).is_none());
    }

    #[test]
    fn full_table_keeps_input_length() {
        for n in [10usize, 53, 100, 300] {
            let table = FeatureEngineer::new()
                .prepare("AAPL", &trending_candles(n))
                .unwrap();
            assert_eq!(table.len(), n);
            assert_eq!(table.rsi.len(), n);
            assert_eq!(table.sma_50.len(), n);
            assert_eq!(table.labels.len(), n);
        }
    }

    #[test]
    fn training_subset_row_count() {
        // 50-period SMA needs 49 prior rows, the label needs 3 forward
        // rows, so a clean length-L series trains on exactly L - 52 rows.
        for n in [53usize, 100, 300] {
            let table = FeatureEngineer::new()
                .prepare("AAPL", &trending_candles(n))
                .unwrap();
            assert_eq!(table.training_rows().len(), n - 52, "length {n}");
        }
    }

    #[test]
    fn label_construction() {
        let table = FeatureEngineer::new()
            .prepare("TEST", &candles_with_closes(&[10.0, 20.0, 15.0, 30.0, 5.0, 40.0, 8.0]))
            .unwrap();

        // close[3] = 30 > close[0] = 10
        assert_eq!(table.labels[0], 1.0);
        // close[4] = 5 < close[1] = 20
        assert_eq!(table.labels[1], 0.0);
        assert_eq!(table.labels[2], 1.0);
        // close[6] = 8 < close[3] = 30
        assert_eq!(table.labels[3], 0.0);
        // final 3 rows have no forward close
        assert!(table.labels[4].is_nan());
        assert!(table.labels[5].is_nan());
        assert!(table.labels[6].is_nan());
    }

    #[test]
    fn features_at_rejects_undefined_rows() {
        let table = FeatureEngineer::new()
            .prepare("AAPL", &trending_candles(60))
            .unwrap();
        // Row 10 predates the 50-period SMA window.
        assert!(table.features_at(10).is_none());
        // The last row has all indicators even though its label is missing.
        let row = table.features_at(59).unwrap();
        assert_eq!(row.len(), FEATURE_COLUMNS.len());
        assert!(row.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn feature_order_matches_schema() {
        let table = FeatureEngineer::new()
            .prepare("AAPL", &trending_candles(60))
            .unwrap();
        let row = table.features_at(55).unwrap();
        assert_eq!(row[0], table.rsi[55]);
        assert_eq!(row[1], table.sma_20[55]);
        assert_eq!(row[2], table.sma_50[55]);
        assert_eq!(row[3], table.returns[55]);
        assert_eq!(row[4], table.volume_change[55]);
    }
}
