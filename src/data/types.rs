//! Core market-data structures
//!
//! Candles as returned by the data source, and the training matrix fed to
//! the classifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV record for a single trading day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    /// Bucket open time
    pub timestamp: DateTime<Utc>,
    /// Opening price
    pub open: f64,
    /// Highest price
    pub high: f64,
    /// Lowest price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Trading volume
    pub volume: f64,
}

/// Candle resolution accepted by the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Day,
    Week,
    Month,
}

impl Resolution {
    /// Finnhub resolution code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Day => "D",
            Resolution::Week => "W",
            Resolution::Month => "M",
        }
    }
}

/// Labeled feature matrix for supervised training.
///
/// Rows are chronological; `features[i]` holds the fixed feature columns for
/// one trading day and `labels[i]` is 1 when the close 3 days forward
/// exceeded that day's close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    /// Feature column names, in matrix order
    pub feature_names: Vec<String>,
    /// Feature matrix (rows = samples, cols = features)
    pub features: Vec<Vec<f64>>,
    /// Binary labels (0 or 1)
    pub labels: Vec<u8>,
    /// Timestamp of each sample
    pub timestamps: Vec<DateTime<Utc>>,
}

impl Dataset {
    pub fn new(feature_names: Vec<String>) -> Self {
        Self {
            feature_names,
            features: Vec::new(),
            labels: Vec::new(),
            timestamps: Vec::new(),
        }
    }

    pub fn push(&mut self, features: Vec<f64>, label: u8, timestamp: DateTime<Utc>) {
        self.features.push(features);
        self.labels.push(label);
        self.timestamps.push(timestamp);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn num_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Split chronologically for validation: the held-out partition is
    /// exactly the last `floor(0.2 * len)` rows, the train partition the
    /// remaining prefix. No shuffling: reordering would leak future
    /// information through overlapping indicator windows.
    pub fn split_for_validation(&self) -> (Dataset, Dataset) {
        let test_len = (self.len() as f64 * 0.2).floor() as usize;
        let split_idx = self.len() - test_len;

        let slice = |range: std::ops::Range<usize>| Dataset {
            feature_names: self.feature_names.clone(),
            features: self.features[range.clone()].to_vec(),
            labels: self.labels[range.clone()].to_vec(),
            timestamps: self.timestamps[range].to_vec(),
        };

        (slice(0..split_idx), slice(split_idx..self.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset_of(n: usize) -> Dataset {
        let mut ds = Dataset::new(vec!["a".to_string(), "b".to_string()]);
        for i in 0..n {
            ds.push(vec![i as f64, -(i as f64)], (i % 2) as u8, Utc::now());
        }
        ds
    }

    #[test]
    fn split_holds_out_last_fifth_floor() {
        for n in [5usize, 10, 11, 100, 248] {
            let ds = dataset_of(n);
            let (train, test) = ds.split_for_validation();
            let expected_test = (n as f64 * 0.2).floor() as usize;
            assert_eq!(test.len(), expected_test, "n = {n}");
            assert_eq!(train.len(), n - expected_test, "n = {n}");
        }
    }

    #[test]
    fn split_preserves_row_order() {
        let ds = dataset_of(10);
        let (train, test) = ds.split_for_validation();
        assert_eq!(train.features[0][0], 0.0);
        assert_eq!(train.features[7][0], 7.0);
        assert_eq!(test.features[0][0], 8.0);
        assert_eq!(test.features[1][0], 9.0);
    }

    #[test]
    fn resolution_codes() {
        assert_eq!(Resolution::Day.as_str(), "D");
        assert_eq!(Resolution::Week.as_str(), "W");
    }
}
