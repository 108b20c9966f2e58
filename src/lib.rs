//! Daily stock signal generation
//!
//! Fetches daily OHLCV history from Finnhub (or synthesizes a random-walk
//! substitute when no API key is available), derives momentum and trend
//! features, trains a small gradient-boosted classifier per symbol, and maps
//! the latest up-probability to a BUY / SELL / HOLD signal.
//!
//! # Modules
//!
//! - [`data`] - Finnhub client, synthetic fallback, core market types
//! - [`features`] - Technical indicators and the labeled feature table
//! - [`models`] - Gradient-boosted up-move classifier
//! - [`signals`] - The per-symbol analysis pipeline
//! - [`server`] - Browser dashboard and JSON API
//!
//! # Example
//!
//! ```rust,no_run
//! use stock_signals::data::DataSource;
//! use stock_signals::signals::Predictor;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // No API key: candles come from the synthetic generator.
//!     let source = DataSource::new(None);
//!     let predictor = Predictor::new(Box::new(source));
//!
//!     let analysis = predictor.analyze("AAPL").await?;
//!     println!(
//!         "{}: {} ({:.1}% up, accuracy {:.1}%)",
//!         analysis.symbol,
//!         analysis.signal,
//!         analysis.probability * 100.0,
//!         analysis.accuracy * 100.0
//!     );
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod data;
pub mod features;
pub mod models;
pub mod server;
pub mod signals;

pub use config::Config;
pub use data::{Candle, DataSource, FinnhubClient, MarketData};
pub use features::{FeatureEngineer, FeatureTable};
pub use models::{GbmClassifier, GbmParams};
pub use signals::{Analysis, AnalysisError, Predictor, Signal};
