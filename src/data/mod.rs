//! Market data: Finnhub client, synthetic fallback, core types

pub mod finnhub;
pub mod source;
pub mod synthetic;
pub mod types;

pub use finnhub::{FinnhubClient, FinnhubError, Quote};
pub use source::{DataSource, MarketData};
pub use types::{Candle, Dataset, Resolution};
