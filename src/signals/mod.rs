//! Signal generation: the per-symbol analysis pipeline

pub mod predictor;

pub use predictor::{
    normalize_symbol, parse_watchlist, signal_for, Analysis, AnalysisError, Predictor, Signal,
    CANDLE_HISTORY,
};
