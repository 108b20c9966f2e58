//! HTTP handlers for the dashboard API

use crate::config::Config;
use crate::data::DataSource;
use crate::signals::{parse_watchlist, Analysis, Predictor};
use axum::extract::{Query, State};
use axum::response::Html;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Default watchlist shown by the dashboard.
pub const DEFAULT_WATCHLIST: &str = "AAPL, MSFT, TSLA, NVDA";

#[derive(Debug, Deserialize)]
pub struct AnalyzeQuery {
    /// Comma-separated symbols; falls back to the default watchlist
    pub symbols: Option<String>,
    /// Per-request API key override
    pub key: Option<String>,
}

/// Per-symbol payload: either a full analysis or an inline error.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SymbolReport {
    Ok(Box<ReportBody>),
    Err { symbol: String, error: String },
}

#[derive(Debug, Serialize)]
pub struct ReportBody {
    pub symbol: String,
    pub current_price: f64,
    pub probability: f64,
    pub signal: String,
    pub accuracy: f64,
    pub latest_time: DateTime<Utc>,
    pub latest: LatestMetrics,
    pub chart: ChartData,
}

/// Most recent indicator values, for the metrics column.
#[derive(Debug, Serialize)]
pub struct LatestMetrics {
    pub rsi: f64,
    pub returns: f64,
    pub volume_change: f64,
}

/// Column-oriented series for the price/SMA and RSI panels. Non-finite
/// values serialize as `null`, which the chart layer treats as gaps.
#[derive(Debug, Serialize)]
pub struct ChartData {
    pub time: Vec<String>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub sma_20: Vec<f64>,
    pub sma_50: Vec<f64>,
    pub rsi: Vec<f64>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardEntry {
    pub symbol: String,
    pub signal: String,
    pub probability: f64,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub synthetic: bool,
    pub results: Vec<SymbolReport>,
    /// Symbols ranked by up-probability, descending
    pub leaderboard: Vec<LeaderboardEntry>,
}

impl ReportBody {
    fn from_analysis(analysis: &Analysis) -> Self {
        let table = &analysis.table;
        let last = table.len() - 1;

        Self {
            symbol: analysis.symbol.clone(),
            current_price: analysis.current_price,
            probability: analysis.probability,
            signal: analysis.signal.to_string(),
            accuracy: analysis.accuracy,
            latest_time: analysis.latest_time,
            latest: LatestMetrics {
                rsi: table.rsi[last],
                returns: table.returns[last],
                volume_change: table.volume_change[last],
            },
            chart: ChartData {
                time: table
                    .candles
                    .iter()
                    .map(|c| c.timestamp.format("%Y-%m-%d").to_string())
                    .collect(),
                open: table.candles.iter().map(|c| c.open).collect(),
                high: table.candles.iter().map(|c| c.high).collect(),
                low: table.candles.iter().map(|c| c.low).collect(),
                close: table.candles.iter().map(|c| c.close).collect(),
                sma_20: table.sma_20.clone(),
                sma_50: table.sma_50.clone(),
                rsi: table.rsi.clone(),
            },
        }
    }
}

/// Serve the embedded single-page dashboard.
pub async fn index() -> Html<&'static str> {
    Html(include_str!("dashboard.html"))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Analyze the requested watchlist, strictly sequentially, and rank the
/// successes by confidence.
pub async fn analyze(
    State(config): State<Arc<Config>>,
    Query(query): Query<AnalyzeQuery>,
) -> Json<AnalyzeResponse> {
    let api_key = query
        .key
        .filter(|k| !k.trim().is_empty())
        .or_else(|| config.api_key.clone());

    let source = DataSource::new(api_key);
    let synthetic = source.is_synthetic();
    let predictor = Predictor::new(Box::new(source));

    let symbols = parse_watchlist(query.symbols.as_deref().unwrap_or(DEFAULT_WATCHLIST));
    let outcomes = predictor.analyze_watchlist(&symbols).await;

    let mut leaderboard: Vec<LeaderboardEntry> = Vec::new();
    let results: Vec<SymbolReport> = outcomes
        .into_iter()
        .map(|(symbol, outcome)| match outcome {
            Ok(analysis) => {
                leaderboard.push(LeaderboardEntry {
                    symbol: analysis.symbol.clone(),
                    signal: analysis.signal.to_string(),
                    probability: analysis.probability,
                });
                SymbolReport::Ok(Box::new(ReportBody::from_analysis(&analysis)))
            }
            Err(e) => SymbolReport::Err {
                symbol,
                error: e.to_string(),
            },
        })
        .collect();

    leaderboard.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Json(AnalyzeResponse {
        synthetic,
        results,
        leaderboard,
    })
}
