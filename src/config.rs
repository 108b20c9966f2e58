//! Application configuration
//!
//! Plain values passed in from the assembly point. Library code never reads
//! the process environment; `FINNHUB_API_KEY` is resolved in `main.rs` only.

/// Settings shared by the server and CLI paths.
#[derive(Debug, Clone)]
pub struct Config {
    /// Finnhub API key; absent means synthetic data mode
    pub api_key: Option<String>,
    /// Dashboard bind host
    pub host: String,
    /// Dashboard bind port
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}
