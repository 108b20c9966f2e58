//! Command-line entry point
//!
//! `serve` runs the browser dashboard; `analyze` runs the pipeline once (or
//! on a blocking timer) and prints the results; `quote` looks up a current
//! price. The `FINNHUB_API_KEY` environment variable is read here and only
//! here; everything below takes the credential as an explicit value.

use clap::Parser;
use stock_signals::config::Config;
use stock_signals::data::{DataSource, MarketData};
use stock_signals::signals::{parse_watchlist, Predictor};

#[derive(Parser)]
#[command(name = "stock-signals", about = "Daily stock signal dashboard")]
struct Cli {
    /// Finnhub API key; falls back to FINNHUB_API_KEY, then synthetic data
    #[arg(long, global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run the browser dashboard
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value = "8080")]
        port: u16,
    },
    /// Analyze a watchlist and print the signals
    Analyze {
        #[arg(short, long, default_value = "AAPL, MSFT, TSLA, NVDA")]
        symbols: String,
        /// Re-run the whole batch every N seconds (blocking loop)
        #[arg(long)]
        every: Option<u64>,
    },
    /// Look up the current price for a symbol
    Quote { symbol: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stock_signals=info,tower_http=warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let api_key = cli
        .api_key
        .or_else(|| std::env::var("FINNHUB_API_KEY").ok());

    match cli.command {
        Commands::Serve { host, port } => {
            let config = Config {
                api_key,
                host,
                port,
            };
            stock_signals::server::serve(config).await?;
        }
        Commands::Analyze { symbols, every } => {
            run_analyze(api_key, &symbols, every).await;
        }
        Commands::Quote { symbol } => {
            let symbol = stock_signals::signals::normalize_symbol(&symbol);
            let source = DataSource::new(api_key);
            match source.current_price(&symbol).await {
                Some(price) => println!("{}: ${:.2}", symbol, price),
                None => println!("{}: quote unavailable", symbol),
            }
        }
    }

    Ok(())
}

async fn run_analyze(api_key: Option<String>, symbols: &str, every: Option<u64>) {
    let predictor = Predictor::new(Box::new(DataSource::new(api_key)));
    let watchlist = parse_watchlist(symbols);

    loop {
        let results = predictor.analyze_watchlist(&watchlist).await;

        println!();
        println!(
            "{:<8} {:>10} {:>6} {:>12} {:>10}",
            "SYMBOL", "PRICE", "SIGNAL", "CONFIDENCE", "ACCURACY"
        );
        let mut ranked = Vec::new();
        for (symbol, outcome) in &results {
            match outcome {
                Ok(a) => {
                    println!(
                        "{:<8} {:>10.2} {:>6} {:>11.1}% {:>9.1}%",
                        a.symbol,
                        a.current_price,
                        a.signal.to_string(),
                        a.probability * 100.0,
                        a.accuracy * 100.0
                    );
                    ranked.push((a.symbol.clone(), a.signal, a.probability));
                }
                Err(e) => println!("{:<8} error: {}", symbol, e),
            }
        }

        ranked.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
        if !ranked.is_empty() {
            println!();
            println!("Top opportunities:");
            for (symbol, signal, prob) in &ranked {
                println!("  {:<8} {} ({:.0}%)", symbol, signal, prob * 100.0);
            }
        }

        match every {
            // One full-batch refresh per tick; the sleep blocks this task,
            // there is no partial or incremental refresh.
            Some(secs) => tokio::time::sleep(std::time::Duration::from_secs(secs)).await,
            None => break,
        }
    }
}
