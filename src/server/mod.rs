//! Dashboard HTTP server
//!
//! A small axum app: the embedded single-page dashboard at `/`, the
//! analysis API at `/api/analyze`, and a health probe.

pub mod handlers;

use crate::config::Config;
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub fn router(config: Arc<Config>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/analyze", get(handlers::analyze))
        .with_state(config)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until the process exits.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let synthetic = config.api_key.is_none();
    let app = router(Arc::new(config));

    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("dashboard listening on http://{}", addr);
    info!("  GET http://{}/            dashboard", addr);
    info!("  GET http://{}/api/analyze?symbols=AAPL,MSFT", addr);
    if synthetic {
        info!("no API key configured: all data will be synthetic");
    }

    axum::serve(listener, app).await?;

    Ok(())
}
