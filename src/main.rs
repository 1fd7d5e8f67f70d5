// =============================================================================
// TickerScope: Main Entry Point
// =============================================================================
//
// A single-ticker stock analysis backend: fetch a daily price series, derive
// SMA20 / SMA50 / RSI14 plus qualitative insights, and serve the result as
// JSON to the charting dashboard.  All computation is batch and per-request;
// the process keeps no analysis state beyond an in-memory cache and a ring
// of recent summaries.
// =============================================================================

mod analyzer;
mod api;
mod app_state;
mod errors;
mod indicators;
mod insights;
mod market_data;
mod runtime_config;
mod types;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::runtime_config::RuntimeConfig;

const CONFIG_PATH: &str = "tickerscope_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment & config
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("TickerScope backend starting up");

    let mut config = RuntimeConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    // Override the provider endpoint from env if available (useful for
    // pointing at a local fixture server during development).
    if let Ok(url) = std::env::var("TICKERSCOPE_PROVIDER_URL") {
        if !url.trim().is_empty() {
            config.provider_base_url = url.trim().trim_end_matches('/').to_string();
        }
    }

    info!(
        provider = %config.provider_base_url,
        lookback_days = config.default_lookback_days,
        "configuration ready"
    );

    // 2. Build shared state
    let state = Arc::new(AppState::new(config));

    // 3. Start the API server
    let bind_addr =
        std::env::var("TICKERSCOPE_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:4000".into());

    let app = api::rest::router(state.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 4. Graceful shutdown
    if let Err(e) = state.runtime_config.read().save(CONFIG_PATH) {
        error!(error = %e, "Failed to save runtime config on shutdown");
    }

    info!("TickerScope shut down complete.");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("Shutdown signal received, stopping gracefully");
    }
}
