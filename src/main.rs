// =============================================================================
// Injective Market Intelligence — Main Entry Point
// =============================================================================
//
// Loads configuration, wires the indexer client, cache and analytics engine
// into shared state, and serves the REST API until Ctrl-C.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod analytics;
mod api;
mod app_state;
mod cache;
mod indicators;
mod injective;
mod runtime_config;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::injective::IndexerClient;
use crate::runtime_config::ServiceConfig;

/// Env var naming the JSON config file.
const CONFIG_PATH_ENV: &str = "MARKET_INTEL_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "service_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Injective Market Intelligence — Starting Up       ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut config = ServiceConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(path = %config_path, error = %e, "Failed to load config, using defaults");
        ServiceConfig::default()
    });
    config.apply_env();

    info!(
        environment = %config.environment,
        network = %config.injective.network,
        indexer = %config.injective.endpoint(),
        cache_enabled = config.cache.enabled,
        cache_ttl_secs = config.cache.ttl_seconds,
        rate_limit = config.rate_limit.enabled,
        "Configuration resolved"
    );

    // ── 2. Upstream client ───────────────────────────────────────────────
    let client = IndexerClient::new(config.injective.endpoint(), config.injective.timeout())
        .context("failed to build indexer HTTP client")?;
    info!(base_url = %client.base_url(), "Indexer client ready");

    // ── 3. Shared state ──────────────────────────────────────────────────
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, Arc::new(client)));

    // ── 4. API server ────────────────────────────────────────────────────
    let app = api::router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;

    info!(addr = %bind_addr, "API server listening");
    for endpoint in [
        "GET  /api/v1/health",
        "GET  /api/v1/markets/overview",
        "GET  /api/v1/markets/:marketId/analytics?type=spot|derivative",
        "GET  /api/v1/markets/:marketId/orderbook-depth?type=spot|derivative",
        "GET  /api/v1/markets/concentration-risk",
        "GET  /api/v1/signals/momentum",
        "GET  /api/v1/signals/volatility-alerts",
        "GET  /api/v1/signals/liquidity-opportunities",
        "GET  /api/v1/cache/status",
        "POST /api/v1/cache/clear",
    ] {
        info!("  {endpoint}");
    }

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("API server failed")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Ctrl-C received, shutting down");
}
