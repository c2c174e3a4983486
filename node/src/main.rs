//! Local development node for the pass sales.
//!
//! This binary hosts an in-memory chain with the APY Pass public sale and the
//! Genesis Pass whitelist sale deployed on it, and exposes both over HTTP.
//! Requests act as the identity named in the `x-caller` header, like an
//! unlocked account on a development chain.
//!
//! # Endpoints
//!
//! - `GET  /`                   - Service information
//! - `GET  /health`             - Health check
//! - `GET  /metrics`            - Prometheus-format metrics
//! - `GET  /public`             - Public sale state
//! - `POST /public/mint`        - Mint a pass, paying `{ "value": "0.05" }`
//! - `POST /public/start`       - Move the start time (owner)
//! - `POST /public/withdraw`    - Withdraw proceeds (owner)
//! - `GET  /whitelist`          - Whitelist sale state
//! - `POST /whitelist/mint`     - Mint a pass with `{ "proof": "0x..." }`
//! - `POST /whitelist/window`   - Move the start and/or end time (owner)
//! - `GET  /accounts/{address}` - Balance and passes held
//! - `POST /dev/fund`           - Credit `DEV_PREFUND` to an address
//!
//! # Configuration
//!
//! Set the following environment variables:
//!
//! - `PORT`            - Server port (default: 4020)
//! - `HOST`            - Bind address (default: 0.0.0.0)
//! - `BIND_ADDR`       - Full bind address, overrides `HOST` and `PORT`
//! - `CHAIN_ID`        - EIP-155 chain id (default: 31337)
//! - `OWNER_ADDRESS`   - Owner of both sales (default: Hardhat account #0)
//! - `ISSUER_ADDRESS`  - Signer of whitelist proofs
//! - `PRICE`           - Public sale price in ether (default: 0.05)
//! - `PUBLIC_START`    - Public sale start, unix seconds (default: now)
//! - `WHITELIST_START` - Whitelist sale start, unix seconds (default: now)
//! - `WHITELIST_END`   - Whitelist sale end, unix seconds (default: start + 7 days)
//! - `DEV_PREFUND`     - Ether credited by `/dev/fund` (default: 0, disabled)

mod config;
mod routes;

use axum::error_handling::HandleErrorLayer;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use pass_mint::chain::{LocalChain, PublicSaleConfig, WhitelistSaleConfig, format_ether};
use pass_mint::{PublicSale, WhitelistSale};
use std::env;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceBuilder;
use tower::buffer::BufferLayer;
use tower::limit::RateLimitLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use config::{NodeConfig, PUBLIC_SALE_ADDRESS, WHITELIST_SALE_ADDRESS};
use routes::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing: LOG_LEVEL is used if RUST_LOG is not set
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    let config = NodeConfig::from_env()?;

    let mut public_config = PublicSaleConfig::apy_pass(config.public_start);
    public_config.price = config.price;
    let whitelist_config = WhitelistSaleConfig::genesis_pass(
        config.issuer,
        config.whitelist_start,
        config.whitelist_end,
    );

    let node = Node {
        chain: LocalChain::new(config.chain_id),
        public: PublicSale::deploy(PUBLIC_SALE_ADDRESS, config.owner, &public_config),
        whitelist: WhitelistSale::deploy(WHITELIST_SALE_ADDRESS, config.owner, &whitelist_config),
    };

    tracing::info!(
        chain_id = %config.chain_id,
        owner = %config.owner,
        issuer = %config.issuer,
        price = %format_ether(config.price),
        public_start = config.public_start,
        whitelist_start = config.whitelist_start,
        whitelist_end = config.whitelist_end,
        "Pass node starting"
    );

    let state = Arc::new(AppState {
        node: Mutex::new(node),
        chain_id: config.chain_id,
        dev_prefund: config.dev_prefund,
        metrics: Metrics::default(),
    });

    // Rate-limited mint routes: 100 requests per 60 seconds.
    // HandleErrorLayer converts tower errors into HTTP 429 responses.
    // BufferLayer wraps the non-Clone RateLimit service so axum can clone handlers.
    let rate_limited_routes = Router::new()
        .route("/public/mint", post(public_mint_handler))
        .route("/whitelist/mint", post(whitelist_mint_handler))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(|err: tower::BoxError| async move {
                    tracing::warn!(error = %err, "Rate limit or buffer error");
                    (
                        StatusCode::TOO_MANY_REQUESTS,
                        Json(serde_json::json!({
                            "error": "rate_limited",
                            "message": "Too many requests. Please try again later.",
                        })),
                    )
                }))
                .layer(BufferLayer::new(256))
                .layer(RateLimitLayer::new(100, Duration::from_secs(60))),
        );

    let app = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/public", get(public_info_handler))
        .route("/public/start", post(public_start_handler))
        .route("/public/withdraw", post(public_withdraw_handler))
        .route("/whitelist", get(whitelist_info_handler))
        .route("/whitelist/window", post(whitelist_window_handler))
        .route("/accounts/{address}", get(account_handler))
        .route("/dev/fund", post(dev_fund_handler))
        .merge(rate_limited_routes)
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!("Listening on {}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Waits for a Ctrl-C signal to initiate graceful shutdown.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
