mod auth;
mod config;
mod dto;
mod error;
mod extract;
mod routes;
mod state;

use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use vps_control::{InMemoryRateLimiter, Orchestrator, RateLimitConfig};

use crate::config::AppConfig;
use crate::routes::api_router;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env().expect("invalid configuration");

    // Upstream adapters
    let adapters = vps_infra::build_adapters().expect("failed to build upstream adapters");

    let limiter = InMemoryRateLimiter::new(RateLimitConfig {
        window: config.action_window,
        sweep_threshold: config.rate_limit_sweep_threshold,
    });
    tracing::info!(window_secs = config.action_window.as_secs(), "action rate limiter ready");

    let orchestrator = Orchestrator::new(
        adapters.provider,
        adapters.ownership,
        Arc::new(limiter),
        config.list_max_limit,
    );

    let state = AppState {
        orchestrator,
        config: config.clone(),
    };

    let app = api_router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .expect("failed to bind listener");

    tracing::info!(addr = %config.listen_addr, "starting instance control plane API");

    axum::serve(listener, app).await.expect("server error");
}
