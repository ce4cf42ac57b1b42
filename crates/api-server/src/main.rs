//! API server for the fleet issue tracker
//!
//! Serves the JSON API for vessels, crew assignments and issue reports.

mod auth;
mod config;
mod error;
mod mail;
mod routes;
mod state;

use anyhow::Context;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fleet_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    if config.uses_default_secret() {
        tracing::warn!("JWT_SECRET is not set; using the development secret");
    }
    if !config.quota_mode.is_enforced() {
        tracing::warn!("Quota enforcement is off; caps are only logged");
    }
    tracing::info!("Using data directory: {:?}", config.data_dir);

    let bind_addr = config.bind_addr;
    let seed_demo = config.seed_demo;
    let app_state = AppState::new(config)
        .await
        .context("Failed to initialize application state")?;

    if seed_demo
        && fleet_core::seed::seed_demo_fleet(app_state.store(), auth::hash_password)
            .await
            .context("Failed to seed demo fleet")?
    {
        tracing::info!("Seeded demo fleet");
    }

    let app = routes::router()
        .with_state(app_state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    tracing::info!("REST API listening on {}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
