//! Alma Service - catalog availability mediator
//!
//! REST API server in front of the Alma library API.

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;

use alma_service::{
    api,
    config::AppConfig,
    logging,
    services::gateway::HttpUpstream,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    logging::init(&config.logging, config.secrets()).context("Failed to initialize logging")?;

    tracing::info!("Starting Alma Service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Alma gateway: {}{}", config.alma.host, config.alma.endpoint);

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    // Create application state
    let client = HttpUpstream::new(&config.alma)?;
    let state = AppState::new(config, Arc::new(client));

    // Build router
    let app = api::create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
