//! Trophy Fitness Relay Server
//!
//! Run with: cargo run --bin trophy-fitness
//!
//! # Configuration
//!
//! Read from the first config file found (see `trophy-fitness-cli config`),
//! then overridden by environment variables:
//! - `TROPHY_API_KEY`: Gamification API key (required for relayed routes)
//! - `TROPHY_FITNESS_API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `TROPHY_FITNESS_API_PORT`: Port to listen on (default: 8082)
//! - `TROPHY_FITNESS_GAMIFICATION_URL`: Upstream base URL
//! - `RUST_LOG`: Log filter (default: trophy_fitness=info)

use anyhow::Context;
use std::sync::Arc;

use trophy_fitness::api::{serve, AppState};
use trophy_fitness::config::Config;
use trophy_fitness::gamification::GamificationClient;
use trophy_fitness::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load_default();
    logging::init(&config.logging);

    tracing::info!("Starting Trophy Fitness relay v{}", env!("CARGO_PKG_VERSION"));

    let state = match config.gamification.client_config() {
        Some(client_config) => {
            tracing::info!(base_url = %client_config.base_url, "Gamification API configured");
            let client = GamificationClient::new(client_config)
                .context("Failed to create gamification client")?;
            AppState::new(Arc::new(client), config.api.clone())
        }
        None => {
            tracing::warn!(
                "No gamification API key (set TROPHY_API_KEY); relayed routes will answer 503"
            );
            AppState::unconfigured(config.api.clone())
        }
    };

    tracing::info!("Starting server on {}", config.api.addr());
    serve(state, &config.api).await.context("Relay server failed")?;

    tracing::info!("Trophy Fitness relay stopped");
    Ok(())
}
