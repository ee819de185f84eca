//! Trophy Fitness Relay API
//!
//! HTTP layer between clients and the gamification API, built with Axum.
//! The server holds the API key; clients never see it.
//!
//! # Endpoints
//!
//! ## Users
//! - `POST /api/v1/users` - Identify a user
//! - `PATCH /api/v1/users/:id` - Update user attributes (city)
//! - `GET /api/v1/users/:id/streak` - Current streak
//! - `GET /api/v1/users/:id/achievements` - Achievements, earned or not
//! - `GET /api/v1/users/:id/points` - XP summary
//! - `GET /api/v1/users/:id/metrics` - Per-metric totals
//!
//! ## Metrics
//! - `POST /api/v1/metrics/:key/events` - Record a metric increment
//!
//! ## Leaderboards
//! - `GET /api/v1/leaderboards/:key?city=` - Rankings
//!
//! ## Levels
//! - `GET /api/v1/levels?xp=` - Level info for an XP total
//! - `GET /api/v1/levels/table` - Level table
//!
//! ## Views (identity from the `trophy-fitness-user-id` cookie)
//! - `GET /api/v1/dashboard`
//! - `GET /api/v1/profile`
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use trophy_fitness::api::{serve, ApiConfig, AppState};
//! use trophy_fitness::gamification::{GamificationClient, GamificationConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GamificationClient::new(GamificationConfig {
//!         api_key: std::env::var("TROPHY_API_KEY")?,
//!         ..Default::default()
//!     })?;
//!     let config = ApiConfig::default();
//!
//!     let state = AppState::new(Arc::new(client), config.clone());
//!     serve(state, &config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    http::HeaderValue,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // User routes
        .route("/users", post(routes::users::identify_user))
        .route("/users/:id", patch(routes::users::update_user))
        .route("/users/:id/streak", get(routes::users::get_streak))
        .route("/users/:id/achievements", get(routes::users::get_achievements))
        .route("/users/:id/points", get(routes::users::get_points))
        .route("/users/:id/metrics", get(routes::users::get_metrics))
        // Metric routes
        .route("/metrics/:key/events", post(routes::metrics::emit_event))
        // Leaderboard routes
        .route("/leaderboards/:key", get(routes::leaderboards::get_leaderboard))
        // Level routes
        .route("/levels", get(routes::levels::get_level))
        .route("/levels/table", get(routes::levels::get_level_table))
        // View routes
        .route("/dashboard", get(routes::views::dashboard))
        .route("/profile", get(routes::views::profile));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config.cors_origins);
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(allowed)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Trophy Fitness relay listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Trophy Fitness relay shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
