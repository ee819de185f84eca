//! # Trophy Fitness
//!
//! Gamified fitness tracking on top of an external gamification API:
//! streaks, XP levels, achievements and weekly leaderboards for runs,
//! rides and swims.
//!
//! ## Modules
//!
//! - [`levels`]: XP to level computation
//! - [`identity`]: anonymous local identity, cookie carrier and city
//! - [`gamification`]: upstream API contract, HTTP client and activities
//! - [`session`]: client operations with optimistic local writes
//! - [`views`]: dashboard and profile views
//! - [`relay`]: client for the relay server
//! - [`api`]: relay server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use trophy_fitness::identity::{MemoryCarrier, MemoryStore, SystemTimezone};
//! use trophy_fitness::gamification::{ActivityLog, ActivityType};
//! use trophy_fitness::relay::RelayClient;
//! use trophy_fitness::session::ClientSession;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let carrier = Arc::new(MemoryCarrier::new());
//!     let relay = RelayClient::new("http://localhost:8082", 5000, carrier.clone())?;
//!     let session = ClientSession::new(
//!         Arc::new(MemoryStore::new()),
//!         carrier,
//!         Arc::new(SystemTimezone),
//!         Arc::new(relay),
//!     );
//!
//!     session.bootstrap().await?;
//!     session
//!         .log_activity(ActivityLog::new(ActivityType::Run, 5.0))
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod gamification;
pub mod identity;
pub mod levels;
pub mod logging;
pub mod relay;
pub mod session;
pub mod views;

#[cfg(test)]
pub(crate) mod testing;

// Re-export top-level types for convenience
pub use levels::{compute_level_info, Level, LevelInfo, LevelTable, LevelTableError};

pub use identity::{
    CityResolver, IdentityCarrier, IdentityCookie, IdentityError, IdentityResolver,
    KeyValueStore, TimezoneSource,
};

pub use gamification::{
    ActivityLog, ActivityType, GamificationApi, GamificationClient, GamificationConfig,
    GamificationError, LeaderboardScope, UserStats,
};

pub use session::{ClientSession, SessionError, SyncOutcome};

pub use views::{DashboardView, ProfileView};

pub use relay::RelayClient;

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{Config, ConfigError, LoggingConfig};
