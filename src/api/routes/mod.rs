//! API Routes
//!
//! Route handlers organized by functionality.

pub mod health;
pub mod leaderboards;
pub mod levels;
pub mod metrics;
pub mod users;
pub mod views;
