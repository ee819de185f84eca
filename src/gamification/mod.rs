//! Gamification API
//!
//! Streaks, achievements, points and leaderboards are owned by an
//! external gamification service. This module defines the contract the
//! rest of the crate relies on and the types crossing that boundary.
//!
//! ## Architecture
//!
//! - **GamificationApi**: abstract upstream contract
//! - **GamificationClient**: HTTP binding of the contract to the upstream service
//! - **activity**: workout to metric event mapping, leaderboard selection
//! - **stats**: concurrent, failure-tolerant read of a user's stats

mod activity;
mod client;
mod stats;
pub(crate) mod transport;
mod types;

pub use activity::{
    ActivityError, ActivityLog, ActivityType, LeaderboardQuery, LeaderboardScope, Pace, SwimStyle,
};
pub use client::{GamificationClient, GamificationConfig};
pub use stats::fetch_user_stats;
pub use types::{
    metric_total, Achievement, AttributeUpdate, LeaderboardEntry, MetricEvent,
    MetricEventResponse, MetricTotal, PointsSummary, Streak, UserIdentification, UserStats,
};

use async_trait::async_trait;
use thiserror::Error;

/// Upstream gamification contract.
///
/// Only the operations are fixed here; method names of any particular
/// SDK revision are not.
#[async_trait]
pub trait GamificationApi: Send + Sync {
    /// Register or refresh a user
    async fn identify_user(&self, user: &UserIdentification) -> Result<(), GamificationError>;

    /// Update custom user attributes such as the city
    async fn update_user_attributes(
        &self,
        user_id: &str,
        update: &AttributeUpdate,
    ) -> Result<(), GamificationError>;

    /// Record a metric increment
    async fn emit_metric_event(
        &self,
        event: &MetricEvent,
    ) -> Result<MetricEventResponse, GamificationError>;

    async fn fetch_streak(&self, user_id: &str) -> Result<Option<Streak>, GamificationError>;

    async fn fetch_achievements(&self, user_id: &str)
        -> Result<Vec<Achievement>, GamificationError>;

    async fn fetch_points(&self, user_id: &str) -> Result<Option<PointsSummary>, GamificationError>;

    async fn fetch_metrics(&self, user_id: &str) -> Result<Vec<MetricTotal>, GamificationError>;

    async fn fetch_leaderboard(
        &self,
        query: &LeaderboardQuery,
    ) -> Result<Vec<LeaderboardEntry>, GamificationError>;
}

/// Errors talking to the gamification service
#[derive(Error, Debug)]
pub enum GamificationError {
    #[error("Gamification service unavailable")]
    Unavailable,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Rate limited")]
    RateLimited,

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Configuration Error: {0}")]
    NotConfigured(String),
}

impl GamificationError {
    /// Classify a transport failure
    pub fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GamificationError::Timeout
        } else if e.is_connect() {
            GamificationError::Unavailable
        } else {
            GamificationError::Request(e)
        }
    }
}
