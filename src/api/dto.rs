//! Data Transfer Objects
//!
//! Request and response types for the relay endpoints that are not
//! gamification boundary types themselves.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::gamification::LeaderboardEntry;

// ============================================
// METRIC DTOs
// ============================================

/// Metric event request; the metric key comes from the path
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricEventRequest {
    pub user_id: String,
    pub value: f64,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

// ============================================
// LEADERBOARD DTOs
// ============================================

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardParams {
    /// Restrict to users whose city attribute matches
    #[serde(default)]
    pub city: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    pub key: String,
    #[serde(default)]
    pub city: Option<String>,
    pub rankings: Vec<LeaderboardEntry>,
}

// ============================================
// LEVEL DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct LevelParams {
    pub xp: i64,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status: "healthy" or "degraded"
    pub status: String,
    /// Upstream status: "configured" or "missing_api_key"
    pub upstream: String,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Server version
    pub version: String,
}
