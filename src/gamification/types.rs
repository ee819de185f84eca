//! Boundary types for the gamification API
//!
//! The upstream service may omit any field, so every field is optional
//! or defaults to empty. Nothing here validates upstream data.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identity registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentification {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tz: Option<String>,
}

/// Attribute update for a known user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeUpdate {
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl AttributeUpdate {
    pub fn city(city: impl Into<String>) -> Self {
        let mut attributes = HashMap::new();
        attributes.insert("city".to_string(), city.into());
        Self { attributes }
    }
}

/// One metric increment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricEvent {
    pub user_id: String,
    pub metric_key: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, String>,
}

/// Current streak
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Streak {
    pub length: Option<u32>,
    pub frequency: Option<String>,
    pub started: Option<String>,
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub expires: Option<String>,
}

impl Streak {
    pub fn length_or_zero(streak: Option<&Streak>) -> u32 {
        streak.and_then(|s| s.length).unwrap_or(0)
    }
}

/// Achievement, earned or not
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Achievement {
    pub id: Option<String>,
    pub key: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    /// "metric", "streak" or "api"
    pub trigger: Option<String>,
    pub metric_name: Option<String>,
    pub metric_value: Option<f64>,
    pub streak_length: Option<u32>,
    pub badge_url: Option<String>,
    pub achieved_at: Option<String>,
}

impl Achievement {
    pub fn is_achieved(&self) -> bool {
        self.achieved_at.as_deref().is_some_and(|at| !at.is_empty())
    }

    /// Short human description of what unlocks this achievement
    pub fn requirement(&self) -> Option<String> {
        match self.trigger.as_deref() {
            Some("streak") => self
                .streak_length
                .map(|days| format!("Maintain a {days}-day streak")),
            Some("metric") => self.metric_value.map(|value| {
                format!(
                    "Reach {} {}",
                    value,
                    self.metric_name.as_deref().unwrap_or("points")
                )
            }),
            _ => self.description.clone(),
        }
    }
}

/// Points (XP) summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PointsSummary {
    pub total: Option<i64>,
    pub added: Option<i64>,
}

/// Per-metric running total
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricTotal {
    pub id: Option<String>,
    pub key: Option<String>,
    pub name: Option<String>,
    pub units: Option<String>,
    pub current: Option<f64>,
}

/// Total for `key` among `metrics`, 0 when absent
pub fn metric_total(metrics: &[MetricTotal], key: &str) -> f64 {
    metrics
        .iter()
        .find(|m| m.key.as_deref() == Some(key))
        .and_then(|m| m.current)
        .unwrap_or(0.0)
}

/// One leaderboard row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeaderboardEntry {
    pub rank: Option<u32>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub value: Option<f64>,
}

impl LeaderboardEntry {
    /// User name, or a shortened id when the user never set one
    pub fn display_name(&self) -> String {
        if let Some(name) = self.user_name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        match self.user_id.as_deref() {
            Some(id) => format!("User {}", id.chars().take(8).collect::<String>()),
            None => "Unknown".to_string(),
        }
    }
}

/// Upstream reply to a metric event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricEventResponse {
    pub event_id: Option<String>,
    pub metric_id: Option<String>,
    pub total: Option<f64>,
    pub achievements: Vec<Achievement>,
    pub current_streak: Option<Streak>,
    pub points: Option<PointsSummary>,
}

/// Everything the dashboard and profile views read for one user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub streak: Option<Streak>,
    pub achievements: Vec<Achievement>,
    pub points: Option<PointsSummary>,
    pub metrics: Vec<MetricTotal>,
}

impl UserStats {
    pub fn total_xp(&self) -> i64 {
        self.points.as_ref().and_then(|p| p.total).unwrap_or(0)
    }

    pub fn streak_length(&self) -> u32 {
        Streak::length_or_zero(self.streak.as_ref())
    }

    /// First achievement not yet earned
    pub fn next_achievement(&self) -> Option<&Achievement> {
        self.achievements.iter().find(|a| !a.is_achieved())
    }
}
