//! Activities and leaderboards
//!
//! Maps a logged workout onto the metric event the gamification API
//! tracks, and picks the leaderboard for an activity and scope.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::types::MetricEvent;
use crate::identity::DEFAULT_CITY;

/// Errors building an activity event
#[derive(Error, Debug, PartialEq)]
pub enum ActivityError {
    #[error("Please enter a valid distance, got {0}")]
    InvalidDistance(f64),

    #[error("Unknown {kind}: {value}")]
    Unknown { kind: &'static str, value: String },
}

/// Kind of workout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Run,
    Cycle,
    Swim,
}

impl ActivityType {
    pub fn all() -> &'static [ActivityType] {
        &[ActivityType::Run, ActivityType::Cycle, ActivityType::Swim]
    }

    /// Metric key tracked upstream
    pub fn metric_key(&self) -> &'static str {
        match self {
            ActivityType::Run => "distance_run",
            ActivityType::Cycle => "distance_cycled",
            ActivityType::Swim => "distance_swum",
        }
    }

    /// Distance unit: km, or m for swimming
    pub fn unit(&self) -> &'static str {
        match self {
            ActivityType::Swim => "m",
            _ => "km",
        }
    }

    /// Past-tense label used in summaries ("km run")
    pub fn verb(&self) -> &'static str {
        match self {
            ActivityType::Run => "run",
            ActivityType::Cycle => "cycled",
            ActivityType::Swim => "swum",
        }
    }

    /// Leaderboard key for this activity and scope
    pub fn leaderboard_key(&self, city_scoped: bool) -> &'static str {
        match (self, city_scoped) {
            (ActivityType::Run, false) => "weekly-distance-run",
            (ActivityType::Run, true) => "weekly-distance-run-cities",
            (ActivityType::Cycle, false) => "weekly-distance-cycled",
            (ActivityType::Cycle, true) => "weekly-distance-cycled-cities",
            (ActivityType::Swim, false) => "weekly-distance-swum",
            (ActivityType::Swim, true) => "weekly-distance-swum-cities",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityType::Run => write!(f, "run"),
            ActivityType::Cycle => write!(f, "cycle"),
            ActivityType::Swim => write!(f, "swim"),
        }
    }
}

impl FromStr for ActivityType {
    type Err = ActivityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "run" | "running" => Ok(ActivityType::Run),
            "cycle" | "cycling" | "bike" => Ok(ActivityType::Cycle),
            "swim" | "swimming" => Ok(ActivityType::Swim),
            _ => Err(ActivityError::Unknown {
                kind: "activity",
                value: s.to_string(),
            }),
        }
    }
}

/// Running pace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pace {
    Walk,
    #[default]
    Run,
}

impl Pace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pace::Walk => "walk",
            Pace::Run => "run",
        }
    }
}

impl FromStr for Pace {
    type Err = ActivityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "walk" | "walking" => Ok(Pace::Walk),
            "run" | "running" => Ok(Pace::Run),
            _ => Err(ActivityError::Unknown {
                kind: "pace",
                value: s.to_string(),
            }),
        }
    }
}

/// Swimming style
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwimStyle {
    #[default]
    Freestyle,
    Breaststroke,
}

impl SwimStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwimStyle::Freestyle => "freestyle",
            SwimStyle::Breaststroke => "breaststroke",
        }
    }
}

impl FromStr for SwimStyle {
    type Err = ActivityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "freestyle" | "free" => Ok(SwimStyle::Freestyle),
            "breaststroke" | "breast" => Ok(SwimStyle::Breaststroke),
            _ => Err(ActivityError::Unknown {
                kind: "swim style",
                value: s.to_string(),
            }),
        }
    }
}

/// A workout as entered by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub activity: ActivityType,
    /// km, or m for swims
    pub distance: f64,
    #[serde(default)]
    pub city: Option<String>,
    /// Only meaningful for runs
    #[serde(default)]
    pub pace: Option<Pace>,
    /// Only meaningful for swims
    #[serde(default)]
    pub style: Option<SwimStyle>,
}

impl ActivityLog {
    pub fn new(activity: ActivityType, distance: f64) -> Self {
        Self {
            activity,
            distance,
            city: None,
            pace: None,
            style: None,
        }
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn pace(mut self, pace: Pace) -> Self {
        self.pace = Some(pace);
        self
    }

    pub fn style(mut self, style: SwimStyle) -> Self {
        self.style = Some(style);
        self
    }

    /// Build the metric event for `user_id`.
    ///
    /// Every event carries a city; runs carry a pace and swims a style,
    /// defaulted when unset.
    pub fn to_event(&self, user_id: &str) -> Result<MetricEvent, ActivityError> {
        if !self.distance.is_finite() || self.distance <= 0.0 {
            return Err(ActivityError::InvalidDistance(self.distance));
        }

        let mut attributes = HashMap::new();
        let city = self
            .city
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CITY);
        attributes.insert("city".to_string(), city.to_string());

        match self.activity {
            ActivityType::Run => {
                let pace = self.pace.unwrap_or_default();
                attributes.insert("pace".to_string(), pace.as_str().to_string());
            }
            ActivityType::Swim => {
                let style = self.style.unwrap_or_default();
                attributes.insert("style".to_string(), style.as_str().to_string());
            }
            ActivityType::Cycle => {}
        }

        Ok(MetricEvent {
            user_id: user_id.to_string(),
            metric_key: self.activity.metric_key().to_string(),
            value: self.distance,
            attributes,
        })
    }
}

/// Which ranking to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaderboardScope {
    Global,
    City(String),
}

/// A leaderboard lookup, keyed by leaderboard id with an optional city filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardQuery {
    pub key: String,
    #[serde(default)]
    pub city: Option<String>,
}

impl LeaderboardQuery {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            city: None,
        }
    }

    /// City scope with an empty city falls back to the global board
    pub fn for_activity(activity: ActivityType, scope: &LeaderboardScope) -> Self {
        match scope {
            LeaderboardScope::City(city) if !city.trim().is_empty() => Self {
                key: activity.leaderboard_key(true).to_string(),
                city: Some(city.trim().to_string()),
            },
            _ => Self::new(activity.leaderboard_key(false)),
        }
    }
}
