//! Dashboard and profile views
//!
//! Both are computed from a [`UserStats`] snapshot. The relay server
//! renders them as JSON and the CLI prints them.

use serde::{Deserialize, Serialize};

use crate::gamification::{metric_total, Achievement, ActivityType, UserStats};
use crate::levels::{compute_level_info, LevelInfo};

/// Running distance for one activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityTotal {
    pub activity: ActivityType,
    pub metric_key: String,
    pub total: f64,
    pub unit: String,
}

impl ActivityTotal {
    fn all(stats: &UserStats) -> Vec<Self> {
        ActivityType::all()
            .iter()
            .map(|activity| ActivityTotal {
                activity: *activity,
                metric_key: activity.metric_key().to_string(),
                total: metric_total(&stats.metrics, activity.metric_key()),
                unit: activity.unit().to_string(),
            })
            .collect()
    }
}

/// The next locked achievement and what unlocks it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextAchievement {
    pub name: String,
    pub requirement: Option<String>,
}

impl From<&Achievement> for NextAchievement {
    fn from(achievement: &Achievement) -> Self {
        Self {
            name: achievement
                .name
                .clone()
                .unwrap_or_else(|| "Next achievement".to_string()),
            requirement: achievement.requirement(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub user_id: String,
    pub total_xp: i64,
    pub level: LevelInfo,
    pub streak_length: u32,
    pub totals: Vec<ActivityTotal>,
    pub next_achievement: Option<NextAchievement>,
}

impl DashboardView {
    pub fn build(user_id: &str, stats: &UserStats) -> Self {
        let total_xp = stats.total_xp();
        Self {
            user_id: user_id.to_string(),
            total_xp,
            level: compute_level_info(total_xp),
            streak_length: stats.streak_length(),
            totals: ActivityTotal::all(stats),
            next_achievement: stats.next_achievement().map(NextAchievement::from),
        }
    }
}

/// Full profile: level, totals and every achievement split by status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileView {
    pub user_id: String,
    pub total_xp: i64,
    pub level: LevelInfo,
    pub streak_length: u32,
    pub totals: Vec<ActivityTotal>,
    pub earned: Vec<Achievement>,
    pub locked: Vec<Achievement>,
}

impl ProfileView {
    pub fn build(user_id: &str, stats: &UserStats) -> Self {
        let total_xp = stats.total_xp();
        let (earned, locked) = stats
            .achievements
            .iter()
            .cloned()
            .partition(Achievement::is_achieved);

        Self {
            user_id: user_id.to_string(),
            total_xp,
            level: compute_level_info(total_xp),
            streak_length: stats.streak_length(),
            totals: ActivityTotal::all(stats),
            earned,
            locked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_stats;

    #[test]
    fn test_dashboard_from_stats() {
        let view = DashboardView::build("u1", &sample_stats());

        assert_eq!(view.total_xp, 250);
        assert_eq!(view.level.current_level.name, "Mover");
        assert_eq!(view.streak_length, 6);
        assert_eq!(view.totals.len(), 3);
        assert_eq!(view.totals[0].total, 42.5);
        assert_eq!(view.totals[1].total, 0.0);
        assert_eq!(view.totals[2].unit, "m");

        let next = view.next_achievement.unwrap();
        assert_eq!(next.name, "Week Warrior");
        assert_eq!(next.requirement.as_deref(), Some("Maintain a 7-day streak"));
    }

    #[test]
    fn test_empty_stats_render() {
        let view = DashboardView::build("u1", &UserStats::default());
        assert_eq!(view.total_xp, 0);
        assert_eq!(view.level.current_level.level, 1);
        assert_eq!(view.streak_length, 0);
        assert!(view.next_achievement.is_none());
    }

    #[test]
    fn test_profile_splits_achievements() {
        let view = ProfileView::build("u1", &sample_stats());
        assert_eq!(view.earned.len(), 1);
        assert_eq!(view.locked.len(), 1);
        assert_eq!(view.earned[0].name.as_deref(), Some("First Run"));
    }

    #[test]
    fn test_view_json_round_trip() {
        let view = DashboardView::build("u1", &sample_stats());
        let json = serde_json::to_string(&view).unwrap();
        let back: DashboardView = serde_json::from_str(&json).unwrap();
        assert_eq!(back, view);
    }
}
