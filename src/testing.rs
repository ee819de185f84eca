//! In-memory gamification double shared by unit tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::gamification::{
    Achievement, AttributeUpdate, GamificationApi, GamificationError, LeaderboardEntry,
    LeaderboardQuery, MetricEvent, MetricEventResponse, MetricTotal, PointsSummary, Streak,
    UserIdentification, UserStats,
};

/// Records writes and answers reads from canned stats
#[derive(Default)]
pub(crate) struct FakeGamification {
    pub stats: UserStats,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub identified: Mutex<Vec<UserIdentification>>,
    pub attribute_updates: Mutex<Vec<(String, AttributeUpdate)>>,
    pub events: Mutex<Vec<MetricEvent>>,
    pub leaderboard_queries: Mutex<Vec<LeaderboardQuery>>,
    fail_writes: AtomicBool,
    fail_streak: AtomicBool,
}

impl FakeGamification {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stats(stats: UserStats) -> Self {
        Self {
            stats,
            ..Self::default()
        }
    }

    pub fn with_leaderboard(leaderboard: Vec<LeaderboardEntry>) -> Self {
        Self {
            leaderboard,
            ..Self::default()
        }
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn fail_streak(&self) {
        self.fail_streak.store(true, Ordering::SeqCst);
    }

    fn check_write(&self) -> Result<(), GamificationError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(GamificationError::Unavailable);
        }
        Ok(())
    }
}

#[async_trait]
impl GamificationApi for FakeGamification {
    async fn identify_user(&self, user: &UserIdentification) -> Result<(), GamificationError> {
        self.check_write()?;
        self.identified.lock().unwrap().push(user.clone());
        Ok(())
    }

    async fn update_user_attributes(
        &self,
        user_id: &str,
        update: &AttributeUpdate,
    ) -> Result<(), GamificationError> {
        self.check_write()?;
        self.attribute_updates
            .lock()
            .unwrap()
            .push((user_id.to_string(), update.clone()));
        Ok(())
    }

    async fn emit_metric_event(
        &self,
        event: &MetricEvent,
    ) -> Result<MetricEventResponse, GamificationError> {
        self.check_write()?;
        self.events.lock().unwrap().push(event.clone());
        Ok(MetricEventResponse {
            total: Some(event.value),
            ..Default::default()
        })
    }

    async fn fetch_streak(&self, _user_id: &str) -> Result<Option<Streak>, GamificationError> {
        if self.fail_streak.load(Ordering::SeqCst) {
            return Err(GamificationError::Timeout);
        }
        Ok(self.stats.streak.clone())
    }

    async fn fetch_achievements(
        &self,
        _user_id: &str,
    ) -> Result<Vec<Achievement>, GamificationError> {
        Ok(self.stats.achievements.clone())
    }

    async fn fetch_points(&self, _user_id: &str) -> Result<Option<PointsSummary>, GamificationError> {
        Ok(self.stats.points.clone())
    }

    async fn fetch_metrics(&self, _user_id: &str) -> Result<Vec<MetricTotal>, GamificationError> {
        Ok(self.stats.metrics.clone())
    }

    async fn fetch_leaderboard(
        &self,
        query: &LeaderboardQuery,
    ) -> Result<Vec<LeaderboardEntry>, GamificationError> {
        self.leaderboard_queries.lock().unwrap().push(query.clone());
        Ok(self.leaderboard.clone())
    }
}

/// Stats for a mid-level user with one earned and one locked achievement
pub(crate) fn sample_stats() -> UserStats {
    UserStats {
        streak: Some(Streak {
            length: Some(6),
            frequency: Some("daily".to_string()),
            ..Default::default()
        }),
        achievements: vec![
            Achievement {
                name: Some("First Run".to_string()),
                trigger: Some("metric".to_string()),
                metric_name: Some("km run".to_string()),
                metric_value: Some(1.0),
                achieved_at: Some("2026-01-04T08:00:00Z".to_string()),
                ..Default::default()
            },
            Achievement {
                name: Some("Week Warrior".to_string()),
                trigger: Some("streak".to_string()),
                streak_length: Some(7),
                ..Default::default()
            },
        ],
        points: Some(PointsSummary {
            total: Some(250),
            added: Some(10),
        }),
        metrics: vec![
            MetricTotal {
                key: Some("distance_run".to_string()),
                current: Some(42.5),
                ..Default::default()
            },
            MetricTotal {
                key: Some("distance_swum".to_string()),
                current: Some(1500.0),
                ..Default::default()
            },
        ],
    }
}
