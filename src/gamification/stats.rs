//! Per-user stats aggregation

use super::{GamificationApi, UserStats};

/// Fetch streak, achievements, points and metrics concurrently.
///
/// A failed read is logged and left empty so one unavailable endpoint
/// does not blank the whole view.
pub async fn fetch_user_stats(api: &dyn GamificationApi, user_id: &str) -> UserStats {
    let (streak, achievements, points, metrics) = tokio::join!(
        api.fetch_streak(user_id),
        api.fetch_achievements(user_id),
        api.fetch_points(user_id),
        api.fetch_metrics(user_id),
    );

    UserStats {
        streak: streak.unwrap_or_else(|e| {
            tracing::warn!(user_id, error = %e, "Failed to fetch streak");
            None
        }),
        achievements: achievements.unwrap_or_else(|e| {
            tracing::warn!(user_id, error = %e, "Failed to fetch achievements");
            Vec::new()
        }),
        points: points.unwrap_or_else(|e| {
            tracing::warn!(user_id, error = %e, "Failed to fetch points");
            None
        }),
        metrics: metrics.unwrap_or_else(|e| {
            tracing::warn!(user_id, error = %e, "Failed to fetch metrics");
            Vec::new()
        }),
    }
}
