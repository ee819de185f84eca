//! User Routes
//!
//! Relay of identity registration, attribute updates and per-user reads.
//!
//! - POST /api/v1/users - Identify a user
//! - PATCH /api/v1/users/:id - Update user attributes
//! - GET /api/v1/users/:id/streak
//! - GET /api/v1/users/:id/achievements
//! - GET /api/v1/users/:id/points
//! - GET /api/v1/users/:id/metrics

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::gamification::{
    Achievement, AttributeUpdate, MetricTotal, PointsSummary, Streak, UserIdentification,
};

/// POST /api/v1/users
pub async fn identify_user(
    State(state): State<Arc<AppState>>,
    Json(user): Json<UserIdentification>,
) -> ApiResult<StatusCode> {
    let upstream = state.upstream()?;
    if user.id.trim().is_empty() {
        return Err(ApiError::Validation("user id cannot be empty".to_string()));
    }

    upstream.identify_user(&user).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/users/:id
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(update): Json<AttributeUpdate>,
) -> ApiResult<StatusCode> {
    let upstream = state.upstream()?;
    if update.attributes.values().any(|v| v.trim().is_empty()) {
        return Err(ApiError::Validation(
            "attribute values cannot be empty".to_string(),
        ));
    }

    upstream.update_user_attributes(&user_id, &update).await?;
    tracing::debug!(user_id = %user_id, "User attributes relayed");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/users/:id/streak
///
/// `null` when the user has no streak yet.
pub async fn get_streak(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Option<Streak>>> {
    Ok(Json(state.upstream()?.fetch_streak(&user_id).await?))
}

/// GET /api/v1/users/:id/achievements
pub async fn get_achievements(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<Achievement>>> {
    Ok(Json(state.upstream()?.fetch_achievements(&user_id).await?))
}

/// GET /api/v1/users/:id/points
pub async fn get_points(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Option<PointsSummary>>> {
    Ok(Json(state.upstream()?.fetch_points(&user_id).await?))
}

/// GET /api/v1/users/:id/metrics
pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<MetricTotal>>> {
    Ok(Json(state.upstream()?.fetch_metrics(&user_id).await?))
}
