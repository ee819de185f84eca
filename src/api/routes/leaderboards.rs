//! Leaderboard Routes
//!
//! - GET /api/v1/leaderboards/:key?city= - Rankings, optionally for one city

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{LeaderboardParams, LeaderboardResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::gamification::LeaderboardQuery;

/// GET /api/v1/leaderboards/:key
pub async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(params): Query<LeaderboardParams>,
) -> ApiResult<Json<LeaderboardResponse>> {
    let upstream = state.upstream()?;

    let query = LeaderboardQuery {
        key,
        city: params
            .city
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
    };
    let rankings = upstream.fetch_leaderboard(&query).await?;

    Ok(Json(LeaderboardResponse {
        key: query.key,
        city: query.city,
        rankings,
    }))
}
