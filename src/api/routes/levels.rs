//! Level Routes
//!
//! Pure computations; these work without upstream credentials.
//!
//! - GET /api/v1/levels?xp= - Level info for an XP total
//! - GET /api/v1/levels/table - The level table

use axum::{extract::Query, Json};

use crate::api::dto::LevelParams;
use crate::levels::{compute_level_info, LevelInfo, LevelTable};

/// GET /api/v1/levels?xp=
pub async fn get_level(Query(params): Query<LevelParams>) -> Json<LevelInfo> {
    Json(compute_level_info(params.xp))
}

/// GET /api/v1/levels/table
pub async fn get_level_table() -> Json<&'static LevelTable> {
    Json(LevelTable::standard())
}
