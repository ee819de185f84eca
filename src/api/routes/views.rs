//! View Routes
//!
//! Server-rendered views have no local store; the user is identified by
//! the `trophy-fitness-user-id` cookie the client keeps refreshed.
//!
//! - GET /api/v1/dashboard
//! - GET /api/v1/profile

use axum::{
    extract::State,
    http::{header::COOKIE, HeaderMap},
    Json,
};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::gamification::fetch_user_stats;
use crate::identity::{cookie_value, USER_ID_COOKIE};
use crate::views::{DashboardView, ProfileView};

/// GET /api/v1/dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<DashboardView>> {
    let upstream = state.upstream()?;
    let user_id = user_from_cookie(&headers)?;

    let stats = fetch_user_stats(upstream, &user_id).await;
    Ok(Json(DashboardView::build(&user_id, &stats)))
}

/// GET /api/v1/profile
pub async fn profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<ProfileView>> {
    let upstream = state.upstream()?;
    let user_id = user_from_cookie(&headers)?;

    let stats = fetch_user_stats(upstream, &user_id).await;
    Ok(Json(ProfileView::build(&user_id, &stats)))
}

fn user_from_cookie(headers: &HeaderMap) -> ApiResult<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|header| cookie_value(header, USER_ID_COOKIE))
        .ok_or(ApiError::MissingIdentity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_user_from_cookie() {
        let mut headers = HeaderMap::new();
        assert!(matches!(user_from_cookie(&headers), Err(ApiError::MissingIdentity)));

        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; trophy-fitness-user-id=abc-123"),
        );
        assert_eq!(user_from_cookie(&headers).unwrap(), "abc-123");
    }
}
