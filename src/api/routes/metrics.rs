//! Metric Routes
//!
//! - POST /api/v1/metrics/:key/events - Record a metric increment

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::MetricEventRequest;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::gamification::{MetricEvent, MetricEventResponse};

/// POST /api/v1/metrics/:key/events
pub async fn emit_event(
    State(state): State<Arc<AppState>>,
    Path(metric_key): Path<String>,
    Json(req): Json<MetricEventRequest>,
) -> ApiResult<(StatusCode, Json<MetricEventResponse>)> {
    let upstream = state.upstream()?;
    validate_event(&req)?;

    let event = MetricEvent {
        user_id: req.user_id,
        metric_key,
        value: req.value,
        attributes: req.attributes,
    };
    let response = upstream.emit_metric_event(&event).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

fn validate_event(req: &MetricEventRequest) -> ApiResult<()> {
    if req.user_id.trim().is_empty() {
        return Err(ApiError::Validation("userId cannot be empty".to_string()));
    }
    if !req.value.is_finite() || req.value <= 0.0 {
        return Err(ApiError::Validation(format!(
            "value must be a positive number, got {}",
            req.value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn request(user_id: &str, value: f64) -> MetricEventRequest {
        MetricEventRequest {
            user_id: user_id.to_string(),
            value,
            attributes: HashMap::new(),
        }
    }

    #[test]
    fn test_validate_event() {
        assert!(validate_event(&request("u1", 3.5)).is_ok());
        assert!(validate_event(&request("", 3.5)).is_err());
        assert!(validate_event(&request("u1", 0.0)).is_err());
        assert!(validate_event(&request("u1", f64::NAN)).is_err());
    }
}
