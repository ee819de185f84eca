//! Relay client
//!
//! [`GamificationApi`] binding used by the CLI. Calls go to the relay
//! server, which holds the upstream API key, and carry the identity
//! cookie so the server-side views can tell who is asking.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::Method;
use std::sync::Arc;
use urlencoding::encode;

use crate::api::dto::{LeaderboardResponse, MetricEventRequest};
use crate::api::error::ErrorResponse;
use crate::gamification::transport::HttpTransport;
use crate::gamification::{
    Achievement, AttributeUpdate, GamificationApi, GamificationError, LeaderboardEntry,
    LeaderboardQuery, MetricEvent, MetricEventResponse, MetricTotal, PointsSummary, Streak,
    UserIdentification,
};
use crate::identity::IdentityCarrier;
use crate::views::{DashboardView, ProfileView};

const API_PREFIX: &str = "/api/v1";

pub struct RelayClient {
    transport: HttpTransport,
    carrier: Arc<dyn IdentityCarrier>,
}

impl RelayClient {
    pub fn new(
        server_url: &str,
        request_timeout_ms: u64,
        carrier: Arc<dyn IdentityCarrier>,
    ) -> Result<Self, GamificationError> {
        let base_url = format!("{}{}", server_url.trim_end_matches('/'), API_PREFIX);
        let transport = HttpTransport::new(&base_url, HeaderMap::new(), request_timeout_ms, 2, 250)?;
        Ok(Self { transport, carrier })
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    /// Dashboard for the user named by the identity cookie
    pub async fn dashboard(&self) -> Result<DashboardView, GamificationError> {
        self.view("/dashboard").await
    }

    /// Profile for the user named by the identity cookie
    pub async fn profile(&self) -> Result<ProfileView, GamificationError> {
        self.view("/profile").await
    }

    async fn view<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, GamificationError> {
        let view: Option<T> = self
            .transport
            .get_optional(path, &[], self.cookie_headers())
            .await
            .map_err(relay_error)?;
        view.ok_or_else(|| GamificationError::ApiError {
            status: 404,
            message: format!("{path} not found on relay server"),
        })
    }

    fn cookie_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let Some(cookie) = self.carrier.current() else {
            return headers;
        };
        match HeaderValue::from_str(&cookie.header_pair()) {
            Ok(value) => {
                headers.insert(COOKIE, value);
            }
            Err(e) => tracing::warn!(error = %e, "Identity cookie is not a valid header"),
        }
        headers
    }
}

/// Replace a relay error body with the message it carries
fn relay_error(error: GamificationError) -> GamificationError {
    match error {
        GamificationError::ApiError { status, message } => {
            let message = serde_json::from_str::<ErrorResponse>(&message)
                .map(|body| body.error.message)
                .unwrap_or(message);
            GamificationError::ApiError { status, message }
        }
        other => other,
    }
}

#[async_trait]
impl GamificationApi for RelayClient {
    async fn identify_user(&self, user: &UserIdentification) -> Result<(), GamificationError> {
        self.transport
            .send(Method::POST, "/users", user, self.cookie_headers())
            .await
            .map_err(relay_error)
    }

    async fn update_user_attributes(
        &self,
        user_id: &str,
        update: &AttributeUpdate,
    ) -> Result<(), GamificationError> {
        let path = format!("/users/{}", encode(user_id));
        self.transport
            .send(Method::PATCH, &path, update, self.cookie_headers())
            .await
            .map_err(relay_error)
    }

    async fn emit_metric_event(
        &self,
        event: &MetricEvent,
    ) -> Result<MetricEventResponse, GamificationError> {
        let path = format!("/metrics/{}/events", encode(&event.metric_key));
        let body = MetricEventRequest {
            user_id: event.user_id.clone(),
            value: event.value,
            attributes: event.attributes.clone(),
        };
        self.transport
            .send_json(Method::POST, &path, &body, self.cookie_headers())
            .await
            .map_err(relay_error)
    }

    async fn fetch_streak(&self, user_id: &str) -> Result<Option<Streak>, GamificationError> {
        let path = format!("/users/{}/streak", encode(user_id));
        let streak: Option<Option<Streak>> = self
            .transport
            .get_optional(&path, &[], self.cookie_headers())
            .await
            .map_err(relay_error)?;
        Ok(streak.flatten())
    }

    async fn fetch_achievements(
        &self,
        user_id: &str,
    ) -> Result<Vec<Achievement>, GamificationError> {
        let path = format!("/users/{}/achievements", encode(user_id));
        let achievements: Option<Vec<Achievement>> = self
            .transport
            .get_optional(&path, &[], self.cookie_headers())
            .await
            .map_err(relay_error)?;
        Ok(achievements.unwrap_or_default())
    }

    async fn fetch_points(&self, user_id: &str) -> Result<Option<PointsSummary>, GamificationError> {
        let path = format!("/users/{}/points", encode(user_id));
        let points: Option<Option<PointsSummary>> = self
            .transport
            .get_optional(&path, &[], self.cookie_headers())
            .await
            .map_err(relay_error)?;
        Ok(points.flatten())
    }

    async fn fetch_metrics(&self, user_id: &str) -> Result<Vec<MetricTotal>, GamificationError> {
        let path = format!("/users/{}/metrics", encode(user_id));
        let metrics: Option<Vec<MetricTotal>> = self
            .transport
            .get_optional(&path, &[], self.cookie_headers())
            .await
            .map_err(relay_error)?;
        Ok(metrics.unwrap_or_default())
    }

    async fn fetch_leaderboard(
        &self,
        query: &LeaderboardQuery,
    ) -> Result<Vec<LeaderboardEntry>, GamificationError> {
        let path = format!("/leaderboards/{}", encode(&query.key));
        let params: Vec<(&str, String)> = query
            .city
            .iter()
            .map(|city| ("city", city.clone()))
            .collect();

        let response: Option<LeaderboardResponse> = self
            .transport
            .get_optional(&path, &params, self.cookie_headers())
            .await
            .map_err(relay_error)?;
        Ok(response.map(|r| r.rankings).unwrap_or_default())
    }
}
