//! Gamification REST API Client
//!
//! HTTP binding of [`GamificationApi`] to the upstream service. The API
//! key is sent with every request as `X-API-KEY`.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use urlencoding::encode;

use super::transport::HttpTransport;
use super::{
    Achievement, AttributeUpdate, GamificationApi, GamificationError, LeaderboardEntry,
    LeaderboardQuery, MetricEvent, MetricEventResponse, MetricTotal, PointsSummary, Streak,
    UserIdentification,
};

/// Configuration for the upstream client
#[derive(Debug, Clone)]
pub struct GamificationConfig {
    /// Base URL, e.g. "https://api.trophy.so/v1"
    pub base_url: String,
    pub api_key: String,
    /// Points system holding the user's XP
    pub points_system: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Maximum attempts per request
    pub max_retries: u32,
    /// Base delay between attempts in milliseconds
    pub retry_backoff_ms: u64,
}

impl Default for GamificationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.trophy.so/v1".to_string(),
            api_key: String::new(),
            points_system: "xp".to_string(),
            request_timeout_ms: 5000,
            max_retries: 3,
            retry_backoff_ms: 1000,
        }
    }
}

/// Upstream gamification client
pub struct GamificationClient {
    transport: HttpTransport,
    config: GamificationConfig,
}

impl GamificationClient {
    /// Create a client; fails without an API key
    pub fn new(config: GamificationConfig) -> Result<Self, GamificationError> {
        if config.api_key.trim().is_empty() {
            return Err(GamificationError::NotConfigured(
                "missing gamification API key".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(config.api_key.trim())
            .map_err(|e| GamificationError::NotConfigured(format!("invalid API key: {e}")))?;
        headers.insert("X-API-KEY", key);

        let transport = HttpTransport::new(
            &config.base_url,
            headers,
            config.request_timeout_ms,
            config.max_retries,
            config.retry_backoff_ms,
        )?;

        Ok(Self { transport, config })
    }

    pub fn config(&self) -> &GamificationConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }
}

#[async_trait]
impl GamificationApi for GamificationClient {
    async fn identify_user(&self, user: &UserIdentification) -> Result<(), GamificationError> {
        self.transport
            .send(Method::POST, "/users", user, HeaderMap::new())
            .await?;
        tracing::debug!(user_id = %user.id, "Identified user");
        Ok(())
    }

    async fn update_user_attributes(
        &self,
        user_id: &str,
        update: &AttributeUpdate,
    ) -> Result<(), GamificationError> {
        let path = format!("/users/{}", encode(user_id));
        self.transport
            .send(Method::PATCH, &path, update, HeaderMap::new())
            .await
    }

    async fn emit_metric_event(
        &self,
        event: &MetricEvent,
    ) -> Result<MetricEventResponse, GamificationError> {
        let path = format!("/metrics/{}/event", encode(&event.metric_key));
        let body = UpstreamEvent {
            user: UpstreamUser {
                id: &event.user_id,
            },
            value: event.value,
            attributes: &event.attributes,
        };

        let response: MetricEventResponse = self
            .transport
            .send_json(Method::POST, &path, &body, HeaderMap::new())
            .await?;

        tracing::info!(
            user_id = %event.user_id,
            metric = %event.metric_key,
            value = event.value,
            "Metric event recorded"
        );
        Ok(response)
    }

    async fn fetch_streak(&self, user_id: &str) -> Result<Option<Streak>, GamificationError> {
        let path = format!("/users/{}/streak", encode(user_id));
        self.transport.get_optional(&path, &[], HeaderMap::new()).await
    }

    async fn fetch_achievements(
        &self,
        user_id: &str,
    ) -> Result<Vec<Achievement>, GamificationError> {
        let path = format!("/users/{}/achievements", encode(user_id));
        let query = [("includeIncomplete", "true".to_string())];
        let achievements: Option<Vec<Achievement>> = self
            .transport
            .get_optional(&path, &query, HeaderMap::new())
            .await?;
        Ok(achievements.unwrap_or_default())
    }

    async fn fetch_points(&self, user_id: &str) -> Result<Option<PointsSummary>, GamificationError> {
        let path = format!(
            "/users/{}/points/{}",
            encode(user_id),
            encode(&self.config.points_system)
        );
        self.transport.get_optional(&path, &[], HeaderMap::new()).await
    }

    async fn fetch_metrics(&self, user_id: &str) -> Result<Vec<MetricTotal>, GamificationError> {
        let path = format!("/users/{}/metrics", encode(user_id));
        let metrics: Option<Vec<MetricTotal>> = self
            .transport
            .get_optional(&path, &[], HeaderMap::new())
            .await?;
        Ok(metrics.unwrap_or_default())
    }

    async fn fetch_leaderboard(
        &self,
        query: &LeaderboardQuery,
    ) -> Result<Vec<LeaderboardEntry>, GamificationError> {
        let path = format!("/leaderboards/{}", encode(&query.key));
        let params: Vec<(&str, String)> = query
            .city
            .as_ref()
            .map(|city| vec![("userAttributes", format!("city:{city}"))])
            .unwrap_or_default();

        let payload: Option<LeaderboardPayload> = self
            .transport
            .get_optional(&path, &params, HeaderMap::new())
            .await?;
        Ok(payload.map(LeaderboardPayload::into_entries).unwrap_or_default())
    }
}

// ============================================
// Upstream wire shapes
// ============================================

#[derive(Serialize)]
struct UpstreamUser<'a> {
    id: &'a str,
}

#[derive(Serialize)]
struct UpstreamEvent<'a> {
    user: UpstreamUser<'a>,
    value: f64,
    #[serde(skip_serializing_if = "no_attributes")]
    attributes: &'a HashMap<String, String>,
}

fn no_attributes(attributes: &&HashMap<String, String>) -> bool {
    attributes.is_empty()
}

/// Leaderboards arrive either as a bare list or wrapped in `rankings`
#[derive(Deserialize)]
#[serde(untagged)]
enum LeaderboardPayload {
    List(Vec<LeaderboardEntry>),
    Wrapped {
        #[serde(default)]
        rankings: Vec<LeaderboardEntry>,
    },
}

impl LeaderboardPayload {
    fn into_entries(self) -> Vec<LeaderboardEntry> {
        match self {
            LeaderboardPayload::List(entries) => entries,
            LeaderboardPayload::Wrapped { rankings } => rankings,
        }
    }
}
