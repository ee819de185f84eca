//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;

use crate::api::error::{ApiError, ApiResult};
use crate::gamification::GamificationApi;

pub use crate::config::ApiConfig;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Upstream gamification API; None when no API key is configured
    pub upstream: Option<Arc<dyn GamificationApi>>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(upstream: Arc<dyn GamificationApi>, config: ApiConfig) -> Self {
        Self {
            upstream: Some(upstream),
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// State for a server started without credentials. Health routes work;
    /// everything relayed answers 503.
    pub fn unconfigured(config: ApiConfig) -> Self {
        Self {
            upstream: None,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn has_upstream(&self) -> bool {
        self.upstream.is_some()
    }

    /// The upstream API, or a configuration error
    pub fn upstream(&self) -> ApiResult<&dyn GamificationApi> {
        self.upstream
            .as_deref()
            .ok_or_else(|| ApiError::NotConfigured("missing gamification API key".to_string()))
    }
}
