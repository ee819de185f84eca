//! Client session
//!
//! Ties the local identity to the gamification API. Local state is
//! always written first; the remote call that follows is best effort and
//! its failure comes back as a notice next to the completed value.

use std::sync::Arc;
use thiserror::Error;

use crate::gamification::{
    ActivityError, ActivityLog, ActivityType, AttributeUpdate, GamificationApi, GamificationError,
    LeaderboardEntry, LeaderboardQuery, LeaderboardScope, MetricEventResponse,
    UserIdentification,
};
use crate::identity::{
    CityResolver, IdentityCarrier, IdentityError, IdentityResolver, KeyValueStore,
    TimezoneSource,
};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Activity(#[from] ActivityError),

    #[error(transparent)]
    Gamification(#[from] GamificationError),
}

/// A completed local operation and the result of syncing it upstream
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome<T> {
    pub value: T,
    /// Set when the upstream sync failed; local state is kept regardless
    pub sync_error: Option<String>,
}

impl<T> SyncOutcome<T> {
    fn from_sync(value: T, result: Result<(), GamificationError>) -> Self {
        Self {
            value,
            sync_error: result.err().map(|e| e.to_string()),
        }
    }

    pub fn is_synced(&self) -> bool {
        self.sync_error.is_none()
    }
}

pub struct ClientSession {
    identity: IdentityResolver,
    city: CityResolver,
    timezone: Arc<dyn TimezoneSource>,
    api: Arc<dyn GamificationApi>,
}

impl ClientSession {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        carrier: Arc<dyn IdentityCarrier>,
        timezone: Arc<dyn TimezoneSource>,
        api: Arc<dyn GamificationApi>,
    ) -> Self {
        Self {
            identity: IdentityResolver::client(Arc::clone(&store), carrier),
            city: CityResolver::client(store, Arc::clone(&timezone)),
            timezone,
            api,
        }
    }

    pub fn identity(&self) -> &IdentityResolver {
        &self.identity
    }

    pub fn city(&self) -> &CityResolver {
        &self.city
    }

    /// Current user id, created on first use
    pub fn user_id(&self) -> Result<String, SessionError> {
        Ok(self.identity.get_or_create_user_id()?)
    }

    /// Establish the identity locally and register it upstream
    pub async fn bootstrap(&self) -> Result<SyncOutcome<String>, SessionError> {
        let user_id = self.user_id()?;
        let user = UserIdentification {
            id: user_id.clone(),
            name: self.identity.get_user_name(),
            tz: self.timezone.timezone(),
        };

        let result = self.api.identify_user(&user).await;
        if let Err(e) = &result {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to identify user upstream");
        }
        Ok(SyncOutcome::from_sync(user_id, result))
    }

    /// Store a new display name, then push it upstream
    pub async fn rename(&self, name: &str) -> Result<SyncOutcome<String>, SessionError> {
        let name = name.trim();
        let user_id = self.user_id()?;
        self.identity.set_user_name(name)?;

        let user = UserIdentification {
            id: user_id.clone(),
            name: Some(name.to_string()),
            tz: self.timezone.timezone(),
        };
        let result = self.api.identify_user(&user).await;
        if let Err(e) = &result {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to sync user name");
        }
        Ok(SyncOutcome::from_sync(name.to_string(), result))
    }

    /// Store a new city, then update the user's city attribute upstream
    pub async fn change_city(&self, value: &str) -> Result<SyncOutcome<String>, SessionError> {
        let city = value.trim();
        self.city.set_city(city)?;
        Ok(self.sync_city(city.to_string()).await?)
    }

    /// Go back to the timezone-detected city
    pub async fn reset_city(&self) -> Result<SyncOutcome<String>, SessionError> {
        let city = self.city.reset_city_to_detected()?;
        Ok(self.sync_city(city).await?)
    }

    async fn sync_city(&self, city: String) -> Result<SyncOutcome<String>, IdentityError> {
        let user_id = self.identity.get_or_create_user_id()?;
        let result = self
            .api
            .update_user_attributes(&user_id, &AttributeUpdate::city(city.as_str()))
            .await;
        if let Err(e) = &result {
            tracing::warn!(user_id = %user_id, city = %city, error = %e, "Failed to sync city");
        }
        Ok(SyncOutcome::from_sync(city, result))
    }

    /// Record a workout. Without an explicit city the resolved city is used.
    pub async fn log_activity(
        &self,
        mut log: ActivityLog,
    ) -> Result<MetricEventResponse, SessionError> {
        if log.city.as_deref().map_or(true, |c| c.trim().is_empty()) {
            log.city = Some(self.city.resolve_city());
        }
        let user_id = self.user_id()?;
        let event = log.to_event(&user_id)?;
        Ok(self.api.emit_metric_event(&event).await?)
    }

    /// Weekly leaderboard for an activity
    pub async fn leaderboard(
        &self,
        activity: ActivityType,
        scope: &LeaderboardScope,
    ) -> Result<Vec<LeaderboardEntry>, SessionError> {
        let query = LeaderboardQuery::for_activity(activity, scope);
        Ok(self.api.fetch_leaderboard(&query).await?)
    }

    /// Leaderboard for the user's own city
    pub async fn city_leaderboard(
        &self,
        activity: ActivityType,
    ) -> Result<Vec<LeaderboardEntry>, SessionError> {
        let scope = LeaderboardScope::City(self.city.resolve_city());
        self.leaderboard(activity, &scope).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamification::Pace;
    use crate::identity::{FixedTimezone, MemoryCarrier, MemoryStore, CITY_KEY};
    use crate::testing::FakeGamification;

    fn session(api: Arc<FakeGamification>) -> (ClientSession, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let session = ClientSession::new(
            store.clone(),
            Arc::new(MemoryCarrier::new()),
            Arc::new(FixedTimezone::new("Europe/Paris")),
            api,
        );
        (session, store)
    }

    #[tokio::test]
    async fn test_bootstrap_identifies_user() {
        let api = Arc::new(FakeGamification::new());
        let (session, _) = session(api.clone());

        let outcome = session.bootstrap().await.unwrap();
        assert!(outcome.is_synced());

        let identified = api.identified.lock().unwrap();
        assert_eq!(identified.len(), 1);
        assert_eq!(identified[0].id, outcome.value);
        assert_eq!(identified[0].tz.as_deref(), Some("Europe/Paris"));
        assert_eq!(identified[0].name, session.identity().get_user_name());
    }

    #[tokio::test]
    async fn test_bootstrap_failure_is_a_notice() {
        let api = Arc::new(FakeGamification::new());
        api.fail_writes();
        let (session, _) = session(api);

        let outcome = session.bootstrap().await.unwrap();
        assert!(outcome.sync_error.is_some());
        assert_eq!(session.identity().stored_user_id(), Some(outcome.value));
    }

    #[tokio::test]
    async fn test_change_city_syncs_attribute() {
        let api = Arc::new(FakeGamification::new());
        let (session, store) = session(api.clone());

        let outcome = session.change_city("  Berlin ").await.unwrap();
        assert_eq!(outcome.value, "Berlin");
        assert!(outcome.is_synced());
        assert_eq!(store.get(CITY_KEY).unwrap().as_deref(), Some("Berlin"));

        let updates = api.attribute_updates.lock().unwrap();
        assert_eq!(updates[0].1.attributes["city"], "Berlin");
    }

    #[tokio::test]
    async fn test_remote_failure_keeps_local_city() {
        let api = Arc::new(FakeGamification::new());
        api.fail_writes();
        let (session, _) = session(api);

        let outcome = session.change_city("Berlin").await.unwrap();
        assert!(!outcome.is_synced());
        assert_eq!(session.city().resolve_city(), "Berlin");
    }

    #[tokio::test]
    async fn test_empty_city_rejected() {
        let api = Arc::new(FakeGamification::new());
        let (session, _) = session(api.clone());

        let err = session.change_city("   ").await.unwrap_err();
        assert!(matches!(err, SessionError::Identity(IdentityError::EmptyValue(_))));
        assert!(api.attribute_updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_city_uses_timezone() {
        let api = Arc::new(FakeGamification::new());
        let (session, _) = session(api);

        session.change_city("Berlin").await.unwrap();
        let outcome = session.reset_city().await.unwrap();
        assert_eq!(outcome.value, "Paris");
        assert_eq!(session.city().resolve_city(), "Paris");
    }

    #[tokio::test]
    async fn test_rename_keeps_local_name_on_failure() {
        let api = Arc::new(FakeGamification::new());
        api.fail_writes();
        let (session, _) = session(api);

        let outcome = session.rename(" SwiftHeron42 ").await.unwrap();
        assert!(!outcome.is_synced());
        assert_eq!(session.identity().get_user_name().as_deref(), Some("SwiftHeron42"));
    }

    #[tokio::test]
    async fn test_log_activity_uses_resolved_city() {
        let api = Arc::new(FakeGamification::new());
        let (session, _) = session(api.clone());

        let log = ActivityLog::new(ActivityType::Run, 5.0).pace(Pace::Walk);
        let response = session.log_activity(log).await.unwrap();
        assert_eq!(response.total, Some(5.0));

        let events = api.events.lock().unwrap();
        assert_eq!(events[0].attributes["city"], "Paris");
        assert_eq!(events[0].attributes["pace"], "walk");
        assert_eq!(Some(events[0].user_id.clone()), session.identity().stored_user_id());
    }

    #[tokio::test]
    async fn test_invalid_distance_sends_nothing() {
        let api = Arc::new(FakeGamification::new());
        let (session, _) = session(api.clone());

        let err = session
            .log_activity(ActivityLog::new(ActivityType::Swim, -1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Activity(ActivityError::InvalidDistance(_))));
        assert!(api.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_city_leaderboard_query() {
        let api = Arc::new(FakeGamification::new());
        let (session, _) = session(api.clone());

        session.city_leaderboard(ActivityType::Cycle).await.unwrap();
        session
            .leaderboard(ActivityType::Cycle, &LeaderboardScope::Global)
            .await
            .unwrap();

        let queries = api.leaderboard_queries.lock().unwrap();
        assert_eq!(queries[0].key, "weekly-distance-cycled-cities");
        assert_eq!(queries[0].city.as_deref(), Some("Paris"));
        assert_eq!(queries[1].city, None);
    }
}
