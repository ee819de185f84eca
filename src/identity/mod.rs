//! Local Identity
//!
//! Anonymous per-client identity and best-guess location.
//!
//! ## Records
//!
//! - **Primary record**: user id and display name in the local
//!   [`KeyValueStore`]. Authoritative.
//! - **Replicated carrier**: the user id mirrored into a cookie through an
//!   [`IdentityCarrier`], refreshed after every identity read so
//!   server-rendered views see the same id.
//!
//! ## Lifecycle
//!
//! The identity is absent until the first [`IdentityResolver::get_or_create_user_id`]
//! call in a client context, then established for good. There is no delete.
//! Two processes bootstrapping at the same instant may each generate an id;
//! the last write wins.

mod carrier;
mod city;
mod names;
mod store;
mod timezone;

pub use carrier::{
    cookie_value, CarrierError, CookieJar, IdentityCarrier, IdentityCookie, MemoryCarrier,
    COOKIE_MAX_AGE_SECS, USER_ID_COOKIE,
};
pub use city::{city_for_timezone, CityResolver, CITY_KEY, DEFAULT_CITY};
pub use names::{generate_display_name, generate_display_name_with, ADJECTIVES, NOUNS};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use timezone::{FixedTimezone, SystemTimezone, TimezoneSource};

use std::sync::Arc;
use thiserror::Error;

/// Local store key for the user id
pub const USER_ID_KEY: &str = "trophy-fitness-user-id";

/// Local store key for the display name
pub const USER_NAME_KEY: &str = "trophy-fitness-user-name";

/// Errors from identity and city operations
#[derive(Error, Debug)]
pub enum IdentityError {
    /// Operation needs client-local storage but none is wired
    #[error("{0} can only be called in a client context")]
    ClientContextRequired(&'static str),

    #[error("Local store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0} cannot be empty")]
    EmptyValue(&'static str),
}

struct ClientContext {
    store: Arc<dyn KeyValueStore>,
    carrier: Arc<dyn IdentityCarrier>,
}

/// Creates and reads the anonymous identity
pub struct IdentityResolver {
    client: Option<ClientContext>,
}

impl IdentityResolver {
    /// Resolver with a local store and cookie carrier
    pub fn client(store: Arc<dyn KeyValueStore>, carrier: Arc<dyn IdentityCarrier>) -> Self {
        Self {
            client: Some(ClientContext { store, carrier }),
        }
    }

    /// Resolver without local storage
    pub fn server() -> Self {
        Self { client: None }
    }

    pub fn is_client(&self) -> bool {
        self.client.is_some()
    }

    /// Return the stored user id, creating the identity on first use.
    ///
    /// A new id is written together with a generated display name. The
    /// cookie carrier is refreshed on every call.
    pub fn get_or_create_user_id(&self) -> Result<String, IdentityError> {
        let client = self
            .client
            .as_ref()
            .ok_or(IdentityError::ClientContextRequired("get_or_create_user_id"))?;

        let user_id = match client.store.get(USER_ID_KEY)?.filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                let name = generate_display_name();
                // The id marks the identity as established, so it goes last
                client.store.set(USER_NAME_KEY, &name)?;
                client.store.set(USER_ID_KEY, &id)?;
                tracing::info!(user_id = %id, user_name = %name, "Created anonymous identity");
                id
            }
        };

        Self::sync_carrier(client, &user_id);
        Ok(user_id)
    }

    /// Stored user id without creating one
    pub fn stored_user_id(&self) -> Option<String> {
        self.read(USER_ID_KEY)
    }

    /// Stored display name
    pub fn get_user_name(&self) -> Option<String> {
        self.read(USER_NAME_KEY)
    }

    /// Replace the display name. No-op outside a client context.
    pub fn set_user_name(&self, name: &str) -> Result<(), IdentityError> {
        if name.is_empty() {
            return Err(IdentityError::EmptyValue("user name"));
        }
        match &self.client {
            Some(client) => Ok(client.store.set(USER_NAME_KEY, name)?),
            None => Ok(()),
        }
    }

    /// Cookie currently held by the carrier
    pub fn carrier_cookie(&self) -> Option<IdentityCookie> {
        self.client.as_ref().and_then(|c| c.carrier.current())
    }

    fn read(&self, key: &str) -> Option<String> {
        let client = self.client.as_ref()?;
        match client.store.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read local store");
                None
            }
        }
    }

    /// The cookie is a cache of the local record, so a failed write is
    /// logged and otherwise ignored.
    fn sync_carrier(client: &ClientContext, user_id: &str) {
        let cookie = IdentityCookie::for_user(user_id);
        if let Err(e) = client.carrier.replicate(&cookie) {
            tracing::warn!(error = %e, "Failed to refresh identity cookie");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> (IdentityResolver, Arc<MemoryStore>, Arc<MemoryCarrier>) {
        let store = Arc::new(MemoryStore::new());
        let carrier = Arc::new(MemoryCarrier::new());
        let resolver = IdentityResolver::client(store.clone(), carrier.clone());
        (resolver, store, carrier)
    }

    #[test]
    fn test_user_id_is_stable() {
        let (identity, _, _) = client();
        assert!(identity.stored_user_id().is_none());
        assert!(identity.get_user_name().is_none());

        let first = identity.get_or_create_user_id().unwrap();
        let second = identity.get_or_create_user_id().unwrap();

        assert_eq!(first, second);
        assert!(uuid::Uuid::parse_str(&first).is_ok());
        assert_eq!(identity.stored_user_id(), Some(first));
    }

    #[test]
    fn test_name_created_once_with_id() {
        let (identity, store, _) = client();
        identity.get_or_create_user_id().unwrap();
        let name = identity.get_user_name().unwrap();

        identity.get_or_create_user_id().unwrap();
        assert_eq!(identity.get_user_name(), Some(name.clone()));
        assert_eq!(store.get(USER_NAME_KEY).unwrap(), Some(name));
    }

    /// Memory store that refuses writes to one key
    struct RefusingStore {
        inner: MemoryStore,
        refused: std::sync::Mutex<Option<&'static str>>,
    }

    impl KeyValueStore for RefusingStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            if *self.refused.lock().unwrap() == Some(key) {
                return Err(StoreError::Io {
                    path: "local.json".into(),
                    error: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                });
            }
            self.inner.set(key, value)
        }
    }

    #[test]
    fn test_failed_name_write_leaves_identity_unestablished() {
        let store = Arc::new(RefusingStore {
            inner: MemoryStore::new(),
            refused: std::sync::Mutex::new(Some(USER_NAME_KEY)),
        });
        let identity = IdentityResolver::client(store.clone(), Arc::new(MemoryCarrier::new()));

        assert!(identity.get_or_create_user_id().is_err());
        assert!(identity.stored_user_id().is_none());

        *store.refused.lock().unwrap() = None;
        let retried = IdentityResolver::client(store.clone(), Arc::new(MemoryCarrier::new()));
        let id = retried.get_or_create_user_id().unwrap();

        assert_eq!(retried.stored_user_id(), Some(id));
        assert!(retried.get_user_name().is_some());
    }

    #[test]
    fn test_existing_id_is_reused() {
        let (identity, store, _) = client();
        store.set(USER_ID_KEY, "existing-id").unwrap();

        assert_eq!(identity.get_or_create_user_id().unwrap(), "existing-id");
        // An existing identity does not gain a generated name
        assert!(identity.get_user_name().is_none());
    }

    #[test]
    fn test_carrier_refreshed_on_every_call() {
        let (identity, _, carrier) = client();
        let id = identity.get_or_create_user_id().unwrap();
        identity.get_or_create_user_id().unwrap();
        identity.get_or_create_user_id().unwrap();

        assert_eq!(carrier.refresh_count(), 3);
        let cookie = identity.carrier_cookie().unwrap();
        assert_eq!(cookie.value, id);
        assert_eq!(cookie.path, "/");
        assert_eq!(cookie.max_age_secs, COOKIE_MAX_AGE_SECS);
    }

    #[test]
    fn test_server_context_cannot_create_identity() {
        let identity = IdentityResolver::server();
        let err = identity.get_or_create_user_id().unwrap_err();
        assert!(matches!(err, IdentityError::ClientContextRequired(_)));
        assert!(identity.get_user_name().is_none());
        assert!(identity.carrier_cookie().is_none());
    }

    #[test]
    fn test_rename() {
        let (identity, _, _) = client();
        identity.get_or_create_user_id().unwrap();
        identity.set_user_name("IronOtter12").unwrap();
        assert_eq!(identity.get_user_name().as_deref(), Some("IronOtter12"));
        assert!(identity.set_user_name("").is_err());
    }
}
