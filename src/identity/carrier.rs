//! Replicated identity carrier
//!
//! The local store is the source of truth for the user id. A copy is
//! pushed into a cookie so server-rendered views can read the identity
//! the client already established. The carrier is a cache and is
//! refreshed on every identity read.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;
use thiserror::Error;

/// Cookie name carrying the user id
pub const USER_ID_COOKIE: &str = "trophy-fitness-user-id";

/// Cookie lifetime: one year
pub const COOKIE_MAX_AGE_SECS: i64 = 31_536_000;

/// Errors writing the carrier
#[derive(Error, Debug)]
pub enum CarrierError {
    #[error("IO error on {path:?}: {error}")]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Carrier lock poisoned")]
    Poisoned,
}

/// A cookie scoped to the whole application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityCookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub max_age_secs: i64,
    pub same_site: String,
}

impl IdentityCookie {
    /// Cookie carrying the given user id
    pub fn for_user(user_id: &str) -> Self {
        Self {
            name: USER_ID_COOKIE.to_string(),
            value: user_id.to_string(),
            path: "/".to_string(),
            max_age_secs: COOKIE_MAX_AGE_SECS,
            same_site: "Lax".to_string(),
        }
    }

    /// `name=value` pair for a `Cookie` request header
    pub fn header_pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// Renders in `Set-Cookie` form
impl fmt::Display for IdentityCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}; Path={}; Max-Age={}; SameSite={}",
            self.name, self.value, self.path, self.max_age_secs, self.same_site
        )
    }
}

/// Extract a cookie value from a `Cookie` request header
pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Secondary carrier mirroring the identity
pub trait IdentityCarrier: Send + Sync {
    /// Write (or refresh the expiry of) the cookie
    fn replicate(&self, cookie: &IdentityCookie) -> Result<(), CarrierError>;

    /// Current cookie, if one is set and unexpired
    fn current(&self) -> Option<IdentityCookie>;
}

/// Carrier that keeps the cookie in memory and counts refreshes
#[derive(Debug, Default)]
pub struct MemoryCarrier {
    cookie: RwLock<Option<IdentityCookie>>,
    refreshes: RwLock<u64>,
}

impl MemoryCarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times the cookie was written
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.read().map(|n| *n).unwrap_or(0)
    }
}

impl IdentityCarrier for MemoryCarrier {
    fn replicate(&self, cookie: &IdentityCookie) -> Result<(), CarrierError> {
        *self.cookie.write().map_err(|_| CarrierError::Poisoned)? = Some(cookie.clone());
        *self.refreshes.write().map_err(|_| CarrierError::Poisoned)? += 1;
        Ok(())
    }

    fn current(&self) -> Option<IdentityCookie> {
        self.cookie.read().ok().and_then(|c| c.clone())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct JarEntry {
    cookie: IdentityCookie,
    expires_at: DateTime<Utc>,
}

/// Cookie jar persisted to a file, used by the CLI client
#[derive(Debug)]
pub struct CookieJar {
    path: PathBuf,
}

impl CookieJar {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_entry(&self) -> Option<JarEntry> {
        let content = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(path = ?self.path, error = %e, "Ignoring unreadable cookie jar");
                None
            }
        }
    }
}

impl IdentityCarrier for CookieJar {
    fn replicate(&self, cookie: &IdentityCookie) -> Result<(), CarrierError> {
        let entry = JarEntry {
            cookie: cookie.clone(),
            expires_at: Utc::now() + Duration::seconds(cookie.max_age_secs),
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|error| CarrierError::Io {
                path: parent.to_path_buf(),
                error,
            })?;
        }

        let content = serde_json::to_string_pretty(&entry)?;
        fs::write(&self.path, content).map_err(|error| CarrierError::Io {
            path: self.path.clone(),
            error,
        })
    }

    fn current(&self) -> Option<IdentityCookie> {
        self.read_entry()
            .filter(|entry| entry.expires_at > Utc::now())
            .map(|entry| entry.cookie)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_set_cookie_format() {
        let cookie = IdentityCookie::for_user("abc-123");
        assert_eq!(
            cookie.to_string(),
            "trophy-fitness-user-id=abc-123; Path=/; Max-Age=31536000; SameSite=Lax"
        );
        assert_eq!(cookie.header_pair(), "trophy-fitness-user-id=abc-123");
    }

    #[test]
    fn test_cookie_value_parsing() {
        let header = "theme=dark; trophy-fitness-user-id=abc-123 ; other=1";
        assert_eq!(
            cookie_value(header, USER_ID_COOKIE).as_deref(),
            Some("abc-123")
        );
        assert_eq!(cookie_value(header, "missing"), None);
        assert_eq!(cookie_value("trophy-fitness-user-id=", USER_ID_COOKIE), None);
    }

    #[test]
    fn test_cookie_jar_roundtrip() {
        let dir = tempdir().unwrap();
        let jar = CookieJar::new(dir.path().join("cookies.json"));
        assert!(jar.current().is_none());

        jar.replicate(&IdentityCookie::for_user("u-1")).unwrap();
        assert_eq!(jar.current().unwrap().value, "u-1");
    }

    #[test]
    fn test_cookie_jar_drops_expired_entry() {
        let dir = tempdir().unwrap();
        let jar = CookieJar::new(dir.path().join("cookies.json"));

        let mut cookie = IdentityCookie::for_user("u-1");
        cookie.max_age_secs = -1;
        jar.replicate(&cookie).unwrap();

        assert!(jar.current().is_none());
    }
}
