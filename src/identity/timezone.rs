//! Runtime timezone detection

/// Source of the runtime's IANA timezone identifier
pub trait TimezoneSource: Send + Sync {
    /// Resolved identifier such as "Europe/Paris", or None if unknown
    fn timezone(&self) -> Option<String>;
}

/// Reads the host timezone.
///
/// `TZ` wins when set; otherwise the platform setting is queried through
/// `iana-time-zone`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimezone;

impl TimezoneSource for SystemTimezone {
    fn timezone(&self) -> Option<String> {
        if let Some(tz) = std::env::var("TZ").ok().and_then(|tz| normalize(&tz)) {
            return Some(tz);
        }

        match iana_time_zone::get_timezone() {
            Ok(tz) => normalize(&tz),
            Err(e) => {
                tracing::debug!(error = %e, "Host timezone unavailable");
                None
            }
        }
    }
}

/// Always reports the same timezone
#[derive(Debug, Clone)]
pub struct FixedTimezone(pub Option<String>);

impl FixedTimezone {
    pub fn new(tz: impl Into<String>) -> Self {
        Self(Some(tz.into()))
    }

    /// A source whose lookup always fails
    pub fn unavailable() -> Self {
        Self(None)
    }
}

impl TimezoneSource for FixedTimezone {
    fn timezone(&self) -> Option<String> {
        self.0.clone()
    }
}

fn normalize(raw: &str) -> Option<String> {
    // POSIX allows a leading ':' on TZ
    let tz = raw.trim().trim_start_matches(':');
    if tz.is_empty() {
        None
    } else {
        Some(tz.to_string())
    }
}
