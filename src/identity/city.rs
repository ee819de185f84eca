//! City resolution
//!
//! The user's city feeds city-scoped leaderboards and is attached to
//! every logged activity. An explicit choice is stored locally; without
//! one, the city is guessed from the runtime timezone.

use std::sync::Arc;

use super::store::KeyValueStore;
use super::timezone::TimezoneSource;
use super::IdentityError;

/// Local store key for the city override
pub const CITY_KEY: &str = "trophy-fitness-city";

/// Used when the timezone is unknown or unmapped
pub const DEFAULT_CITY: &str = "London";

/// Timezone identifier to closest major city
static TIMEZONE_TO_CITY: &[(&str, &str)] = &[
    // Americas
    ("America/New_York", "New York"),
    ("America/Chicago", "Chicago"),
    ("America/Denver", "Denver"),
    ("America/Los_Angeles", "Los Angeles"),
    ("America/Phoenix", "Phoenix"),
    ("America/Toronto", "Toronto"),
    ("America/Vancouver", "Vancouver"),
    ("America/Mexico_City", "Mexico City"),
    ("America/Sao_Paulo", "São Paulo"),
    ("America/Buenos_Aires", "Buenos Aires"),
    ("America/Santiago", "Santiago"),
    ("America/Bogota", "Bogotá"),
    ("America/Lima", "Lima"),
    // Europe
    ("Europe/London", "London"),
    ("Europe/Paris", "Paris"),
    ("Europe/Berlin", "Berlin"),
    ("Europe/Madrid", "Madrid"),
    ("Europe/Rome", "Rome"),
    ("Europe/Amsterdam", "Amsterdam"),
    ("Europe/Brussels", "Brussels"),
    ("Europe/Vienna", "Vienna"),
    ("Europe/Stockholm", "Stockholm"),
    ("Europe/Oslo", "Oslo"),
    ("Europe/Copenhagen", "Copenhagen"),
    ("Europe/Helsinki", "Helsinki"),
    ("Europe/Warsaw", "Warsaw"),
    ("Europe/Prague", "Prague"),
    ("Europe/Budapest", "Budapest"),
    ("Europe/Zurich", "Zurich"),
    ("Europe/Dublin", "Dublin"),
    ("Europe/Lisbon", "Lisbon"),
    ("Europe/Athens", "Athens"),
    ("Europe/Istanbul", "Istanbul"),
    ("Europe/Moscow", "Moscow"),
    // Asia
    ("Asia/Tokyo", "Tokyo"),
    ("Asia/Shanghai", "Shanghai"),
    ("Asia/Hong_Kong", "Hong Kong"),
    ("Asia/Singapore", "Singapore"),
    ("Asia/Seoul", "Seoul"),
    ("Asia/Taipei", "Taipei"),
    ("Asia/Bangkok", "Bangkok"),
    ("Asia/Jakarta", "Jakarta"),
    ("Asia/Manila", "Manila"),
    ("Asia/Kuala_Lumpur", "Kuala Lumpur"),
    ("Asia/Ho_Chi_Minh", "Ho Chi Minh City"),
    ("Asia/Mumbai", "Mumbai"),
    ("Asia/Kolkata", "Mumbai"),
    ("Asia/Delhi", "Delhi"),
    ("Asia/Bangalore", "Bangalore"),
    ("Asia/Dubai", "Dubai"),
    ("Asia/Riyadh", "Riyadh"),
    ("Asia/Tel_Aviv", "Tel Aviv"),
    ("Asia/Jerusalem", "Jerusalem"),
    // Oceania
    ("Australia/Sydney", "Sydney"),
    ("Australia/Melbourne", "Melbourne"),
    ("Australia/Brisbane", "Brisbane"),
    ("Australia/Perth", "Perth"),
    ("Pacific/Auckland", "Auckland"),
    // Africa
    ("Africa/Cairo", "Cairo"),
    ("Africa/Johannesburg", "Johannesburg"),
    ("Africa/Lagos", "Lagos"),
    ("Africa/Nairobi", "Nairobi"),
    ("Africa/Casablanca", "Casablanca"),
];

/// Look up the city for a timezone identifier
pub fn city_for_timezone(timezone: &str) -> Option<&'static str> {
    TIMEZONE_TO_CITY
        .iter()
        .find(|(tz, _)| *tz == timezone)
        .map(|(_, city)| *city)
}

/// Resolves and stores the user's city
pub struct CityResolver {
    /// None outside a client context
    store: Option<Arc<dyn KeyValueStore>>,
    timezone: Arc<dyn TimezoneSource>,
}

impl CityResolver {
    /// Resolver backed by the client's local store
    pub fn client(store: Arc<dyn KeyValueStore>, timezone: Arc<dyn TimezoneSource>) -> Self {
        Self {
            store: Some(store),
            timezone,
        }
    }

    /// Resolver without local storage; always answers the timezone default
    pub fn server(timezone: Arc<dyn TimezoneSource>) -> Self {
        Self {
            store: None,
            timezone,
        }
    }

    /// City guessed from the runtime timezone. Never fails.
    pub fn default_city_from_timezone(&self) -> String {
        let city = self
            .timezone
            .timezone()
            .and_then(|tz| city_for_timezone(&tz))
            .unwrap_or(DEFAULT_CITY);
        city.to_string()
    }

    /// Explicitly stored city, if any
    pub fn stored_city(&self) -> Option<String> {
        let store = self.store.as_ref()?;
        match store.get(CITY_KEY) {
            Ok(city) => city.filter(|c| !c.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored city");
                None
            }
        }
    }

    /// Stored city, falling back to the timezone default
    pub fn resolve_city(&self) -> String {
        self.stored_city()
            .unwrap_or_else(|| self.default_city_from_timezone())
    }

    /// Store a city, overwriting any previous choice.
    ///
    /// The caller trims the value. Outside a client context this is a
    /// no-op.
    pub fn set_city(&self, value: &str) -> Result<(), IdentityError> {
        if value.is_empty() {
            return Err(IdentityError::EmptyValue("city"));
        }

        let Some(store) = &self.store else {
            tracing::debug!("Ignoring city update outside a client context");
            return Ok(());
        };

        store.set(CITY_KEY, value)?;
        tracing::debug!(city = %value, "City stored");
        Ok(())
    }

    /// Replace any stored city with the timezone default and return it
    pub fn reset_city_to_detected(&self) -> Result<String, IdentityError> {
        let city = self.default_city_from_timezone();
        self.set_city(&city)?;
        Ok(city)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::store::MemoryStore;
    use crate::identity::timezone::FixedTimezone;

    fn resolver(tz: &str) -> CityResolver {
        CityResolver::client(Arc::new(MemoryStore::new()), Arc::new(FixedTimezone::new(tz)))
    }

    #[test]
    fn test_timezone_lookup() {
        assert_eq!(city_for_timezone("Europe/Paris"), Some("Paris"));
        assert_eq!(city_for_timezone("Asia/Kolkata"), Some("Mumbai"));
        assert_eq!(city_for_timezone("America/Sao_Paulo"), Some("São Paulo"));
        assert_eq!(city_for_timezone("Antarctica/Troll"), None);
    }

    #[test]
    fn test_unmapped_timezone_falls_back_to_london() {
        assert_eq!(resolver("Antarctica/Troll").default_city_from_timezone(), "London");
    }

    #[test]
    fn test_unreadable_timezone_falls_back_to_london() {
        let city = CityResolver::client(
            Arc::new(MemoryStore::new()),
            Arc::new(FixedTimezone::unavailable()),
        );
        assert_eq!(city.resolve_city(), DEFAULT_CITY);
    }

    #[test]
    fn test_set_and_reset_city() {
        let city = resolver("Asia/Tokyo");
        assert_eq!(city.resolve_city(), city.default_city_from_timezone());
        assert_eq!(city.resolve_city(), "Tokyo");

        city.set_city("Paris").unwrap();
        assert_eq!(city.resolve_city(), "Paris");

        assert_eq!(city.reset_city_to_detected().unwrap(), "Tokyo");
        assert_eq!(city.resolve_city(), "Tokyo");
        assert_eq!(city.stored_city().as_deref(), Some("Tokyo"));
    }

    #[test]
    fn test_empty_city_is_rejected() {
        let city = resolver("Europe/Berlin");
        assert!(matches!(city.set_city(""), Err(IdentityError::EmptyValue("city"))));
        assert_eq!(city.resolve_city(), "Berlin");
    }

    #[test]
    fn test_server_context_uses_timezone_default() {
        let city = CityResolver::server(Arc::new(FixedTimezone::new("Europe/Madrid")));
        city.set_city("Paris").unwrap();
        assert_eq!(city.stored_city(), None);
        assert_eq!(city.resolve_city(), "Madrid");
    }
}
