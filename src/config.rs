//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::gamification::GamificationConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub gamification: GamificationSection,

    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Relay server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins; empty allows any
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Upstream gamification API settings
#[derive(Debug, Clone, Deserialize)]
pub struct GamificationSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Secret; only the relay server needs it
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_points_system")]
    pub points_system: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
}

fn default_base_url() -> String {
    "https://api.trophy.so/v1".to_string()
}

fn default_points_system() -> String {
    "xp".to_string()
}

fn default_request_timeout() -> u64 {
    5000
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    1000
}

impl Default for GamificationSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            points_system: default_points_system(),
            request_timeout_ms: default_request_timeout(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff(),
        }
    }
}

impl GamificationSection {
    /// Client settings, or None without a usable API key
    pub fn client_config(&self) -> Option<GamificationConfig> {
        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())?;

        Some(GamificationConfig {
            base_url: self.base_url.clone(),
            api_key: api_key.to_string(),
            points_system: self.points_system.clone(),
            request_timeout_ms: self.request_timeout_ms,
            max_retries: self.max_retries,
            retry_backoff_ms: self.retry_backoff_ms,
        })
    }
}

/// CLI client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Directory holding the local identity store and cookie jar
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Relay server the CLI talks to
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Timezone override, e.g. "Europe/Paris"
    #[serde(default)]
    pub timezone: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("trophy-fitness").to_string_lossy().to_string())
        .unwrap_or_else(|| "./trophy_fitness_data".to_string())
}

fn default_server_url() -> String {
    "http://localhost:8082".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            server_url: default_server_url(),
            timezone: None,
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl ClientConfig {
    pub fn store_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join("local.json")
    }

    pub fn cookie_jar_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join("cookies.json")
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("trophy-fitness").join("config.toml")),
            Some(PathBuf::from("/etc/trophy-fitness/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // API overrides
        if let Some(host) = var("TROPHY_FITNESS_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = var("TROPHY_FITNESS_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        // Gamification overrides
        if let Some(key) = var("TROPHY_API_KEY") {
            self.gamification.api_key = Some(key);
        }
        if let Some(url) = var("TROPHY_FITNESS_GAMIFICATION_URL") {
            self.gamification.base_url = url;
        }

        // Client overrides
        if let Some(data_dir) = var("TROPHY_FITNESS_DATA_DIR") {
            self.client.data_dir = data_dir;
        }
        if let Some(url) = var("TROPHY_FITNESS_SERVER_URL") {
            self.client.server_url = url;
        }
        if let Some(tz) = var("TROPHY_FITNESS_TIMEZONE") {
            self.client.timezone = Some(tz);
        }

        // Logging overrides
        if let Some(level) = var("TROPHY_FITNESS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("TROPHY_FITNESS_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Trophy Fitness Configuration
#
# Environment variables override these settings:
# - TROPHY_API_KEY
# - TROPHY_FITNESS_API_HOST
# - TROPHY_FITNESS_API_PORT
# - TROPHY_FITNESS_GAMIFICATION_URL
# - TROPHY_FITNESS_DATA_DIR
# - TROPHY_FITNESS_SERVER_URL
# - TROPHY_FITNESS_TIMEZONE
# - TROPHY_FITNESS_LOG_LEVEL
# - TROPHY_FITNESS_LOG_FORMAT

[api]
# Relay server host
host = "0.0.0.0"

# Relay server port
port = 8082

# Allowed CORS origins (empty allows any)
cors_origins = []

[gamification]
# Upstream gamification API
base_url = "https://api.trophy.so/v1"

# API key, prefer the TROPHY_API_KEY environment variable
# api_key = ""

# Points system holding user XP
points_system = "xp"

# Request timeout (ms)
request_timeout_ms = 5000

# Attempts per request and base backoff between them (ms)
max_retries = 3
retry_backoff_ms = 1000

[client]
# Local identity store and cookie jar
data_dir = "~/.local/share/trophy-fitness"

# Relay server used by the CLI
server_url = "http://localhost:8082"

# Override the detected timezone
# timezone = "Europe/London"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.addr(), "0.0.0.0:8082");
        assert_eq!(config.gamification.points_system, "xp");
        assert!(config.gamification.client_config().is_none());
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_generated_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.api.port, 8082);
        assert_eq!(config.client.server_url, "http://localhost:8082");
        assert_eq!(config.gamification.max_retries, 3);
        assert!(config.gamification.api_key.is_none());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = Config::parse("[client]\ntimezone = \"Europe/Oslo\"\n").unwrap();
        assert_eq!(config.client.timezone.as_deref(), Some("Europe/Oslo"));
        assert_eq!(config.api.port, 8082);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api]\nport = 9000\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api.port, 9000);

        std::fs::write(&path, "[api\nport = ").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
        assert!(matches!(
            Config::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("TROPHY_API_KEY", " secret "),
            ("TROPHY_FITNESS_API_PORT", "9100"),
            ("TROPHY_FITNESS_SERVER_URL", "http://relay:9100"),
            ("TROPHY_FITNESS_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.api.port, 9100);
        assert_eq!(config.client.server_url, "http://relay:9100");
        assert_eq!(config.logging.format, "json");
        let client = config.gamification.client_config().unwrap();
        assert_eq!(client.api_key, "secret");
    }

    #[test]
    fn test_invalid_port_override_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| (key == "TROPHY_FITNESS_API_PORT").then(|| "abc".to_string()));
        assert_eq!(config.api.port, 8082);
    }
}
