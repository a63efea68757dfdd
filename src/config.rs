//! Runtime configuration for the Health Hub service.
//!
//! Values come from environment variables with defaults for everything but
//! the API key. Configuration is built once at startup and passed into the
//! client, store and server constructors.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Placeholder value shipped in sample env files; treated as no key.
const PLACEHOLDER_API_KEY: &str = "your_gemini_api_key_here";

/// Default Gemini API host.
const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
/// Default Gemini API version segment.
const DEFAULT_API_VERSION: &str = "v1";
/// Default model.
const DEFAULT_MODEL: &str = "gemini-1.5-pro";
/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;
/// Default directory for the persisted identity record.
const DEFAULT_DATA_DIR: &str = ".health-hub";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Port is not a valid non-zero `u16`.
    #[error("invalid port: {0}")]
    InvalidPort(String),
    /// Endpoint URL cannot be parsed.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// A required value is empty.
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// An API key that never prints in full.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a raw key; blank values and the sample placeholder yield `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let key = raw.trim();
        if key.is_empty() || key == PLACEHOLDER_API_KEY {
            None
        } else {
            Some(Self(key.to_string()))
        }
    }

    /// The raw key, for building requests.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// First six characters followed by `...`.
    #[must_use]
    pub fn masked(&self) -> String {
        let prefix: String = self.0.chars().take(6).collect();
        format!("{prefix}...")
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({})", self.masked())
    }
}

/// Gemini endpoint and HTTP client settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key sent in the query string.
    pub api_key: Option<ApiKey>,
    /// Scheme and host of the API.
    pub base_url: String,
    /// Version path segment (`v1`, `v1beta`).
    pub api_version: String,
    /// Model name.
    pub model: String,
    /// Connection timeout.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
    /// Whole-request timeout.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_GEMINI_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            model: DEFAULT_MODEL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl GeminiConfig {
    /// Set the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = ApiKey::parse(key);
        self
    }

    /// Point the client at another host (tests, gateways).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Use another model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// HTTP server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listening port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

/// Identity settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Directory holding the persisted identity record.
    pub data_dir: PathBuf,
    /// Accepted login name.
    pub username: String,
    /// Accepted password.
    pub password: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            username: "user".to_string(),
            password: "password123".to_string(),
        }
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Gemini client settings.
    pub gemini: GeminiConfig,
    /// Server settings.
    pub server: ServerConfig,
    /// Identity settings.
    pub identity: IdentityConfig,
    /// Seed the store with the placeholder conversations.
    pub seed_placeholders: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gemini: GeminiConfig::default(),
            server: ServerConfig::default(),
            identity: IdentityConfig::default(),
            seed_placeholders: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// Returns an error if a value is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns an error if a value is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        config.gemini.api_key = lookup("GEMINI_API_KEY")
            .or_else(|| lookup("VITE_GEMINI_API_KEY"))
            .and_then(|raw| ApiKey::parse(&raw));
        if let Some(url) = lookup("HEALTH_HUB_GEMINI_URL") {
            config.gemini.base_url = url;
        }
        if let Some(version) = lookup("HEALTH_HUB_API_VERSION") {
            config.gemini.api_version = version;
        }
        if let Some(model) = lookup("HEALTH_HUB_MODEL") {
            config.gemini.model = model;
        }

        if let Some(raw) = lookup("HEALTH_HUB_PORT").or_else(|| lookup("PORT")) {
            config.server.port = parse_port(&raw)?;
        }

        if let Some(dir) = lookup("HEALTH_HUB_DATA_DIR") {
            config.identity.data_dir = PathBuf::from(dir);
        }
        if let Some(username) = lookup("HEALTH_HUB_USERNAME") {
            config.identity.username = username;
        }
        if let Some(password) = lookup("HEALTH_HUB_PASSWORD") {
            config.identity.password = password;
        }

        if let Some(seed) = lookup("HEALTH_HUB_SEED") {
            config.seed_placeholders = !matches!(seed.trim(), "0" | "false" | "no" | "off");
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any value is out of range or invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.gemini.base_url)?;
        if self.gemini.model.trim().is_empty() {
            return Err(ConfigError::Empty("model"));
        }
        if self.gemini.api_version.trim().is_empty() {
            return Err(ConfigError::Empty("api_version"));
        }
        if self.identity.username.trim().is_empty() {
            return Err(ConfigError::Empty("username"));
        }
        if self.server.port == 0 {
            return Err(ConfigError::InvalidPort("0".to_string()));
        }
        Ok(())
    }
}

fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    match raw.trim().parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(ConfigError::InvalidPort(raw.to_string())),
    }
}

/// Serde module for Duration serialization.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
