//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `LAMPSTAND_ENV` - Build mode, `production` or `development` (default: development)
//! - `LAMPSTAND_API_URL` - Development API base URL (default: <http://localhost:5000/api>).
//!   Ignored in production, which always talks to the production API.
//! - `LAMPSTAND_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 15, max: 300)
//! - `LAMPSTAND_CACHE_CAPACITY` - Maximum cached query results (default: 1000)

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::cache::StalenessConfig;

/// Production API base URL.
pub const PRODUCTION_API_URL: &str = "https://api.lampstand.app/api";

/// Development API base URL used when no override is set.
pub const DEFAULT_DEV_API_URL: &str = "http://localhost:5000/api";

const DEFAULT_TIMEOUT_SECS: u64 = 15;
const MAX_TIMEOUT_SECS: u64 = 300;
const DEFAULT_CACHE_CAPACITY: u64 = 1000;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which backend the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Production,
    #[default]
    Development,
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" => Ok(Self::Development),
            _ => Err(format!("expected production or development, got {s}")),
        }
    }
}

/// Data-access layer configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Build mode the base URL was selected for
    pub environment: Environment,
    /// API base URL; endpoint paths are appended to it
    pub base_url: Url,
    /// Timeout applied to every HTTP request
    pub request_timeout: Duration,
    /// Maximum number of cached query results
    pub cache_capacity: u64,
    /// Per-resource staleness windows
    pub staleness: StalenessConfig,
}

impl ClientConfig {
    /// Configuration pointing at an explicit base URL, with defaults elsewhere.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `base_url` is not an absolute URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            environment: Environment::Development,
            base_url: parse_base_url("base_url", base_url)?,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            staleness: StalenessConfig::default(),
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let environment = match lookup("LAMPSTAND_ENV") {
            Some(value) => value
                .parse::<Environment>()
                .map_err(|e| ConfigError::InvalidEnvVar("LAMPSTAND_ENV".to_string(), e))?,
            None => Environment::default(),
        };

        let base_url = match environment {
            Environment::Production => parse_base_url("LAMPSTAND_ENV", PRODUCTION_API_URL)?,
            Environment::Development => {
                let raw = lookup("LAMPSTAND_API_URL")
                    .unwrap_or_else(|| DEFAULT_DEV_API_URL.to_string());
                parse_base_url("LAMPSTAND_API_URL", &raw)?
            }
        };

        let timeout_secs = match lookup("LAMPSTAND_REQUEST_TIMEOUT_SECS") {
            Some(raw) => parse_timeout(&raw)?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let cache_capacity = match lookup("LAMPSTAND_CACHE_CAPACITY") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("LAMPSTAND_CACHE_CAPACITY".to_string(), e.to_string())
            })?,
            None => DEFAULT_CACHE_CAPACITY,
        };

        Ok(Self {
            environment,
            base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            cache_capacity,
            staleness: StalenessConfig::default(),
        })
    }

    /// Replace the staleness windows.
    #[must_use]
    pub const fn with_staleness(mut self, staleness: StalenessConfig) -> Self {
        self.staleness = staleness;
        self
    }

    /// Replace the request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_base_url(var: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim_end_matches('/'))
        .map_err(|e| ConfigError::InvalidEnvVar(var.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var.to_string(),
            format!("{raw} is not an http(s) base URL"),
        ));
    }
    Ok(url)
}

fn parse_timeout(raw: &str) -> Result<u64, ConfigError> {
    let var = "LAMPSTAND_REQUEST_TIMEOUT_SECS";
    let secs = raw
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(var.to_string(), e.to_string()))?;
    if secs == 0 || secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::InvalidEnvVar(
            var.to_string(),
            format!("must be between 1 and {MAX_TIMEOUT_SECS} seconds (got {secs})"),
        ));
    }
    Ok(secs)
}
