//! Overpass service configuration.
//!
//! The default service is embedded from `services/overpass.toml` at
//! compile time. [`OverpassConfig::from_env`] layers environment
//! overrides on top:
//!
//! - `OVERPASS_URL` replaces the endpoint.
//! - `OVERPASS_CLIENT_TIMEOUT_SECS` sets a client-side request timeout.
//!   Unset means the client waits as long as the server keeps the
//!   connection open.

use std::time::Duration;

use serde::Deserialize;

use crate::GeodataError;
use crate::query::DEFAULT_TIMEOUT_SECS;

const OVERPASS_TOML: &str = include_str!("../services/overpass.toml");

/// Configuration for an Overpass API endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OverpassConfig {
    /// Unique identifier (e.g., `"overpass"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Interpreter URL that accepts `?data=<query>`.
    pub endpoint: String,
    /// Timeout sent inside the query as `[timeout:N]`.
    #[serde(default = "default_server_timeout")]
    pub server_timeout_secs: u32,
    /// Optional client-side request timeout.
    #[serde(default)]
    pub client_timeout_secs: Option<u64>,
    /// `User-Agent` header sent with every request.
    #[serde(default)]
    pub user_agent: Option<String>,
}

const fn default_server_timeout() -> u32 {
    DEFAULT_TIMEOUT_SECS
}

impl OverpassConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`GeodataError::Config`] if the TOML is malformed or the
    /// endpoint is empty.
    pub fn from_toml(toml_str: &str) -> Result<Self, GeodataError> {
        let config: Self = toml::de::from_str(toml_str).map_err(|e| GeodataError::Config {
            message: format!("Failed to parse Overpass config: {e}"),
        })?;
        if config.endpoint.trim().is_empty() {
            return Err(GeodataError::Config {
                message: format!("Overpass service '{}' has an empty endpoint", config.id),
            });
        }
        Ok(config)
    }

    /// Returns the compile-time embedded default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (a build-time guarantee).
    #[must_use]
    pub fn embedded() -> Self {
        Self::from_toml(OVERPASS_TOML)
            .unwrap_or_else(|e| panic!("Embedded Overpass config is invalid: {e}"))
    }

    /// Returns the embedded configuration with environment overrides
    /// applied.
    ///
    /// # Errors
    ///
    /// Returns [`GeodataError::Config`] if `OVERPASS_CLIENT_TIMEOUT_SECS`
    /// is set but is not a number.
    pub fn from_env() -> Result<Self, GeodataError> {
        Self::embedded().with_overrides(
            std::env::var("OVERPASS_URL").ok().as_deref(),
            std::env::var("OVERPASS_CLIENT_TIMEOUT_SECS").ok().as_deref(),
        )
    }

    fn with_overrides(
        mut self,
        endpoint: Option<&str>,
        client_timeout: Option<&str>,
    ) -> Result<Self, GeodataError> {
        if let Some(endpoint) = endpoint.map(str::trim).filter(|s| !s.is_empty()) {
            log::info!("Using Overpass endpoint override: {endpoint}");
            self.endpoint = endpoint.to_string();
        }
        if let Some(raw) = client_timeout.map(str::trim).filter(|s| !s.is_empty()) {
            let secs = raw.parse::<u64>().map_err(|e| GeodataError::Config {
                message: format!("Invalid OVERPASS_CLIENT_TIMEOUT_SECS '{raw}': {e}"),
            })?;
            self.client_timeout_secs = Some(secs);
        }
        Ok(self)
    }

    /// Client-side timeout, if one is configured.
    #[must_use]
    pub fn client_timeout(&self) -> Option<Duration> {
        self.client_timeout_secs.map(Duration::from_secs)
    }
}
