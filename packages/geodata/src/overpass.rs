//! Overpass API client.
//!
//! Sends the query as the URL-encoded `data` parameter of a single GET to
//! the interpreter endpoint. There is no retry: a failed cycle is
//! recovered by the next viewport change.
//!
//! See <https://wiki.openstreetmap.org/wiki/Overpass_API>

use async_trait::async_trait;
use traffic_watch_geodata_models::{GeodataResponse, Viewport};

use crate::service_config::OverpassConfig;
use crate::{GeodataError, GeodataSource};

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 300;

/// A [`GeodataSource`] backed by an Overpass interpreter endpoint.
pub struct OverpassClient {
    client: reqwest::Client,
    config: OverpassConfig,
}

impl OverpassClient {
    /// Builds a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`GeodataError::Http`] if the HTTP client cannot be built
    /// (e.g., TLS backend initialisation fails).
    pub fn new(config: OverpassConfig) -> Result<Self, GeodataError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.client_timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    /// Builds a client from the embedded config plus environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`GeodataError`] if the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn from_env() -> Result<Self, GeodataError> {
        Self::new(OverpassConfig::from_env()?)
    }

    /// The configuration this client was built with.
    #[must_use]
    pub const fn config(&self) -> &OverpassConfig {
        &self.config
    }
}

#[async_trait]
impl GeodataSource for OverpassClient {
    async fn fetch(
        &self,
        viewport: &Viewport,
        query: &str,
    ) -> Result<GeodataResponse, GeodataError> {
        log::debug!(
            "Requesting Overpass data for bbox {} at zoom {}",
            viewport.bounds,
            viewport.zoom
        );

        let resp = self
            .client
            .get(&self.config.endpoint)
            .query(&[("data", query)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GeodataError::Status {
                status: status.as_u16(),
            });
        }

        let text = resp.text().await?;
        parse_body(&text)
    }
}

/// Parses an Overpass JSON body.
fn parse_body(text: &str) -> Result<GeodataResponse, GeodataError> {
    serde_json::from_str(text).map_err(|e| {
        let preview: String = text.chars().take(BODY_PREVIEW_LEN).collect();
        log::warn!("Overpass body did not parse ({e}); preview: {preview}");
        GeodataError::Json(e)
    })
}
