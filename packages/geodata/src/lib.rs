#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Road and traffic-signal geodata for the traffic overlay.
//!
//! A refresh cycle goes through three steps provided here:
//!
//! 1. [`query::build_query`] turns a [`Viewport`] into an Overpass QL
//!    query whose road classes and signal filters depend on the zoom.
//! 2. A [`GeodataSource`] (normally [`overpass::OverpassClient`]) sends the
//!    query and returns the raw, mixed node/way elements.
//! 3. [`resolve::resolve`] builds the node lookup, turns ways into
//!    drawable [`RoadPath`]s and extracts [`SignalPoint`]s.
//!
//! The Overpass endpoint is configured by the embedded
//! [`service_config`] TOML and can be overridden from the environment.

pub mod overpass;
pub mod query;
pub mod resolve;
pub mod service_config;

use async_trait::async_trait;
use thiserror::Error;
use traffic_watch_geodata_models::{GeodataResponse, Viewport};

pub use traffic_watch_geodata_models::{RoadPath, SignalPoint};

/// Errors from fetching or decoding geodata.
#[derive(Debug, Error)]
pub enum GeodataError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("Geodata service returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// Response body was not a valid element document.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Service configuration was invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },
}

/// Something that can answer a viewport query with raw map elements.
///
/// Implemented by [`overpass::OverpassClient`] for the real service and by
/// in-process stubs in tests.
#[async_trait]
pub trait GeodataSource: Send + Sync {
    /// Fetches the elements matching `query` for `viewport`.
    ///
    /// `query` is the text produced by [`query::build_query`] for the same
    /// viewport; sources that do not speak Overpass QL may ignore it.
    ///
    /// # Errors
    ///
    /// Returns [`GeodataError`] if the request fails or the response
    /// cannot be decoded.
    async fn fetch(&self, viewport: &Viewport, query: &str)
    -> Result<GeodataResponse, GeodataError>;
}
