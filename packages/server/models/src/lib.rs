#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the traffic watch server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the overlay's internal types to allow independent evolution of
//! the API contract.

use serde::{Deserialize, Serialize};
use traffic_watch_geodata_models::{BoundingBox, Viewport};
use traffic_watch_overlay::{CycleOutcome, LayerSnapshot};

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Body of `POST /api/viewport`: the settled map viewport.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportRequest {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
    pub zoom: u8,
}

impl ViewportRequest {
    /// Validates the bounds and converts to a [`Viewport`].
    ///
    /// # Errors
    ///
    /// Returns a message if any coordinate is not finite, a latitude is
    /// outside ±90°, or south is north of north.
    pub fn to_viewport(self) -> Result<Viewport, String> {
        let bounds = BoundingBox::try_new(self.south, self.west, self.north, self.east)?;
        Ok(Viewport::new(bounds, self.zoom))
    }
}

/// Query parameters for `GET /api/query`.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryParams {
    /// Bounding box as `south,west,north,east`.
    pub bbox: String,
    /// Integer zoom level.
    pub zoom: u8,
}

/// Query parameters for `GET /video_feed`.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedParams {
    /// Source stream URL of a roster camera.
    pub url: Option<String>,
}

/// Outcome of one refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum ApiCycle {
    #[serde(rename_all = "camelCase")]
    Committed {
        sequence: u64,
        roads: usize,
        signals: usize,
    },
    #[serde(rename_all = "camelCase")]
    Superseded {
        sequence: u64,
        latest: u64,
        /// Fetch failure of the discarded cycle, if it failed.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Failed { sequence: u64, error: String },
}

impl From<&CycleOutcome> for ApiCycle {
    fn from(outcome: &CycleOutcome) -> Self {
        match outcome {
            CycleOutcome::Committed {
                sequence,
                roads,
                signals,
            } => Self::Committed {
                sequence: *sequence,
                roads: *roads,
                signals: *signals,
            },
            CycleOutcome::Superseded {
                sequence,
                latest,
                error,
            } => Self::Superseded {
                sequence: *sequence,
                latest: *latest,
                error: error.as_ref().map(ToString::to_string),
            },
            CycleOutcome::Failed { sequence, error } => Self::Failed {
                sequence: *sequence,
                error: error.to_string(),
            },
        }
    }
}

/// Response of `POST /api/viewport`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportResponse {
    /// What happened to this request's cycle.
    pub cycle: ApiCycle,
    /// Layers after the cycle finished.
    pub overlay: LayerSnapshot,
}
