#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Camera roster and stream player resolution for the traffic dashboard.
//!
//! The roster is embedded from `cameras.toml` at compile time and served
//! unchanged to the video grid. [`player`] decides how each camera's
//! stream should be shown: a YouTube embed, an HLS source, or a
//! placeholder when there is nothing to play. [`hls`] decides what the
//! video feed proxy may relay and rewrites the playlists it passes on.

pub mod hls;
pub mod player;
pub mod roster;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

pub use hls::{is_playlist, is_relayable_stream, rewrite_playlist};
pub use player::{CameraPlayer, extract_youtube_id, feed_url, player_for};
pub use roster::{all_cameras, find_camera};

/// Reported camera state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CameraStatus {
    Online,
    Offline,
}

/// How a camera's `stream_url` should be played.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StreamKind {
    /// A YouTube watch or live URL, shown as an embedded player.
    Youtube,
    /// An HLS (`.m3u8`) playlist.
    Hls,
}

/// A camera in the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Camera {
    /// Unique identifier (e.g., `"camera-1"`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Human-readable location.
    pub location: String,
    /// `[lat, lon]` of the camera, if known.
    #[serde(default)]
    pub coordinates: Option<[f64; 2]>,
    /// Source stream URL. Empty when the camera has no feed.
    #[serde(default)]
    pub stream_url: String,
    pub status: CameraStatus,
    #[serde(rename = "type")]
    pub kind: StreamKind,
}

impl Camera {
    /// Whether the camera has a stream URL at all.
    #[must_use]
    pub fn has_stream(&self) -> bool {
        !self.stream_url.trim().is_empty()
    }
}

/// Errors from roster lookups and configuration.
#[derive(Debug, Error)]
pub enum CameraError {
    /// Roster TOML could not be parsed.
    #[error("Camera roster error: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },

    /// No camera with the given ID.
    #[error("Unknown camera: {id}")]
    UnknownCamera {
        /// The ID that was requested.
        id: String,
    },
}
