//! The two render layers of the map view.
//!
//! Layers have no identity tracking: a refresh clears them and pushes the
//! new contents.

use serde::{Deserialize, Serialize};
use traffic_watch_geodata_models::{LatLng, RoadClass};

use crate::icon::SignalIcon;
use crate::style::LineStyle;

/// A styled road line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Polyline {
    pub way_id: Option<i64>,
    pub road_class: Option<RoadClass>,
    pub points: Vec<LatLng>,
    pub style: LineStyle,
}

/// A traffic signal marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalMarker {
    pub node_id: i64,
    pub position: LatLng,
    pub icon: SignalIcon,
    pub popup: String,
}

/// Road polylines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadLayer {
    lines: Vec<Polyline>,
}

impl RoadLayer {
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn add(&mut self, line: Polyline) {
        self.lines.push(line);
    }

    #[must_use]
    pub fn lines(&self) -> &[Polyline] {
        &self.lines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Signal markers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalLayer {
    markers: Vec<SignalMarker>,
}

impl SignalLayer {
    pub fn clear(&mut self) {
        self.markers.clear();
    }

    pub fn add(&mut self, marker: SignalMarker) {
        self.markers.push(marker);
    }

    #[must_use]
    pub fn markers(&self) -> &[SignalMarker] {
        &self.markers
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}
