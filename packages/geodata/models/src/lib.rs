#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Viewport, road class and raw map element types.
//!
//! These types describe what the map is currently showing ([`Viewport`]),
//! how a zoom level translates into what gets requested ([`QueryTier`]),
//! and the shapes of elements returned by the geodata service
//! ([`RawElement`]). Resolved, render-ready geometry lives in
//! [`RoadPath`] and [`SignalPoint`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Zoom below which only major roads are requested.
pub const EXTENDED_ROADS_MIN_ZOOM: u8 = 13;

/// Zoom at or above which traffic signals are requested.
pub const SIGNALS_MIN_ZOOM: u8 = 14;

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
}

impl LatLng {
    /// Creates a new coordinate pair.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A geographic bounding box in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Southern latitude boundary.
    pub south: f64,
    /// Western longitude boundary.
    pub west: f64,
    /// Northern latitude boundary.
    pub north: f64,
    /// Eastern longitude boundary.
    pub east: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Creates a bounding box, checking that it describes a real area.
    ///
    /// # Errors
    ///
    /// Returns a message if any coordinate is not finite, a latitude is
    /// outside ±90°, or south is north of north.
    pub fn try_new(south: f64, west: f64, north: f64, east: f64) -> Result<Self, String> {
        if [south, west, north, east].iter().any(|c| !c.is_finite()) {
            return Err("Coordinates must be finite".to_string());
        }
        if !(-90.0..=90.0).contains(&south) || !(-90.0..=90.0).contains(&north) {
            return Err("Latitudes must be within -90..90".to_string());
        }
        if south > north {
            return Err("South must not be greater than north".to_string());
        }
        Ok(Self::new(south, west, north, east))
    }

    /// Parses `"south,west,north,east"`.
    ///
    /// Returns `None` unless exactly four numbers are present and they
    /// pass [`Self::try_new`].
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse().ok())
            .collect::<Option<_>>()?;
        match parts[..] {
            [south, west, north, east] => Self::try_new(south, west, north, east).ok(),
            _ => None,
        }
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{},{}", self.south, self.west, self.north, self.east)
    }
}

/// The visible map area and its integer zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Visible bounds.
    pub bounds: BoundingBox,
    /// Integer zoom level.
    pub zoom: u8,
}

impl Viewport {
    /// Creates a new viewport.
    #[must_use]
    pub const fn new(bounds: BoundingBox, zoom: u8) -> Self {
        Self { bounds, zoom }
    }

    /// Returns the query tier for this viewport's zoom.
    #[must_use]
    pub const fn tier(&self) -> QueryTier {
        QueryTier::for_zoom(self.zoom)
    }
}

/// `OpenStreetMap` `highway=*` values the overlay can draw.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RoadClass {
    Primary,
    Secondary,
    Tertiary,
    Trunk,
    Motorway,
    PrimaryLink,
    SecondaryLink,
    TrunkLink,
}

/// Which road classes a query asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadTier {
    /// Primary, trunk and motorway only.
    Major,
    /// Major roads plus secondary, tertiary and the link variants.
    Extended,
}

impl RoadTier {
    /// Returns the road classes in the order they appear in the query
    /// filter.
    #[must_use]
    pub const fn classes(self) -> &'static [RoadClass] {
        match self {
            Self::Major => &[RoadClass::Primary, RoadClass::Trunk, RoadClass::Motorway],
            Self::Extended => &[
                RoadClass::Primary,
                RoadClass::Secondary,
                RoadClass::Tertiary,
                RoadClass::Trunk,
                RoadClass::Motorway,
                RoadClass::PrimaryLink,
                RoadClass::SecondaryLink,
                RoadClass::TrunkLink,
            ],
        }
    }
}

/// Whether signal nodes are requested and rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalPolicy {
    Include,
    Omit,
}

impl SignalPolicy {
    #[must_use]
    pub const fn includes_signals(self) -> bool {
        matches!(self, Self::Include)
    }
}

/// The discrete road and signal policy derived from a zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryTier {
    pub roads: RoadTier,
    pub signals: SignalPolicy,
}

impl QueryTier {
    /// Classifies a zoom level.
    #[must_use]
    pub const fn for_zoom(zoom: u8) -> Self {
        let roads = if zoom < EXTENDED_ROADS_MIN_ZOOM {
            RoadTier::Major
        } else {
            RoadTier::Extended
        };
        let signals = if zoom >= SIGNALS_MIN_ZOOM {
            SignalPolicy::Include
        } else {
            SignalPolicy::Omit
        };
        Self { roads, signals }
    }
}

/// Free-form `OpenStreetMap` tags.
pub type Tags = BTreeMap<String, String>;

/// A single element of a geodata service response.
///
/// Element types other than nodes and ways (e.g. relations) deserialize to
/// [`RawElement::Other`] and are ignored downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RawElement {
    Node {
        id: i64,
        lat: f64,
        lon: f64,
        #[serde(default)]
        tags: Tags,
    },
    Way {
        #[serde(default)]
        id: Option<i64>,
        #[serde(default)]
        nodes: Vec<i64>,
        #[serde(default)]
        tags: Tags,
    },
    #[serde(other)]
    Other,
}

/// Body of a geodata service response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeodataResponse {
    /// Mixed node and way elements.
    pub elements: Vec<RawElement>,
}

/// An ordered, drawable road polyline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadPath {
    /// Source way ID, when the service reported one.
    pub way_id: Option<i64>,
    /// The way's `highway` tag, if it is a known road class.
    pub road_class: Option<RoadClass>,
    /// Resolved points in way order. Always at least two.
    pub points: Vec<LatLng>,
}

/// A node tagged as a traffic or crossing signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalPoint {
    /// Source node ID.
    pub node_id: i64,
    /// Node position.
    pub position: LatLng,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn major_roads_below_zoom_13() {
        for zoom in [0, 5, 12] {
            let tier = QueryTier::for_zoom(zoom);
            assert_eq!(tier.roads, RoadTier::Major);
            assert_eq!(
                tier.roads.classes(),
                &[RoadClass::Primary, RoadClass::Trunk, RoadClass::Motorway]
            );
        }
    }

    #[test]
    fn extended_roads_from_zoom_13() {
        for zoom in [13, 14, 18] {
            let tier = QueryTier::for_zoom(zoom);
            assert_eq!(tier.roads, RoadTier::Extended);
            assert_eq!(tier.roads.classes().len(), 8);
            assert!(tier.roads.classes().contains(&RoadClass::SecondaryLink));
        }
    }

    #[test]
    fn signals_only_from_zoom_14() {
        assert_eq!(QueryTier::for_zoom(13).signals, SignalPolicy::Omit);
        assert_eq!(QueryTier::for_zoom(14).signals, SignalPolicy::Include);
        assert_eq!(QueryTier::for_zoom(19).signals, SignalPolicy::Include);
    }

    #[test]
    fn road_class_uses_osm_names() {
        assert_eq!(RoadClass::PrimaryLink.to_string(), "primary_link");
        assert_eq!("trunk_link".parse::<RoadClass>(), Ok(RoadClass::TrunkLink));
        assert!("residential".parse::<RoadClass>().is_err());
    }

    #[test]
    fn parses_bbox() {
        let bbox = BoundingBox::parse("19.0, 72.8,19.1,72.9").unwrap();
        assert_eq!(bbox, BoundingBox::new(19.0, 72.8, 19.1, 72.9));
        assert_eq!(bbox.to_string(), "19,72.8,19.1,72.9");
        assert!(BoundingBox::parse("19.0,72.8,19.1").is_none());
        assert!(BoundingBox::parse("a,b,c,d").is_none());
    }

    #[test]
    fn rejects_non_finite_and_impossible_bboxes() {
        assert!(BoundingBox::parse("NaN,inf,1,2").is_none());
        assert!(BoundingBox::parse("19.0,72.8,19.1,-inf").is_none());
        assert!(BoundingBox::parse("-91,0,10,1").is_none());
        assert!(BoundingBox::parse("19.2,72.8,19.1,72.9").is_none());
        assert!(BoundingBox::try_new(19.0, f64::NAN, 19.1, 72.9).is_err());
        assert!(BoundingBox::try_new(-90.0, -180.0, 90.0, 180.0).is_ok());
    }

    #[test]
    fn deserializes_mixed_elements() {
        let body = serde_json::json!({
            "elements": [
                {"type": "node", "id": 1, "lat": 19.0, "lon": 72.8},
                {"type": "way", "nodes": [1, 2], "tags": {"highway": "primary"}},
                {"type": "relation", "id": 9, "members": []}
            ]
        });
        let response: GeodataResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.elements.len(), 3);
        assert!(matches!(
            response.elements[0],
            RawElement::Node { id: 1, ref tags, .. } if tags.is_empty()
        ));
        assert!(matches!(
            response.elements[1],
            RawElement::Way { id: None, ref nodes, .. } if nodes == &[1, 2]
        ));
        assert_eq!(response.elements[2], RawElement::Other);
    }
}
