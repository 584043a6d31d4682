#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Road and signal overlay for the traffic dashboard map.
//!
//! The [`view::MapView`] controller owns two render layers (roads and
//! signals) and redraws them on every viewport change through a refresh
//! cycle guarded by a sequence number. Road colors and weights come from
//! a pluggable [`style::TrafficStyler`]; the default simulates congestion
//! at random. Layers can be exported as `GeoJSON` with
//! [`geojson_export::to_feature_collection`].

pub mod geojson_export;
pub mod icon;
pub mod layers;
pub mod style;
pub mod view;

pub use view::{CycleOutcome, LayerSnapshot, MapView};
