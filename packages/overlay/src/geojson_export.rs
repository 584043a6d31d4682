//! `GeoJSON` export of the render layers.
//!
//! Roads become `LineString` features and signals `Point` features, with
//! the styling carried in `properties` so any `GeoJSON`-aware map client
//! can draw the overlay without knowing about [`LayerSnapshot`].

use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use traffic_watch_geodata_models::LatLng;

use crate::layers::{Polyline, SignalMarker};
use crate::view::LayerSnapshot;

fn position(point: LatLng) -> Vec<f64> {
    vec![point.lon, point.lat]
}

fn road_feature(line: &Polyline) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("layer".to_string(), "roads".into());
    properties.insert("color".to_string(), line.style.color.clone().into());
    properties.insert("weight".to_string(), line.style.weight.into());
    properties.insert("opacity".to_string(), line.style.opacity.into());
    properties.insert(
        "congestion".to_string(),
        line.style.congestion.as_ref().into(),
    );
    if let Some(class) = line.road_class {
        properties.insert("highway".to_string(), class.as_ref().into());
    }

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::LineString(
            line.points.iter().copied().map(position).collect(),
        ))),
        id: line.way_id.map(|id| Id::Number(id.into())),
        properties: Some(properties),
        foreign_members: None,
    }
}

fn signal_feature(marker: &SignalMarker) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("layer".to_string(), "signals".into());
    properties.insert("popup".to_string(), marker.popup.clone().into());
    properties.insert("lamp".to_string(), marker.icon.lamp.as_ref().into());
    properties.insert("iconSvg".to_string(), marker.icon.svg.clone().into());

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(position(marker.position)))),
        id: Some(Id::Number(marker.node_id.into())),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Converts a snapshot into a `FeatureCollection`, roads first.
#[must_use]
pub fn to_feature_collection(snapshot: &LayerSnapshot) -> FeatureCollection {
    let features = snapshot
        .roads
        .iter()
        .map(road_feature)
        .chain(snapshot.signals.iter().map(signal_feature))
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use traffic_watch_geodata_models::RoadClass;

    use super::*;
    use crate::icon::{SIGNAL_POPUP, SignalIcon};
    use crate::style::{Congestion, LineStyle};

    fn snapshot() -> LayerSnapshot {
        LayerSnapshot {
            committed_sequence: Some(3),
            latest_sequence: 3,
            loading: false,
            viewport: None,
            roads: vec![Polyline {
                way_id: Some(42),
                road_class: Some(RoadClass::TrunkLink),
                points: vec![LatLng::new(19.0, 72.8), LatLng::new(19.01, 72.81)],
                style: LineStyle::new(Congestion::Moderate, 5),
            }],
            signals: vec![SignalMarker {
                node_id: 7,
                position: LatLng::new(19.05, 72.85),
                icon: SignalIcon::red(),
                popup: SIGNAL_POPUP.to_string(),
            }],
        }
    }

    #[test]
    fn exports_roads_then_signals() {
        let collection = to_feature_collection(&snapshot());
        let json = serde_json::to_value(&collection).unwrap();

        let features = json["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);

        let road = &features[0];
        assert_eq!(road["geometry"]["type"], "LineString");
        assert_eq!(
            road["geometry"]["coordinates"],
            serde_json::json!([[72.8, 19.0], [72.81, 19.01]])
        );
        assert_eq!(road["id"], 42);
        assert_eq!(road["properties"]["color"], "#f97316");
        assert_eq!(road["properties"]["weight"], 5);
        assert_eq!(road["properties"]["highway"], "trunk_link");
        assert_eq!(road["properties"]["congestion"], "moderate");

        let signal = &features[1];
        assert_eq!(signal["geometry"]["type"], "Point");
        assert_eq!(signal["geometry"]["coordinates"], serde_json::json!([72.85, 19.05]));
        assert_eq!(signal["properties"]["popup"], "Traffic Signal");
        assert_eq!(signal["properties"]["lamp"], "red");
    }

    #[test]
    fn empty_snapshot_exports_empty_collection() {
        let mut snapshot = snapshot();
        snapshot.roads.clear();
        snapshot.signals.clear();
        assert!(to_feature_collection(&snapshot).features.is_empty());
    }
}
