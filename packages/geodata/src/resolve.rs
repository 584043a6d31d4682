//! Resolution of raw elements into drawable geometry.

use std::collections::HashMap;

use traffic_watch_geodata_models::{
    LatLng, RawElement, RoadPath, SignalPolicy, SignalPoint, Tags,
};

/// Roads and signals resolved from one response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedGeometry {
    /// Ways with at least two resolvable points.
    pub roads: Vec<RoadPath>,
    /// Signal nodes (empty when signals are omitted).
    pub signals: Vec<SignalPoint>,
}

/// Builds the node-id → coordinate lookup from every node element.
///
/// A node ID seen twice keeps its last position.
#[must_use]
pub fn node_index(elements: &[RawElement]) -> HashMap<i64, LatLng> {
    elements
        .iter()
        .filter_map(|el| match el {
            RawElement::Node { id, lat, lon, .. } => Some((*id, LatLng::new(*lat, *lon))),
            _ => None,
        })
        .collect()
}

/// Resolves a way's node list through `nodes`, skipping unknown IDs.
///
/// Returns `None` if fewer than two points resolve.
#[must_use]
pub fn resolve_way(node_ids: &[i64], nodes: &HashMap<i64, LatLng>) -> Option<Vec<LatLng>> {
    let points: Vec<LatLng> = node_ids
        .iter()
        .filter_map(|id| nodes.get(id).copied())
        .collect();
    (points.len() >= 2).then_some(points)
}

/// Whether a node's tags mark it as a traffic or crossing signal.
#[must_use]
pub fn is_signal(tags: &Tags) -> bool {
    tags.get("highway").is_some_and(|v| v == "traffic_signals")
        || tags.get("crossing").is_some_and(|v| v == "traffic_signals")
}

/// Turns a response's elements into roads and signals.
///
/// Signals are only extracted when `signals` is
/// [`SignalPolicy::Include`], so a low-zoom cycle never yields markers
/// even if the service returned tagged nodes.
#[must_use]
pub fn resolve(elements: &[RawElement], signals: SignalPolicy) -> ResolvedGeometry {
    let nodes = node_index(elements);
    let mut resolved = ResolvedGeometry::default();

    for el in elements {
        match el {
            RawElement::Way { id, nodes: ids, tags } => {
                if let Some(points) = resolve_way(ids, &nodes) {
                    resolved.roads.push(RoadPath {
                        way_id: *id,
                        road_class: tags.get("highway").and_then(|h| h.parse().ok()),
                        points,
                    });
                }
            }
            RawElement::Node { id, lat, lon, tags }
                if signals.includes_signals() && is_signal(tags) =>
            {
                resolved.signals.push(SignalPoint {
                    node_id: *id,
                    position: LatLng::new(*lat, *lon),
                });
            }
            RawElement::Node { .. } | RawElement::Other => {}
        }
    }

    log::debug!(
        "Resolved {} roads and {} signals from {} elements ({} nodes)",
        resolved.roads.len(),
        resolved.signals.len(),
        elements.len(),
        nodes.len()
    );

    resolved
}
