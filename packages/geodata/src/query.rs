//! Overpass QL query construction.
//!
//! The query asks for every way whose `highway` tag matches the zoom's
//! road classes and, from zoom 14 on, for nodes tagged as traffic or
//! crossing signals. `out body; >; out skel qt;` then pulls in the
//! skeleton nodes referenced by the ways so they can be resolved to
//! coordinates.

use traffic_watch_geodata_models::{BoundingBox, QueryTier, RoadTier, Viewport};

/// Server-side timeout requested when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u32 = 25;

/// Builds the `highway` regex for a road tier, e.g.
/// `^(primary|trunk|motorway)$`.
#[must_use]
pub fn highway_pattern(roads: RoadTier) -> String {
    let names: Vec<&str> = roads.classes().iter().map(AsRef::as_ref).collect();
    format!("^({})$", names.join("|"))
}

fn signal_filters(bbox: &BoundingBox) -> String {
    format!(
        "  node[\"highway\"=\"traffic_signals\"]({bbox});\n  \
         node[\"crossing\"=\"traffic_signals\"]({bbox});\n"
    )
}

/// Builds the full query for `viewport`.
///
/// `timeout_secs` is sent to the service as `[timeout:N]`; it bounds the
/// server's work, not the client's wait.
#[must_use]
pub fn build_query(viewport: &Viewport, timeout_secs: u32) -> String {
    let tier = QueryTier::for_zoom(viewport.zoom);
    let bbox = viewport.bounds;

    let mut union = format!(
        "  way[\"highway\"~\"{}\"]({bbox});\n",
        highway_pattern(tier.roads)
    );
    if tier.signals.includes_signals() {
        union.push_str(&signal_filters(&bbox));
    }

    format!("[out:json][timeout:{timeout_secs}];\n(\n{union});\nout body;\n>;\nout skel qt;\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(zoom: u8) -> Viewport {
        Viewport::new(BoundingBox::new(19.0, 72.8, 19.1, 72.9), zoom)
    }

    #[test]
    fn major_pattern() {
        assert_eq!(highway_pattern(RoadTier::Major), "^(primary|trunk|motorway)$");
    }

    #[test]
    fn extended_pattern() {
        assert_eq!(
            highway_pattern(RoadTier::Extended),
            "^(primary|secondary|tertiary|trunk|motorway|primary_link|secondary_link|trunk_link)$"
        );
    }

    #[test]
    fn low_zoom_query_has_no_signals() {
        let query = build_query(&viewport(12), DEFAULT_TIMEOUT_SECS);
        assert!(query.starts_with("[out:json][timeout:25];"));
        assert!(query.contains("way[\"highway\"~\"^(primary|trunk|motorway)$\"](19,72.8,19.1,72.9);"));
        assert!(!query.contains("traffic_signals"));
        assert!(query.ends_with("out body;\n>;\nout skel qt;\n"));
    }

    #[test]
    fn zoom_13_widens_roads_without_signals() {
        let query = build_query(&viewport(13), DEFAULT_TIMEOUT_SECS);
        assert!(query.contains("secondary_link"));
        assert!(!query.contains("traffic_signals"));
    }

    #[test]
    fn zoom_14_requests_signals() {
        let query = build_query(&viewport(14), 60);
        assert!(query.starts_with("[out:json][timeout:60];"));
        assert!(query.contains("node[\"highway\"=\"traffic_signals\"](19,72.8,19.1,72.9);"));
        assert!(query.contains("node[\"crossing\"=\"traffic_signals\"](19,72.8,19.1,72.9);"));
    }
}
