//! The map view controller and its refresh cycle.
//!
//! [`MapView`] owns the road and signal layers and the loading flag. Each
//! call to [`MapView::refresh`] is one cycle: clear, query, fetch,
//! resolve, style, commit. Cycles may overlap; every cycle takes a
//! sequence number when it starts and only the cycle holding the latest
//! number may commit, so a slow response can never overwrite a newer
//! viewport's layers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use traffic_watch_geodata::query::{DEFAULT_TIMEOUT_SECS, build_query};
use traffic_watch_geodata::resolve::{ResolvedGeometry, resolve};
use traffic_watch_geodata::{GeodataError, GeodataSource};
use traffic_watch_geodata_models::Viewport;

use crate::icon::{SIGNAL_POPUP, SignalIcon};
use crate::layers::{Polyline, RoadLayer, SignalLayer, SignalMarker};
use crate::style::TrafficStyler;

/// How a refresh cycle ended.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The cycle drew its results.
    Committed {
        sequence: u64,
        roads: usize,
        signals: usize,
    },
    /// A newer cycle started while this one was in flight; its results
    /// were discarded. `error` carries the fetch failure, if there was one.
    Superseded {
        sequence: u64,
        latest: u64,
        error: Option<GeodataError>,
    },
    /// The fetch failed; layers were left empty.
    Failed { sequence: u64, error: GeodataError },
}

impl CycleOutcome {
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        match self {
            Self::Committed { sequence, .. }
            | Self::Superseded { sequence, .. }
            | Self::Failed { sequence, .. } => *sequence,
        }
    }

    #[must_use]
    pub const fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

/// A copy of the view's current layers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSnapshot {
    /// Sequence number of the cycle that drew these layers, if any.
    pub committed_sequence: Option<u64>,
    /// Latest sequence number issued.
    pub latest_sequence: u64,
    /// Whether the latest cycle is still in flight.
    pub loading: bool,
    /// Viewport of the latest cycle.
    pub viewport: Option<Viewport>,
    pub roads: Vec<Polyline>,
    pub signals: Vec<SignalMarker>,
}

#[derive(Debug, Default)]
struct ViewState {
    roads: RoadLayer,
    signals: SignalLayer,
    loading: bool,
    viewport: Option<Viewport>,
    committed: Option<u64>,
}

impl ViewState {
    fn clear_layers(&mut self) {
        self.roads.clear();
        self.signals.clear();
    }
}

/// Owns the render layers and runs refresh cycles against a
/// [`GeodataSource`].
pub struct MapView {
    source: Arc<dyn GeodataSource>,
    styler: Arc<dyn TrafficStyler>,
    server_timeout_secs: u32,
    sequence: AtomicU64,
    state: Mutex<ViewState>,
}

impl MapView {
    /// Creates an empty view.
    #[must_use]
    pub fn new(source: Arc<dyn GeodataSource>, styler: Arc<dyn TrafficStyler>) -> Self {
        Self {
            source,
            styler,
            server_timeout_secs: DEFAULT_TIMEOUT_SECS,
            sequence: AtomicU64::new(0),
            state: Mutex::new(ViewState::default()),
        }
    }

    /// Sets the `[timeout:N]` sent with each query.
    #[must_use]
    pub const fn with_server_timeout(mut self, secs: u32) -> Self {
        self.server_timeout_secs = secs;
        self
    }

    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Latest sequence number issued (0 before the first cycle).
    #[must_use]
    pub fn latest_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Whether the loading indicator is showing.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    /// The query text a cycle for `viewport` would send.
    #[must_use]
    pub fn query_for(&self, viewport: &Viewport) -> String {
        build_query(viewport, self.server_timeout_secs)
    }

    /// Copies the current layers.
    #[must_use]
    pub fn snapshot(&self) -> LayerSnapshot {
        let state = self.lock();
        LayerSnapshot {
            committed_sequence: state.committed,
            latest_sequence: self.latest_sequence(),
            loading: state.loading,
            viewport: state.viewport,
            roads: state.roads.lines().to_vec(),
            signals: state.signals.markers().to_vec(),
        }
    }

    /// Runs one refresh cycle for `viewport`.
    ///
    /// Never fails: fetch errors are logged and reported as
    /// [`CycleOutcome::Failed`] with the layers left empty.
    pub async fn refresh(&self, viewport: Viewport) -> CycleOutcome {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.lock();
            state.loading = true;
            state.viewport = Some(viewport);
            state.committed = None;
            state.clear_layers();
        }
        log::debug!(
            "Cycle {sequence}: bbox {} zoom {}",
            viewport.bounds,
            viewport.zoom
        );

        let tier = viewport.tier();
        let query = self.query_for(&viewport);
        let result = self.source.fetch(&viewport, &query).await;

        let resolved = result.map(|response| resolve(&response.elements, tier.signals));

        let mut state = self.lock();
        let latest = self.latest_sequence();
        if sequence != latest {
            let error = resolved.err();
            match &error {
                Some(e) => log::error!(
                    "Cycle {sequence}: error fetching geodata (superseded by cycle {latest}): {e}"
                ),
                None => log::debug!("Cycle {sequence} superseded by cycle {latest}, discarding"),
            }
            return CycleOutcome::Superseded {
                sequence,
                latest,
                error,
            };
        }

        state.clear_layers();
        state.loading = false;

        // Styling draws from the styler's RNG, so only the winning cycle styles.
        match resolved {
            Ok(geometry) => {
                let (lines, markers) = self.draw(viewport.zoom, geometry);
                let (roads, signals) = (lines.len(), markers.len());
                for line in lines {
                    state.roads.add(line);
                }
                for marker in markers {
                    state.signals.add(marker);
                }
                state.committed = Some(sequence);
                log::info!("Cycle {sequence}: drew {roads} roads and {signals} signals");
                CycleOutcome::Committed {
                    sequence,
                    roads,
                    signals,
                }
            }
            Err(error) => {
                log::error!("Cycle {sequence}: error fetching geodata: {error}");
                CycleOutcome::Failed { sequence, error }
            }
        }
    }

    fn draw(&self, zoom: u8, geometry: ResolvedGeometry) -> (Vec<Polyline>, Vec<SignalMarker>) {
        let lines = geometry
            .roads
            .into_iter()
            .map(|path| {
                let style = self.styler.style(zoom, &path);
                Polyline {
                    way_id: path.way_id,
                    road_class: path.road_class,
                    points: path.points,
                    style,
                }
            })
            .collect();

        let icon = SignalIcon::red();
        let markers = geometry
            .signals
            .into_iter()
            .map(|signal| SignalMarker {
                node_id: signal.node_id,
                position: signal.position,
                icon: icon.clone(),
                popup: SIGNAL_POPUP.to_string(),
            })
            .collect();

        (lines, markers)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;
    use traffic_watch_geodata_models::{BoundingBox, GeodataResponse, LatLng};

    use super::*;
    use crate::style::{Congestion, FixedStyler, RandomStyler};

    /// Serves canned bodies keyed by zoom; a missing zoom is a fetch error.
    #[derive(Default)]
    struct StubSource {
        bodies: HashMap<u8, serde_json::Value>,
        gates: HashMap<u8, Arc<Notify>>,
        queries: Mutex<Vec<String>>,
    }

    impl StubSource {
        fn with(mut self, zoom: u8, body: serde_json::Value) -> Self {
            self.bodies.insert(zoom, body);
            self
        }

        fn gated(mut self, zoom: u8, gate: Arc<Notify>) -> Self {
            self.gates.insert(zoom, gate);
            self
        }
    }

    #[async_trait]
    impl GeodataSource for StubSource {
        async fn fetch(
            &self,
            viewport: &Viewport,
            query: &str,
        ) -> Result<GeodataResponse, GeodataError> {
            self.queries.lock().unwrap().push(query.to_string());
            if let Some(gate) = self.gates.get(&viewport.zoom) {
                gate.notified().await;
            }
            match self.bodies.get(&viewport.zoom) {
                Some(body) => Ok(serde_json::from_value(body.clone())?),
                None => Err(GeodataError::Status { status: 504 }),
            }
        }
    }

    fn viewport(zoom: u8) -> Viewport {
        Viewport::new(BoundingBox::new(19.0, 72.8, 19.1, 72.9), zoom)
    }

    fn view(source: StubSource) -> MapView {
        MapView::new(Arc::new(source), Arc::new(RandomStyler::seeded(1)))
    }

    fn two_node_way() -> serde_json::Value {
        serde_json::json!({"elements": [
            {"type": "node", "id": 1, "lat": 19.0, "lon": 72.8},
            {"type": "node", "id": 2, "lat": 19.01, "lon": 72.81},
            {"type": "way", "nodes": [1, 2], "tags": {"highway": "primary"}}
        ]})
    }

    fn signal_only() -> serde_json::Value {
        serde_json::json!({"elements": [
            {"type": "node", "id": 5, "lat": 19.05, "lon": 72.85,
             "tags": {"highway": "traffic_signals"}}
        ]})
    }

    #[tokio::test]
    async fn one_path_no_signals_at_zoom_12() {
        let view = view(StubSource::default().with(12, two_node_way()));
        let outcome = view.refresh(viewport(12)).await;
        assert!(matches!(
            outcome,
            CycleOutcome::Committed { sequence: 1, roads: 1, signals: 0 }
        ));

        let snapshot = view.snapshot();
        assert!(!snapshot.loading);
        assert_eq!(snapshot.committed_sequence, Some(1));
        assert_eq!(snapshot.roads.len(), 1);
        assert_eq!(snapshot.roads[0].points.len(), 2);
        assert!(matches!(snapshot.roads[0].style.weight, 2 | 4));
        assert!(snapshot.signals.is_empty());
    }

    #[tokio::test]
    async fn signal_marker_at_zoom_14() {
        let view = view(StubSource::default().with(14, signal_only()));
        view.refresh(viewport(14)).await;

        let snapshot = view.snapshot();
        assert!(snapshot.roads.is_empty());
        assert_eq!(snapshot.signals.len(), 1);
        let marker = &snapshot.signals[0];
        assert_eq!(marker.position, LatLng::new(19.05, 72.85));
        assert_eq!(marker.popup, "Traffic Signal");
        assert_eq!(marker.icon, SignalIcon::red());
    }

    #[tokio::test]
    async fn signals_never_drawn_below_zoom_14() {
        let view = view(StubSource::default().with(13, signal_only()));
        let outcome = view.refresh(viewport(13)).await;
        assert!(matches!(outcome, CycleOutcome::Committed { signals: 0, .. }));
        assert!(view.snapshot().signals.is_empty());
    }

    #[tokio::test]
    async fn query_follows_zoom() {
        let source = Arc::new(
            StubSource::default()
                .with(12, two_node_way())
                .with(16, two_node_way()),
        );
        let view = MapView::new(source.clone(), Arc::new(FixedStyler(Congestion::Clear)))
            .with_server_timeout(40);
        view.refresh(viewport(12)).await;
        view.refresh(viewport(16)).await;

        let queries = source.queries.lock().unwrap();
        assert_eq!(queries.len(), 2);
        assert!(queries[0].starts_with("[out:json][timeout:40];"));
        assert!(!queries[0].contains("traffic_signals"));
        assert!(queries[1].contains("trunk_link"));
        assert!(queries[1].contains("traffic_signals"));
    }

    #[tokio::test]
    async fn second_cycle_replaces_first() {
        let disjoint = serde_json::json!({"elements": [
            {"type": "node", "id": 10, "lat": 18.9, "lon": 72.7},
            {"type": "node", "id": 11, "lat": 18.91, "lon": 72.71},
            {"type": "node", "id": 12, "lat": 18.92, "lon": 72.72},
            {"type": "way", "id": 100, "nodes": [10, 11]},
            {"type": "way", "id": 101, "nodes": [11, 12]}
        ]});
        let view = view(
            StubSource::default()
                .with(12, two_node_way())
                .with(15, disjoint),
        );

        view.refresh(viewport(12)).await;
        view.refresh(viewport(15)).await;

        let snapshot = view.snapshot();
        let ids: Vec<Option<i64>> = snapshot.roads.iter().map(|r| r.way_id).collect();
        assert_eq!(ids, vec![Some(100), Some(101)]);
        assert!(snapshot.roads.iter().all(|r| r.style.weight == 4 || r.style.weight == 6));
    }

    #[tokio::test]
    async fn failed_fetch_leaves_layers_empty() {
        let view = view(StubSource::default().with(12, two_node_way()));
        view.refresh(viewport(12)).await;
        assert_eq!(view.snapshot().roads.len(), 1);

        let outcome = view.refresh(viewport(11)).await;
        assert!(matches!(
            outcome,
            CycleOutcome::Failed { sequence: 2, error: GeodataError::Status { status: 504 } }
        ));

        let snapshot = view.snapshot();
        assert!(!snapshot.loading);
        assert!(snapshot.roads.is_empty());
        assert!(snapshot.signals.is_empty());
        assert_eq!(snapshot.committed_sequence, None);
    }

    #[tokio::test]
    async fn malformed_body_is_a_failure() {
        let view = view(StubSource::default().with(12, serde_json::json!({"remark": "error"})));
        let outcome = view.refresh(viewport(12)).await;
        assert!(matches!(
            outcome,
            CycleOutcome::Failed { error: GeodataError::Json(_), .. }
        ));
        assert!(!view.is_loading());
    }

    #[tokio::test]
    async fn stale_cycle_does_not_overwrite_newer_one() {
        let gate = Arc::new(Notify::new());
        let view = Arc::new(view(
            StubSource::default()
                .with(12, two_node_way())
                .with(14, signal_only())
                .gated(12, gate.clone()),
        ));

        let slow = {
            let view = view.clone();
            tokio::spawn(async move { view.refresh(viewport(12)).await })
        };
        while view.latest_sequence() < 1 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert!(view.is_loading());

        let fast = view.refresh(viewport(14)).await;
        assert!(matches!(fast, CycleOutcome::Committed { sequence: 2, signals: 1, .. }));

        gate.notify_one();
        let stale = slow.await.unwrap();
        assert!(matches!(
            stale,
            CycleOutcome::Superseded { sequence: 1, latest: 2, error: None }
        ));

        let snapshot = view.snapshot();
        assert_eq!(snapshot.committed_sequence, Some(2));
        assert!(snapshot.roads.is_empty());
        assert_eq!(snapshot.signals.len(), 1);
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn superseded_failure_keeps_its_error() {
        let gate = Arc::new(Notify::new());
        let view = Arc::new(view(
            StubSource::default()
                .with(14, signal_only())
                .gated(11, gate.clone()),
        ));

        let slow = {
            let view = view.clone();
            tokio::spawn(async move { view.refresh(viewport(11)).await })
        };
        while view.latest_sequence() < 1 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        let fast = view.refresh(viewport(14)).await;
        assert!(fast.is_committed());

        gate.notify_one();
        let stale = slow.await.unwrap();
        assert!(matches!(
            stale,
            CycleOutcome::Superseded {
                sequence: 1,
                latest: 2,
                error: Some(GeodataError::Status { status: 504 }),
            }
        ));
        assert_eq!(view.snapshot().signals.len(), 1);
    }

    #[tokio::test]
    async fn superseded_cycle_does_not_consume_style_draws() {
        let disjoint = serde_json::json!({"elements": [
            {"type": "node", "id": 10, "lat": 18.9, "lon": 72.7},
            {"type": "node", "id": 11, "lat": 18.91, "lon": 72.71},
            {"type": "node", "id": 12, "lat": 18.92, "lon": 72.72},
            {"type": "way", "id": 100, "nodes": [10, 11]},
            {"type": "way", "id": 101, "nodes": [11, 12]}
        ]});

        let gate = Arc::new(Notify::new());
        let raced = Arc::new(MapView::new(
            Arc::new(
                StubSource::default()
                    .with(12, two_node_way())
                    .with(15, disjoint.clone())
                    .gated(12, gate.clone()),
            ),
            Arc::new(RandomStyler::seeded(5)),
        ));
        let slow = {
            let view = raced.clone();
            tokio::spawn(async move { view.refresh(viewport(12)).await })
        };
        while raced.latest_sequence() < 1 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        raced.refresh(viewport(15)).await;
        gate.notify_one();
        assert!(matches!(slow.await.unwrap(), CycleOutcome::Superseded { .. }));
        raced.refresh(viewport(15)).await;

        let alone = MapView::new(
            Arc::new(StubSource::default().with(15, disjoint)),
            Arc::new(RandomStyler::seeded(5)),
        );
        alone.refresh(viewport(15)).await;
        alone.refresh(viewport(15)).await;

        let styles = |view: &MapView| -> Vec<_> {
            view.snapshot().roads.into_iter().map(|r| r.style).collect()
        };
        assert_eq!(styles(&raced), styles(&alone));
    }
}
