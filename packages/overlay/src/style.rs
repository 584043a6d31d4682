//! Line styling for road polylines.
//!
//! Styling goes through the [`TrafficStyler`] trait so a real congestion
//! feed can replace the simulated one without touching the render path.
//! [`RandomStyler`] is the simulated default: a uniformly random palette
//! color and an occasional heavier stroke.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};
use traffic_watch_geodata_models::RoadPath;

/// Opacity applied to every road line.
pub const LINE_OPACITY: f64 = 0.8;

/// Draws above this value add [`HEAVY_EXTRA_WEIGHT`] to the stroke.
pub const HEAVY_DRAW_THRESHOLD: f64 = 0.8;

/// Extra stroke weight for a "heavy" segment.
pub const HEAVY_EXTRA_WEIGHT: u8 = 2;

/// Simulated congestion level, rendered as a line color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Congestion {
    /// Free-flowing (green).
    Clear,
    /// Slow (orange).
    Moderate,
    /// Jammed (red).
    Heavy,
}

impl Congestion {
    /// All levels, in palette order.
    pub const ALL: [Self; 3] = [Self::Clear, Self::Moderate, Self::Heavy];

    /// Hex color for this level.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Clear => "#22c55e",
            Self::Moderate => "#f97316",
            Self::Heavy => "#ef4444",
        }
    }
}

/// How a single road polyline is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineStyle {
    /// Congestion level the color stands for.
    pub congestion: Congestion,
    /// Hex stroke color.
    pub color: String,
    /// Stroke weight in pixels.
    pub weight: u8,
    /// Stroke opacity.
    pub opacity: f64,
}

impl LineStyle {
    /// Builds a style for `congestion` with the standard opacity.
    #[must_use]
    pub fn new(congestion: Congestion, weight: u8) -> Self {
        Self {
            congestion,
            color: congestion.color().to_string(),
            weight,
            opacity: LINE_OPACITY,
        }
    }
}

/// Stroke weight before any random emphasis: 2 below zoom 13, 3 below
/// zoom 15, 4 otherwise.
#[must_use]
pub const fn base_weight(zoom: u8) -> u8 {
    if zoom < 13 {
        2
    } else if zoom < 15 {
        3
    } else {
        4
    }
}

/// Stroke weight for `zoom` given a uniform `draw` in `[0, 1)`.
#[must_use]
pub fn stroke_weight(zoom: u8, draw: f64) -> u8 {
    if draw > HEAVY_DRAW_THRESHOLD {
        base_weight(zoom) + HEAVY_EXTRA_WEIGHT
    } else {
        base_weight(zoom)
    }
}

/// Chooses the style of each road line.
pub trait TrafficStyler: Send + Sync {
    /// Returns the style for `path` rendered at `zoom`.
    fn style(&self, zoom: u8, path: &RoadPath) -> LineStyle;
}

/// Simulated traffic: random palette color, 20% chance of a heavier line.
pub struct RandomStyler {
    rng: Mutex<StdRng>,
}

impl RandomStyler {
    /// A styler seeded from OS entropy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// A deterministic styler for a fixed seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomStyler {
    fn default() -> Self {
        Self::new()
    }
}

impl TrafficStyler for RandomStyler {
    fn style(&self, zoom: u8, _path: &RoadPath) -> LineStyle {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let congestion = Congestion::ALL[rng.gen_range(0..Congestion::ALL.len())];
        let draw: f64 = rng.r#gen();
        LineStyle::new(congestion, stroke_weight(zoom, draw))
    }
}

/// Paints every road the same way. Useful for previews and tests.
pub struct FixedStyler(pub Congestion);

impl TrafficStyler for FixedStyler {
    fn style(&self, zoom: u8, _path: &RoadPath) -> LineStyle {
        LineStyle::new(self.0, base_weight(zoom))
    }
}

#[cfg(test)]
mod tests {
    use traffic_watch_geodata_models::LatLng;

    use super::*;

    fn path() -> RoadPath {
        RoadPath {
            way_id: Some(1),
            road_class: None,
            points: vec![LatLng::new(0.0, 0.0), LatLng::new(1.0, 1.0)],
        }
    }

    #[test]
    fn base_weight_bands() {
        assert_eq!(base_weight(0), 2);
        assert_eq!(base_weight(12), 2);
        assert_eq!(base_weight(13), 3);
        assert_eq!(base_weight(14), 3);
        assert_eq!(base_weight(15), 4);
        assert_eq!(base_weight(20), 4);
    }

    #[test]
    fn heavy_only_strictly_above_threshold() {
        assert_eq!(stroke_weight(12, 0.0), 2);
        assert_eq!(stroke_weight(12, 0.8), 2);
        assert_eq!(stroke_weight(12, 0.800_001), 4);
        assert_eq!(stroke_weight(14, 0.99), 5);
        assert_eq!(stroke_weight(16, 0.5), 4);
        assert_eq!(stroke_weight(16, 0.9), 6);
    }

    #[test]
    fn seeded_styler_is_deterministic() {
        let a = RandomStyler::seeded(42);
        let b = RandomStyler::seeded(42);
        for zoom in [10, 13, 16] {
            for _ in 0..50 {
                assert_eq!(a.style(zoom, &path()), b.style(zoom, &path()));
            }
        }
    }

    #[test]
    fn random_styles_stay_in_bounds() {
        let styler = RandomStyler::seeded(7);
        for _ in 0..200 {
            let style = styler.style(14, &path());
            assert!(style.weight == 3 || style.weight == 5);
            assert_eq!(style.color, style.congestion.color());
            assert!((style.opacity - LINE_OPACITY).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn fixed_styler() {
        let style = FixedStyler(Congestion::Heavy).style(15, &path());
        assert_eq!(style.color, "#ef4444");
        assert_eq!(style.weight, 4);
    }
}
