//! Two-phase signal controller with a yellow transition.

use serde::Serialize;
use strum_macros::Display;

use crate::Axis;

/// Ticks the yellow light is held before the green swaps axes.
pub const YELLOW_DURATION_TICKS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LightColor {
    Green,
    Yellow,
    Red,
}

/// Colors shown to each axis for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LightPhase {
    pub north_south: LightColor,
    pub east_west: LightColor,
}

impl LightPhase {
    const fn with(axis: Axis, color: LightColor) -> Self {
        match axis {
            Axis::NorthSouth => Self {
                north_south: color,
                east_west: LightColor::Red,
            },
            Axis::EastWest => Self {
                north_south: LightColor::Red,
                east_west: color,
            },
        }
    }

    #[must_use]
    pub const fn color_for(&self, axis: Axis) -> LightColor {
        match axis {
            Axis::NorthSouth => self.north_south,
            Axis::EastWest => self.east_west,
        }
    }
}

/// Holds green on one axis; a switch request runs a yellow phase on that
/// axis and then hands green to the other one.
#[derive(Debug, Clone)]
pub struct SignalController {
    green: Axis,
    yellow_elapsed: Option<u32>,
    switches: u64,
}

impl Default for SignalController {
    fn default() -> Self {
        Self::new(Axis::NorthSouth)
    }
}

impl SignalController {
    #[must_use]
    pub const fn new(green: Axis) -> Self {
        Self {
            green,
            yellow_elapsed: None,
            switches: 0,
        }
    }

    /// Axis currently holding green (or yellow).
    #[must_use]
    pub const fn green_axis(&self) -> Axis {
        self.green
    }

    #[must_use]
    pub const fn is_yellow(&self) -> bool {
        self.yellow_elapsed.is_some()
    }

    /// Completed green swaps.
    #[must_use]
    pub const fn switches(&self) -> u64 {
        self.switches
    }

    /// Starts the yellow phase. Ignored (returns `false`) while one is
    /// already running.
    pub fn request_switch(&mut self) -> bool {
        if self.is_yellow() {
            return false;
        }
        self.yellow_elapsed = Some(0);
        true
    }

    /// Advances one tick and returns the colors shown during it.
    ///
    /// Yellow is shown for `YELLOW_DURATION_TICKS + 1` ticks; the swap
    /// takes effect from the tick after.
    pub fn tick(&mut self) -> LightPhase {
        let Some(elapsed) = self.yellow_elapsed else {
            return LightPhase::with(self.green, LightColor::Green);
        };
        let elapsed = elapsed + 1;
        let phase = LightPhase::with(self.green, LightColor::Yellow);
        if elapsed > YELLOW_DURATION_TICKS {
            self.yellow_elapsed = None;
            self.green = self.green.other();
            self.switches += 1;
            log::debug!("Signal swapped, {} now green", self.green);
        } else {
            self.yellow_elapsed = Some(elapsed);
        }
        phase
    }
}
