#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Adaptive traffic signal control for a single four-way intersection.
//!
//! A tabular Q-learning [`agent`] watches how many vehicles queue on each
//! axis and decides every few seconds whether to keep the current green
//! or switch. The [`controller`] turns a switch into a yellow phase
//! followed by the swap, the [`intersection`] moves vehicles and tallies
//! their waiting time, and [`simulation`] ties them into a headless loop
//! whose reward is the negative total wait.

pub mod agent;
pub mod controller;
pub mod intersection;
pub mod simulation;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};
use thiserror::Error;

pub use agent::{Action, AgentConfig, QAgent, QTable, TrafficLevel, TrafficState};
pub use controller::{LightColor, LightPhase, SignalController};
pub use intersection::{Intersection, Vehicle};
pub use simulation::{Simulation, SimulationStats};

/// Direction of travel of an approaching vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Self; 4] = [Self::North, Self::South, Self::East, Self::West];

    /// The signal axis this direction is controlled by.
    #[must_use]
    pub const fn axis(self) -> Axis {
        match self {
            Self::North | Self::South => Axis::NorthSouth,
            Self::East | Self::West => Axis::EastWest,
        }
    }
}

/// One of the two signal groups at the intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    #[strum(serialize = "N-S")]
    NorthSouth,
    #[strum(serialize = "E-W")]
    EastWest,
}

impl Axis {
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::NorthSouth => Self::EastWest,
            Self::EastWest => Self::NorthSouth,
        }
    }
}

/// Vehicles detected on each approach.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApproachCounts {
    pub north: usize,
    pub south: usize,
    pub east: usize,
    pub west: usize,
}

impl ApproachCounts {
    pub const fn add(&mut self, direction: Direction) {
        match direction {
            Direction::North => self.north += 1,
            Direction::South => self.south += 1,
            Direction::East => self.east += 1,
            Direction::West => self.west += 1,
        }
    }

    #[must_use]
    pub const fn north_south(&self) -> usize {
        self.north + self.south
    }

    #[must_use]
    pub const fn east_west(&self) -> usize {
        self.east + self.west
    }
}

/// Errors from persisting the Q-table.
#[derive(Debug, Error)]
pub enum SignalControlError {
    /// Reading or writing the table file failed.
    #[error("Q-table I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The table file is not a valid JSON Q-table.
    #[error("Q-table JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directions_map_to_axes() {
        assert_eq!(Direction::North.axis(), Axis::NorthSouth);
        assert_eq!(Direction::South.axis(), Axis::NorthSouth);
        assert_eq!(Direction::East.axis(), Axis::EastWest);
        assert_eq!(Direction::West.axis(), Axis::EastWest);
        assert_eq!(Axis::NorthSouth.other(), Axis::EastWest);
    }

    #[test]
    fn counts_sum_per_axis() {
        let mut counts = ApproachCounts::default();
        for direction in [Direction::North, Direction::South, Direction::South, Direction::West] {
            counts.add(direction);
        }
        assert_eq!(counts.north_south(), 3);
        assert_eq!(counts.east_west(), 1);
    }
}
