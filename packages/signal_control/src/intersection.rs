//! One-dimensional lane model of a four-way intersection.
//!
//! Each direction has a single lane. A vehicle's position is the distance
//! of its front from that lane's stop line: positive while approaching,
//! negative once it has entered or crossed the junction.

use serde::Serialize;

use crate::controller::{LightColor, LightPhase, SignalController};
use crate::{ApproachCounts, Direction};

/// Distance a moving vehicle covers per tick.
pub const VEHICLE_SPEED: i32 = 3;

/// Bumper-to-bumper length of a vehicle.
pub const VEHICLE_LENGTH: i32 = 50;

/// Where new vehicles enter their lane.
pub const SPAWN_DISTANCE: i32 = 300;

/// Window before the stop line in which a vehicle obeys the light.
pub const STOP_LINE_MARGIN: i32 = 5;

/// Length of the detection zone in front of each stop line.
pub const DETECTION_ZONE: i32 = 200;

/// Vehicles at or beyond this distance have left the map.
pub const EXIT_DISTANCE: i32 = -550;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: u64,
    pub direction: Direction,
    /// Front of the vehicle relative to the stop line.
    pub distance: i32,
    pub stopped: bool,
    /// Consecutive ticks spent stopped.
    pub wait_ticks: u64,
}

impl Vehicle {
    const fn at_stop_line(&self) -> bool {
        self.distance >= 0 && self.distance <= STOP_LINE_MARGIN
    }

    /// Whether this vehicle's span overlaps `[from, from + length)`.
    const fn overlaps(&self, from: i32) -> bool {
        from < self.distance + VEHICLE_LENGTH && self.distance < from + VEHICLE_LENGTH
    }
}

#[derive(Debug, Default)]
pub struct Intersection {
    controller: SignalController,
    vehicles: Vec<Vehicle>,
    next_id: u64,
    cleared: u64,
}

impl Intersection {
    #[must_use]
    pub const fn new(controller: SignalController) -> Self {
        Self {
            controller,
            vehicles: Vec::new(),
            next_id: 0,
            cleared: 0,
        }
    }

    #[must_use]
    pub const fn controller(&self) -> &SignalController {
        &self.controller
    }

    pub const fn controller_mut(&mut self) -> &mut SignalController {
        &mut self.controller
    }

    #[must_use]
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    /// Vehicles that have left the map.
    #[must_use]
    pub const fn cleared(&self) -> u64 {
        self.cleared
    }

    /// Adds a vehicle at the entrance of `direction`'s lane. Returns `false`
    /// without adding one if the entrance is still occupied.
    pub fn spawn(&mut self, direction: Direction) -> bool {
        if self
            .vehicles
            .iter()
            .any(|v| v.direction == direction && v.overlaps(SPAWN_DISTANCE))
        {
            return false;
        }
        self.next_id += 1;
        self.vehicles.push(Vehicle {
            id: self.next_id,
            direction,
            distance: SPAWN_DISTANCE,
            stopped: false,
            wait_ticks: 0,
        });
        true
    }

    /// Vehicles inside each approach's detection zone.
    #[must_use]
    pub fn counts(&self) -> ApproachCounts {
        let mut counts = ApproachCounts::default();
        for vehicle in &self.vehicles {
            if vehicle.distance < DETECTION_ZONE && vehicle.distance + VEHICLE_LENGTH > 0 {
                counts.add(vehicle.direction);
            }
        }
        counts
    }

    /// Sum of every vehicle's current wait.
    #[must_use]
    pub fn total_wait(&self) -> u64 {
        self.vehicles.iter().map(|v| v.wait_ticks).sum()
    }

    fn blocked(&self, index: usize) -> bool {
        let vehicle = &self.vehicles[index];
        let ahead = vehicle.distance - VEHICLE_SPEED;
        self.vehicles.iter().enumerate().any(|(i, other)| {
            i != index && other.direction == vehicle.direction && other.overlaps(ahead)
        })
    }

    /// Advances the light and every vehicle by one tick, in arrival order.
    pub fn step(&mut self) -> LightPhase {
        let phase = self.controller.tick();

        for index in 0..self.vehicles.len() {
            let blocked = self.blocked(index);
            let vehicle = &mut self.vehicles[index];
            let light = phase.color_for(vehicle.direction.axis());
            vehicle.stopped = blocked || (vehicle.at_stop_line() && light != LightColor::Green);
            if vehicle.stopped {
                vehicle.wait_ticks += 1;
            } else {
                vehicle.wait_ticks = 0;
                vehicle.distance -= VEHICLE_SPEED;
            }
        }

        let before = self.vehicles.len();
        self.vehicles.retain(|v| v.distance > EXIT_DISTANCE);
        self.cleared += (before - self.vehicles.len()) as u64;

        phase
    }
}
