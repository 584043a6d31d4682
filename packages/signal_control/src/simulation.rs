//! Headless training loop for the signal agent.
//!
//! Every tick: maybe spawn a vehicle, observe the detection zones, and on
//! decision ticks learn from the previous decision and take a new one.
//! Then the light and vehicles advance and the tick's reward is the
//! negative of the total waiting time.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::Direction;
use crate::agent::{Action, QAgent, TrafficState};
use crate::controller::LightPhase;
use crate::intersection::Intersection;

/// Ticks between vehicle arrivals.
pub const SPAWN_INTERVAL_TICKS: u32 = 100;

/// Ticks between agent decisions (three seconds at 60 ticks per second).
pub const DECISION_INTERVAL_TICKS: u32 = 180;

/// Totals over a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationStats {
    pub ticks: u64,
    /// Vehicles that entered the map.
    pub spawned: u64,
    /// Arrivals dropped because the lane entrance was occupied.
    pub spawn_blocked: u64,
    /// Vehicles that left the map.
    pub cleared: u64,
    pub decisions: u64,
    /// Completed green swaps.
    pub switches: u64,
    /// Sum of every tick's reward.
    pub total_reward: f64,
}

pub struct Simulation {
    intersection: Intersection,
    agent: QAgent,
    rng: StdRng,
    spawn_timer: u32,
    decision_timer: u32,
    last: Option<(TrafficState, Action)>,
    last_reward: f64,
    stats: SimulationStats,
}

impl Simulation {
    /// Creates a simulation with entropy-seeded arrivals.
    #[must_use]
    pub fn new(agent: QAgent) -> Self {
        Self::with_rng(agent, StdRng::from_entropy())
    }

    /// Creates a simulation whose arrivals are reproducible.
    #[must_use]
    pub fn seeded(agent: QAgent, seed: u64) -> Self {
        Self::with_rng(agent, StdRng::seed_from_u64(seed))
    }

    fn with_rng(agent: QAgent, rng: StdRng) -> Self {
        Self {
            intersection: Intersection::default(),
            agent,
            rng,
            spawn_timer: 0,
            decision_timer: 0,
            last: None,
            last_reward: 0.0,
            stats: SimulationStats::default(),
        }
    }

    #[must_use]
    pub const fn intersection(&self) -> &Intersection {
        &self.intersection
    }

    #[must_use]
    pub const fn agent(&self) -> &QAgent {
        &self.agent
    }

    /// Hands back the agent, e.g. to save its table.
    #[must_use]
    pub fn into_agent(self) -> QAgent {
        self.agent
    }

    #[must_use]
    pub fn stats(&self) -> SimulationStats {
        SimulationStats {
            cleared: self.intersection.cleared(),
            switches: self.intersection.controller().switches(),
            ..self.stats.clone()
        }
    }

    fn spawn(&mut self) {
        let direction = Direction::ALL[self.rng.gen_range(0..Direction::ALL.len())];
        if self.intersection.spawn(direction) {
            self.stats.spawned += 1;
        } else {
            self.stats.spawn_blocked += 1;
            log::trace!("Lane {direction} entrance occupied, arrival dropped");
        }
    }

    fn decide(&mut self, state: TrafficState) {
        if let Some((last_state, last_action)) = self.last {
            self.agent.update(&last_state, last_action, self.last_reward, &state);
        }
        let action = self.agent.choose_action(&state);
        if action == Action::Switch && self.intersection.controller_mut().request_switch() {
            log::debug!(
                "Tick {}: switching away from {}",
                self.stats.ticks,
                self.intersection.controller().green_axis()
            );
        }
        self.last = Some((state, action));
        self.stats.decisions += 1;
    }

    /// Runs one tick and returns the light colors shown during it.
    #[allow(clippy::cast_precision_loss)]
    pub fn step(&mut self) -> LightPhase {
        self.spawn_timer += 1;
        if self.spawn_timer > SPAWN_INTERVAL_TICKS {
            self.spawn_timer = 0;
            self.spawn();
        }

        let state = TrafficState::from_counts(&self.intersection.counts());

        self.decision_timer += 1;
        if self.decision_timer > DECISION_INTERVAL_TICKS {
            self.decision_timer = 0;
            self.decide(state);
        }

        let phase = self.intersection.step();
        self.last_reward = -(self.intersection.total_wait() as f64);
        self.stats.total_reward += self.last_reward;
        self.stats.ticks += 1;
        phase
    }

    /// Runs `ticks` ticks and returns the totals so far.
    pub fn run(&mut self, ticks: u64) -> SimulationStats {
        for _ in 0..ticks {
            self.step();
        }
        let stats = self.stats();
        log::info!(
            "Simulated {} ticks: {} vehicles in, {} out, {} decisions, {} switches",
            stats.ticks,
            stats.spawned,
            stats.cleared,
            stats.decisions,
            stats.switches
        );
        stats
    }
}
