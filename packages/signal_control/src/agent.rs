//! Tabular Q-learning agent.
//!
//! States are the discretized vehicle counts on the two axes and the agent
//! picks between keeping the current green and switching. The table is
//! keyed by strings (`"(0, 1)"` for states, `"0"`/`"1"` for actions) so it
//! can be stored as plain JSON and edited by hand.

use std::collections::BTreeMap;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{ApproachCounts, SignalControlError};

/// Axis count at which traffic is considered medium.
pub const MEDIUM_MIN: usize = 3;

/// Axis count at which traffic is considered high.
pub const HIGH_MIN: usize = 6;

/// Coarse traffic level on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TrafficLevel {
    Low,
    Medium,
    High,
}

impl TrafficLevel {
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }
}

/// Buckets a vehicle count: below 3 is low, below 6 medium, else high.
#[must_use]
pub const fn discretize(count: usize) -> TrafficLevel {
    if count < MEDIUM_MIN {
        TrafficLevel::Low
    } else if count < HIGH_MIN {
        TrafficLevel::Medium
    } else {
        TrafficLevel::High
    }
}

/// What the agent sees: traffic levels on the north-south and east-west
/// axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrafficState {
    pub north_south: TrafficLevel,
    pub east_west: TrafficLevel,
}

impl TrafficState {
    #[must_use]
    pub const fn from_counts(counts: &ApproachCounts) -> Self {
        Self {
            north_south: discretize(counts.north_south()),
            east_west: discretize(counts.east_west()),
        }
    }

    /// Table key, e.g. `"(0, 2)"`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("({}, {})", self.north_south.index(), self.east_west.index())
    }
}

/// Decision taken at each decision interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Leave the current green.
    Keep,
    /// Start the yellow phase towards the other axis.
    Switch,
}

impl Action {
    pub const ALL: [Self; 2] = [Self::Keep, Self::Switch];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Keep => "0",
            Self::Switch => "1",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "0" => Some(Self::Keep),
            "1" => Some(Self::Switch),
            _ => None,
        }
    }
}

/// Learning hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    /// Step size of each update.
    pub learning_rate: f64,
    /// Weight of the best next-state value.
    pub discount_factor: f64,
    /// Probability of a random action.
    pub exploration_rate: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount_factor: 0.9,
            exploration_rate: 0.1,
        }
    }
}

/// State key → action key → value.
pub type QTable = BTreeMap<String, BTreeMap<String, f64>>;

/// `old + lr * (reward + gamma * next_max - old)`
#[must_use]
pub fn bellman(old: f64, reward: f64, next_max: f64, learning_rate: f64, gamma: f64) -> f64 {
    learning_rate.mul_add(gamma.mul_add(next_max, reward) - old, old)
}

/// Epsilon-greedy Q-learning agent.
#[derive(Debug)]
pub struct QAgent {
    table: QTable,
    config: AgentConfig,
    rng: StdRng,
}

impl QAgent {
    /// Creates an agent with an empty table and an entropy-seeded RNG.
    #[must_use]
    pub fn new(config: AgentConfig) -> Self {
        Self {
            table: QTable::new(),
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates an agent whose exploration is reproducible.
    #[must_use]
    pub fn seeded(config: AgentConfig, seed: u64) -> Self {
        Self {
            table: QTable::new(),
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Replaces the table, e.g. with one loaded from disk.
    #[must_use]
    pub fn with_table(mut self, table: QTable) -> Self {
        self.table = table;
        self
    }

    #[must_use]
    pub const fn table(&self) -> &QTable {
        &self.table
    }

    #[must_use]
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Learned value of `action` in `state`, 0 if never updated.
    #[must_use]
    pub fn q_value(&self, state: &TrafficState, action: Action) -> f64 {
        self.table
            .get(&state.key())
            .and_then(|actions| actions.get(action.key()))
            .copied()
            .unwrap_or(0.0)
    }

    fn random_action(&mut self) -> Action {
        if self.rng.gen_bool(0.5) {
            Action::Switch
        } else {
            Action::Keep
        }
    }

    /// Highest-valued action known for `state`; ties keep the first.
    #[must_use]
    pub fn best_action(&self, state: &TrafficState) -> Option<Action> {
        let mut best: Option<(Action, f64)> = None;
        for (key, &value) in self.table.get(&state.key())? {
            let Some(action) = Action::from_key(key) else {
                continue;
            };
            if best.is_none_or(|(_, top)| value > top) {
                best = Some((action, value));
            }
        }
        best.map(|(action, _)| action)
    }

    /// Explores with probability epsilon, otherwise exploits. A state with
    /// no learned values gets a random action.
    pub fn choose_action(&mut self, state: &TrafficState) -> Action {
        if self.rng.gen_range(0.0..1.0) < self.config.exploration_rate {
            return self.random_action();
        }
        match self.best_action(state) {
            Some(action) => action,
            None => self.random_action(),
        }
    }

    /// Applies one Bellman update and returns the new value.
    pub fn update(
        &mut self,
        state: &TrafficState,
        action: Action,
        reward: f64,
        next_state: &TrafficState,
    ) -> f64 {
        let old = self.q_value(state, action);
        let next_max = self
            .table
            .get(&next_state.key())
            .and_then(|actions| actions.values().copied().reduce(f64::max))
            .unwrap_or(0.0);
        let new = bellman(
            old,
            reward,
            next_max,
            self.config.learning_rate,
            self.config.discount_factor,
        );
        self.table
            .entry(state.key())
            .or_default()
            .insert(action.key().to_string(), new);
        log::trace!(
            "Q{}[{}]: {old:.3} -> {new:.3} (reward {reward}, next max {next_max:.3})",
            state.key(),
            action.key()
        );
        new
    }
}

/// Loads a Q-table, or `None` if the file does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_table(path: &Path) -> Result<Option<QTable>, SignalControlError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Writes a Q-table as JSON.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_table(path: &Path, table: &QTable) -> Result<(), SignalControlError> {
    std::fs::write(path, serde_json::to_string(table)?)?;
    Ok(())
}
