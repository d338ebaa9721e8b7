//! Tabular action values for reactive agents.

use crate::action::Action;
use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A canonical identifier for a belief state.
///
/// Built by [`Perception::canonical_key`](crate::Perception::canonical_key): two
/// beliefs with identical content always map to the same id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StateId(String);

impl StateId {
    /// Creates a `StateId` from a raw string.
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A composite key representing a state-action pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateActionPair {
    pub state: StateId,
    pub action: Action,
}

impl StateActionPair {
    pub fn new(state: StateId, action: Action) -> Self {
        Self { state, action }
    }
}

/// The learned value of a state-action pair, with associated statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QValue {
    /// The mean learned value for this state-action pair.
    pub mean: f64,
    /// The variance of the samples seen so far, indicating uncertainty.
    pub variance: f64,
    /// The number of times this value has been updated.
    pub update_count: u64,
    /// The timestamp of the last update.
    pub last_updated: Timestamp,
}

impl QValue {
    pub fn new(initial_value: f64) -> Self {
        Self {
            mean: initial_value,
            variance: 0.0,
            update_count: 0,
            last_updated: Timestamp::now(),
        }
    }

    /// Moves the mean towards `sample`: `mean += rate * (sample - mean)`.
    ///
    /// The variance follows Welford's incremental update.
    pub fn update(&mut self, sample: f64, learning_rate: f64) {
        let old_mean = self.mean;
        self.mean += learning_rate * (sample - self.mean);

        if self.update_count > 0 {
            let delta = sample - old_mean;
            let delta2 = sample - self.mean;
            self.variance += (delta * delta2 - self.variance) / (self.update_count as f64);
        }

        self.update_count += 1;
        self.last_updated = Timestamp::now();
    }
}

impl Default for QValue {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// A lookup table of `StateId × Action → QValue`.
///
/// Missing entries have no value at all, which lets callers tell "never tried"
/// apart from "tried and worth zero".
#[derive(Debug, Clone, Default)]
pub struct ActionValueTable {
    values: HashMap<StateActionPair, QValue>,
    total_updates: u64,
}

impl ActionValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The learned value, if any.
    pub fn get(&self, state: &StateId, action: Action) -> Option<f64> {
        self.values
            .get(&StateActionPair::new(state.clone(), action))
            .map(|q| q.mean)
    }

    /// Applies the one-step update `Q += rate * (reward - Q)` and returns the new value.
    pub fn update(&mut self, state: &StateId, action: Action, reward: f64, learning_rate: f64) -> f64 {
        let qvalue = self
            .values
            .entry(StateActionPair::new(state.clone(), action))
            .or_default();
        qvalue.update(reward, learning_rate);
        self.total_updates += 1;
        qvalue.mean
    }

    /// The values of every action in `actions`, or `None` if any of them is unknown.
    pub fn values_for(&self, state: &StateId, actions: &[Action]) -> Option<Vec<f64>> {
        if actions.is_empty() {
            return None;
        }
        actions.iter().map(|a| self.get(state, *a)).collect()
    }

    /// The greedy action, provided every action in `actions` has a value.
    ///
    /// Ties go to the action listed first.
    pub fn best_action(&self, state: &StateId, actions: &[Action]) -> Option<Action> {
        let values = self.values_for(state, actions)?;
        let mut best = 0;
        for (i, value) in values.iter().enumerate().skip(1) {
            if *value > values[best] {
                best = i;
            }
        }
        Some(actions[best])
    }

    /// Returns the number of state-action pairs in the table.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn total_updates(&self) -> u64 {
        self.total_updates
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.total_updates = 0;
    }
}
