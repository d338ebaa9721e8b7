//! Bounded experience replay.

use crate::action::Action;
use crate::observation::Perception;
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A single `(state, action, reward, next_state)` transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experience {
    pub state: Perception,
    pub action: Action,
    pub reward: f64,
    pub next_state: Perception,
    /// `true` if the transition ended the episode.
    pub done: bool,
}

impl Experience {
    pub fn new(
        state: Perception,
        action: Action,
        reward: f64,
        next_state: Perception,
        done: bool,
    ) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            done,
        }
    }
}

/// A ring buffer that keeps the most recent `capacity` items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> ReplayBuffer<T> {
    /// Creates an empty buffer. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
        }
    }

    /// Appends an item, evicting the oldest once full.
    pub fn push(&mut self, item: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates from the oldest item to the newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Draws up to `n` distinct items uniformly at random.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<&T> {
        let amount = n.min(self.items.len());
        index::sample(rng, self.items.len(), amount)
            .into_iter()
            .filter_map(|i| self.items.get(i))
            .collect()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
