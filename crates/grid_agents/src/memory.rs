//! Bounded episodic memory.
//!
//! Every agent keeps a short FIFO log of what it perceived, decided, did and learned.
//! The log is append-only during a step and evicts its oldest entries once full.

use crate::action::Action;
use crate::learning::StateId;
use crate::observation::Perception;
use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// The payload recorded by a `learn` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningRecord {
    pub state: StateId,
    pub action: Action,
    pub reward: f64,
    /// The value estimate after the update.
    pub value: f64,
    /// The exploration rate after decay.
    pub exploration: f64,
}

/// A tagged event in the memory log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum MemoryEvent {
    Perception(Perception),
    Decision(Action),
    Action(Action),
    Learning(LearningRecord),
}

impl MemoryEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            MemoryEvent::Perception(_) => EventKind::Perception,
            MemoryEvent::Decision(_) => EventKind::Decision,
            MemoryEvent::Action(_) => EventKind::Action,
            MemoryEvent::Learning(_) => EventKind::Learning,
        }
    }
}

/// The kind tag of a [`MemoryEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Perception,
    Decision,
    Action,
    Learning,
}

/// A timestamped memory entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub event: MemoryEvent,
    pub timestamp: Timestamp,
}

/// A bounded FIFO log of [`MemoryEntry`] values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    entries: VecDeque<MemoryEntry>,
    capacity: usize,
}

impl Memory {
    /// Creates an empty memory. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends an event, evicting the oldest entry when full.
    pub fn record(&mut self, event: MemoryEvent) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(MemoryEntry {
            event,
            timestamp: Timestamp::now(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates from the oldest entry to the newest.
    pub fn iter(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.entries.iter()
    }

    /// The most recent entry.
    pub fn last(&self) -> Option<&MemoryEntry> {
        self.entries.back()
    }

    /// The `n` most recent entries of the given kind, newest first.
    pub fn recent(&self, kind: EventKind, n: usize) -> Vec<&MemoryEntry> {
        self.entries
            .iter()
            .rev()
            .filter(|e| e.event.kind() == kind)
            .take(n)
            .collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.entries.iter().filter(|e| e.event.kind() == kind).count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new(100)
    }
}
