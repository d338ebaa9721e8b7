//! Environment snapshots and what an agent makes of them.
//!
//! [`GridState`] is the authoritative snapshot the environment hands out each step.
//! [`Perception`] is the agent-side view of it: every field is optional because an
//! agent only sees the fields its [`Capability`] set grants, and the agent's belief
//! is built by merging successive perceptions.

use crate::action::Action;
use crate::learning::StateId;
use crate::types::{Orientation, Position, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// An immutable snapshot of the grid world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridState {
    /// The agent's cell.
    pub position: Position,
    /// The direction the agent is facing.
    pub orientation: Orientation,
    /// The goal cell.
    pub goal_position: Position,
    /// Every blocked cell.
    pub obstacles: BTreeSet<Position>,
    /// The actions the environment accepts, in canonical order.
    pub available_actions: Vec<Action>,
}

impl GridState {
    /// Creates a snapshot with no obstacles and the full action vocabulary.
    pub fn new(position: Position, orientation: Orientation, goal_position: Position) -> Self {
        Self {
            position,
            orientation,
            goal_position,
            obstacles: BTreeSet::new(),
            available_actions: Action::ALL.to_vec(),
        }
    }

    /// Replaces the obstacle set.
    pub fn with_obstacles(mut self, obstacles: impl IntoIterator<Item = Position>) -> Self {
        self.obstacles = obstacles.into_iter().collect();
        self
    }

    /// Replaces the available actions.
    pub fn with_available_actions(mut self, actions: Vec<Action>) -> Self {
        self.available_actions = actions;
        self
    }

    /// Returns `true` when the agent stands on the goal.
    pub fn is_at_goal(&self) -> bool {
        self.position == self.goal_position
    }
}

impl Default for GridState {
    fn default() -> Self {
        Self::new(Position::new(0, 0), Orientation::Right, Position::new(0, 0))
    }
}

/// A named field of a [`GridState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateField {
    Position,
    Orientation,
    GoalPosition,
    Obstacles,
    AvailableActions,
}

impl StateField {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateField::Position => "position",
            StateField::Orientation => "orientation",
            StateField::GoalPosition => "goal_position",
            StateField::Obstacles => "obstacles",
            StateField::AvailableActions => "available_actions",
        }
    }
}

/// Something an agent is able to do.
///
/// `Observe` grants the whole snapshot. Without it, an agent only perceives the
/// fields named by its `Sense` capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Observe,
    Decide,
    Act,
    Plan,
    Learn,
    Sense(StateField),
}

impl Capability {
    /// The capability set a plain agent starts with.
    pub fn defaults() -> Vec<Capability> {
        vec![Capability::Observe, Capability::Decide, Capability::Act]
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Observe => f.write_str("observe"),
            Capability::Decide => f.write_str("decide"),
            Capability::Act => f.write_str("act"),
            Capability::Plan => f.write_str("plan"),
            Capability::Learn => f.write_str("learn"),
            Capability::Sense(field) => write!(f, "sense:{}", field.as_str()),
        }
    }
}

/// A partial view of a [`GridState`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Perception {
    pub position: Option<Position>,
    pub orientation: Option<Orientation>,
    pub goal_position: Option<Position>,
    pub obstacles: Option<BTreeSet<Position>>,
    pub available_actions: Option<Vec<Action>>,
}

impl Perception {
    /// Filters `state` down to the fields `capabilities` allow.
    pub fn filtered(state: &GridState, capabilities: &[Capability]) -> Self {
        if capabilities.contains(&Capability::Observe) {
            return Self::from(state);
        }
        let sees = |field| capabilities.contains(&Capability::Sense(field));
        Self {
            position: sees(StateField::Position).then_some(state.position),
            orientation: sees(StateField::Orientation).then_some(state.orientation),
            goal_position: sees(StateField::GoalPosition).then_some(state.goal_position),
            obstacles: sees(StateField::Obstacles).then(|| state.obstacles.clone()),
            available_actions: sees(StateField::AvailableActions)
                .then(|| state.available_actions.clone()),
        }
    }

    /// Overwrites every field that `other` carries.
    pub fn merge(&mut self, other: &Perception) {
        if let Some(p) = other.position {
            self.position = Some(p);
        }
        if let Some(o) = other.orientation {
            self.orientation = Some(o);
        }
        if let Some(g) = other.goal_position {
            self.goal_position = Some(g);
        }
        if let Some(obstacles) = &other.obstacles {
            self.obstacles = Some(obstacles.clone());
        }
        if let Some(actions) = &other.available_actions {
            self.available_actions = Some(actions.clone());
        }
    }

    /// Returns `true` if no field is known.
    pub fn is_empty(&self) -> bool {
        self.position.is_none()
            && self.orientation.is_none()
            && self.goal_position.is_none()
            && self.obstacles.is_none()
            && self.available_actions.is_none()
    }

    /// The available actions, or `[wait]` when they are unknown.
    pub fn available_actions_or_wait(&self) -> Vec<Action> {
        match &self.available_actions {
            Some(actions) if !actions.is_empty() => actions.clone(),
            _ => vec![Action::Wait],
        }
    }

    /// `Some(true)` when both the position and the goal are known and equal.
    pub fn is_at_goal(&self) -> Option<bool> {
        Some(self.position? == self.goal_position?)
    }

    /// Reads a named field for rule evaluation.
    ///
    /// Known names: `position.x`, `position.y` (also `position[0]`, `position[1]`),
    /// `goal_position.x`, `goal_position.y`, `orientation`, `distance_to_goal`,
    /// `obstacle_count`. Unknown names and unknown fields yield `None`.
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "position.x" | "position[0]" => self.position.map(|p| Value::from(p.x)),
            "position.y" | "position[1]" => self.position.map(|p| Value::from(p.y)),
            "goal_position.x" | "goal_position[0]" => self.goal_position.map(|p| Value::from(p.x)),
            "goal_position.y" | "goal_position[1]" => self.goal_position.map(|p| Value::from(p.y)),
            "orientation" => self.orientation.map(|o| Value::from(o.as_str())),
            "distance_to_goal" => {
                let d = self.position?.manhattan(self.goal_position?);
                Some(Value::Int(d as i64))
            }
            "obstacle_count" => self.obstacles.as_ref().map(|o| Value::Int(o.len() as i64)),
            _ => None,
        }
    }

    /// Canonical string key for tabular value lookups.
    ///
    /// Fields appear in sorted name order and obstacles in sorted cell order, so two
    /// perceptions with the same content always produce the same key.
    pub fn canonical_key(&self) -> StateId {
        let mut parts: Vec<String> = Vec::with_capacity(5);
        if let Some(actions) = &self.available_actions {
            let names: Vec<&str> = actions.iter().map(|a| a.as_str()).collect();
            parts.push(format!("available_actions=[{}]", names.join(",")));
        }
        if let Some(goal) = self.goal_position {
            parts.push(format!("goal_position={}", goal));
        }
        if let Some(obstacles) = &self.obstacles {
            let cells: Vec<String> = obstacles.iter().map(|p| p.to_string()).collect();
            parts.push(format!("obstacles=[{}]", cells.join(",")));
        }
        if let Some(orientation) = self.orientation {
            parts.push(format!("orientation={}", orientation));
        }
        if let Some(position) = self.position {
            parts.push(format!("position={}", position));
        }
        StateId::from_string(parts.join(";"))
    }
}

impl From<&GridState> for Perception {
    fn from(state: &GridState) -> Self {
        Self {
            position: Some(state.position),
            orientation: Some(state.orientation),
            goal_position: Some(state.goal_position),
            obstacles: Some(state.obstacles.clone()),
            available_actions: Some(state.available_actions.clone()),
        }
    }
}
