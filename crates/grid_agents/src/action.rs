//! Action vocabulary for grid agents.
//!
//! The vocabulary is closed: every agent and every environment speaks the same
//! five discrete actions. Actions are the output of the agent's decision step and
//! the input to [`Environment::update`](crate::environment::Environment::update).

use crate::error::{Error, Result};
use crate::observation::GridState;
use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A discrete action an agent can take on the grid.
///
/// Movement is relative to the agent's current [`Orientation`](crate::Orientation):
/// `MoveForward` steps one cell in the facing direction, `MoveBackward` one cell
/// against it, and the two turns rotate the facing direction by a quarter turn.
///
/// # Examples
///
/// ```
/// # use grid_agents::Action;
/// let action: Action = "turn_left".parse().unwrap();
/// assert_eq!(action, Action::TurnLeft);
/// assert_eq!(action.as_str(), "turn_left");
/// assert!("jump".parse::<Action>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Step one cell in the facing direction.
    MoveForward,
    /// Step one cell against the facing direction.
    MoveBackward,
    /// Rotate a quarter turn counter-clockwise.
    TurnLeft,
    /// Rotate a quarter turn clockwise.
    TurnRight,
    /// Do nothing for one step.
    Wait,
}

impl Action {
    /// The full vocabulary in its canonical order.
    ///
    /// This order is also the index order used by per-action value models.
    pub const ALL: [Action; 5] = [
        Action::MoveForward,
        Action::MoveBackward,
        Action::TurnLeft,
        Action::TurnRight,
        Action::Wait,
    ];

    /// The action's wire name, e.g. `"move_forward"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::MoveForward => "move_forward",
            Action::MoveBackward => "move_backward",
            Action::TurnLeft => "turn_left",
            Action::TurnRight => "turn_right",
            Action::Wait => "wait",
        }
    }

    /// Position of the action inside [`Action::ALL`].
    pub fn index(&self) -> usize {
        match self {
            Action::MoveForward => 0,
            Action::MoveBackward => 1,
            Action::TurnLeft => 2,
            Action::TurnRight => 3,
            Action::Wait => 4,
        }
    }

    /// Inverse of [`Action::index`].
    pub fn from_index(index: usize) -> Option<Action> {
        Self::ALL.get(index).copied()
    }

    /// Returns `true` for the two translation actions.
    pub fn is_move(&self) -> bool {
        matches!(self, Action::MoveForward | Action::MoveBackward)
    }

    /// Returns `true` for the two rotation actions.
    pub fn is_turn(&self) -> bool {
        matches!(self, Action::TurnLeft | Action::TurnRight)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .find(|a| a.as_str() == s)
            .copied()
            .ok_or_else(|| Error::Action(format!("unknown action '{}'", s)))
    }
}

/// The result of [`Agent::act`](crate::Agent::act).
///
/// `act` never touches the authoritative environment. It validates the action
/// against the available actions and returns a locally advanced copy of the
/// state it was given, so callers can preview the move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    /// The action that was requested.
    pub action: Action,
    /// `true` if the action was accepted.
    pub success: bool,
    /// A human-readable status message.
    pub message: String,
    /// The locally advanced state (unchanged when the action was rejected).
    pub state: GridState,
    /// When the action was processed.
    pub executed_at: Timestamp,
}

impl ActionResult {
    /// Creates an accepted result.
    pub fn accepted(action: Action, state: GridState) -> Self {
        Self {
            action,
            success: true,
            message: format!("Executed action: {}", action),
            state,
            executed_at: Timestamp::now(),
        }
    }

    /// Creates a rejected result carrying the unchanged state.
    pub fn rejected(action: Action, state: GridState) -> Self {
        let available: Vec<&str> = state.available_actions.iter().map(|a| a.as_str()).collect();
        Self {
            action,
            success: false,
            message: format!(
                "Cannot perform action '{}'. Available actions: [{}]",
                action,
                available.join(", ")
            ),
            state,
            executed_at: Timestamp::now(),
        }
    }
}
