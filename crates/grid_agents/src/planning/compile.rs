//! Turning grid paths into actions, and the exploration fallback.

use crate::action::Action;
use crate::types::{Orientation, Position};
use rand::seq::IndexedRandom;
use rand::Rng;

/// The turns that rotate `from` to face `to`.
///
/// Quarter turns go the short way round. A half turn is two `turn_right`.
pub fn turns_between(from: Orientation, to: Orientation) -> Vec<Action> {
    match from.clockwise_steps(to) {
        0 => vec![],
        1 => vec![Action::TurnRight],
        2 => vec![Action::TurnRight, Action::TurnRight],
        _ => vec![Action::TurnLeft],
    }
}

/// Compiles a path of adjacent cells into turn and `move_forward` actions, starting
/// from `orientation`.
///
/// Repeated cells are skipped. Executing the result from the path's first cell on an
/// unobstructed grid ends on its last cell.
pub fn path_to_actions(path: &[Position], orientation: Orientation) -> Vec<Action> {
    let mut actions = Vec::with_capacity(path.len() * 2);
    let mut heading = orientation;
    for pair in path.windows(2) {
        let Some(direction) = Orientation::between(pair[0], pair[1]) else {
            continue;
        };
        actions.extend(turns_between(heading, direction));
        actions.push(Action::MoveForward);
        heading = direction;
    }
    actions
}

/// One exploration step.
///
/// Prefers `move_forward` with probability `forward_bias` when it is available,
/// otherwise picks one of the available turns, otherwise waits.
pub fn explore<R: Rng + ?Sized>(available: &[Action], rng: &mut R, forward_bias: f64) -> Action {
    if available.contains(&Action::MoveForward) && rng.random::<f64>() < forward_bias {
        return Action::MoveForward;
    }
    let turns: Vec<Action> = [Action::TurnLeft, Action::TurnRight]
        .into_iter()
        .filter(|a| available.contains(a))
        .collect();
    turns.choose(rng).copied().unwrap_or(Action::Wait)
}
