//! The grid world the agents live in.
//!
//! [`Environment`] is the contract agents consume: a snapshot accessor, a
//! deterministic transition function and a reset. [`GridWorld`] is the bounded 2-D
//! implementation with walls, obstacles and a single goal.

use crate::action::Action;
use crate::config::GridWorldConfig;
use crate::error::{Error, Result};
use crate::observation::GridState;
use crate::types::{Orientation, Position};
use rand::rngs::StdRng;
use rand::seq::{index, IndexedRandom};
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;

/// The outcome of one environment transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub state: GridState,
    pub reward: f64,
    /// `true` once the goal has been reached.
    pub done: bool,
}

/// Something an agent can be dropped into.
pub trait Environment {
    /// Returns a copy of the current state. Mutating it does not affect the environment.
    fn get_state(&self) -> GridState;

    /// Applies exactly one action and returns the resulting transition.
    fn update(&mut self, action: Action) -> Step;

    /// Starts a new episode and returns its initial state.
    fn reset(&mut self) -> GridState;
}

/// A bounded grid with obstacles and a goal cell.
///
/// Moves are relative to the agent's orientation. A move into a wall or an obstacle
/// leaves the agent in place and costs `wall_penalty` on top of `step_reward`.
/// Landing on the goal pays `goal_reward` and ends the episode.
#[derive(Debug, Clone)]
pub struct GridWorld {
    config: GridWorldConfig,
    state: GridState,
    rng: StdRng,
}

impl GridWorld {
    /// A world with the agent at `(0, 0)`, the goal in the far corner and a random
    /// set of interior obstacles.
    pub fn new(config: GridWorldConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let goal = Position::new(config.width as i32 - 1, config.height as i32 - 1);
        let orientation = config.start_orientation.unwrap_or(Orientation::Right);
        let obstacles = random_obstacles(&config, goal, &mut rng);
        let state = GridState::new(Position::new(0, 0), orientation, goal).with_obstacles(obstacles);
        Ok(Self { config, state, rng })
    }

    /// A world with an explicit layout.
    ///
    /// Fails when the start, goal or an obstacle lies outside the grid, or when an
    /// obstacle covers the start or goal.
    pub fn with_layout(
        config: GridWorldConfig,
        start: Position,
        orientation: Orientation,
        goal: Position,
        obstacles: impl IntoIterator<Item = Position>,
    ) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let world = Self {
            state: GridState::new(start, orientation, goal).with_obstacles(obstacles),
            config,
            rng,
        };

        for (label, cell) in [("start", start), ("goal", goal)] {
            if !world.in_bounds(cell) {
                return Err(Error::Environment(format!("{} {} is out of bounds", label, cell)));
            }
            if world.state.obstacles.contains(&cell) {
                return Err(Error::Environment(format!("{} {} is covered by an obstacle", label, cell)));
            }
        }
        if let Some(cell) = world.state.obstacles.iter().find(|p| !world.in_bounds(**p)) {
            return Err(Error::Environment(format!("obstacle {} is out of bounds", cell)));
        }
        Ok(world)
    }

    pub fn config(&self) -> &GridWorldConfig {
        &self.config
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    pub fn in_bounds(&self, p: Position) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.config.width as i32 && p.y < self.config.height as i32
    }

    /// `true` if the cell is inside the grid and not an obstacle.
    pub fn is_free(&self, p: Position) -> bool {
        self.in_bounds(p) && !self.state.obstacles.contains(&p)
    }

    fn try_move(&mut self, target: Position) -> f64 {
        if self.is_free(target) {
            self.state.position = target;
            0.0
        } else {
            self.config.wall_penalty
        }
    }
}

impl Environment for GridWorld {
    fn get_state(&self) -> GridState {
        self.state.clone()
    }

    fn update(&mut self, action: Action) -> Step {
        let mut reward = self.config.step_reward;
        let position = self.state.position;
        let orientation = self.state.orientation;

        match action {
            Action::MoveForward => reward += self.try_move(position.step(orientation)),
            Action::MoveBackward => reward += self.try_move(position.step_back(orientation)),
            Action::TurnLeft => self.state.orientation = orientation.turned_left(),
            Action::TurnRight => self.state.orientation = orientation.turned_right(),
            Action::Wait => {}
        }

        let done = self.state.is_at_goal();
        if done {
            reward += self.config.goal_reward;
        }

        Step {
            state: self.state.clone(),
            reward,
            done,
        }
    }

    /// Puts the agent back at `(0, 0)`, draws a goal on the right or bottom edge and
    /// a fresh set of interior obstacles.
    fn reset(&mut self) -> GridState {
        let w = self.config.width as i32;
        let h = self.config.height as i32;

        let goal = if self.rng.random_bool(0.5) {
            Position::new(w - 1, self.rng.random_range(0..h))
        } else {
            Position::new(self.rng.random_range(0..w), h - 1)
        };
        let goal = if goal == Position::new(0, 0) {
            Position::new(w - 1, h - 1)
        } else {
            goal
        };

        let orientation = match self.config.start_orientation {
            Some(o) => o,
            None => Orientation::CLOCKWISE
                .choose(&mut self.rng)
                .copied()
                .unwrap_or(Orientation::Right),
        };

        let obstacles = random_obstacles(&self.config, goal, &mut self.rng);
        self.state = GridState::new(Position::new(0, 0), orientation, goal).with_obstacles(obstacles);
        self.state.clone()
    }
}

/// Distinct interior cells, never covering the start or the goal.
fn random_obstacles(config: &GridWorldConfig, goal: Position, rng: &mut StdRng) -> BTreeSet<Position> {
    let inner_w = config.width.saturating_sub(2) as usize;
    let inner_h = config.height.saturating_sub(2) as usize;
    let candidates: Vec<Position> = (0..inner_w * inner_h)
        .map(|i| Position::new((i % inner_w) as i32 + 1, (i / inner_w) as i32 + 1))
        .filter(|p| *p != goal && *p != Position::new(0, 0))
        .collect();
    if candidates.is_empty() {
        return BTreeSet::new();
    }

    let count = rng
        .random_range(config.min_obstacles..=config.max_obstacles)
        .min(candidates.len());
    index::sample(rng, candidates.len(), count)
        .into_iter()
        .map(|i| candidates[i])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_world() -> GridWorld {
        GridWorld::with_layout(
            GridWorldConfig::default().with_seed(1),
            Position::new(0, 0),
            Orientation::Right,
            Position::new(9, 9),
            [Position::new(1, 1)],
        )
        .unwrap()
    }

    #[test]
    fn test_free_move_costs_step_reward() {
        let mut world = open_world();
        let step = world.update(Action::MoveForward);
        assert_eq!(step.state.position, Position::new(1, 0));
        assert!((step.reward + 0.1).abs() < 1e-9);
        assert!(!step.done);
    }

    #[test]
    fn test_blocked_moves_pay_wall_penalty() {
        let mut world = open_world();
        // Out of bounds behind the start.
        let step = world.update(Action::MoveBackward);
        assert_eq!(step.state.position, Position::new(0, 0));
        assert!((step.reward + 1.1).abs() < 1e-9);

        // Into the obstacle at (1, 1).
        world.update(Action::MoveForward);
        world.update(Action::TurnRight);
        let step = world.update(Action::MoveForward);
        assert_eq!(step.state.position, Position::new(1, 0));
        assert!((step.reward + 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_turns_cycle_orientation() {
        let mut world = open_world();
        let step = world.update(Action::TurnLeft);
        assert_eq!(step.state.orientation, Orientation::Up);
        assert!((step.reward + 0.1).abs() < 1e-9);
        let step = world.update(Action::TurnRight);
        assert_eq!(step.state.orientation, Orientation::Right);
        let step = world.update(Action::Wait);
        assert_eq!(step.state.position, Position::new(0, 0));
    }

    #[test]
    fn test_reaching_goal_ends_episode() {
        let mut world = GridWorld::with_layout(
            GridWorldConfig::default(),
            Position::new(8, 9),
            Orientation::Right,
            Position::new(9, 9),
            [],
        )
        .unwrap();
        let step = world.update(Action::MoveForward);
        assert!(step.done);
        assert!((step.reward - 9.9).abs() < 1e-9);
    }

    #[test]
    fn test_get_state_is_a_copy() {
        let world = open_world();
        let mut state = world.get_state();
        state.position = Position::new(5, 5);
        state.obstacles.clear();
        assert_eq!(world.get_state().position, Position::new(0, 0));
        assert_eq!(world.get_state().obstacles.len(), 1);
    }

    #[test]
    fn test_reset_layout_invariants() {
        let mut world = GridWorld::new(GridWorldConfig::default().with_seed(42)).unwrap();
        for _ in 0..50 {
            let state = world.reset();
            assert_eq!(state.position, Position::new(0, 0));
            assert!(state.goal_position.x == 9 || state.goal_position.y == 9);
            assert!((3..=10).contains(&state.obstacles.len()));
            assert!(!state.obstacles.contains(&state.position));
            assert!(!state.obstacles.contains(&state.goal_position));
            assert!(state.obstacles.iter().all(|p| world.in_bounds(*p)));
        }
    }

    #[test]
    fn test_seeded_worlds_are_reproducible() {
        let mut a = GridWorld::new(GridWorldConfig::default().with_seed(7)).unwrap();
        let mut b = GridWorld::new(GridWorldConfig::default().with_seed(7)).unwrap();
        assert_eq!(a.get_state(), b.get_state());
        assert_eq!(a.reset(), b.reset());
    }

    #[test]
    fn test_layout_validation() {
        let config = GridWorldConfig::default();
        let bad_goal = GridWorld::with_layout(
            config.clone(),
            Position::new(0, 0),
            Orientation::Up,
            Position::new(10, 3),
            [],
        );
        assert!(matches!(bad_goal, Err(Error::Environment(_))));

        let covered_start = GridWorld::with_layout(
            config.clone(),
            Position::new(0, 0),
            Orientation::Up,
            Position::new(9, 9),
            [Position::new(0, 0)],
        );
        assert!(covered_start.is_err());

        assert!(GridWorld::new(config.with_size(1, 1)).is_err());
    }
}
