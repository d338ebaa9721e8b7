//! Map-building A* planner.
//!
//! The [`Planner`] keeps what an autonomous agent has discovered about the grid (a
//! [`KnownMap`] plus the set of visited cells), and a queue of pending actions. Each
//! decision pops the next queued action. The queue is rebuilt when it runs dry and
//! every `replanning_frequency` decisions, by running [`a_star`] over the known map and
//! compiling the path with [`path_to_actions`]. When no path exists the queue is
//! filled with [`explore`] steps instead.
//!
//! The search and compilation steps are free functions over explicit inputs, so they
//! can be exercised without an agent.

pub mod astar;
pub mod compile;
pub mod map;

pub use astar::a_star;
pub use compile::{explore, path_to_actions, turns_between};
pub use map::{CellTag, GridBounds, KnownMap};

use crate::action::Action;
use crate::config::PlannerConfig;
use crate::observation::Perception;
use crate::types::{Position, Timestamp};
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

/// The result of a replanning attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PlanOutcome {
    /// No goal is known; the plan was left untouched.
    NoGoal,
    /// The agent already stands on the goal; the plan was cleared.
    AtGoal,
    /// A path was found and compiled.
    Path { cells: usize, actions: usize },
    /// No usable path; the plan was filled with exploration steps.
    Exploration { reason: String, actions: usize },
}

/// Where a decided action came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    Plan,
    Exploration,
}

/// One entry of the planner's reasoning trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReasoningStep {
    Perception {
        position: Option<Position>,
        known_cells: usize,
        at: Timestamp,
    },
    Decision {
        step: u64,
        action: Action,
        source: DecisionSource,
        at: Timestamp,
    },
    Planning {
        step: u64,
        outcome: PlanOutcome,
        at: Timestamp,
    },
}

/// Planning state owned by an autonomous agent.
#[derive(Debug, Clone)]
pub struct Planner {
    config: PlannerConfig,
    known_map: KnownMap,
    visited: BTreeSet<Position>,
    goal: Option<Position>,
    plan: VecDeque<Action>,
    step_counter: u64,
    replans: u64,
    trace: VecDeque<ReasoningStep>,
}

impl Planner {
    /// Creates a planner with an empty map.
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            config,
            known_map: KnownMap::new(),
            visited: BTreeSet::new(),
            goal: None,
            plan: VecDeque::new(),
            step_counter: 0,
            replans: 0,
            trace: VecDeque::new(),
        }
    }

    /// Folds a perception into the known map.
    ///
    /// The current cell is visited and known empty, the goal is tagged, and every
    /// reported obstacle is tagged.
    pub fn observe(&mut self, perception: &Perception) {
        if let Some(position) = perception.position {
            self.visited.insert(position);
            self.known_map.mark(position, CellTag::Empty);
        }
        if let Some(goal) = perception.goal_position {
            self.goal = Some(goal);
            self.known_map.mark(goal, CellTag::Goal);
        }
        if let Some(obstacles) = &perception.obstacles {
            for cell in obstacles {
                self.known_map.mark(*cell, CellTag::Obstacle);
            }
        }
        self.push_trace(ReasoningStep::Perception {
            position: perception.position,
            known_cells: self.known_map.len(),
            at: Timestamp::now(),
        });
    }

    /// Picks the next action, replanning when the plan is empty or due.
    pub fn decide<R: Rng + ?Sized>(&mut self, belief: &Perception, rng: &mut R) -> Action {
        self.step_counter += 1;
        let frequency = self.config.replanning_frequency.max(1);
        if self.plan.is_empty() || self.step_counter % frequency == 0 {
            self.replan(belief, rng);
        }

        let (action, source) = match self.plan.pop_front() {
            Some(action) => (action, DecisionSource::Plan),
            None => (
                explore(&exploration_actions(belief), rng, self.config.forward_bias),
                DecisionSource::Exploration,
            ),
        };
        self.push_trace(ReasoningStep::Decision {
            step: self.step_counter,
            action,
            source,
            at: Timestamp::now(),
        });
        action
    }

    /// Rebuilds the plan from the current belief.
    pub fn replan<R: Rng + ?Sized>(&mut self, belief: &Perception, rng: &mut R) -> PlanOutcome {
        let outcome = self.build_plan(belief, rng);
        self.replans += 1;
        debug!("Replanned at step {}: {:?}", self.step_counter, outcome);
        self.push_trace(ReasoningStep::Planning {
            step: self.step_counter,
            outcome: outcome.clone(),
            at: Timestamp::now(),
        });
        outcome
    }

    fn build_plan<R: Rng + ?Sized>(&mut self, belief: &Perception, rng: &mut R) -> PlanOutcome {
        let Some(goal) = self.goal else {
            return PlanOutcome::NoGoal;
        };
        let (Some(start), Some(heading)) = (belief.position, belief.orientation) else {
            return self.fill_exploration(belief, rng, "position or orientation unknown");
        };
        if start == goal {
            self.plan.clear();
            return PlanOutcome::AtGoal;
        }

        let Some(path) = a_star(&self.known_map, self.bounds(), start, goal, heading) else {
            return self.fill_exploration(belief, rng, "no path to goal");
        };
        let actions = path_to_actions(&path, heading);
        if let Some(available) = &belief.available_actions {
            if let Some(missing) = actions.iter().find(|a| !available.contains(a)) {
                let reason = format!("plan needs unavailable action {}", missing);
                return self.fill_exploration(belief, rng, &reason);
            }
        }

        let outcome = PlanOutcome::Path {
            cells: path.len(),
            actions: actions.len(),
        };
        self.plan = actions.into();
        outcome
    }

    fn fill_exploration<R: Rng + ?Sized>(
        &mut self,
        belief: &Perception,
        rng: &mut R,
        reason: &str,
    ) -> PlanOutcome {
        let available = exploration_actions(belief);
        self.plan = (0..self.config.planning_horizon)
            .map(|_| explore(&available, rng, self.config.forward_bias))
            .collect();
        PlanOutcome::Exploration {
            reason: reason.to_string(),
            actions: self.plan.len(),
        }
    }

    fn push_trace(&mut self, step: ReasoningStep) {
        if self.config.trace_capacity == 0 {
            return;
        }
        if self.trace.len() == self.config.trace_capacity {
            self.trace.pop_front();
        }
        self.trace.push_back(step);
    }

    /// The square planning bound.
    pub fn bounds(&self) -> GridBounds {
        GridBounds::square(self.config.grid_size)
    }

    /// Everything observed so far.
    pub fn known_map(&self) -> &KnownMap {
        &self.known_map
    }

    /// Cells the agent has stood on.
    pub fn visited(&self) -> &BTreeSet<Position> {
        &self.visited
    }

    /// The goal, once observed.
    pub fn goal(&self) -> Option<Position> {
        self.goal
    }

    /// Pending actions, next first.
    pub fn plan(&self) -> &VecDeque<Action> {
        &self.plan
    }

    /// Number of decisions taken.
    pub fn step_counter(&self) -> u64 {
        self.step_counter
    }

    /// Number of times the plan was rebuilt.
    pub fn replans(&self) -> u64 {
        self.replans
    }

    /// The reasoning trace, oldest first.
    pub fn trace(&self) -> impl Iterator<Item = &ReasoningStep> {
        self.trace.iter()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Forgets the map, the plan and the trace.
    pub fn reset(&mut self) {
        self.known_map.clear();
        self.visited.clear();
        self.goal = None;
        self.plan.clear();
        self.step_counter = 0;
        self.replans = 0;
        self.trace.clear();
    }
}

/// Actions exploration may draw from. An unsensed action list means the
/// agent can still move and turn.
fn exploration_actions(belief: &Perception) -> Vec<Action> {
    match &belief.available_actions {
        Some(actions) if !actions.is_empty() => actions.clone(),
        Some(_) => vec![Action::Wait],
        None => vec![
            Action::MoveForward,
            Action::TurnLeft,
            Action::TurnRight,
            Action::Wait,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::GridState;
    use crate::types::Orientation;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn belief(x: i32, y: i32, orientation: Orientation) -> Perception {
        Perception::from(&GridState::new(Position::new(x, y), orientation, Position::new(9, 9)))
    }

    #[test]
    fn test_observe_builds_map() {
        let mut planner = Planner::new(PlannerConfig::default());
        let state = GridState::new(Position::new(0, 0), Orientation::Right, Position::new(9, 9))
            .with_obstacles([Position::new(2, 2), Position::new(3, 3)]);
        planner.observe(&Perception::from(&state));

        assert_eq!(planner.goal(), Some(Position::new(9, 9)));
        assert_eq!(planner.known_map().get(Position::new(0, 0)), Some(CellTag::Empty));
        assert_eq!(planner.known_map().get(Position::new(9, 9)), Some(CellTag::Goal));
        assert_eq!(planner.known_map().count(CellTag::Obstacle), 2);
        assert_eq!(planner.visited().len(), 1);
    }

    #[test]
    fn test_first_decision_follows_compiled_plan() {
        let mut planner = Planner::new(PlannerConfig::default());
        let mut rng = StdRng::seed_from_u64(0);
        let b = belief(0, 0, Orientation::Right);
        planner.observe(&b);

        assert_eq!(planner.decide(&b, &mut rng), Action::MoveForward);
        assert_eq!(planner.plan().len(), 18);
        assert_eq!(planner.plan().iter().filter(|a| a.is_turn()).count(), 1);
        assert_eq!(planner.replans(), 1);
    }

    #[test]
    fn test_replans_on_schedule() {
        let mut planner = Planner::new(PlannerConfig::default().with_replanning_frequency(3));
        let mut rng = StdRng::seed_from_u64(0);
        let b = belief(0, 0, Orientation::Right);
        planner.observe(&b);
        for _ in 0..6 {
            planner.decide(&b, &mut rng);
        }
        // Step 1 (empty plan), then steps 3 and 6.
        assert_eq!(planner.replans(), 3);
    }

    #[test]
    fn test_no_goal_explores() {
        let mut planner = Planner::new(PlannerConfig::default());
        let mut rng = StdRng::seed_from_u64(1);
        let b = Perception {
            goal_position: None,
            ..belief(0, 0, Orientation::Right)
        };
        planner.observe(&b);
        assert_eq!(planner.replan(&b, &mut rng), PlanOutcome::NoGoal);
        assert!(planner.plan().is_empty());
        let action = planner.decide(&b, &mut rng);
        assert!(matches!(action, Action::MoveForward | Action::TurnLeft | Action::TurnRight));
    }

    #[test]
    fn test_at_goal_clears_plan() {
        let mut planner = Planner::new(PlannerConfig::default());
        let mut rng = StdRng::seed_from_u64(1);
        let start = belief(0, 0, Orientation::Right);
        planner.observe(&start);
        planner.replan(&start, &mut rng);
        assert!(!planner.plan().is_empty());

        let at_goal = belief(9, 9, Orientation::Down);
        assert_eq!(planner.replan(&at_goal, &mut rng), PlanOutcome::AtGoal);
        assert!(planner.plan().is_empty());
    }

    #[test]
    fn test_unreachable_goal_falls_back_to_exploration() {
        let mut planner = Planner::new(PlannerConfig::default());
        let mut rng = StdRng::seed_from_u64(2);
        let goal = Position::new(5, 5);
        let state = GridState::new(Position::new(0, 0), Orientation::Right, goal)
            .with_obstacles(Orientation::CLOCKWISE.map(|d| goal.step(d)));
        let b = Perception::from(&state);
        planner.observe(&b);

        let outcome = planner.replan(&b, &mut rng);
        assert!(matches!(outcome, PlanOutcome::Exploration { actions: 20, .. }));
        assert_eq!(planner.plan().len(), 20);
    }

    #[test]
    fn test_plan_with_unavailable_action_is_replaced() {
        let mut planner = Planner::new(PlannerConfig::default());
        let mut rng = StdRng::seed_from_u64(3);
        let b = Perception {
            available_actions: Some(vec![Action::MoveForward, Action::TurnLeft, Action::Wait]),
            ..belief(0, 0, Orientation::Right)
        };
        planner.observe(&b);

        let outcome = planner.replan(&b, &mut rng);
        assert!(matches!(outcome, PlanOutcome::Exploration { .. }));
        assert!(planner.plan().iter().all(|a| *a != Action::TurnRight));
    }

    #[test]
    fn test_trace_is_bounded() {
        let config = PlannerConfig {
            trace_capacity: 4,
            ..Default::default()
        };
        let mut planner = Planner::new(config);
        let mut rng = StdRng::seed_from_u64(4);
        let b = belief(0, 0, Orientation::Right);
        for _ in 0..10 {
            planner.observe(&b);
            planner.decide(&b, &mut rng);
        }
        assert_eq!(planner.trace().count(), 4);
    }

    #[test]
    fn test_reset_forgets_everything() {
        let mut planner = Planner::new(PlannerConfig::default());
        let mut rng = StdRng::seed_from_u64(5);
        let b = belief(0, 0, Orientation::Right);
        planner.observe(&b);
        planner.decide(&b, &mut rng);
        planner.reset();
        assert!(planner.known_map().is_empty());
        assert!(planner.plan().is_empty());
        assert_eq!(planner.goal(), None);
        assert_eq!(planner.step_counter(), 0);
    }
}
