//! Configuration for grid agents and the grid world.
//!
//! Every knob has a default matching the reference behaviour and can be overridden
//! independently, either by struct update syntax or through the `with_*` builders.

use crate::error::{Error, Result};
use crate::types::Orientation;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Defines the configuration for an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Learning rate (alpha) of the tabular one-step update.
    pub learning_rate: f64,
    /// Probability of a uniformly random decision in the reactive policy.
    pub exploration_rate: f64,
    /// Multiplicative decay applied to `exploration_rate` after each `learn`.
    pub exploration_decay: f64,
    /// Floor for `exploration_rate`.
    pub exploration_min: f64,
    /// Number of events the episodic memory keeps before evicting the oldest.
    pub memory_capacity: usize,
    /// Seed for the agent's random generator. `None` seeds from the OS.
    pub seed: Option<u64>,
    pub planner: PlannerConfig,
    pub learner: LearnerConfig,
    pub autonomy: AutonomyConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            exploration_rate: 0.2,
            exploration_decay: 0.99,
            exploration_min: 0.05,
            memory_capacity: 100,
            seed: None,
            planner: PlannerConfig::default(),
            learner: LearnerConfig::default(),
            autonomy: AutonomyConfig::default(),
        }
    }
}

impl AgentConfig {
    /// A seeded configuration with no step delay, for reproducible runs.
    pub fn deterministic(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            autonomy: AutonomyConfig {
                step_delay: Duration::ZERO,
                ..AutonomyConfig::default()
            },
            ..Default::default()
        }
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the tabular learning rate.
    pub fn with_learning_rate(mut self, rate: f64) -> Self {
        self.learning_rate = rate;
        self
    }

    /// Sets the reactive exploration rate.
    pub fn with_exploration_rate(mut self, rate: f64) -> Self {
        self.exploration_rate = rate;
        self
    }

    /// Sets the memory capacity.
    pub fn with_memory_capacity(mut self, capacity: usize) -> Self {
        self.memory_capacity = capacity;
        self
    }

    /// Sets the planner configuration.
    pub fn with_planner(mut self, planner: PlannerConfig) -> Self {
        self.planner = planner;
        self
    }

    /// Sets the learner configuration.
    pub fn with_learner(mut self, learner: LearnerConfig) -> Self {
        self.learner = learner;
        self
    }

    /// Sets the autonomy configuration.
    pub fn with_autonomy(mut self, autonomy: AutonomyConfig) -> Self {
        self.autonomy = autonomy;
        self
    }

    /// Checks that every value is in range.
    pub fn validate(&self) -> Result<()> {
        check_unit("learning_rate", self.learning_rate)?;
        check_unit("exploration_rate", self.exploration_rate)?;
        check_unit("exploration_decay", self.exploration_decay)?;
        check_unit("exploration_min", self.exploration_min)?;
        if self.memory_capacity == 0 {
            return Err(Error::Config("memory_capacity must be > 0".into()));
        }
        self.planner.validate()?;
        self.learner.validate()?;
        Ok(())
    }
}

/// Settings of the A* planner used by autonomous agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Side length of the square planning bound.
    pub grid_size: u32,
    /// Replan every this many decisions, even when a plan is still queued.
    pub replanning_frequency: u64,
    /// Length of the exploration plan used when no path is found.
    pub planning_horizon: usize,
    /// Probability of preferring `move_forward` while exploring.
    pub forward_bias: f64,
    /// Maximum number of reasoning steps kept in the trace.
    pub trace_capacity: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            grid_size: 10,
            replanning_frequency: 5,
            planning_horizon: 20,
            forward_bias: 0.7,
            trace_capacity: 200,
        }
    }
}

impl PlannerConfig {
    /// Sets the side length of the planning bound.
    pub fn with_grid_size(mut self, size: u32) -> Self {
        self.grid_size = size;
        self
    }

    /// Sets the replanning cadence.
    pub fn with_replanning_frequency(mut self, frequency: u64) -> Self {
        self.replanning_frequency = frequency;
        self
    }

    /// Sets the exploration plan length.
    pub fn with_planning_horizon(mut self, horizon: usize) -> Self {
        self.planning_horizon = horizon;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid_size == 0 {
            return Err(Error::Config("grid_size must be > 0".into()));
        }
        if self.replanning_frequency == 0 {
            return Err(Error::Config("replanning_frequency must be > 0".into()));
        }
        check_unit("forward_bias", self.forward_bias)
    }
}

/// Settings of the function-approximation learner used by enhanced agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerConfig {
    /// Discount factor (gamma) of the bootstrapped target.
    pub discount_factor: f64,
    /// Initial exploration rate of the epsilon-greedy policy.
    pub epsilon: f64,
    pub epsilon_decay: f64,
    pub epsilon_min: f64,
    /// Capacity of the experience replay buffer.
    pub replay_capacity: usize,
    /// Number of transitions replayed per `learn` once the buffer is warm.
    pub batch_size: usize,
    /// Step size of the per-action linear regressors.
    pub model_learning_rate: f64,
    /// Length of the state feature vector. Extra features are truncated, missing ones are zero.
    pub feature_width: usize,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            discount_factor: 0.95,
            epsilon: 0.2,
            epsilon_decay: 0.995,
            epsilon_min: 0.01,
            replay_capacity: 1000,
            batch_size: 32,
            model_learning_rate: 0.01,
            feature_width: 10,
        }
    }
}

impl LearnerConfig {
    /// Sets the initial exploration rate.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Sets the replay buffer capacity and batch size.
    pub fn with_replay(mut self, capacity: usize, batch_size: usize) -> Self {
        self.replay_capacity = capacity;
        self.batch_size = batch_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_unit("discount_factor", self.discount_factor)?;
        check_unit("epsilon", self.epsilon)?;
        check_unit("epsilon_decay", self.epsilon_decay)?;
        check_unit("epsilon_min", self.epsilon_min)?;
        if self.replay_capacity == 0 {
            return Err(Error::Config("replay_capacity must be > 0".into()));
        }
        if self.batch_size == 0 || self.batch_size > self.replay_capacity {
            return Err(Error::Config(format!(
                "batch_size must be in 1..={}, got {}",
                self.replay_capacity, self.batch_size
            )));
        }
        if !(self.model_learning_rate > 0.0 && self.model_learning_rate <= 1.0) {
            return Err(Error::Config(format!(
                "model_learning_rate must be in (0, 1], got {}",
                self.model_learning_rate
            )));
        }
        if self.feature_width == 0 {
            return Err(Error::Config("feature_width must be > 0".into()));
        }
        Ok(())
    }
}

/// Settings of [`Agent::run_autonomously`](crate::Agent::run_autonomously).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutonomyConfig {
    /// Step cap used when the caller passes no explicit budget.
    pub max_steps: usize,
    /// Pause between steps. Zero disables pacing.
    pub step_delay: Duration,
}

impl Default for AutonomyConfig {
    fn default() -> Self {
        Self {
            max_steps: 200,
            step_delay: Duration::from_millis(500),
        }
    }
}

/// Layout and reward settings of a [`GridWorld`](crate::GridWorld).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridWorldConfig {
    pub width: u32,
    pub height: u32,
    /// Reward of every step.
    pub step_reward: f64,
    /// Added to the step reward when a move is blocked.
    pub wall_penalty: f64,
    /// Added to the step reward when the goal is reached.
    pub goal_reward: f64,
    /// Inclusive bounds of the random obstacle count drawn on reset.
    pub min_obstacles: usize,
    pub max_obstacles: usize,
    /// Orientation after reset. `None` draws one at random.
    pub start_orientation: Option<Orientation>,
    pub seed: Option<u64>,
}

impl Default for GridWorldConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            step_reward: -0.1,
            wall_penalty: -1.0,
            goal_reward: 10.0,
            min_obstacles: 3,
            max_obstacles: 10,
            start_orientation: None,
            seed: None,
        }
    }
}

impl GridWorldConfig {
    /// Sets the grid dimensions.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Fixes the orientation after reset.
    pub fn with_start_orientation(mut self, orientation: Orientation) -> Self {
        self.start_orientation = Some(orientation);
        self
    }

    /// Sets the bounds of the random obstacle count.
    pub fn with_obstacle_range(mut self, min: usize, max: usize) -> Self {
        self.min_obstacles = min;
        self.max_obstacles = max;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.width < 2 || self.height < 2 {
            return Err(Error::Config(format!(
                "grid must be at least 2x2, got {}x{}",
                self.width, self.height
            )));
        }
        if self.min_obstacles > self.max_obstacles {
            return Err(Error::Config(format!(
                "min_obstacles ({}) exceeds max_obstacles ({})",
                self.min_obstacles, self.max_obstacles
            )));
        }
        Ok(())
    }
}

fn check_unit(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::Config(format!("{} must be in [0, 1], got {}", name, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default();
        assert_eq!(config.memory_capacity, 100);
        assert_eq!(config.planner.replanning_frequency, 5);
        assert_eq!(config.planner.planning_horizon, 20);
        assert_eq!(config.learner.replay_capacity, 1000);
        assert_eq!(config.learner.batch_size, 32);
        assert_eq!(config.autonomy.max_steps, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deterministic_config() {
        let config = AgentConfig::deterministic(7);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.autonomy.step_delay, Duration::ZERO);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let config = AgentConfig::default().with_exploration_rate(1.5);
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = AgentConfig::default().with_learner(LearnerConfig::default().with_replay(10, 32));
        assert!(config.validate().is_err());

        let config = AgentConfig::default()
            .with_planner(PlannerConfig::default().with_replanning_frequency(0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_grid_world_config() {
        assert!(GridWorldConfig::default().validate().is_ok());
        assert!(GridWorldConfig::default().with_size(1, 5).validate().is_err());
        assert!(GridWorldConfig::default()
            .with_obstacle_range(5, 2)
            .validate()
            .is_err());
    }

    #[test]
    fn test_config_serializes() {
        let json = serde_json::to_string(&AgentConfig::default()).unwrap();
        let back: AgentConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.learner.feature_width, 10);
    }
}
