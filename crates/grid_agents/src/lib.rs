//! # Grid Agents
//!
//! Autonomous agents for bounded grid worlds.
//!
//! ## Overview
//!
//! Every agent runs the same loop against an [`Environment`]:
//! - **Perceive** the state, filtered by the agent's capabilities
//! - **Decide** on one of five discrete actions
//! - **Act**, validating the action against what the state allows
//! - **Learn** from the reward the environment hands back
//!
//! Three policies plug into that loop: reactive rules with tabular values, A*
//! replanning over an incrementally discovered map, and an epsilon-greedy linear
//! Q-learner with experience replay.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Agent                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  GridState → Perception → Decision → Action → Learning      │
//! │                                                              │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐  │
//! │  │   Reactive   │  │   Planning   │  │     Learned      │  │
//! │  │              │  │              │  │                  │  │
//! │  │ • Rules      │  │ • Known map  │  │ • Linear Q model │  │
//! │  │ • Q table    │  │ • A*         │  │ • Replay buffer  │  │
//! │  │ • Random     │  │ • Compiler   │  │ • Epsilon decay  │  │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘  │
//! │                                                              │
//! │                 Memory (bounded event log)                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use grid_agents::{create_autonomous_agent, Environment, GridWorld, Orientation, Position};
//! use grid_agents::config::GridWorldConfig;
//!
//! let mut world = GridWorld::with_layout(
//!     GridWorldConfig::default().with_seed(1),
//!     Position::new(0, 0),
//!     Orientation::Right,
//!     Position::new(9, 9),
//!     [],
//! )
//! .unwrap();
//!
//! let mut agent = create_autonomous_agent("scout");
//! let summary = agent.run_autonomously(&mut world, None, None);
//! assert!(summary.goal_reached);
//! assert_eq!(world.get_state().position, Position::new(9, 9));
//! ```
//!
//! ### Rules
//!
//! ```
//! use grid_agents::{create_agent, Action, GridState, Orientation, Position};
//!
//! let mut agent = create_agent("guard");
//! agent.add_rule_expr("position.x >= 5 and orientation == 'right'", Action::TurnRight);
//! agent.perceive(&GridState::new(Position::new(6, 0), Orientation::Right, Position::new(9, 9)));
//! let _ = agent.decide();
//! ```

pub mod action;
pub mod agent;
pub mod config;
pub mod environment;
pub mod error;
pub mod learning;
pub mod memory;
pub mod observation;
pub mod planning;
pub mod rules;
pub mod training;
pub mod types;

pub use action::{Action, ActionResult};
pub use agent::{
    Agent, AgentCore, AgentStatus, CancelToken, LearnedPolicy, LearningStatus, PlanningPolicy,
    PlanningStatus, Policy, PolicyKind, ReactivePolicy, RunSummary, StepReport,
};
pub use config::{AgentConfig, AutonomyConfig, GridWorldConfig, LearnerConfig, PlannerConfig};
pub use environment::{Environment, GridWorld, Step};
pub use error::{Error, Result};
pub use learning::{Experience, LearningModel, QLearner, ReplayBuffer, StateId};
pub use memory::{EventKind, LearningRecord, Memory, MemoryEvent};
pub use observation::{Capability, GridState, Perception, StateField};
pub use planning::{PlanOutcome, Planner};
pub use rules::{Condition, Rule, RuleSet};
pub use types::*;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Creates a reactive agent with default configuration.
///
/// # Examples
///
/// ```
/// use grid_agents::create_agent;
///
/// let agent = create_agent("my_agent");
/// assert_eq!(agent.name(), "my_agent");
/// ```
pub fn create_agent(name: &str) -> Agent {
    Agent::reactive(name, AgentConfig::default())
}

/// Creates a planning agent with no step delay.
pub fn create_autonomous_agent(name: &str) -> Agent {
    let config = AgentConfig::default().with_autonomy(AutonomyConfig {
        step_delay: std::time::Duration::ZERO,
        ..Default::default()
    });
    Agent::autonomous(name, config)
}

/// Creates a learning agent with default configuration.
pub fn create_enhanced_agent(name: &str) -> Agent {
    Agent::enhanced(name, AgentConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_agent() {
        let agent = create_agent("test_agent");
        assert_eq!(agent.name(), "test_agent");
        assert_eq!(agent.policy_kind(), PolicyKind::Reactive);
    }

    #[test]
    fn test_create_autonomous_agent() {
        let agent = create_autonomous_agent("scout");
        assert!(agent.config().autonomy.step_delay.is_zero());
        assert!(agent.planner().is_some());
    }

    #[test]
    fn test_create_enhanced_agent() {
        let agent = create_enhanced_agent("learner");
        assert!(agent.has_capability(Capability::Learn));
        assert!(agent.learner().is_some());
    }
}
