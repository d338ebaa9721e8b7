//! Learning module for grid agents.
//!
//! Two families of value learning live here:
//! - **Tabular** one-step updates keyed by the canonical [`StateId`] of a belief,
//!   used by reactive agents.
//! - **Function approximation**: a [`LearningModel`] with one linear regressor per
//!   action, trained by the epsilon-greedy [`QLearner`] with bootstrapped targets and
//!   a bounded [`ReplayBuffer`].
//!
//! ## Example
//!
//! ```rust
//! use grid_agents::learning::{Experience, QLearner};
//! use grid_agents::{Action, GridState, LearnerConfig, Orientation, Perception, Position};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut learner = QLearner::new(LearnerConfig::default());
//! let mut rng = StdRng::seed_from_u64(42);
//!
//! let goal = Position::new(9, 9);
//! let before = Perception::from(&GridState::new(Position::new(0, 0), Orientation::Right, goal));
//! let after = Perception::from(&GridState::new(Position::new(1, 0), Orientation::Right, goal));
//!
//! learner.learn(Experience::new(before.clone(), Action::MoveForward, -0.1, after, false), &mut rng);
//! assert_eq!(learner.experience_count(), 1);
//! let _next = learner.decide(&before, &mut rng);
//! ```

pub mod learner;
pub mod model;
pub mod replay;
pub mod tabular;
pub mod value_function;

pub use learner::{bootstrap_target, QLearner};
pub use model::LearningModel;
pub use replay::{Experience, ReplayBuffer};
pub use tabular::{ActionValueTable, QValue, StateActionPair, StateId};
pub use value_function::LinearValueFunction;
