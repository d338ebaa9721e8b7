//! The stock [`Policy`] implementations.

use super::{AgentCore, Policy, PolicyKind};
use crate::action::Action;
use crate::config::{LearnerConfig, PlannerConfig};
use crate::learning::{Experience, QLearner};
use crate::memory::LearningRecord;
use crate::observation::Perception;
use crate::planning::Planner;

/// Exploration, then tabular values, then rules, then a random action.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReactivePolicy;

impl Policy for ReactivePolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Reactive
    }

    fn decide(&mut self, core: &mut AgentCore) -> Action {
        core.reactive_decision()
    }

    fn learn(&mut self, core: &mut AgentCore, experience: Experience) -> LearningRecord {
        core.tabular_update(&experience)
    }
}

/// Follows A* plans over the map discovered so far.
///
/// Learning stays tabular; the plan does not consult the values.
#[derive(Debug, Clone)]
pub struct PlanningPolicy {
    planner: Planner,
}

impl PlanningPolicy {
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            planner: Planner::new(config),
        }
    }
}

impl Policy for PlanningPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Planning
    }

    fn observe(&mut self, belief: &Perception) {
        self.planner.observe(belief);
    }

    fn decide(&mut self, core: &mut AgentCore) -> Action {
        self.planner.decide(&core.belief, &mut core.rng)
    }

    fn learn(&mut self, core: &mut AgentCore, experience: Experience) -> LearningRecord {
        core.tabular_update(&experience)
    }

    // A new layout invalidates the discovered map.
    fn begin_episode(&mut self) {
        self.planner.reset();
    }

    fn reset(&mut self) {
        self.planner.reset();
    }

    fn planner(&self) -> Option<&Planner> {
        Some(&self.planner)
    }
}

/// Epsilon-greedy over a linear Q model trained with experience replay.
#[derive(Debug, Clone)]
pub struct LearnedPolicy {
    learner: QLearner,
}

impl LearnedPolicy {
    pub fn new(config: LearnerConfig) -> Self {
        Self {
            learner: QLearner::new(config),
        }
    }
}

impl Policy for LearnedPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Learned
    }

    fn decide(&mut self, core: &mut AgentCore) -> Action {
        self.learner.decide(&core.belief, &mut core.rng)
    }

    fn learn(&mut self, core: &mut AgentCore, experience: Experience) -> LearningRecord {
        let state = experience.state.clone();
        let action = experience.action;
        let reward = experience.reward;
        self.learner.learn(experience, &mut core.rng);

        LearningRecord {
            state: state.canonical_key(),
            action,
            reward,
            value: self.learner.model().value(&state, action),
            exploration: self.learner.epsilon(),
        }
    }

    fn reset(&mut self) {
        self.learner.reset();
    }

    fn learner(&self) -> Option<&QLearner> {
        Some(&self.learner)
    }
}
