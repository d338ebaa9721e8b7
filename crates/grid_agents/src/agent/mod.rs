//! The perceive-decide-act-learn agent.
//!
//! An [`Agent`] owns its belief, its episodic [`Memory`], its rules and tabular
//! values (together the [`AgentCore`]), and a boxed [`Policy`] that decides and
//! learns. The three stock policies give the three agent flavours:
//!
//! ```text
//! Agent::reactive    ReactivePolicy   exploration -> tabular values -> rules -> random
//! Agent::autonomous  PlanningPolicy   A* replanning over the discovered map
//! Agent::enhanced    LearnedPolicy    epsilon-greedy over a linear Q model + replay
//! ```
//!
//! The loop itself never fails. Planning failure degrades to exploration, bad rule
//! expressions are stored as rules that never match, and an unavailable action
//! yields a rejected [`ActionResult`].

mod autonomy;
mod policies;

pub use autonomy::{CancelToken, RunSummary, StepReport};
pub use policies::{LearnedPolicy, PlanningPolicy, ReactivePolicy};

use crate::action::{Action, ActionResult};
use crate::config::AgentConfig;
use crate::error::Result;
use crate::learning::{ActionValueTable, Experience, QLearner};
use crate::memory::{LearningRecord, Memory, MemoryEvent};
use crate::observation::{Capability, GridState, Perception};
use crate::planning::Planner;
use crate::rules::{Condition, Rule, RuleSet};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which decision strategy an agent runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    Reactive,
    Planning,
    Learned,
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PolicyKind::Reactive => "reactive",
            PolicyKind::Planning => "planning",
            PolicyKind::Learned => "learned",
        };
        f.write_str(name)
    }
}

/// Decision state shared by every policy.
#[derive(Debug)]
pub struct AgentCore {
    /// Everything perceived so far, latest value per field.
    pub belief: Perception,
    pub rules: RuleSet,
    pub values: ActionValueTable,
    /// Reactive exploration rate, decayed by each tabular update.
    pub exploration_rate: f64,
    pub rng: StdRng,
    pub config: AgentConfig,
}

impl AgentCore {
    pub fn new(config: AgentConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            belief: Perception::default(),
            rules: RuleSet::new(),
            values: ActionValueTable::new(),
            exploration_rate: config.exploration_rate,
            rng,
            config,
        }
    }

    /// A uniformly random available action, or `wait` when none is known.
    pub fn random_action(&mut self) -> Action {
        let available = self.belief.available_actions_or_wait();
        available.choose(&mut self.rng).copied().unwrap_or(Action::Wait)
    }

    /// Explore with probability `exploration_rate`, else the greedy tabular action
    /// when every available action has a value, else the first matching rule, else
    /// a random action.
    pub fn reactive_decision(&mut self) -> Action {
        if self.rng.random::<f64>() < self.exploration_rate {
            return self.random_action();
        }

        let available = self.belief.available_actions_or_wait();
        let key = self.belief.canonical_key();
        if let Some(action) = self.values.best_action(&key, &available) {
            return action;
        }
        if let Some(action) = self.rules.fire(&self.belief) {
            return action;
        }
        self.random_action()
    }

    /// `Q += lr * (reward - Q)` for the experience's state, then decays the
    /// exploration rate towards its floor.
    pub fn tabular_update(&mut self, experience: &Experience) -> LearningRecord {
        let key = experience.state.canonical_key();
        let value = self.values.update(
            &key,
            experience.action,
            experience.reward,
            self.config.learning_rate,
        );
        self.exploration_rate =
            (self.exploration_rate * self.config.exploration_decay).max(self.config.exploration_min);
        LearningRecord {
            state: key,
            action: experience.action,
            reward: experience.reward,
            value,
            exploration: self.exploration_rate,
        }
    }

    fn reset(&mut self) {
        self.belief = Perception::default();
        self.values.clear();
        self.exploration_rate = self.config.exploration_rate;
    }
}

/// A decision strategy plugged into an [`Agent`].
pub trait Policy: Send + fmt::Debug {
    fn kind(&self) -> PolicyKind;

    /// Called with the merged belief after every perception.
    fn observe(&mut self, _belief: &Perception) {}

    fn decide(&mut self, core: &mut AgentCore) -> Action;

    fn learn(&mut self, core: &mut AgentCore, experience: Experience) -> LearningRecord;

    /// Called when a new episode starts in a fresh environment layout.
    fn begin_episode(&mut self) {}

    /// Forgets everything learned.
    fn reset(&mut self) {}

    fn planner(&self) -> Option<&Planner> {
        None
    }

    fn learner(&self) -> Option<&QLearner> {
        None
    }
}

/// Planning fields of an [`AgentStatus`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningStatus {
    pub has_goal: bool,
    pub plan_length: usize,
    pub known_map_size: usize,
    pub visited_count: usize,
    pub is_autonomous: bool,
    pub autonomous_steps: u64,
}

/// Learning fields of an [`AgentStatus`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningStatus {
    pub epsilon: f64,
    pub experience_count: usize,
}

/// A point-in-time snapshot of an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStatus {
    pub name: String,
    pub capabilities: Vec<String>,
    pub policy: PolicyKind,
    pub state: Perception,
    pub memory_size: usize,
    pub rules_count: usize,
    pub exploration_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planning: Option<PlanningStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning: Option<LearningStatus>,
}

impl AgentStatus {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A grid agent.
///
/// # Examples
///
/// ```
/// use grid_agents::{Agent, AgentConfig, GridState, Orientation, Position};
///
/// let mut agent = Agent::autonomous("scout", AgentConfig::deterministic(7));
/// let state = GridState::new(Position::new(0, 0), Orientation::Right, Position::new(9, 9));
/// agent.perceive(&state);
/// let action = agent.decide();
/// assert!(agent.act(action, &state).success);
/// ```
#[derive(Debug)]
pub struct Agent {
    name: String,
    capabilities: Vec<Capability>,
    memory: Memory,
    core: AgentCore,
    policy: Box<dyn Policy>,
    autonomous: bool,
    autonomous_steps: u64,
}

impl Agent {
    /// An agent with an arbitrary policy.
    pub fn with_policy(
        name: &str,
        config: AgentConfig,
        capabilities: Vec<Capability>,
        policy: Box<dyn Policy>,
    ) -> Self {
        Self {
            name: name.to_string(),
            capabilities,
            memory: Memory::new(config.memory_capacity),
            core: AgentCore::new(config),
            policy,
            autonomous: false,
            autonomous_steps: 0,
        }
    }

    /// Rules, tabular values and random exploration.
    pub fn reactive(name: &str, config: AgentConfig) -> Self {
        Self::with_policy(name, config, Capability::defaults(), Box::new(ReactivePolicy))
    }

    /// A* replanning over the discovered map.
    pub fn autonomous(name: &str, config: AgentConfig) -> Self {
        let policy = PlanningPolicy::new(config.planner.clone());
        let mut capabilities = Capability::defaults();
        capabilities.push(Capability::Plan);
        Self::with_policy(name, config, capabilities, Box::new(policy))
    }

    /// Epsilon-greedy over a learned linear Q model.
    pub fn enhanced(name: &str, config: AgentConfig) -> Self {
        let policy = LearnedPolicy::new(config.learner.clone());
        let mut capabilities = Capability::defaults();
        capabilities.push(Capability::Learn);
        Self::with_policy(name, config, capabilities, Box::new(policy))
    }

    /// Validates `config` and builds an agent of the given kind.
    pub fn from_config(kind: PolicyKind, name: &str, config: AgentConfig) -> Result<Self> {
        config.validate()?;
        Ok(match kind {
            PolicyKind::Reactive => Self::reactive(name, config),
            PolicyKind::Planning => Self::autonomous(name, config),
            PolicyKind::Learned => Self::enhanced(name, config),
        })
    }

    /// Replaces the capability set.
    pub fn with_capabilities(mut self, capabilities: Vec<Capability>) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Filters `state` by capability, merges it into the belief and records it.
    pub fn perceive(&mut self, state: &GridState) -> Perception {
        let perception = Perception::filtered(state, &self.capabilities);
        self.core.belief.merge(&perception);
        self.memory.record(MemoryEvent::Perception(perception.clone()));
        self.policy.observe(&self.core.belief);
        perception
    }

    pub fn decide(&mut self) -> Action {
        let action = self.policy.decide(&mut self.core);
        self.memory.record(MemoryEvent::Decision(action));
        action
    }

    /// Validates `action` against `state` and returns a locally advanced copy.
    ///
    /// Only position and orientation move. Moves into a known obstacle leave the
    /// position unchanged; bounds are the environment's business.
    pub fn act(&mut self, action: Action, state: &GridState) -> ActionResult {
        if !state.available_actions.contains(&action) {
            return ActionResult::rejected(action, state.clone());
        }

        let mut next = state.clone();
        let target = match action {
            Action::MoveForward => Some(next.position.step(next.orientation)),
            Action::MoveBackward => Some(next.position.step_back(next.orientation)),
            Action::TurnLeft => {
                next.orientation = next.orientation.turned_left();
                None
            }
            Action::TurnRight => {
                next.orientation = next.orientation.turned_right();
                None
            }
            Action::Wait => None,
        };
        if let Some(cell) = target.filter(|c| !next.obstacles.contains(c)) {
            next.position = cell;
        }

        self.memory.record(MemoryEvent::Action(action));
        ActionResult::accepted(action, next)
    }

    /// Learns from `(state, action, reward)`, taking the current belief as the
    /// successor state.
    pub fn learn(&mut self, reward: f64, state: &GridState, action: Action) -> LearningRecord {
        let experience = Experience::new(
            Perception::filtered(state, &self.capabilities),
            action,
            reward,
            self.core.belief.clone(),
            false,
        );
        self.learn_experience(experience)
    }

    /// Learns from a full transition.
    pub fn learn_transition(
        &mut self,
        reward: f64,
        state: &GridState,
        action: Action,
        next_state: &GridState,
        done: bool,
    ) -> LearningRecord {
        let experience = Experience::new(
            Perception::filtered(state, &self.capabilities),
            action,
            reward,
            Perception::filtered(next_state, &self.capabilities),
            done,
        );
        self.learn_experience(experience)
    }

    fn learn_experience(&mut self, experience: Experience) -> LearningRecord {
        let record = self.policy.learn(&mut self.core, experience);
        self.memory.record(MemoryEvent::Learning(record.clone()));
        record
    }

    pub fn add_rule(&mut self, rule: Rule) {
        info!("Agent '{}' registered rule '{}' -> {}", self.name, rule.name, rule.action);
        self.core.rules.add(rule);
    }

    /// Registers a rule from a textual condition.
    ///
    /// An expression that does not parse is kept as a rule that never matches.
    pub fn add_rule_expr(&mut self, expr: &str, action: Action) {
        let rule = match Rule::from_expression(expr, action) {
            Ok(rule) => rule,
            Err(e) => {
                warn!("Agent '{}': rule '{}' never matches: {}", self.name, expr, e);
                Rule {
                    expression: Some(expr.to_string()),
                    ..Rule::new(expr, Condition::Never, action)
                }
            }
        };
        self.add_rule(rule);
    }

    /// Prepares for a new episode. The belief is dropped, learning is kept.
    pub fn begin_episode(&mut self) {
        self.core.belief = Perception::default();
        self.policy.begin_episode();
    }

    /// Forgets belief, memory, values and everything the policy learned. Rules stay.
    pub fn reinitialize(&mut self) {
        self.core.reset();
        self.memory.clear();
        self.policy.reset();
        self.autonomous = false;
        self.autonomous_steps = 0;
    }

    pub fn status(&self) -> AgentStatus {
        let planning = self.policy.planner().map(|planner| PlanningStatus {
            has_goal: planner.goal().is_some(),
            plan_length: planner.plan().len(),
            known_map_size: planner.known_map().len(),
            visited_count: planner.visited().len(),
            is_autonomous: self.autonomous,
            autonomous_steps: self.autonomous_steps,
        });
        let learning = self.policy.learner().map(|learner| LearningStatus {
            epsilon: learner.epsilon(),
            experience_count: learner.experience_count(),
        });

        AgentStatus {
            name: self.name.clone(),
            capabilities: self.capabilities.iter().map(|c| c.to_string()).collect(),
            policy: self.policy.kind(),
            state: self.core.belief.clone(),
            memory_size: self.memory.len(),
            rules_count: self.core.rules.len(),
            exploration_rate: self.core.exploration_rate,
            planning,
            learning,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn config(&self) -> &AgentConfig {
        &self.core.config
    }

    pub fn belief(&self) -> &Perception {
        &self.core.belief
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn rules(&self) -> &RuleSet {
        &self.core.rules
    }

    pub fn values(&self) -> &ActionValueTable {
        &self.core.values
    }

    pub fn exploration_rate(&self) -> f64 {
        self.core.exploration_rate
    }

    pub fn policy_kind(&self) -> PolicyKind {
        self.policy.kind()
    }

    pub fn planner(&self) -> Option<&Planner> {
        self.policy.planner()
    }

    pub fn learner(&self) -> Option<&QLearner> {
        self.policy.learner()
    }

    pub fn is_autonomous(&self) -> bool {
        self.autonomous
    }
}
