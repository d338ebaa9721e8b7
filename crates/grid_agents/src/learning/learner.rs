//! Epsilon-greedy Q-learning over the linear [`LearningModel`].

use super::model::LearningModel;
use super::replay::{Experience, ReplayBuffer};
use crate::action::Action;
use crate::config::LearnerConfig;
use crate::observation::Perception;
use log::debug;
use rand::seq::IndexedRandom;
use rand::Rng;

/// Function-approximation Q-learner with experience replay.
#[derive(Debug, Clone)]
pub struct QLearner {
    model: LearningModel,
    replay: ReplayBuffer<Experience>,
    epsilon: f64,
    config: LearnerConfig,
    total_updates: u64,
    replay_batches: u64,
}

impl QLearner {
    pub fn new(config: LearnerConfig) -> Self {
        Self {
            model: LearningModel::new(config.feature_width, config.model_learning_rate),
            replay: ReplayBuffer::new(config.replay_capacity),
            epsilon: config.epsilon,
            config,
            total_updates: 0,
            replay_batches: 0,
        }
    }

    /// Epsilon-greedy choice over the model's prediction.
    ///
    /// A prediction outside the belief's available actions is replaced by a random
    /// available action.
    pub fn decide<R: Rng + ?Sized>(&self, belief: &Perception, rng: &mut R) -> Action {
        let available = belief.available_actions_or_wait();
        if rng.random::<f64>() < self.epsilon {
            return random_action(&available, rng);
        }
        let predicted = self.model.predict(belief);
        if available.contains(&predicted) {
            predicted
        } else {
            random_action(&available, rng)
        }
    }

    /// Learns from one transition and returns its target.
    ///
    /// The transition is fitted immediately, stored for replay, and once the buffer
    /// holds a full batch a random batch is replayed with the same target rule.
    /// Epsilon decays afterwards.
    pub fn learn<R: Rng + ?Sized>(
        &mut self,
        experience: Experience,
        rng: &mut R,
    ) -> f64 {
        let gamma = self.config.discount_factor;
        let target = bootstrap_target(
            &self.model,
            gamma,
            experience.reward,
            &experience.next_state,
            experience.done,
        );
        self.model.update(&experience.state, experience.action, target);
        self.total_updates += 1;
        self.replay.push(experience);

        if self.replay.len() >= self.config.batch_size {
            let batch = self.replay.sample(rng, self.config.batch_size);
            debug!("Replaying batch of {} transitions", batch.len());
            for exp in batch {
                let t = bootstrap_target(&self.model, gamma, exp.reward, &exp.next_state, exp.done);
                self.model.update(&exp.state, exp.action, t);
                self.total_updates += 1;
            }
            self.replay_batches += 1;
        }

        self.decay_epsilon();
        target
    }

    /// `epsilon = max(epsilon_min, epsilon * epsilon_decay)`.
    pub fn decay_epsilon(&mut self) {
        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn model(&self) -> &LearningModel {
        &self.model
    }

    pub fn replay(&self) -> &ReplayBuffer<Experience> {
        &self.replay
    }

    pub fn experience_count(&self) -> usize {
        self.replay.len()
    }

    /// Number of model updates, online and replayed.
    pub fn total_updates(&self) -> u64 {
        self.total_updates
    }

    pub fn replay_batches(&self) -> u64 {
        self.replay_batches
    }

    pub fn config(&self) -> &LearnerConfig {
        &self.config
    }

    /// Forgets everything learned and restores the initial epsilon.
    pub fn reset(&mut self) {
        self.model.reset();
        self.replay.clear();
        self.epsilon = self.config.epsilon;
        self.total_updates = 0;
        self.replay_batches = 0;
    }
}

/// `reward + gamma * max_a Q(next, a)`, or just `reward` when the transition is
/// terminal, the goal is unknown, or the successor already stands on the goal.
pub fn bootstrap_target(
    model: &LearningModel,
    gamma: f64,
    reward: f64,
    next_state: &Perception,
    done: bool,
) -> f64 {
    let at_goal = next_state.is_at_goal().unwrap_or(true);
    if done || at_goal {
        reward
    } else {
        reward + gamma * model.max_value(next_state)
    }
}

fn random_action<R: Rng + ?Sized>(available: &[Action], rng: &mut R) -> Action {
    available.choose(rng).copied().unwrap_or(Action::Wait)
}
