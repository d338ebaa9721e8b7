//! Closed-loop runs against an [`Environment`].

use super::Agent;
use crate::action::Action;
use crate::environment::{Environment, Step};
use crate::observation::GridState;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// A cooperative stop flag, polled between steps.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What the step callback sees after each step.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub step: usize,
    pub state: GridState,
    pub action: Action,
    pub reward: f64,
    pub done: bool,
    pub total_reward: f64,
}

/// The outcome of a closed-loop run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub steps: usize,
    pub total_reward: f64,
    pub goal_reached: bool,
    pub cancelled: bool,
}

impl Agent {
    /// Runs perceive, decide, act, environment update and learn until the episode
    /// ends or `max_steps` (default from the autonomy config) is reached.
    ///
    /// `callback` is invoked after every step. Between steps the loop sleeps for
    /// the configured step delay.
    pub fn run_autonomously<E: Environment + ?Sized>(
        &mut self,
        env: &mut E,
        callback: Option<&mut dyn FnMut(&StepReport)>,
        max_steps: Option<usize>,
    ) -> RunSummary {
        self.run_until_cancelled(env, callback, max_steps, &CancelToken::new())
    }

    /// Like [`Agent::run_autonomously`], stopping early once `cancel` is set.
    pub fn run_until_cancelled<E: Environment + ?Sized>(
        &mut self,
        env: &mut E,
        callback: Option<&mut dyn FnMut(&StepReport)>,
        max_steps: Option<usize>,
        cancel: &CancelToken,
    ) -> RunSummary {
        let max_steps = max_steps.unwrap_or(self.core.config.autonomy.max_steps);
        let delay = self.core.config.autonomy.step_delay;
        self.drive(env, max_steps, delay, Some(cancel), callback)
    }

    pub(crate) fn drive<E: Environment + ?Sized>(
        &mut self,
        env: &mut E,
        max_steps: usize,
        delay: Duration,
        cancel: Option<&CancelToken>,
        mut callback: Option<&mut dyn FnMut(&StepReport)>,
    ) -> RunSummary {
        self.autonomous = true;
        self.autonomous_steps = 0;
        let mut summary = RunSummary {
            steps: 0,
            total_reward: 0.0,
            goal_reached: false,
            cancelled: false,
        };
        let mut state = env.get_state();

        for step in 1..=max_steps {
            if cancel.is_some_and(|c| c.is_cancelled()) {
                summary.cancelled = true;
                warn!("Agent '{}' run cancelled after {} steps", self.name, summary.steps);
                break;
            }

            self.perceive(&state);
            let action = self.decide();
            self.act(action, &state);
            let Step {
                state: next,
                reward,
                done,
            } = env.update(action);
            self.learn_transition(reward, &state, action, &next, done);

            summary.steps = step;
            summary.total_reward += reward;
            self.autonomous_steps += 1;
            if let Some(cb) = callback.as_mut() {
                cb(&StepReport {
                    step,
                    state: next.clone(),
                    action,
                    reward,
                    done,
                    total_reward: summary.total_reward,
                });
            }

            state = next;
            if done {
                summary.goal_reached = true;
                break;
            }
            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }

        self.autonomous = false;
        info!(
            "Agent '{}' finished: {} steps, reward {:.2}, goal reached: {}",
            self.name, summary.steps, summary.total_reward, summary.goal_reached
        );
        summary
    }
}
