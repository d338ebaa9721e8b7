//! Episode and multi-episode training drivers.
//!
//! ```
//! use grid_agents::config::GridWorldConfig;
//! use grid_agents::training::{train, TrainingConfig};
//! use grid_agents::{Agent, AgentConfig, GridWorld};
//!
//! let mut agent = Agent::enhanced("trainee", AgentConfig::deterministic(3));
//! let mut world = GridWorld::new(GridWorldConfig::default().with_seed(3)).unwrap();
//! let stats = train(&mut agent, &mut world, &TrainingConfig::new(5, 50));
//! assert_eq!(stats.episode_rewards.len(), 5);
//! ```

use crate::agent::Agent;
use crate::environment::Environment;
use log::info;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub episodes: usize,
    /// Step cap per episode.
    pub max_steps: usize,
    /// Log progress every this many episodes. Zero disables progress logs.
    pub log_every: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 100,
            max_steps: 200,
            log_every: 10,
        }
    }
}

impl TrainingConfig {
    pub fn new(episodes: usize, max_steps: usize) -> Self {
        Self {
            episodes,
            max_steps,
            ..Default::default()
        }
    }
}

/// The outcome of one episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeStats {
    pub steps: usize,
    pub total_reward: f64,
    pub goal_reached: bool,
}

/// Aggregate results of [`train`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingStats {
    pub episodes: usize,
    /// Fraction of episodes that reached the goal, in `[0, 1]`.
    pub success_rate: f64,
    pub avg_reward: f64,
    pub avg_steps: f64,
    pub episode_rewards: Vec<f64>,
    pub episode_steps: Vec<usize>,
}

/// Resets `env` and runs one episode without step delay.
pub fn run_episode<E: Environment + ?Sized>(
    agent: &mut Agent,
    env: &mut E,
    max_steps: usize,
) -> EpisodeStats {
    env.reset();
    agent.begin_episode();
    let summary = agent.drive(env, max_steps, Duration::ZERO, None, None);
    EpisodeStats {
        steps: summary.steps,
        total_reward: summary.total_reward,
        goal_reached: summary.goal_reached,
    }
}

/// Runs `config.episodes` episodes and aggregates their results.
pub fn train<E: Environment + ?Sized>(
    agent: &mut Agent,
    env: &mut E,
    config: &TrainingConfig,
) -> TrainingStats {
    let mut stats = TrainingStats {
        episodes: config.episodes,
        ..Default::default()
    };
    let mut successes = 0usize;

    for episode in 1..=config.episodes {
        let result = run_episode(agent, env, config.max_steps);
        if result.goal_reached {
            successes += 1;
        }
        stats.episode_rewards.push(result.total_reward);
        stats.episode_steps.push(result.steps);

        if config.log_every > 0 && episode % config.log_every == 0 {
            let window = &stats.episode_rewards[episode - config.log_every..];
            let avg = window.iter().sum::<f64>() / window.len() as f64;
            info!(
                "Episode {}/{}: avg reward {:.2} over last {}, {} successes",
                episode,
                config.episodes,
                avg,
                window.len(),
                successes
            );
        }
    }

    if config.episodes > 0 {
        let n = config.episodes as f64;
        stats.success_rate = successes as f64 / n;
        stats.avg_reward = stats.episode_rewards.iter().sum::<f64>() / n;
        stats.avg_steps = stats.episode_steps.iter().sum::<usize>() as f64 / n;
    }
    stats
}
