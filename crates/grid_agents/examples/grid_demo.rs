//! Runs each agent flavour on the same grid and trains a learning agent.
//!
//! Run with: RUST_LOG=info cargo run -p grid_agents --example grid_demo

use grid_agents::config::GridWorldConfig;
use grid_agents::training::{train, TrainingConfig};
use grid_agents::{Action, Agent, AgentConfig, Environment, GridWorld, PolicyKind, StepReport};

fn main() -> grid_agents::Result<()> {
    env_logger::init();

    println!("=== Grid Agents Demo ===\n");

    for kind in [PolicyKind::Reactive, PolicyKind::Planning, PolicyKind::Learned] {
        let mut world = GridWorld::new(GridWorldConfig::default().with_seed(7))?;
        let start = world.reset();
        let mut agent = Agent::from_config(kind, &format!("{}-agent", kind), AgentConfig::deterministic(7))?;
        if kind == PolicyKind::Reactive {
            agent.add_rule_expr("distance_to_goal > 0", Action::MoveForward);
        }

        let mut turns = 0;
        let mut count_turns = |r: &StepReport| {
            if r.action.is_turn() {
                turns += 1;
            }
        };
        let summary = agent.run_autonomously(&mut world, Some(&mut count_turns), Some(200));

        println!("{} agent", kind);
        println!("  start {} facing {}, goal {}", start.position, start.orientation, start.goal_position);
        println!(
            "  steps: {}, turns: {}, reward: {:.1}, goal reached: {}",
            summary.steps, turns, summary.total_reward, summary.goal_reached
        );
    }

    println!("\nTraining a learning agent...");
    let mut agent = Agent::enhanced("trainee", AgentConfig::deterministic(11));
    let mut world = GridWorld::new(GridWorldConfig::default().with_seed(11))?;
    let stats = train(&mut agent, &mut world, &TrainingConfig::new(50, 200));
    println!(
        "  episodes: {}, success rate: {:.0}%, avg reward: {:.2}, avg steps: {:.1}",
        stats.episodes,
        stats.success_rate * 100.0,
        stats.avg_reward,
        stats.avg_steps
    );

    println!("\nFinal status:\n{}", agent.status().to_json()?);
    Ok(())
}
