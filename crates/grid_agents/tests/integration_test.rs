//! Integration tests for grid agents
//!
//! These tests drive agents against real grid worlds, covering planning, learning,
//! the reward contract and the status surface.

use grid_agents::config::GridWorldConfig;
use grid_agents::learning::{Experience, QLearner, ReplayBuffer};
use grid_agents::planning::{
    a_star, path_to_actions, CellTag, GridBounds, KnownMap, Planner, ReasoningStep,
};
use grid_agents::training::{train, TrainingConfig};
use grid_agents::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashSet, VecDeque};

fn open_world(seed: u64) -> GridWorld {
    GridWorld::with_layout(
        GridWorldConfig::default().with_seed(seed),
        Position::new(0, 0),
        Orientation::Right,
        Position::new(9, 9),
        [],
    )
    .unwrap()
}

fn bfs_distance(map: &KnownMap, bounds: GridBounds, start: Position, goal: Position) -> Option<usize> {
    let mut seen = HashSet::from([start]);
    let mut queue = VecDeque::from([(start, 0usize)]);
    while let Some((cell, d)) = queue.pop_front() {
        if cell == goal {
            return Some(d);
        }
        for dir in Orientation::CLOCKWISE {
            let next = cell.step(dir);
            if bounds.contains(next) && !map.is_obstacle(next) && seen.insert(next) {
                queue.push_back((next, d + 1));
            }
        }
    }
    None
}

/// Empty 10x10 grid, start (0, 0) facing right, goal (9, 9).
#[test]
fn test_end_to_end_open_grid() {
    let map = KnownMap::new();
    let path = a_star(
        &map,
        GridBounds::square(10),
        Position::new(0, 0),
        Position::new(9, 9),
        Orientation::Right,
    )
    .unwrap();
    let actions = path_to_actions(&path, Orientation::Right);
    assert_eq!(actions.len(), 19);
    assert_eq!(actions.iter().filter(|a| **a == Action::MoveForward).count(), 18);
    assert_eq!(actions.iter().filter(|a| **a == Action::TurnRight).count(), 1);
    assert_eq!(actions[9], Action::TurnRight);

    let mut agent = Agent::autonomous("scout", AgentConfig::deterministic(11));
    let mut world = open_world(11);
    let summary = agent.run_autonomously(&mut world, None, Some(200));

    assert!(summary.goal_reached);
    assert!(summary.steps <= 19);
    assert!(summary.total_reward >= 8.0 && summary.total_reward <= 9.9);
    assert_eq!(world.get_state().position, Position::new(9, 9));
}

/// A* path length matches breadth-first search on random maps.
#[test]
fn test_astar_matches_bfs_on_random_maps() {
    let bounds = GridBounds::square(10);
    let start = Position::new(0, 0);
    let goal = Position::new(9, 9);

    for seed in 0..20 {
        let world = GridWorld::new(GridWorldConfig::default().with_seed(seed)).unwrap();
        let mut map = KnownMap::new();
        for cell in &world.get_state().obstacles {
            map.mark(*cell, CellTag::Obstacle);
        }

        let expected = bfs_distance(&map, bounds, start, goal);
        let found = a_star(&map, bounds, start, goal, Orientation::Right).map(|p| p.len() - 1);
        assert_eq!(found, expected, "seed {}", seed);
    }
}

/// An enclosed goal does not panic; the planner explores instead.
#[test]
fn test_enclosed_goal_falls_back_to_exploration() {
    let goal = Position::new(5, 5);
    let walls: Vec<Position> = Orientation::CLOCKWISE.iter().map(|d| goal.step(*d)).collect();
    let mut world = GridWorld::with_layout(
        GridWorldConfig::default().with_seed(3),
        Position::new(0, 0),
        Orientation::Right,
        goal,
        walls,
    )
    .unwrap();

    let mut agent = Agent::autonomous("boxed", AgentConfig::deterministic(3));
    let summary = agent.run_autonomously(&mut world, None, Some(40));
    assert!(!summary.goal_reached);
    assert_eq!(summary.steps, 40);

    let planner = agent.planner().unwrap();
    let explored = planner.trace().any(|s| {
        matches!(
            s,
            ReasoningStep::Planning {
                outcome: PlanOutcome::Exploration { .. },
                ..
            }
        )
    });
    assert!(explored);
}

/// Compiled plans are deterministic, drawn from the vocabulary and land on the goal.
#[test]
fn test_compiled_plans_execute_exactly() {
    for seed in 0..10 {
        let mut world = GridWorld::new(GridWorldConfig::default().with_seed(seed)).unwrap();
        let state = world.reset();
        let mut map = KnownMap::new();
        for cell in &state.obstacles {
            map.mark(*cell, CellTag::Obstacle);
        }

        let path = a_star(
            &map,
            GridBounds::square(10),
            state.position,
            state.goal_position,
            state.orientation,
        )
        .unwrap();
        let actions = path_to_actions(&path, state.orientation);
        assert_eq!(actions, path_to_actions(&path, state.orientation));
        assert!(actions.iter().all(|a| Action::ALL.contains(a)));

        let mut last = None;
        for action in &actions {
            last = Some(world.update(*action));
        }
        let last = last.unwrap();
        assert_eq!(last.state.position, state.goal_position);
        assert!(last.done);
    }
}

/// Step cost, wall penalty and goal bonus.
#[test]
fn test_reward_shape() {
    let mut world = GridWorld::with_layout(
        GridWorldConfig::default(),
        Position::new(0, 0),
        Orientation::Right,
        Position::new(2, 0),
        [Position::new(0, 1)],
    )
    .unwrap();

    let free = world.update(Action::MoveForward);
    assert!((free.reward + 0.1).abs() < 1e-9);
    assert_eq!(free.state.position, Position::new(1, 0));

    world.update(Action::TurnLeft);
    let wall = world.update(Action::MoveForward);
    assert!((wall.reward + 1.1).abs() < 1e-9);
    assert_eq!(wall.state.position, Position::new(1, 0));

    world.update(Action::TurnRight);
    let goal = world.update(Action::MoveForward);
    assert!((goal.reward - 9.9).abs() < 1e-9);
    assert!(goal.done);
}

/// The replay buffer keeps the most recent `capacity` insertions in order.
#[test]
fn test_replay_buffer_bound() {
    let mut buffer = ReplayBuffer::new(50);
    for i in 0..73 {
        buffer.push(i);
    }
    assert_eq!(buffer.len(), 50);
    let kept: Vec<i32> = buffer.iter().copied().collect();
    assert_eq!(kept, (23..73).collect::<Vec<_>>());
}

/// Epsilon never increases and never drops below its floor.
#[test]
fn test_epsilon_monotone_over_learning() {
    let mut learner = QLearner::new(LearnerConfig::default());
    let mut rng = StdRng::seed_from_u64(5);
    let goal = Position::new(9, 9);
    let mut last = learner.epsilon();

    for i in 0..2000 {
        let x = i % 9;
        let before = Perception::from(&GridState::new(Position::new(x, 0), Orientation::Right, goal));
        let after = Perception::from(&GridState::new(Position::new(x + 1, 0), Orientation::Right, goal));
        learner.learn(Experience::new(before, Action::MoveForward, -0.1, after, false), &mut rng);
        assert!(learner.epsilon() <= last);
        assert!(learner.epsilon() >= 0.01);
        last = learner.epsilon();
    }
    assert_eq!(learner.experience_count(), 1000);
    assert!((learner.epsilon() - 0.01).abs() < 1e-12);
}

/// A learning agent's status carries the learning block and no planning block.
#[test]
fn test_status_json_shapes() {
    let mut agent = Agent::enhanced("learner", AgentConfig::deterministic(2));
    let mut world = open_world(2);
    agent.run_autonomously(&mut world, None, Some(10));

    let json = agent.status().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["policy"], "learned");
    assert_eq!(value["learning"]["experience_count"], 10);
    assert!(value["learning"]["epsilon"].as_f64().unwrap() < 0.2);
    assert!(value["memory_size"].as_u64().unwrap() <= 100);
    assert!(value.get("planning").is_none());
    assert!(value["state"]["position"].is_object());
}

#[test]
fn test_training_stats() {
    let mut agent = Agent::enhanced("trainee", AgentConfig::deterministic(8));
    let mut world = GridWorld::new(GridWorldConfig::default().with_seed(8)).unwrap();
    let stats = train(&mut agent, &mut world, &TrainingConfig::new(6, 60));

    assert_eq!(stats.episodes, 6);
    assert_eq!(stats.episode_steps.len(), 6);
    assert!(stats.episode_steps.iter().all(|s| *s <= 60));
    assert!((0.0..=1.0).contains(&stats.success_rate));
}

/// Two identically seeded runs behave identically.
#[test]
fn test_seeded_runs_are_reproducible() {
    let run = || {
        let mut agent = Agent::reactive("twin", AgentConfig::deterministic(21));
        let mut world = GridWorld::new(GridWorldConfig::default().with_seed(21)).unwrap();
        let mut actions = Vec::new();
        let mut record = |r: &StepReport| actions.push(r.action);
        let summary = agent.run_autonomously(&mut world, Some(&mut record), Some(50));
        (summary, actions)
    };
    assert_eq!(run(), run());
}

#[test]
fn test_planner_is_usable_standalone() {
    let mut planner = Planner::new(PlannerConfig::default());
    let mut rng = StdRng::seed_from_u64(1);
    let belief = Perception::from(&GridState::new(
        Position::new(9, 0),
        Orientation::Left,
        Position::new(9, 9),
    ));
    planner.observe(&belief);
    assert_eq!(planner.decide(&belief, &mut rng), Action::TurnLeft);
    assert_eq!(planner.plan().len(), 9);
}
