//! Benchmarks for grid agents
//!
//! Run with: cargo bench -p grid_agents

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use grid_agents::config::GridWorldConfig;
use grid_agents::learning::{Experience, QLearner};
use grid_agents::planning::{a_star, path_to_actions, CellTag, GridBounds, KnownMap};
use grid_agents::{
    Action, Agent, AgentConfig, Environment, GridState, GridWorld, LearnerConfig, Orientation,
    Perception, Position,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn walled_map(size: i32) -> KnownMap {
    let mut map = KnownMap::new();
    // Alternating walls with a gap at opposite ends.
    for x in (2..size - 1).step_by(3) {
        let gap = if (x / 3) % 2 == 0 { size - 1 } else { 0 };
        for y in 0..size {
            if y != gap {
                map.mark(Position::new(x, y), CellTag::Obstacle);
            }
        }
    }
    map
}

/// Benchmark A* on open and walled grids
fn bench_astar(c: &mut Criterion) {
    let mut group = c.benchmark_group("A*");

    for size in [10u32, 30, 60] {
        let bounds = GridBounds::square(size);
        let goal = Position::new(size as i32 - 1, size as i32 - 1);
        let open = KnownMap::new();
        let walled = walled_map(size as i32);

        group.bench_with_input(BenchmarkId::new("open", size), &size, |b, _| {
            b.iter(|| {
                black_box(a_star(&open, bounds, Position::new(0, 0), goal, Orientation::Right))
            });
        });

        group.bench_with_input(BenchmarkId::new("walled", size), &size, |b, _| {
            b.iter(|| {
                black_box(a_star(&walled, bounds, Position::new(0, 0), goal, Orientation::Right))
            });
        });
    }

    group.finish();
}

/// Benchmark path compilation
fn bench_compile(c: &mut Criterion) {
    let map = walled_map(30);
    let path = a_star(
        &map,
        GridBounds::square(30),
        Position::new(0, 0),
        Position::new(29, 29),
        Orientation::Up,
    )
    .unwrap_or_default();

    c.bench_function("path_to_actions", |b| {
        b.iter(|| black_box(path_to_actions(&path, Orientation::Up)));
    });
}

/// Benchmark one learning update, with and without replay
fn bench_learn(c: &mut Criterion) {
    let mut group = c.benchmark_group("Learn");
    let goal = Position::new(9, 9);
    let transitions: Vec<Experience> = (0..9)
        .map(|x| {
            Experience::new(
                Perception::from(&GridState::new(Position::new(x, 0), Orientation::Right, goal)),
                Action::MoveForward,
                -0.1,
                Perception::from(&GridState::new(Position::new(x + 1, 0), Orientation::Right, goal)),
                false,
            )
        })
        .collect();

    for batch in [1usize, 32] {
        group.bench_with_input(BenchmarkId::new("batch", batch), &batch, |b, &batch| {
            let mut learner = QLearner::new(LearnerConfig::default().with_replay(1000, batch));
            let mut rng = StdRng::seed_from_u64(1);
            let mut i = 0;
            b.iter(|| {
                let exp = transitions[i % transitions.len()].clone();
                i += 1;
                black_box(learner.learn(exp, &mut rng))
            });
        });
    }

    group.finish();
}

/// Benchmark full episodes per agent flavour
fn bench_episode(c: &mut Criterion) {
    let mut group = c.benchmark_group("Episode");

    group.bench_function("autonomous", |b| {
        b.iter(|| {
            let mut agent = Agent::autonomous("bench", AgentConfig::deterministic(1));
            let mut world = GridWorld::new(GridWorldConfig::default().with_seed(1)).unwrap();
            world.reset();
            black_box(agent.run_autonomously(&mut world, None, Some(200)))
        });
    });

    group.bench_function("enhanced", |b| {
        b.iter(|| {
            let mut agent = Agent::enhanced("bench", AgentConfig::deterministic(1));
            let mut world = GridWorld::new(GridWorldConfig::default().with_seed(1)).unwrap();
            world.reset();
            black_box(agent.run_autonomously(&mut world, None, Some(200)))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_astar, bench_compile, bench_learn, bench_episode);
criterion_main!(benches);
