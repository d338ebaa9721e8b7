//! A* over the known map.
//!
//! Four-connected moves, unit cost, Manhattan heuristic. Among equally short paths
//! the search prefers the one needing the fewest turns from the starting heading,
//! then the earliest discovered, so results are deterministic for a given input.

use super::map::{GridBounds, KnownMap};
use crate::types::{Orientation, Position};
use core::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

#[derive(Debug)]
struct OpenNode {
    f: u32,
    turns: u32,
    g: u32,
    cell: Position,
    tie: u64,
}

impl OpenNode {
    fn key(&self) -> (u32, u32, u64) {
        (self.f, self.turns, self.tie)
    }
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap behave like a min-heap.
        other.key().cmp(&self.key())
    }
}

#[derive(Debug, Clone, Copy)]
struct Best {
    g: u32,
    turns: u32,
    heading: Orientation,
}

/// Finds a shortest path from `start` to `goal`, both included.
///
/// Cells tagged as obstacles and cells outside `bounds` are impassable; unknown cells
/// are assumed free. Returns `None` when no path exists or an endpoint is blocked.
pub fn a_star(
    map: &KnownMap,
    bounds: GridBounds,
    start: Position,
    goal: Position,
    heading: Orientation,
) -> Option<Vec<Position>> {
    let passable = |p: Position| bounds.contains(p) && !map.is_obstacle(p);
    if !bounds.contains(start) || !passable(goal) {
        return None;
    }
    if start == goal {
        return Some(vec![start]);
    }

    let mut open = BinaryHeap::<OpenNode>::new();
    let mut best: HashMap<Position, Best> = HashMap::new();
    let mut came_from: HashMap<Position, Position> = HashMap::new();
    let mut tie: u64 = 0;

    best.insert(
        start,
        Best {
            g: 0,
            turns: 0,
            heading,
        },
    );
    open.push(OpenNode {
        f: start.manhattan(goal),
        turns: 0,
        g: 0,
        cell: start,
        tie,
    });
    tie += 1;

    while let Some(node) = open.pop() {
        let Some(current) = best.get(&node.cell).copied() else {
            continue;
        };
        if node.g != current.g || node.turns != current.turns {
            // Stale heap entry.
            continue;
        }

        if node.cell == goal {
            return Some(reconstruct_path(&came_from, start, goal));
        }

        // Fixed order for determinism: up, right, down, left.
        for direction in Orientation::CLOCKWISE {
            let next = node.cell.step(direction);
            if !passable(next) {
                continue;
            }

            let g = node.g + 1;
            let turns = node.turns + current.heading.turn_distance(direction);
            let improves = match best.get(&next) {
                Some(b) => (g, turns) < (b.g, b.turns),
                None => true,
            };
            if !improves {
                continue;
            }

            best.insert(
                next,
                Best {
                    g,
                    turns,
                    heading: direction,
                },
            );
            came_from.insert(next, node.cell);
            open.push(OpenNode {
                f: g + next.manhattan(goal),
                turns,
                g,
                cell: next,
                tie,
            });
            tie += 1;
        }
    }

    None
}

fn reconstruct_path(
    came_from: &HashMap<Position, Position>,
    start: Position,
    goal: Position,
) -> Vec<Position> {
    let mut out = vec![goal];
    let mut current = goal;
    while current != start {
        match came_from.get(&current) {
            Some(prev) => {
                current = *prev;
                out.push(current);
            }
            None => break,
        }
    }
    out.reverse();
    out
}
