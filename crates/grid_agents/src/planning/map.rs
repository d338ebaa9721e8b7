//! The agent's incrementally discovered map.

use crate::types::Position;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What the agent knows about a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellTag {
    Empty,
    Goal,
    Obstacle,
}

impl CellTag {
    fn rank(self) -> u8 {
        match self {
            CellTag::Empty => 0,
            CellTag::Goal => 1,
            CellTag::Obstacle => 2,
        }
    }
}

/// The square region the planner searches in. Cells outside are impassable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBounds {
    pub width: i32,
    pub height: i32,
}

impl GridBounds {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn square(size: u32) -> Self {
        Self::new(size as i32, size as i32)
    }

    pub fn contains(&self, p: Position) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.width && p.y < self.height
    }
}

/// Cell tags discovered so far.
///
/// The map only grows. A cell keeps the strongest tag it was ever given
/// (`obstacle` > `goal` > `empty`), so an obstacle is never downgraded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnownMap {
    cells: BTreeMap<Position, CellTag>,
}

impl KnownMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `tag` for `cell` unless a stronger tag is already known.
    pub fn mark(&mut self, cell: Position, tag: CellTag) {
        self.cells
            .entry(cell)
            .and_modify(|current| {
                if tag.rank() > current.rank() {
                    *current = tag;
                }
            })
            .or_insert(tag);
    }

    pub fn get(&self, cell: Position) -> Option<CellTag> {
        self.cells.get(&cell).copied()
    }

    /// `true` only for cells known to be obstacles. Unknown cells are passable.
    pub fn is_obstacle(&self, cell: Position) -> bool {
        self.get(cell) == Some(CellTag::Obstacle)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Position, &CellTag)> {
        self.cells.iter()
    }

    pub fn count(&self, tag: CellTag) -> usize {
        self.cells.values().filter(|t| **t == tag).count()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }
}
