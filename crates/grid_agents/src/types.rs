//! Core, general-purpose data types: grid geometry, timestamps and rule values.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A high-precision timestamp in microseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Returns the current timestamp.
    pub fn now() -> Self {
        let now = chrono::Utc::now();
        let micros = (now.timestamp() as u64) * 1_000_000 + (now.timestamp_subsec_micros() as u64);
        Self(micros)
    }
}

/// A cell on the grid. `x` grows to the right, `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to `other`.
    pub fn manhattan(&self, other: Position) -> u32 {
        ((self.x - other.x).abs() + (self.y - other.y).abs()) as u32
    }

    /// The neighbouring cell one step in `orientation`.
    pub fn step(&self, orientation: Orientation) -> Position {
        let (dx, dy) = orientation.delta();
        Position::new(self.x + dx, self.y + dy)
    }

    /// The neighbouring cell one step against `orientation`.
    pub fn step_back(&self, orientation: Orientation) -> Position {
        let (dx, dy) = orientation.delta();
        Position::new(self.x - dx, self.y - dy)
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Position::new(x, y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The direction an agent is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Up,
    Right,
    Down,
    Left,
}

impl Orientation {
    /// All orientations in clockwise order, starting from `Up`.
    pub const CLOCKWISE: [Orientation; 4] = [
        Orientation::Up,
        Orientation::Right,
        Orientation::Down,
        Orientation::Left,
    ];

    fn index(self) -> usize {
        match self {
            Orientation::Up => 0,
            Orientation::Right => 1,
            Orientation::Down => 2,
            Orientation::Left => 3,
        }
    }

    /// The orientation after a single counter-clockwise turn.
    pub fn turned_left(self) -> Self {
        Self::CLOCKWISE[(self.index() + 3) % 4]
    }

    /// The orientation after a single clockwise turn.
    pub fn turned_right(self) -> Self {
        Self::CLOCKWISE[(self.index() + 1) % 4]
    }

    /// Number of clockwise quarter turns needed to go from `self` to `target` (0..=3).
    pub fn clockwise_steps(self, target: Orientation) -> usize {
        (target.index() + 4 - self.index()) % 4
    }

    /// Minimal number of single turns needed to face `target` (0..=2).
    pub fn turn_distance(self, target: Orientation) -> u32 {
        match self.clockwise_steps(target) {
            0 => 0,
            2 => 2,
            _ => 1,
        }
    }

    /// Unit displacement for a forward move.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Orientation::Up => (0, -1),
            Orientation::Right => (1, 0),
            Orientation::Down => (0, 1),
            Orientation::Left => (-1, 0),
        }
    }

    /// The axis-aligned direction of travel between two cells, if any.
    ///
    /// The x axis wins when both components are non-zero.
    pub fn between(from: Position, to: Position) -> Option<Orientation> {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        if dx > 0 {
            Some(Orientation::Right)
        } else if dx < 0 {
            Some(Orientation::Left)
        } else if dy > 0 {
            Some(Orientation::Down)
        } else if dy < 0 {
            Some(Orientation::Up)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Up => "up",
            Orientation::Right => "right",
            Orientation::Down => "down",
            Orientation::Left => "left",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "up" => Ok(Orientation::Up),
            "right" => Ok(Orientation::Right),
            "down" => Ok(Orientation::Down),
            "left" => Ok(Orientation::Left),
            other => Err(Error::Config(format!("unknown orientation '{}'", other))),
        }
    }
}

/// A generic value read from a perception field or written in a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// A boolean value.
    Bool(bool),
    /// A 64-bit signed integer value.
    Int(i64),
    /// A 64-bit floating-point value.
    Float(f64),
    /// A string value.
    String(String),
    /// Represents the absence of a value.
    None,
}

impl Value {
    /// Attempts to convert the `Value` to an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Converts the `Value` to a `String` representation.
    pub fn as_string(&self) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::None => "none".to_string(),
        }
    }

    /// Compares two values loosely: numerically when both are numbers,
    /// otherwise by their string form.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => (a - b).abs() < f64::EPSILON,
            _ => self.as_string() == other.as_string(),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

/// A numeric range, used by `Condition::InRange`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    /// The minimum value of the range (inclusive), if bounded.
    pub min: Option<f64>,
    /// The maximum value of the range (inclusive), if bounded.
    pub max: Option<f64>,
}

impl ValueRange {
    /// Creates a new `ValueRange` with a defined minimum and maximum.
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Returns `true` if the given value is within the range.
    pub fn contains(&self, value: f64) -> bool {
        if let Some(min) = self.min {
            if value < min {
                return false;
            }
        }
        if let Some(max) = self.max {
            if value > max {
                return false;
            }
        }
        true
    }
}

impl From<std::ops::Range<f64>> for ValueRange {
    fn from(r: std::ops::Range<f64>) -> Self {
        Self::new(r.start, r.end)
    }
}
