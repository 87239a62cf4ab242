use serde::{Deserialize, Serialize};

/// A cell of the goal grid, addressed by column and row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    pub col: u32,
    pub row: u32,
}

impl GridCell {
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }
}

/// Navigation target broadcast to the vehicle. `(-1, -1)` clears the goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalTarget {
    pub x: i32,
    pub y: i32,
}

impl GoalTarget {
    pub const CLEARED: GoalTarget = GoalTarget { x: -1, y: -1 };
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainParameters {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl GainParameters {
    pub fn has_invalid(&self) -> bool {
        !(self.kp.is_finite() && self.ki.is_finite() && self.kd.is_finite())
    }
}
