use shared::domain::{GoalTarget, GridCell};

const X_SCALE: f64 = 2.5;
const Y_SCALE: f64 = 3.0;

/// Logical goal grid with at most one selected cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalGrid {
    width: u32,
    height: u32,
    selected: Option<GridCell>,
}

impl GoalGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            selected: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn contains(&self, cell: GridCell) -> bool {
        cell.col < self.width && cell.row < self.height
    }

    pub fn selected(&self) -> Option<GridCell> {
        self.selected
    }

    pub fn is_selected(&self, cell: GridCell) -> bool {
        self.selected == Some(cell)
    }

    /// Row-major, matching the order cells are laid out on screen.
    pub fn cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        (0..self.height)
            .flat_map(move |row| (0..self.width).map(move |col| GridCell::new(col, row)))
    }

    /// Replaces any previous selection. Returns `None` for cells outside the grid.
    pub fn select(&mut self, cell: GridCell) -> Option<GoalTarget> {
        if !self.contains(cell) {
            return None;
        }
        self.selected = Some(cell);
        Some(goal_for(cell))
    }

    pub fn clear(&mut self) -> GoalTarget {
        self.selected = None;
        GoalTarget::CLEARED
    }
}

pub fn goal_for(cell: GridCell) -> GoalTarget {
    GoalTarget {
        x: (f64::from(cell.col) * X_SCALE).floor() as i32,
        y: (f64::from(cell.row) * Y_SCALE).floor() as i32,
    }
}
