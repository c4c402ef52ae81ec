//! Dense per-cell storage over a hexagon.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::hex::{HexShape, Pos};

/// A value for every cell of a [`HexShape`], stored in a rectangle.
///
/// Cells of the rectangle that fall outside the hexagon are allocated but
/// never reachable through the accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HexGrid<T> {
    shape: HexShape,
    cells: Vec<T>,
}

impl<T: Clone> HexGrid<T> {
    /// Create a grid with every cell set to `fill`.
    #[must_use]
    pub fn new(shape: HexShape, fill: T) -> Self {
        Self {
            shape,
            cells: vec![fill; shape.rect_len()],
        }
    }

    /// Set every hexagon cell to `value`.
    pub fn fill(&mut self, value: T) {
        self.cells.fill(value);
    }
}

impl<T> HexGrid<T> {
    /// Create a grid by evaluating `init` at every rectangle position.
    pub fn from_fn(shape: HexShape, mut init: impl FnMut(Pos) -> T) -> Self {
        let cells = (0..shape.rect_len()).map(|i| init(shape.pos2xy(i))).collect();
        Self { shape, cells }
    }

    /// The grid's shape.
    #[must_use]
    pub const fn shape(&self) -> HexShape {
        self.shape
    }

    /// Whether `pos` addresses a cell of this grid.
    #[must_use]
    pub const fn contains(&self, pos: Pos) -> bool {
        self.shape.contains(pos)
    }

    /// Value at `pos`, or `None` outside the hexagon.
    #[must_use]
    pub fn get(&self, pos: Pos) -> Option<&T> {
        self.shape.index(pos).and_then(|i| self.cells.get(i))
    }

    /// Mutable value at `pos`, or `None` outside the hexagon.
    pub fn get_mut(&mut self, pos: Pos) -> Option<&mut T> {
        self.shape.index(pos).and_then(|i| self.cells.get_mut(i))
    }

    /// Value at `pos`, failing with [`GameError::OutOfBounds`] outside the hexagon.
    ///
    /// # Errors
    ///
    /// Returns an error if `pos` is not a cell of the grid.
    pub fn try_get(&self, pos: Pos) -> Result<&T> {
        self.get(pos)
            .ok_or(GameError::OutOfBounds { x: pos.x, y: pos.y })
    }

    /// Overwrite the value at `pos`. Returns `false` outside the hexagon.
    pub fn set(&mut self, pos: Pos, value: T) -> bool {
        match self.get_mut(pos) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    /// Iterate hexagon cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Pos, &T)> + '_ {
        self.shape
            .positions()
            .filter_map(move |pos| self.get(pos).map(|value| (pos, value)))
    }
}

impl<T: Copy> HexGrid<T> {
    /// Copy of the value at `pos`, or `default` outside the hexagon.
    #[must_use]
    pub fn get_or(&self, pos: Pos, default: T) -> T {
        self.get(pos).copied().unwrap_or(default)
    }
}
