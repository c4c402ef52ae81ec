//! Field of view by recursive shadowcasting over six sextants.
//!
//! Each sextant is scanned row by row outward from the centre, tracking the
//! visible wedge as a pair of slopes. Transparent cells are revealed when
//! their centre lies inside the wedge, edges included, while opaque cells
//! are revealed over a slightly wider band, so the walls bounding visible
//! floor are shown but disjoint slivers of view do not leak past corners.
//!
//! Slopes are exact fractions, so half-cell ties round the same way on
//! every platform.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::grid::HexGrid;
use crate::hex::{Direction, Pos};
use crate::tile::Tile;

/// A slope `num / den` with `den > 0`, measured as column over row.
#[derive(Debug, Clone, Copy)]
struct Slope {
    num: i64,
    den: i64,
}

impl Slope {
    const ZERO: Self = Self { num: 0, den: 1 };
    const ONE: Self = Self { num: 1, den: 1 };

    /// The slope through the left edge of cell `x` in row `y`.
    const fn left_edge(x: i64, y: i64) -> Self {
        Self {
            num: 2 * x - 1,
            den: 2 * y,
        }
    }

    /// The slope through the right edge of cell `x` in row `y`.
    const fn right_edge(x: i64, y: i64) -> Self {
        Self {
            num: 2 * x + 1,
            den: 2 * y,
        }
    }

    const fn at_least(self, other: Self) -> bool {
        self.num * other.den >= other.num * self.den
    }

    /// `x <= y * self`
    const fn covers(self, x: i64, y: i64) -> bool {
        x * self.den <= y * self.num
    }

    /// `y * self <= x`
    const fn below(self, x: i64, y: i64) -> bool {
        y * self.num <= x * self.den
    }

    /// `y * self` rounded to nearest, halves rounding up.
    const fn round_high(self, y: i64) -> i64 {
        (2 * y * self.num + self.den).div_euclid(2 * self.den)
    }

    /// `y * self` rounded to nearest, halves rounding down.
    const fn round_low(self, y: i64) -> i64 {
        -(self.den - 2 * y * self.num).div_euclid(2 * self.den)
    }
}

struct Row {
    y: i64,
    start: Slope,
    end: Slope,
}

/// Compute the cells visible from `center`.
///
/// `transparent` decides whether sight passes through a cell and must
/// return `false` for cells outside the map, or the scan never stops.
/// `reveal` is called for every visible cell, possibly more than once for
/// the same cell, and may receive positions outside the map that bound the
/// view.
pub fn shadowcast(center: Pos, transparent: impl Fn(Pos) -> bool, mut reveal: impl FnMut(Pos)) {
    reveal(center);
    for (i, normal) in Direction::ALL.into_iter().enumerate() {
        let tangent = Direction::from_index(i + 2);
        let (nx, ny) = normal.offset();
        let (tx, ty) = tangent.offset();
        #[allow(clippy::cast_possible_truncation)]
        let transform = |x: i64, y: i64| {
            let (x, y) = (x as i32, y as i32);
            Pos::new(center.x + x * tx + y * nx, center.y + x * ty + y * ny)
        };
        scan_sextant(
            |x, y| transparent(transform(x, y)),
            |x, y| reveal(transform(x, y)),
        );
    }
}

fn scan_sextant(transparent: impl Fn(i64, i64) -> bool, mut reveal: impl FnMut(i64, i64)) {
    let mut rows = vec![Row {
        y: 1,
        start: Slope::ZERO,
        end: Slope::ONE,
    }];

    'rows: while let Some(Row { y, mut start, end }) = rows.pop() {
        if start.at_least(end) {
            continue;
        }

        let xmin = start.round_high(y);
        let xmax = end.round_low(y);
        let mut fov_exists = false;

        for x in xmin..=xmax {
            if transparent(x, y) {
                if start.below(x, y) && end.covers(x, y) {
                    reveal(x, y);
                    fov_exists = true;
                }
            } else {
                if fov_exists {
                    rows.push(Row {
                        y: y + 1,
                        start,
                        end: Slope::left_edge(x, y),
                    });
                }
                reveal(x, y);
                fov_exists = false;
                start = Slope::right_edge(x, y);
                if start.at_least(end) {
                    continue 'rows;
                }
            }
        }

        if fov_exists {
            rows.push(Row { y: y + 1, start, end });
        }
    }
}

/// The cells visible from `center` on `tiles`, seeing through cells
/// accepted by `clear`. Off-map cells are excluded.
pub fn visible_set(center: Pos, tiles: &HexGrid<Tile>, clear: impl Fn(Tile) -> bool) -> BTreeSet<Pos> {
    let mut seen = BTreeSet::new();
    shadowcast(
        center,
        |pos| tiles.get(pos).is_some_and(|&tile| clear(tile)),
        |pos| {
            if tiles.contains(pos) {
                seen.insert(pos);
            }
        },
    );
    seen
}

/// What one viewer currently sees and what it remembers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visibility {
    /// Cells in direct view.
    pub visible: BTreeSet<Pos>,
    /// Last seen tile for every cell ever glimpsed.
    pub memory: BTreeMap<Pos, Tile>,
}

impl Visibility {
    /// Create an empty view.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the view from `center`.
    ///
    /// Memory is refreshed through partially transparent tiles, so tall
    /// grass can be seen into, while direct view only extends through
    /// fully clear tiles.
    pub fn look(&mut self, center: Pos, tiles: &HexGrid<Tile>) {
        let memory = &mut self.memory;
        shadowcast(
            center,
            |pos| tiles.get(pos).is_some_and(|tile| tile.is_visible_through()),
            |pos| {
                if let Some(&tile) = tiles.get(pos) {
                    memory.insert(pos, tile);
                }
            },
        );
        self.visible = visible_set(center, tiles, Tile::is_clear);
    }

    /// Whether `pos` is in direct view.
    #[must_use]
    pub fn is_visible(&self, pos: Pos) -> bool {
        self.visible.contains(&pos)
    }

    /// The remembered tile at `pos`.
    #[must_use]
    pub fn remembered(&self, pos: Pos) -> Option<Tile> {
        self.memory.get(&pos).copied()
    }

    /// Whether nothing is in view yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// Forget the current view but keep memory.
    pub fn clear(&mut self) {
        self.visible.clear();
    }
}
