//! Hex coordinates, hexagon bounds and neighbourhood algorithms.
//!
//! Positions use axial coordinates stored in a rectangular backing array.
//! Each row `y` of a [`HexShape`] only admits columns in
//! `xmin(y)..xmax(y)`, and those bounds taper linearly with the row so the
//! admitted cells form a hexagon inside the rectangle.
//!
//! The six [`Direction`]s are ordered clockwise starting at north-east.
//! That order is load-bearing: [`count_groups`] walks it cyclically and
//! the shadowcaster derives its sextant transforms from it.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// A cell position in axial hex coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Pos {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Pos {
    /// Create a position from its coordinates.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The adjacent position in `direction`.
    #[must_use]
    pub const fn neighbor(self, direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        Self::new(self.x + dx, self.y + dy)
    }

    /// All six neighbours in clockwise direction order.
    #[must_use]
    pub fn neighbors(self) -> [Self; 6] {
        Direction::ALL.map(|dir| self.neighbor(dir))
    }

    /// Hex distance in steps between two positions.
    #[must_use]
    pub const fn distance(self, other: Self) -> u32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx.unsigned_abs() + dy.unsigned_abs() + (dx + dy).unsigned_abs()) / 2
    }
}

impl Add<Direction> for Pos {
    type Output = Self;

    fn add(self, direction: Direction) -> Self {
        self.neighbor(direction)
    }
}

impl Ord for Pos {
    /// Row-major order, matching [`HexShape::positions`].
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Pos {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The six hex directions, clockwise from north-east.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// (1, -1)
    NorthEast,
    /// (1, 0)
    East,
    /// (0, 1)
    SouthEast,
    /// (-1, 1)
    SouthWest,
    /// (-1, 0)
    West,
    /// (0, -1)
    NorthWest,
}

impl Direction {
    /// All directions in clockwise order.
    pub const ALL: [Self; 6] = [
        Self::NorthEast,
        Self::East,
        Self::SouthEast,
        Self::SouthWest,
        Self::West,
        Self::NorthWest,
    ];

    /// Coordinate offset of one step in this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::NorthEast => (1, -1),
            Self::East => (1, 0),
            Self::SouthEast => (0, 1),
            Self::SouthWest => (-1, 1),
            Self::West => (-1, 0),
            Self::NorthWest => (0, -1),
        }
    }

    /// Position of this direction in [`Direction::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Direction at `index` in clockwise order, wrapping modulo 6.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self::ALL[index % 6]
    }

    /// Rotate clockwise by `steps` sixths of a turn.
    #[must_use]
    pub const fn rotate(self, steps: usize) -> Self {
        Self::from_index(self.index() + steps)
    }

    /// The direction pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        self.rotate(3)
    }
}

/// Hexagon-shaped playable region inside a `width` x `height` rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexShape {
    width: i32,
    height: i32,
}

impl HexShape {
    /// Create a shape with the given rectangle dimensions.
    ///
    /// Dimensions are clamped to at least one cell, and the height is cut
    /// down if needed so the rectangle's cell count fits an `i32`.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let width = i32::try_from(width.max(1)).unwrap_or(i32::MAX);
        let height = i32::try_from(height.max(1)).unwrap_or(i32::MAX);
        let height = match width.checked_mul(height) {
            Some(_) => height,
            None => i32::MAX / width,
        };
        Self { width, height }
    }

    /// Rectangle width.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width as u32
    }

    /// Rectangle height.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height as u32
    }

    /// Minimum column of row `y`, inclusive.
    #[must_use]
    pub const fn xmin(&self, y: i32) -> i32 {
        (self.height - y) / 2
    }

    /// Maximum column of row `y`, exclusive.
    #[must_use]
    pub const fn xmax(&self, y: i32) -> i32 {
        self.width - y / 2
    }

    /// Whether `pos` lies inside the rectangular backing store.
    #[must_use]
    pub const fn in_rect(&self, pos: Pos) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    /// Whether `pos` lies inside the hexagon.
    #[must_use]
    pub const fn contains(&self, pos: Pos) -> bool {
        pos.y >= 0 && pos.y < self.height && pos.x >= self.xmin(pos.y) && pos.x < self.xmax(pos.y)
    }

    /// Whether `pos` lies inside the hexagon and off its outer ring.
    #[must_use]
    pub const fn contains_inner(&self, pos: Pos) -> bool {
        pos.y > 0
            && pos.y < self.height - 1
            && pos.x > self.xmin(pos.y)
            && pos.x < self.xmax(pos.y) - 1
    }

    /// Pack `(x, y)` into a rectangle index.
    #[must_use]
    pub const fn xy2pos(&self, x: i32, y: i32) -> usize {
        (x + y * self.width) as usize
    }

    /// Unpack a rectangle index into a position.
    #[must_use]
    pub const fn pos2xy(&self, index: usize) -> Pos {
        let index = index as i32;
        Pos::new(index % self.width, index / self.width)
    }

    /// Rectangle index of `pos`, or `None` outside the hexagon.
    #[must_use]
    pub const fn index(&self, pos: Pos) -> Option<usize> {
        if self.contains(pos) {
            Some(self.xy2pos(pos.x, pos.y))
        } else {
            None
        }
    }

    /// Number of cells in the rectangle.
    #[must_use]
    pub const fn rect_len(&self) -> usize {
        (self.width * self.height) as usize
    }

    /// Number of cells in the hexagon.
    #[must_use]
    pub fn area(&self) -> usize {
        self.positions().count()
    }

    /// The middle cell of the middle row.
    #[must_use]
    pub const fn center(&self) -> Pos {
        let y = self.height / 2;
        Pos::new((self.xmin(y) + self.xmax(y)) / 2, y)
    }

    /// Every hexagon position in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.height).flat_map(move |y| (self.xmin(y)..self.xmax(y)).map(move |x| Pos::new(x, y)))
    }

    /// Every hexagon position off the outer ring, in row-major order.
    pub fn inner_positions(&self) -> impl Iterator<Item = Pos> + '_ {
        (1..self.height - 1).flat_map(move |y| {
            (self.xmin(y) + 1..self.xmax(y) - 1).map(move |x| Pos::new(x, y))
        })
    }
}

impl Default for HexShape {
    /// The 48 x 31 board.
    fn default() -> Self {
        Self::new(48, 31)
    }
}

/// Call `callback` with each neighbour of `pos` in direction order.
///
/// Neighbours outside any grid are passed through; callers bounds-check.
pub fn for_each_neighbor(pos: Pos, mut callback: impl FnMut(Pos)) {
    for dir in Direction::ALL {
        callback(pos + dir);
    }
}

/// Whether `predicate` holds for all six neighbours of `pos`.
pub fn surrounded(pos: Pos, predicate: impl Fn(Pos) -> bool) -> bool {
    Direction::ALL.iter().all(|&dir| predicate(pos + dir))
}

/// Count the contiguous runs of neighbours around `pos` satisfying `ingroup`.
///
/// Runs are counted by their entering edges while walking the directions
/// cyclically. With no edge at all the neighbourhood is uniform, and the
/// result is 1 if the north-east neighbour is in the group and 0 otherwise.
pub fn count_groups(pos: Pos, ingroup: impl Fn(Pos) -> bool) -> u32 {
    let inside = Direction::ALL.map(|dir| ingroup(pos + dir));
    let edges = (0..6)
        .filter(|&i| !inside[i] && inside[(i + 1) % 6])
        .count() as u32;
    if edges > 0 {
        edges
    } else {
        u32::from(inside[Direction::NorthEast.index()])
    }
}

/// Depth-first flood fill from `start`.
///
/// `flood` is called on every position for which `floodable` holds when it
/// is reached. `flood` must make `floodable` false for the position it
/// visits, otherwise the fill never terminates.
///
/// The traversal runs on an explicit frame stack but visits positions in
/// exactly the order a recursive fill over [`Direction::ALL`] would.
pub fn floodfill<S>(
    start: Pos,
    state: &mut S,
    floodable: impl Fn(&S, Pos) -> bool,
    mut flood: impl FnMut(&mut S, Pos),
) {
    if !floodable(state, start) {
        return;
    }
    flood(state, start);

    let mut stack: Vec<(Pos, usize)> = vec![(start, 0)];
    while let Some(frame) = stack.last_mut() {
        if frame.1 >= Direction::ALL.len() {
            stack.pop();
            continue;
        }
        let next = frame.0 + Direction::from_index(frame.1);
        frame.1 += 1;

        if floodable(state, next) {
            flood(state, next);
            stack.push((next, 0));
        }
    }
}

#[derive(Default)]
struct FloodSet {
    seen: HashSet<Pos>,
    order: Vec<Pos>,
}

/// Flood from `start` through `passable` positions.
///
/// Returns the reached positions in visit order.
pub fn floodfill_set(start: Pos, passable: impl Fn(Pos) -> bool) -> Vec<Pos> {
    let mut set = FloodSet::default();
    floodfill(
        start,
        &mut set,
        |set, pos| passable(pos) && !set.seen.contains(&pos),
        |set, pos| {
            set.seen.insert(pos);
            set.order.push(pos);
        },
    );
    set.order
}
