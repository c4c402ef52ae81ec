//! Test fixtures and helpers.
//!
//! Hand-drawn levels and small games for consistent testing.

use hex_core::config::{GameConfig, LevelConfig};
use hex_core::game::Game;
use hex_core::grid::HexGrid;
use hex_core::hex::HexShape;
use hex_core::tile::Tile;

/// Parse one fixture character.
///
/// `#` wall, `.` floor, `,` short grass, `"` tall grass, `^` spikes.
///
/// # Panics
///
/// Panics on any other character.
#[must_use]
pub fn tile_from_char(c: char) -> Tile {
    match c {
        '#' => Tile::Wall,
        '.' => Tile::Floor,
        ',' => Tile::ShortGrass,
        '"' => Tile::TallGrass,
        '^' => Tile::Spikes,
        other => panic!("unknown fixture tile {other:?}"),
    }
}

/// Build a grid from rows of hexagon cells, whitespace ignored.
///
/// Row `y` lists the cells from `xmin(y)` to `xmax(y)`. Drawn with every
/// other row shifted half a cell, a fixture looks like the board:
///
/// ```text
/// # # # #
///  # . . #
/// # . . #
///  # . . #
/// # # # #
/// ```
///
/// # Panics
///
/// Panics if a row's length does not fit the hexagon implied by the first row.
#[must_use]
pub fn ascii_grid(rows: &[&str]) -> HexGrid<Tile> {
    let rows: Vec<Vec<Tile>> = rows
        .iter()
        .map(|row| row.chars().filter(|c| !c.is_whitespace()).map(tile_from_char).collect())
        .collect();
    let height = u32::try_from(rows.len()).unwrap();
    let first = u32::try_from(rows.first().map_or(0, Vec::len)).unwrap();
    let shape = HexShape::new(first + height / 2, height);

    let mut grid = HexGrid::new(shape, Tile::Wall);
    for (y, row) in rows.iter().enumerate() {
        let y = i32::try_from(y).unwrap();
        let expected = usize::try_from(shape.xmax(y) - shape.xmin(y)).unwrap();
        assert_eq!(row.len(), expected, "fixture row {y} has the wrong length");
        for (x, &tile) in (shape.xmin(y)..).zip(row) {
            grid.set(hex_core::hex::Pos::new(x, y), tile);
        }
    }
    grid
}

/// Render a grid back to fixture rows.
#[must_use]
pub fn grid_to_ascii(grid: &HexGrid<Tile>) -> Vec<String> {
    let shape = grid.shape();
    (0..i32::try_from(shape.height()).unwrap_or(0))
        .map(|y| {
            (shape.xmin(y)..shape.xmax(y))
                .map(|x| match grid.get(hex_core::hex::Pos::new(x, y)) {
                    Some(Tile::Floor) => '.',
                    Some(Tile::ShortGrass) => ',',
                    Some(Tile::TallGrass) => '"',
                    Some(Tile::Spikes) => '^',
                    Some(Tile::Wall) | None => '#',
                })
                .collect()
        })
        .collect()
}

/// A hexagon of floor walled in by its outer ring.
#[must_use]
pub fn open_room(width: u32, height: u32) -> HexGrid<Tile> {
    let shape = HexShape::new(width, height);
    HexGrid::from_fn(shape, |pos| {
        if shape.contains_inner(pos) {
            Tile::Floor
        } else {
            Tile::Wall
        }
    })
}

/// A small board without grass, for quick games.
#[must_use]
pub fn small_level_config() -> LevelConfig {
    LevelConfig::default().with_size(24, 15).with_grass(false)
}

/// A new game on the small board.
///
/// # Panics
///
/// Panics if generation fails for `seed`.
#[must_use]
pub fn small_game(seed: u64) -> Game {
    Game::new(GameConfig::default().with_level(small_level_config()), seed).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_core::hex::Pos;

    const RING: [&str; 5] = ["####", "#..#", "#..#", "#..#", "####"];

    #[test]
    fn test_ascii_grid_shape() {
        let grid = ascii_grid(&RING);
        assert_eq!(grid.shape().width(), 6);
        assert_eq!(grid.shape().height(), 5);
        assert_eq!(grid.get(grid.shape().center()), Some(&Tile::Floor));
        assert_eq!(grid.get(Pos::new(2, 0)), Some(&Tile::Wall));
    }

    #[test]
    fn test_ascii_round_trip() {
        let grid = ascii_grid(&RING);
        assert_eq!(grid_to_ascii(&grid), RING.to_vec());
    }

    #[test]
    fn test_open_room_matches_fixture() {
        assert_eq!(open_room(6, 5), ascii_grid(&RING));
    }

    #[test]
    #[should_panic(expected = "wrong length")]
    fn test_bad_row_length() {
        let _ = ascii_grid(&["####", "#..#", "#...#"]);
    }

    #[test]
    fn test_small_game_ready() {
        let game = small_game(1);
        assert!(game.is_awaiting_input());
    }
}
