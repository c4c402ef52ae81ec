//! ASCII level visualizer.
//!
//! Draws the hexagon with every row shifted half a cell, which is how the
//! board looks on screen: cell `(x, y)` lands in text column `2x + y`.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use hex_core::behavior::BehaviorKind;
use hex_core::hex::{HexShape, Pos};
use hex_core::map_generation::GeneratedLevel;
use hex_core::tile::Tile;
use hex_core::view::{CellView, Opacity};

/// ASCII visualization configuration.
#[derive(Debug, Clone)]
pub struct AsciiConfig {
    /// Use colored output (ANSI).
    pub use_color: bool,
    /// Print a symbol legend under the map.
    pub show_legend: bool,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            use_color: true,
            show_legend: true,
        }
    }
}

/// ANSI color codes.
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";

    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const GREEN: &str = "\x1b[32m";
    pub const WHITE: &str = "\x1b[37m";
    pub const GRAY: &str = "\x1b[90m";
}

/// Character for a terrain tile.
#[must_use]
pub const fn tile_char(tile: Tile) -> char {
    match tile {
        Tile::Wall => '#',
        Tile::Floor => '.',
        Tile::ShortGrass => ',',
        Tile::TallGrass => '"',
        Tile::Spikes => '^',
    }
}

/// Character for an entity.
#[must_use]
pub const fn kind_char(kind: BehaviorKind) -> char {
    match kind {
        BehaviorKind::Player => '@',
        BehaviorKind::Snake => 's',
        BehaviorKind::Spike => '*',
        BehaviorKind::Environment => ' ',
    }
}

const fn tile_color(tile: Tile) -> &'static str {
    match tile {
        Tile::Wall => colors::GRAY,
        Tile::Floor => colors::WHITE,
        Tile::ShortGrass | Tile::TallGrass => colors::GREEN,
        Tile::Spikes => colors::RED,
    }
}

const fn kind_color(kind: BehaviorKind) -> &'static str {
    match kind {
        BehaviorKind::Player => colors::BOLD,
        BehaviorKind::Snake => colors::YELLOW,
        BehaviorKind::Spike | BehaviorKind::Environment => colors::RED,
    }
}

/// Lay out `shape` as staggered text, asking `glyph` for each cell.
fn render_cells(
    shape: HexShape,
    use_color: bool,
    mut glyph: impl FnMut(Pos) -> Option<(char, &'static str)>,
) -> String {
    let height = i32::try_from(shape.height()).unwrap_or(0);
    let indent = (0..height)
        .map(|y| 2 * shape.xmin(y) + y)
        .min()
        .unwrap_or(0);

    let mut out = String::new();
    for y in 0..height {
        let mut line = String::new();
        let mut column = indent;
        for x in shape.xmin(y)..shape.xmax(y) {
            let target = 2 * x + y;
            while column < target {
                line.push(' ');
                column += 1;
            }
            match glyph(Pos::new(x, y)) {
                Some((c, color)) if use_color => {
                    let _ = write!(line, "{color}{c}{}", colors::RESET);
                }
                Some((c, _)) => line.push(c),
                None => line.push(' '),
            }
            column += 1;
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn legend(out: &mut String) {
    out.push_str("\n# wall  . floor  , short grass  \" tall grass  ^ spikes\n");
    out.push_str("@ player  s snake  * spike\n");
}

/// Render a freshly generated level with its start and snake positions.
#[must_use]
pub fn render_level(level: &GeneratedLevel, config: &AsciiConfig) -> String {
    let mut out = render_cells(level.tiles.shape(), config.use_color, |pos| {
        if pos == level.start {
            return Some((kind_char(BehaviorKind::Player), kind_color(BehaviorKind::Player)));
        }
        if level.snakes.contains(&pos) {
            return Some((kind_char(BehaviorKind::Snake), kind_color(BehaviorKind::Snake)));
        }
        level
            .tiles
            .get(pos)
            .map(|&tile| (tile_char(tile), tile_color(tile)))
    });

    let _ = writeln!(
        out,
        "\nseed {}  attempts {}  cave {}  floor {}",
        level.seed, level.attempts, level.cave_size, level.floor_count
    );
    if config.show_legend {
        legend(&mut out);
    }
    out
}

/// Render what the player currently knows.
#[must_use]
pub fn render_view(cells: &[CellView], shape: HexShape, config: &AsciiConfig) -> String {
    let by_pos: BTreeMap<Pos, &CellView> = cells.iter().map(|c| (c.pos, c)).collect();
    let mut out = render_cells(shape, config.use_color, |pos| {
        let cell = by_pos.get(&pos)?;
        match cell.opacity {
            Opacity::Hidden => None,
            Opacity::Half => cell.tile.map(|t| (tile_char(t), colors::DIM)),
            Opacity::Full => match cell.occupant {
                Some(kind) => Some((kind_char(kind), kind_color(kind))),
                None => cell.tile.map(|t| (tile_char(t), tile_color(t))),
            },
        }
    });
    if config.show_legend {
        legend(&mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_core::config::LevelConfig;
    use hex_core::game::Game;
    use hex_core::map_generation::generate_level;
    use hex_test_utils::fixtures::small_game;

    fn plain() -> AsciiConfig {
        AsciiConfig {
            use_color: false,
            show_legend: false,
        }
    }

    #[test]
    fn test_render_level_rows() {
        let config = LevelConfig::default().with_size(24, 15).with_grass(false);
        let level = generate_level(&config, 5, config.shape().center()).unwrap();
        let text = render_level(&level, &plain());
        let lines: Vec<&str> = text.lines().collect();

        // 15 map rows, a blank line and the stats line.
        assert_eq!(lines.len(), 17);
        let map: String = lines.iter().take(15).copied().collect();
        assert_eq!(map.chars().filter(|&c| c == '@').count(), 1);
        assert_eq!(map.chars().filter(|&c| c == 's').count(), level.snakes.len());
        assert!(lines[16].starts_with("seed 5"));
    }

    #[test]
    fn test_rows_are_staggered() {
        let shape = HexShape::new(6, 5);
        let text = render_cells(shape, false, |_| Some(('x', "")));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "x x x x");
        assert_eq!(lines[1], " x x x x");
        assert_eq!(lines[2], "x x x x");
    }

    #[test]
    fn test_color_codes_optional() {
        let game: Game = small_game(3);
        let shape = game.level().shape();
        let colored = render_view(&game.view(), shape, &AsciiConfig::default());
        let plain_text = render_view(&game.view(), shape, &plain());
        assert!(colored.contains("\x1b["));
        assert!(!plain_text.contains("\x1b["));
        assert!(plain_text.contains('@'));
    }
}
