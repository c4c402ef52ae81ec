//! What a renderer needs for one frame.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::behavior::BehaviorKind;
use crate::game::Game;
use crate::hex::Pos;
use crate::tile::Tile;

/// How strongly a cell should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Opacity {
    /// In view right now.
    Full,
    /// Seen before, not in view.
    Half,
    /// Never seen.
    Hidden,
}

/// One cell as the player knows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellView {
    /// Cell position.
    pub pos: Pos,
    /// Current tile if visible, remembered tile otherwise.
    pub tile: Option<Tile>,
    /// What stands or flies there, only for visible cells.
    pub occupant: Option<BehaviorKind>,
    /// Draw strength.
    pub opacity: Opacity,
}

impl Game {
    /// Every in-grid cell in row-major order, filtered through the
    /// player's view and memory.
    #[must_use]
    pub fn view(&self) -> Vec<CellView> {
        let Some(sight) = self.player_visibility() else {
            return self
                .level
                .shape()
                .positions()
                .map(|pos| CellView {
                    pos,
                    tile: None,
                    occupant: None,
                    opacity: Opacity::Hidden,
                })
                .collect();
        };

        // Lowest id wins when a spike shares a cell with a ground entity.
        let mut occupants: BTreeMap<Pos, BehaviorKind> = BTreeMap::new();
        for entity in self.entities.iter() {
            if let Some(pos) = entity.position {
                occupants.entry(pos).or_insert(entity.kind);
            }
        }

        self.level
            .shape()
            .positions()
            .map(|pos| {
                if sight.is_visible(pos) {
                    CellView {
                        pos,
                        tile: self.level.tile(pos),
                        occupant: occupants.get(&pos).copied(),
                        opacity: Opacity::Full,
                    }
                } else if let Some(tile) = sight.remembered(pos) {
                    CellView {
                        pos,
                        tile: Some(tile),
                        occupant: None,
                        opacity: Opacity::Half,
                    }
                } else {
                    CellView {
                        pos,
                        tile: None,
                        occupant: None,
                        opacity: Opacity::Hidden,
                    }
                }
            })
            .collect()
    }
}
