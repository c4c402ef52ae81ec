//! Terrain plus the occupancy map.
//!
//! At most one ground entity stands on a cell. Projectiles fly over the
//! map and are not recorded here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::error::{GameError, Result};
use crate::grid::HexGrid;
use crate::hex::{HexShape, Pos};
use crate::tile::Tile;

/// A playable level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    tiles: HexGrid<Tile>,
    occupants: BTreeMap<Pos, EntityId>,
}

impl Level {
    /// Wrap generated terrain with no occupants.
    #[must_use]
    pub fn new(tiles: HexGrid<Tile>) -> Self {
        Self {
            tiles,
            occupants: BTreeMap::new(),
        }
    }

    /// The level's shape.
    #[must_use]
    pub const fn shape(&self) -> HexShape {
        self.tiles.shape()
    }

    /// Terrain grid.
    #[must_use]
    pub const fn tiles(&self) -> &HexGrid<Tile> {
        &self.tiles
    }

    /// Tile at `pos`, or `None` off the map.
    #[must_use]
    pub fn tile(&self, pos: Pos) -> Option<Tile> {
        self.tiles.get(pos).copied()
    }

    /// Overwrite the tile at `pos`.
    pub fn set_tile(&mut self, pos: Pos, tile: Tile) -> Result<()> {
        if self.tiles.set(pos, tile) {
            Ok(())
        } else {
            Err(GameError::OutOfBounds { x: pos.x, y: pos.y })
        }
    }

    /// Ground entity standing on `pos`.
    #[must_use]
    pub fn occupant(&self, pos: Pos) -> Option<EntityId> {
        self.occupants.get(&pos).copied()
    }

    /// All occupied cells in row-major order.
    #[must_use]
    pub const fn occupants(&self) -> &BTreeMap<Pos, EntityId> {
        &self.occupants
    }

    /// Whether a ground entity could step onto `pos`.
    #[must_use]
    pub fn can_enter(&self, pos: Pos) -> bool {
        self.tile(pos).is_some_and(Tile::can_walk) && !self.occupants.contains_key(&pos)
    }

    /// Put `id` on `pos`.
    pub fn place(&mut self, id: EntityId, pos: Pos) -> Result<()> {
        if !self.tiles.contains(pos) {
            return Err(GameError::OutOfBounds { x: pos.x, y: pos.y });
        }
        if let Some(other) = self.occupant(pos) {
            return Err(GameError::InvalidState(format!(
                "cell ({}, {}) already holds entity {other}",
                pos.x, pos.y
            )));
        }
        self.occupants.insert(pos, id);
        Ok(())
    }

    /// Move the occupant of `from` to `to`.
    pub fn relocate(&mut self, from: Pos, to: Pos) -> Result<()> {
        let id = self
            .occupants
            .remove(&from)
            .ok_or_else(|| GameError::InvalidState(format!("no occupant at ({}, {})", from.x, from.y)))?;
        if let Err(e) = self.place(id, to) {
            self.occupants.insert(from, id);
            return Err(e);
        }
        Ok(())
    }

    /// Take whatever stands on `pos` off the map.
    pub fn vacate(&mut self, pos: Pos) -> Option<EntityId> {
        self.occupants.remove(&pos)
    }
}
