//! What each kind of entity does on its turn.
//!
//! Behaviours are plain functions from game state and the acting entity to
//! a [`Delay`], looked up by [`BehaviorKind`].

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::error::{GameError, Result};
use crate::game::Game;
use crate::hex::Direction;
use crate::schedule::Delay;
use crate::tile::Tile;

/// Signature shared by all behaviours.
pub type BehaviorFn = fn(&mut Game, EntityId) -> Result<Delay>;

/// The behaviour an entity runs when it acts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorKind {
    /// Waits for input.
    Player,
    /// Chases the player when it can see them.
    Snake,
    /// Regrows trampled grass.
    Environment,
    /// Flies in a straight line leaving spikes behind.
    Spike,
}

impl BehaviorKind {
    /// The function run on this kind's turn.
    #[must_use]
    pub const fn behavior(self) -> BehaviorFn {
        match self {
            Self::Player => player_turn,
            Self::Snake => snake_turn,
            Self::Environment => environment_turn,
            Self::Spike => spike_turn,
        }
    }

    /// Whether entities of this kind block a cell for others.
    #[must_use]
    pub const fn occupies_cell(self) -> bool {
        matches!(self, Self::Player | Self::Snake)
    }

    /// Whether a turn of this kind is worth showing frame by frame.
    #[must_use]
    pub const fn is_animated(self) -> bool {
        matches!(self, Self::Spike)
    }
}

fn player_turn(game: &mut Game, id: EntityId) -> Result<Delay> {
    let has_view = game
        .entities
        .get(id)
        .and_then(|e| e.visibility.as_ref())
        .is_some_and(|v| !v.is_empty());
    if !has_view {
        game.look(id)?;
    }
    Ok(Delay::AwaitInput)
}

fn snake_turn(game: &mut Game, id: EntityId) -> Result<Delay> {
    let pos = game.position_of(id)?;
    let target = game.position_of(game.player)?;

    if game.player_sees(pos) {
        let offset = if game.rng.coin() { 3 } else { 0 };
        let distance = pos.distance(target);
        let step = (0..Direction::ALL.len())
            .map(|i| Direction::from_index(i + offset))
            .find(|&dir| {
                let next = pos + dir;
                next.distance(target) < distance && game.level.can_enter(next)
            });
        if let Some(dir) = step {
            game.walk(id, dir)?;
            tracing::trace!(snake = id, ?dir, "Snake closes in");
        }
    }

    Ok(Delay::After(game.config.snake_delay))
}

fn environment_turn(game: &mut Game, _id: EntityId) -> Result<Delay> {
    let level = &game.level;
    let mut regrown = Vec::new();
    game.grass_regrowth.retain(|&pos, remaining| {
        if level.tile(pos) != Some(Tile::ShortGrass) {
            return false;
        }
        *remaining = remaining.saturating_sub(1);
        if *remaining == 0 {
            regrown.push(pos);
            false
        } else {
            true
        }
    });

    if !regrown.is_empty() {
        for &pos in &regrown {
            game.level.set_tile(pos, Tile::TallGrass)?;
        }
        tracing::trace!(cells = regrown.len(), "Grass regrown");
        game.look(game.player)?;
    }

    Ok(Delay::After(game.config.environment_delay))
}

fn spike_turn(game: &mut Game, id: EntityId) -> Result<Delay> {
    let entity = game.entities.get(id).ok_or(GameError::EntityNotFound(id))?;
    let (pos, velocity) = match (entity.position, entity.velocity) {
        (Some(pos), Some(velocity)) => (pos, velocity),
        _ => {
            return Err(GameError::InvalidState(format!(
                "spike {id} has no position or velocity"
            )))
        }
    };

    if !game.level.can_enter(pos) {
        tracing::trace!(spike = id, x = pos.x, y = pos.y, "Spike stopped");
        return Ok(Delay::Never);
    }

    game.level.set_tile(pos, Tile::Spikes)?;
    game.grass_regrowth.remove(&pos);
    if let Some(spike) = game.entities.get_mut(id) {
        spike.position = Some(pos + velocity);
    }
    game.look(game.player)?;

    Ok(Delay::After(game.config.spike_delay))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_flags() {
        assert!(BehaviorKind::Player.occupies_cell());
        assert!(BehaviorKind::Snake.occupies_cell());
        assert!(!BehaviorKind::Spike.occupies_cell());
        assert!(!BehaviorKind::Environment.occupies_cell());
        assert!(BehaviorKind::Spike.is_animated());
        assert!(!BehaviorKind::Snake.is_animated());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&BehaviorKind::Snake).unwrap(), "\"snake\"");
    }
}
