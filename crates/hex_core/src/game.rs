//! The game loop.
//!
//! [`Game`] owns all state and advances it one turn at a time. A turn pops
//! the earliest entity off the [`Schedule`], runs its behaviour and
//! requeues it according to the returned [`Delay`]. The loop parks as soon
//! as the player's turn comes up; the input entry points
//! ([`Game::move_player`], [`Game::rest`], [`Game::cast`]) spend the
//! player's turn and unpark it.
//!
//! Identical seeds and inputs always produce identical states, which
//! [`Game::state_hash`] makes cheap to check.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use crate::behavior::BehaviorKind;
use crate::config::GameConfig;
use crate::entity::{Entity, EntityId, EntityStore};
use crate::error::{GameError, Result};
use crate::fov::Visibility;
use crate::hex::{Direction, Pos};
use crate::level::Level;
use crate::map_generation::generate_level;
use crate::random::Alea;
use crate::schedule::{Delay, Schedule};
use crate::snapshot::{SaveStore, Snapshot, SNAPSHOT_VERSION};
use crate::tile::Tile;

/// Outcome of a single [`Game::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A turn ran; keep stepping.
    Continue,
    /// A turn ran that a front end may want to draw before continuing.
    Animate(EntityId),
    /// The player is up. Nothing more happens until an input entry point runs.
    AwaitInput,
}

/// Complete game state.
#[derive(Debug, Clone)]
pub struct Game {
    pub(crate) config: GameConfig,
    pub(crate) seed: u64,
    pub(crate) level: Level,
    pub(crate) entities: EntityStore,
    pub(crate) schedule: Schedule,
    pub(crate) rng: Alea,
    pub(crate) grass_regrowth: BTreeMap<Pos, u32>,
    pub(crate) player: EntityId,
    pub(crate) current: Option<EntityId>,
}

impl Game {
    /// Generate a level from `seed`, populate it and run until the player's
    /// first turn.
    pub fn new(config: GameConfig, seed: u64) -> Result<Self> {
        config.validate("game config")?;
        let shape = config.level.shape();
        let generated = generate_level(&config.level, seed, shape.center())?;

        let mut game = Self {
            seed,
            level: Level::new(generated.tiles),
            entities: EntityStore::new(),
            schedule: Schedule::new(),
            rng: generated.rng,
            grass_regrowth: BTreeMap::new(),
            player: 0,
            current: None,
            config,
        };

        game.player = game.spawn(
            Entity::new(BehaviorKind::Player)
                .with_position(generated.start)
                .with_visibility(),
            0,
        )?;
        game.spawn(
            Entity::new(BehaviorKind::Environment),
            game.config.environment_delay,
        )?;
        for pos in generated.snakes {
            game.spawn(
                Entity::new(BehaviorKind::Snake).with_position(pos),
                game.config.snake_delay,
            )?;
        }

        tracing::debug!(
            seed,
            attempts = generated.attempts,
            entities = game.entities.len(),
            "Game created"
        );

        game.run_until_input()?;
        Ok(game)
    }

    /// Rules in effect.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Seed the level was generated from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Current game clock.
    #[must_use]
    pub const fn time(&self) -> u64 {
        self.schedule.time()
    }

    /// The level.
    #[must_use]
    pub const fn level(&self) -> &Level {
        &self.level
    }

    /// All entities.
    #[must_use]
    pub const fn entities(&self) -> &EntityStore {
        &self.entities
    }

    /// Pending turns.
    #[must_use]
    pub const fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// The player's id.
    #[must_use]
    pub const fn player(&self) -> EntityId {
        self.player
    }

    /// Whether the loop is parked on the player.
    #[must_use]
    pub fn is_awaiting_input(&self) -> bool {
        self.current == Some(self.player)
    }

    /// The player's position.
    pub fn player_position(&self) -> Result<Pos> {
        self.position_of(self.player)
    }

    /// The player's field of view.
    #[must_use]
    pub fn player_visibility(&self) -> Option<&Visibility> {
        self.entities
            .get(self.player)
            .and_then(|e| e.visibility.as_ref())
    }

    /// Trampled grass and the environment ticks left until it regrows.
    #[must_use]
    pub const fn grass_regrowth(&self) -> &BTreeMap<Pos, u32> {
        &self.grass_regrowth
    }

    pub(crate) fn position_of(&self, id: EntityId) -> Result<Pos> {
        self.entities
            .get(id)
            .ok_or(GameError::EntityNotFound(id))?
            .position
            .ok_or_else(|| GameError::InvalidState(format!("entity {id} has no position")))
    }

    pub(crate) fn player_sees(&self, pos: Pos) -> bool {
        self.player_visibility().is_some_and(|v| v.is_visible(pos))
    }

    /// Add an entity and queue its first turn `delay` units from now.
    pub fn spawn(&mut self, entity: Entity, delay: u32) -> Result<EntityId> {
        let kind = entity.kind;
        let position = entity.position;
        let id = self.entities.insert(entity);
        if let (true, Some(pos)) = (kind.occupies_cell(), position) {
            if let Err(e) = self.level.place(id, pos) {
                self.entities.remove(id);
                return Err(e);
            }
        }
        self.schedule.push(id, delay);
        tracing::trace!(id, ?kind, delay, "Entity spawned");
        Ok(id)
    }

    /// Remove an entity from the map, the schedule and storage.
    pub fn despawn(&mut self, id: EntityId) -> Result<()> {
        let entity = self
            .entities
            .remove(id)
            .ok_or(GameError::EntityNotFound(id))?;
        if let (true, Some(pos)) = (entity.kind.occupies_cell(), entity.position) {
            self.level.vacate(pos);
        }
        self.schedule.unschedule(id);
        if self.current == Some(id) {
            self.current = None;
        }
        tracing::trace!(id, kind = ?entity.kind, "Entity despawned");
        Ok(())
    }

    /// Recompute what `id` sees from where it stands.
    pub(crate) fn look(&mut self, id: EntityId) -> Result<()> {
        let pos = self.position_of(id)?;
        let entity = self
            .entities
            .get_mut(id)
            .ok_or(GameError::EntityNotFound(id))?;
        entity
            .visibility
            .get_or_insert_with(Visibility::new)
            .look(pos, self.level.tiles());
        Ok(())
    }

    /// Step a ground entity one cell. Returns whether it moved.
    ///
    /// Walking into tall grass tramples it and starts its regrowth timer.
    pub(crate) fn walk(&mut self, id: EntityId, direction: Direction) -> Result<bool> {
        let from = self.position_of(id)?;
        let to = from + direction;
        if !self.level.can_enter(to) {
            return Ok(false);
        }
        let trampled = self.level.tile(to) == Some(Tile::TallGrass);

        self.level.relocate(from, to)?;
        if let Some(entity) = self.entities.get_mut(id) {
            entity.position = Some(to);
        }

        if trampled {
            self.level.set_tile(to, Tile::ShortGrass)?;
            let (min, max) = (self.config.regrow_min, self.config.regrow_max);
            let delay = self.rng.randint(i64::from(min), i64::from(max));
            self.grass_regrowth
                .insert(to, u32::try_from(delay).unwrap_or(max));
        }
        Ok(true)
    }

    fn take_input(&self) -> Result<EntityId> {
        if self.is_awaiting_input() {
            Ok(self.player)
        } else {
            Err(GameError::NotAwaitingInput)
        }
    }

    fn end_input(&mut self, cost: u32) {
        self.schedule.push(self.player, cost);
        self.current = None;
    }

    /// Spend the player's turn walking one cell. Returns whether they moved;
    /// bumping into something still costs the turn.
    pub fn move_player(&mut self, direction: Direction) -> Result<bool> {
        let player = self.take_input()?;
        let moved = self.walk(player, direction)?;
        self.look(player)?;
        self.end_input(self.config.move_cost);
        tracing::debug!(time = self.time(), ?direction, moved, "Player moved");
        Ok(moved)
    }

    /// Spend the player's turn doing nothing.
    pub fn rest(&mut self) -> Result<()> {
        self.take_input()?;
        self.end_input(self.config.rest_cost);
        tracing::debug!(time = self.time(), "Player rested");
        Ok(())
    }

    /// Spend the player's turn launching a spike in `direction`.
    ///
    /// The spike starts one cell away and acts at the current time.
    pub fn cast(&mut self, direction: Direction) -> Result<EntityId> {
        let player = self.take_input()?;
        let origin = self.position_of(player)?;
        let spike = self.spawn(
            Entity::new(BehaviorKind::Spike)
                .with_position(origin + direction)
                .with_velocity(direction),
            0,
        )?;
        self.end_input(self.config.cast_cost);
        tracing::debug!(time = self.time(), ?direction, spike, "Player cast spike");
        Ok(spike)
    }

    /// Run one turn.
    pub fn step(&mut self) -> Result<Step> {
        if self.current.is_some() {
            return Ok(Step::AwaitInput);
        }

        let (time, id) = self.schedule.pop_next()?;
        tracing::trace!(time, id, "Turn popped");
        let kind = self
            .entities
            .get(id)
            .ok_or(GameError::EntityNotFound(id))?
            .kind;
        let delay = (kind.behavior())(self, id)?;

        match delay {
            Delay::After(units) => {
                self.schedule.push(id, units);
                if kind.is_animated() {
                    Ok(Step::Animate(id))
                } else {
                    Ok(Step::Continue)
                }
            }
            Delay::AwaitInput => {
                self.current = Some(id);
                Ok(Step::AwaitInput)
            }
            Delay::Never => {
                self.despawn(id)?;
                Ok(Step::Continue)
            }
        }
    }

    /// Step until the player is up. Returns the number of turns run.
    ///
    /// Calling this while already awaiting input does nothing.
    pub fn run_until_input(&mut self) -> Result<u32> {
        if self.current.is_none() && !self.schedule.contains(self.player) {
            return Err(GameError::InvalidState(
                "player is neither scheduled nor awaiting input".to_string(),
            ));
        }
        let mut turns = 0;
        while self.step()? != Step::AwaitInput {
            turns += 1;
        }
        Ok(turns)
    }

    /// Hash of everything that affects future play.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.seed.hash(&mut hasher);
        self.schedule.time().hash(&mut hasher);
        self.schedule.entries().hash(&mut hasher);
        self.current.hash(&mut hasher);

        self.entities.len().hash(&mut hasher);
        for entity in self.entities.iter() {
            entity.id.hash(&mut hasher);
            entity.kind.hash(&mut hasher);
            entity.position.hash(&mut hasher);
            entity.velocity.hash(&mut hasher);
            if let Some(ref view) = entity.visibility {
                view.visible.hash(&mut hasher);
                view.memory.hash(&mut hasher);
            }
        }

        for (_, tile) in self.level.tiles().iter() {
            tile.hash(&mut hasher);
        }
        self.level.occupants().hash(&mut hasher);
        self.grass_regrowth.hash(&mut hasher);
        self.rng.fingerprint().hash(&mut hasher);

        hasher.finish()
    }

    /// Capture the full state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            seed: self.seed,
            config: self.config.clone(),
            schedule: self.schedule.clone(),
            entities: self.entities.clone(),
            level: self.level.clone(),
            rng: self.rng.clone(),
            grass_regrowth: self.grass_regrowth.clone(),
            player: self.player,
            current: self.current,
        }
    }

    /// Rebuild a game from a snapshot.
    ///
    /// A version mismatch is logged and the data is loaded as is.
    pub fn restore(snapshot: Snapshot) -> Result<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            tracing::warn!(
                expected = SNAPSHOT_VERSION,
                found = snapshot.version,
                "Snapshot version mismatch, loading anyway"
            );
        }
        if !snapshot.entities.contains(snapshot.player) {
            return Err(GameError::EntityNotFound(snapshot.player));
        }
        Ok(Self {
            config: snapshot.config,
            seed: snapshot.seed,
            level: snapshot.level,
            entities: snapshot.entities,
            schedule: snapshot.schedule,
            rng: snapshot.rng,
            grass_regrowth: snapshot.grass_regrowth,
            player: snapshot.player,
            current: snapshot.current,
        })
    }

    /// Write the current state to `store`.
    pub fn save(&self, store: &mut dyn SaveStore) -> Result<()> {
        store.save(&self.snapshot())
    }

    /// Load a game from `store`, if it holds one.
    pub fn load(store: &dyn SaveStore) -> Result<Option<Self>> {
        store.load()?.map(Self::restore).transpose()
    }
}
