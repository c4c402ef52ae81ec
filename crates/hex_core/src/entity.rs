//! Entities and their components.
//!
//! An entity is an id plus whichever optional components it carries.
//! Storage is keyed by id in a `BTreeMap`, so iteration is already in
//! deterministic order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::behavior::BehaviorKind;
use crate::fov::Visibility;
use crate::hex::{Direction, Pos};

/// Unique identifier for entities.
pub type EntityId = u64;

/// An entity and its components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier.
    pub id: EntityId,
    /// Which behaviour runs on its turn.
    pub kind: BehaviorKind,
    /// Cell the entity stands on, if it is on the map.
    pub position: Option<Pos>,
    /// Direction of travel for projectiles.
    pub velocity: Option<Direction>,
    /// Field of view and tile memory.
    pub visibility: Option<Visibility>,
}

impl Entity {
    /// Create an entity with no components. The id is assigned on insert.
    #[must_use]
    pub const fn new(kind: BehaviorKind) -> Self {
        Self {
            id: 0,
            kind,
            position: None,
            velocity: None,
            visibility: None,
        }
    }

    /// Place the entity at `pos`.
    #[must_use]
    pub const fn with_position(mut self, pos: Pos) -> Self {
        self.position = Some(pos);
        self
    }

    /// Give the entity a direction of travel.
    #[must_use]
    pub const fn with_velocity(mut self, direction: Direction) -> Self {
        self.velocity = Some(direction);
        self
    }

    /// Give the entity an empty field of view.
    #[must_use]
    pub fn with_visibility(mut self) -> Self {
        self.visibility = Some(Visibility::new());
        self
    }
}

/// Storage for all entities in a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityStore {
    entities: BTreeMap<EntityId, Entity>,
    next_id: EntityId,
}

impl EntityStore {
    /// Create empty storage. Ids start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Insert an entity under a fresh id and return the id.
    pub fn insert(&mut self, mut entity: Entity) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        entity.id = id;
        self.entities.insert(id, entity);
        id
    }

    /// Remove an entity by id.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Get an entity by id.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Get a mutable entity by id.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Whether `id` exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether there are no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The id the next insert will receive.
    #[must_use]
    pub const fn next_id(&self) -> EntityId {
        self.next_id
    }

    /// Ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Entities in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Entities of `kind` in ascending id order.
    pub fn of_kind(&self, kind: BehaviorKind) -> impl Iterator<Item = &Entity> {
        self.entities.values().filter(move |e| e.kind == kind)
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic() {
        let mut store = EntityStore::new();
        let a = store.insert(Entity::new(BehaviorKind::Player));
        let b = store.insert(Entity::new(BehaviorKind::Snake));
        store.remove(a);
        let c = store.insert(Entity::new(BehaviorKind::Snake));
        assert_eq!((a, b, c), (1, 2, 3));
        assert_eq!(store.next_id(), 4);
        assert!(!store.contains(a));
    }

    #[test]
    fn test_components() {
        let mut store = EntityStore::new();
        let id = store.insert(
            Entity::new(BehaviorKind::Spike)
                .with_position(Pos::new(3, 4))
                .with_velocity(Direction::East),
        );
        let spike = store.get(id).unwrap();
        assert_eq!(spike.id, id);
        assert_eq!(spike.position, Some(Pos::new(3, 4)));
        assert_eq!(spike.velocity, Some(Direction::East));
        assert!(spike.visibility.is_none());

        store.get_mut(id).unwrap().position = None;
        assert_eq!(store.get(id).unwrap().position, None);
    }

    #[test]
    fn test_of_kind_ordered() {
        let mut store = EntityStore::new();
        store.insert(Entity::new(BehaviorKind::Snake));
        store.insert(Entity::new(BehaviorKind::Player));
        store.insert(Entity::new(BehaviorKind::Snake));
        let snakes: Vec<_> = store.of_kind(BehaviorKind::Snake).map(|e| e.id).collect();
        assert_eq!(snakes, vec![1, 3]);
        assert_eq!(store.ids().collect::<Vec<_>>(), vec![1, 2, 3]);
    }
}
