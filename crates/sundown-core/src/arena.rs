//! Arena module for the simulation.
//!
//! The Arena is the container for every entity except the player. It provides:
//! - Entity storage with deterministic iteration order (`BTreeMap`)
//! - Entity lifecycle management (spawn/despawn), immediate or deferred
//! - Projectile hit detection against mobs
//!
//! # Deferred Lifecycle
//!
//! Entities spawned or despawned while a tick is being resolved must not
//! change the set being iterated. [`Arena::queue_spawn`] and
//! [`Arena::queue_despawn`] stage those changes; [`Arena::flush`] applies
//! them at the end of the tick. Ids are assigned when the spawn is queued so
//! follow-up events can name the new entity.
//!
//! # Example
//!
//! ```
//! use sundown_core::arena::Arena;
//! use sundown_core::config::PowerupConfig;
//! use sundown_core::entity::{EntityInner, Powerup, PowerupKind};
//! use glam::IVec2;
//!
//! let mut arena = Arena::new();
//! let powerup = Powerup::new(PowerupKind::Heal, IVec2::ZERO, 0, &PowerupConfig::default(), 100);
//!
//! let id = arena.queue_spawn(EntityInner::Powerup(powerup));
//! assert!(arena.get(id).is_none());
//!
//! arena.flush();
//! assert!(arena.get(id).is_some());
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::entity::{Entity, EntityId, EntityInner, Faction};

// =============================================================================
// Arena
// =============================================================================

/// A projectile overlapping a mob it can damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectileHit {
    /// The projectile.
    pub projectile: EntityId,
    /// The mob it hit.
    pub mob: EntityId,
    /// Damage carried by the projectile.
    pub damage: i32,
}

/// Container for simulation entities.
///
/// # Determinism
///
/// Entity ids are assigned monotonically and never reused, and the
/// `BTreeMap` ordering guarantees that iterating over entities always
/// produces the same sequence: spawn order.
///
/// # Example
///
/// ```
/// use sundown_core::arena::Arena;
/// use sundown_core::config::ProjectileConfig;
/// use sundown_core::entity::{EntityInner, Faction, Projectile};
/// use glam::IVec2;
///
/// let mut arena = Arena::new();
/// let config = ProjectileConfig::default();
/// let shot = || Projectile::new(None, Faction::Player, IVec2::ZERO, 1, &config, 0, 100);
///
/// let first = arena.spawn(EntityInner::Projectile(shot()));
/// let second = arena.spawn(EntityInner::Projectile(shot()));
///
/// let ids: Vec<_> = arena.entity_ids_sorted().collect();
/// assert_eq!(ids, vec![first, second]);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Arena {
    /// Monotonically increasing entity ID counter.
    next_id: u64,
    /// Entity storage with deterministic iteration order.
    entities: BTreeMap<EntityId, Entity>,
    /// Entities that join at the next flush.
    pending_spawns: Vec<Entity>,
    /// Entities that leave at the next flush.
    pending_despawns: Vec<EntityId>,
}

impl Arena {
    /// Creates a new empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self, inner: EntityInner) -> Entity {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        Entity::new(id, inner)
    }

    /// Spawns an entity immediately.
    ///
    /// # Returns
    ///
    /// The unique ID assigned to the new entity.
    pub fn spawn(&mut self, inner: EntityInner) -> EntityId {
        let entity = self.allocate(inner);
        let id = entity.id();
        trace!(entity = %id, tag = ?entity.tag(), "entity_spawned");
        self.entities.insert(id, entity);
        id
    }

    /// Stages an entity to join at the next [`flush`](Self::flush).
    ///
    /// The id is reserved now.
    pub fn queue_spawn(&mut self, inner: EntityInner) -> EntityId {
        let entity = self.allocate(inner);
        let id = entity.id();
        self.pending_spawns.push(entity);
        id
    }

    /// Stages an entity to leave at the next [`flush`](Self::flush).
    /// Duplicates and unknown ids are ignored.
    pub fn queue_despawn(&mut self, id: EntityId) {
        if !self.pending_despawns.contains(&id) {
            self.pending_despawns.push(id);
        }
    }

    /// Applies staged despawns, then staged spawns.
    ///
    /// # Returns
    ///
    /// The removed entities, in id order.
    pub fn flush(&mut self) -> Vec<Entity> {
        let mut despawns = std::mem::take(&mut self.pending_despawns);
        despawns.sort_unstable();
        let removed: Vec<Entity> = despawns
            .into_iter()
            .filter_map(|id| self.despawn(id))
            .collect();
        for entity in self.pending_spawns.drain(..) {
            trace!(entity = %entity.id(), tag = ?entity.tag(), "entity_spawned");
            self.entities.insert(entity.id(), entity);
        }
        removed
    }

    /// Despawns an entity immediately.
    ///
    /// # Returns
    ///
    /// The removed entity, if it existed.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        let removed = self.entities.remove(&id);
        if removed.is_some() {
            trace!(entity = %id, "entity_despawned");
        }
        removed
    }

    /// Returns a reference to an entity by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Returns a mutable reference to an entity by ID.
    #[must_use]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Returns an iterator over entity IDs in deterministic (sorted) order.
    ///
    /// This is the primary way to iterate over entities in simulation code.
    pub fn entity_ids_sorted(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Returns an iterator over entities in deterministic (sorted by ID) order.
    pub fn entities_sorted(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    /// Returns an iterator over mutable entities in deterministic order.
    pub fn entities_sorted_mut(&mut self) -> impl Iterator<Item = &mut Entity> + '_ {
        self.entities.values_mut()
    }

    /// Returns the number of entities in the arena, not counting staged
    /// spawns.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the arena has no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of staged spawns.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending_spawns.len()
    }

    /// Finds live player projectiles overlapping a live, killable mob.
    ///
    /// Each projectile hits at most one mob: the lowest id among those it
    /// overlaps. Results are in projectile id order.
    #[must_use]
    pub fn projectile_hits(&self) -> Vec<ProjectileHit> {
        let mut hits = Vec::new();
        for entity in self.entities.values() {
            let Some(projectile) = entity.as_projectile() else {
                continue;
            };
            if !projectile.is_alive() || projectile.faction() != Faction::Player {
                continue;
            }
            let bounds = projectile.body().bounds();
            let target = self.entities.values().find(|candidate| {
                candidate.as_mob().is_some_and(|mob| {
                    mob.is_alive() && mob.is_killable() && mob.body().collider().intersects(&bounds)
                })
            });
            if let Some(mob) = target {
                hits.push(ProjectileHit {
                    projectile: entity.id(),
                    mob: mob.id(),
                    damage: projectile.damage(),
                });
            }
        }
        hits
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MobKind, MobProfile, PowerupConfig, ProjectileConfig};
    use crate::entity::{Mob, MobRolls, Powerup, PowerupKind, Projectile};
    use glam::IVec2;

    fn powerup() -> EntityInner {
        EntityInner::Powerup(Powerup::new(
            PowerupKind::Heal,
            IVec2::ZERO,
            0,
            &PowerupConfig::default(),
            100,
        ))
    }

    fn projectile(faction: Faction, center: IVec2) -> EntityInner {
        EntityInner::Projectile(Projectile::new(
            None,
            faction,
            center,
            1,
            &ProjectileConfig::default(),
            0,
            100,
        ))
    }

    fn mob(kind: MobKind, position: IVec2) -> EntityInner {
        let rolls = MobRolls {
            health: 10,
            speed: 1,
            chases: false,
            shoots: false,
            shoot_interval: 1_000,
            facing: 1,
        };
        EntityInner::Mob(Mob::spawn(kind, &MobProfile::default_for(kind), position, rolls, 0, 100))
    }

    mod lifecycle_tests {
        use super::*;

        #[test]
        fn new_creates_empty_arena() {
            let arena = Arena::new();
            assert!(arena.is_empty());
            assert_eq!(arena.entity_count(), 0);
        }

        #[test]
        fn spawn_assigns_unique_ids() {
            let mut arena = Arena::new();
            let id1 = arena.spawn(powerup());
            let id2 = arena.spawn(powerup());
            let id3 = arena.queue_spawn(powerup());

            assert_ne!(id1, id2);
            assert_ne!(id2, id3);
            assert_eq!(id1.as_u64() + 1, id2.as_u64());
            assert_eq!(id2.as_u64() + 1, id3.as_u64());
        }

        #[test]
        fn queued_spawn_joins_on_flush() {
            let mut arena = Arena::new();
            let id = arena.queue_spawn(powerup());

            assert!(arena.get(id).is_none());
            assert_eq!(arena.pending_len(), 1);

            let removed = arena.flush();
            assert!(removed.is_empty());
            assert!(arena.get(id).is_some());
            assert_eq!(arena.pending_len(), 0);
        }

        #[test]
        fn queued_despawn_leaves_on_flush() {
            let mut arena = Arena::new();
            let id = arena.spawn(powerup());
            arena.queue_despawn(id);
            arena.queue_despawn(id);

            assert!(arena.get(id).is_some());
            let removed = arena.flush();
            assert_eq!(removed.len(), 1);
            assert_eq!(removed[0].id(), id);
            assert!(arena.is_empty());
        }

        #[test]
        fn despawn_nonexistent_returns_none() {
            let mut arena = Arena::new();
            assert!(arena.despawn(EntityId::new(999)).is_none());
            arena.queue_despawn(EntityId::new(999));
            assert!(arena.flush().is_empty());
        }

        #[test]
        fn ids_are_never_reused() {
            let mut arena = Arena::new();
            let id1 = arena.spawn(powerup());
            arena.despawn(id1);
            let id2 = arena.spawn(powerup());
            assert!(id2 > id1);
        }
    }

    mod iteration_tests {
        use super::*;

        #[test]
        fn iteration_follows_spawn_order() {
            let mut arena = Arena::new();
            let ids: Vec<_> = (0..5).map(|_| arena.spawn(powerup())).collect();
            arena.despawn(ids[2]);

            let sorted: Vec<_> = arena.entity_ids_sorted().collect();
            assert_eq!(sorted, vec![ids[0], ids[1], ids[3], ids[4]]);

            let from_entities: Vec<_> = arena.entities_sorted().map(Entity::id).collect();
            assert_eq!(from_entities, sorted);
        }
    }

    mod hit_tests {
        use super::*;

        #[test]
        fn player_shot_hits_overlapping_mob() {
            let mut arena = Arena::new();
            let target = arena.spawn(mob(MobKind::Coyote, IVec2::new(100, 100)));
            let collider = arena.get(target).unwrap().as_mob().unwrap().body().collider();
            let shot = arena.spawn(projectile(Faction::Player, collider.center()));

            let hits = arena.projectile_hits();
            assert_eq!(
                hits,
                vec![ProjectileHit {
                    projectile: shot,
                    mob: target,
                    damage: ProjectileConfig::default().damage,
                }]
            );
        }

        #[test]
        fn mob_shots_and_decorations_are_not_hit() {
            let mut arena = Arena::new();
            let coffin = arena.spawn(mob(MobKind::Coffin, IVec2::new(100, 100)));
            let collider = arena.get(coffin).unwrap().as_mob().unwrap().body().collider();
            arena.spawn(projectile(Faction::Player, collider.center()));
            arena.spawn(projectile(Faction::Mob, collider.center()));

            assert!(arena.projectile_hits().is_empty());
        }

        #[test]
        fn far_shot_misses() {
            let mut arena = Arena::new();
            arena.spawn(mob(MobKind::Coyote, IVec2::new(100, 100)));
            arena.spawn(projectile(Faction::Player, IVec2::new(900, 600)));
            assert!(arena.projectile_hits().is_empty());
        }
    }
}
