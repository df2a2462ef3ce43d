//! Simulated entities held by the [`Arena`](crate::arena::Arena).
//!
//! - [`EntityId`]: Unique identifier for entities
//! - [`EntityTag`]: Type classification
//! - [`EntityInner`]: Type-safe storage for the concrete entity
//! - [`Entity`]: The complete entity container
//!
//! Every concrete entity embeds a [`Body`](crate::geometry::Body) and an
//! [`AnimationState`](crate::animation::AnimationState). The player is not an
//! arena entity; it lives in the [`World`](crate::world::World) next to the
//! arena (see [`player`]).
//!
//! # Example
//!
//! ```
//! use glam::IVec2;
//! use sundown_core::config::PowerupConfig;
//! use sundown_core::entity::{Entity, EntityId, EntityInner, EntityTag, Powerup, PowerupKind};
//!
//! let config = PowerupConfig::default();
//! let powerup = Powerup::new(PowerupKind::Shield, IVec2::new(10, 10), 0, &config, 100);
//! let entity = Entity::new(EntityId::new(42), EntityInner::Powerup(powerup));
//!
//! assert_eq!(entity.id().as_u64(), 42);
//! assert_eq!(entity.tag(), EntityTag::Powerup);
//! ```

pub mod mob;
pub mod player;
pub mod powerup;
pub mod projectile;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use mob::{ActivePhase, Mob, MobPhase, MobRolls};
pub use player::{Player, PlayerInput};
pub use powerup::{Powerup, PowerupKind};
pub use projectile::{Faction, Projectile};

use crate::context::TickContext;
use crate::geometry::Body;
use crate::output::Output;
use crate::render::SpriteDraw;

/// Unique identifier for an entity.
///
/// Ids are assigned monotonically by the arena and never reused. Their
/// ordering is the arena's iteration order.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new `EntityId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

/// Entity type tag.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityTag {
    /// Enemy driven by the mob controller
    Mob,
    /// Timed pickup
    Powerup,
    /// Projectile in flight
    Projectile,
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mob => write!(f, "Mob"),
            Self::Powerup => write!(f, "Powerup"),
            Self::Projectile => write!(f, "Projectile"),
        }
    }
}

/// Type-safe storage for the concrete entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityInner {
    /// Mob state
    Mob(Mob),
    /// Powerup state
    Powerup(Powerup),
    /// Projectile state
    Projectile(Projectile),
}

impl EntityInner {
    /// Returns the corresponding `EntityTag` for this inner storage.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        match self {
            Self::Mob(_) => EntityTag::Mob,
            Self::Powerup(_) => EntityTag::Powerup,
            Self::Projectile(_) => EntityTag::Projectile,
        }
    }
}

/// A complete entity in the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    tag: EntityTag,
    inner: EntityInner,
}

impl Entity {
    /// Creates a new entity. The tag is derived from `inner`.
    #[must_use]
    pub const fn new(id: EntityId, inner: EntityInner) -> Self {
        Self {
            id,
            tag: inner.tag(),
            inner,
        }
    }

    /// Returns the entity's unique identifier.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the entity's type tag.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        self.tag
    }

    /// Returns a reference to the entity's inner storage.
    #[must_use]
    pub const fn inner(&self) -> &EntityInner {
        &self.inner
    }

    /// Returns a mutable reference to the entity's inner storage.
    #[must_use]
    pub fn inner_mut(&mut self) -> &mut EntityInner {
        &mut self.inner
    }

    /// Returns the mob state if this is a mob.
    #[must_use]
    pub const fn as_mob(&self) -> Option<&Mob> {
        match &self.inner {
            EntityInner::Mob(mob) => Some(mob),
            _ => None,
        }
    }

    /// Returns the mutable mob state if this is a mob.
    #[must_use]
    pub fn as_mob_mut(&mut self) -> Option<&mut Mob> {
        match &mut self.inner {
            EntityInner::Mob(mob) => Some(mob),
            _ => None,
        }
    }

    /// Returns the powerup state if this is a powerup.
    #[must_use]
    pub const fn as_powerup(&self) -> Option<&Powerup> {
        match &self.inner {
            EntityInner::Powerup(powerup) => Some(powerup),
            _ => None,
        }
    }

    /// Returns the mutable powerup state if this is a powerup.
    #[must_use]
    pub fn as_powerup_mut(&mut self) -> Option<&mut Powerup> {
        match &mut self.inner {
            EntityInner::Powerup(powerup) => Some(powerup),
            _ => None,
        }
    }

    /// Returns the projectile state if this is a projectile.
    #[must_use]
    pub const fn as_projectile(&self) -> Option<&Projectile> {
        match &self.inner {
            EntityInner::Projectile(projectile) => Some(projectile),
            _ => None,
        }
    }

    /// Returns the mutable projectile state if this is a projectile.
    #[must_use]
    pub fn as_projectile_mut(&mut self) -> Option<&mut Projectile> {
        match &mut self.inner {
            EntityInner::Projectile(projectile) => Some(projectile),
            _ => None,
        }
    }

    /// Spatial state.
    #[must_use]
    pub const fn body(&self) -> &Body {
        match &self.inner {
            EntityInner::Mob(mob) => mob.body(),
            EntityInner::Powerup(powerup) => powerup.body(),
            EntityInner::Projectile(projectile) => projectile.body(),
        }
    }

    /// Runs one tick of the entity's behavior, appending any cross-entity
    /// effects to `out`.
    pub fn update(&mut self, ctx: &TickContext<'_>, out: &mut Vec<Output>) {
        let id = self.id;
        match &mut self.inner {
            EntityInner::Mob(mob) => mob.update(id, ctx, out),
            EntityInner::Powerup(powerup) => powerup.update(id, ctx, out),
            EntityInner::Projectile(projectile) => projectile.update(ctx, out),
        }
    }

    /// Returns true once the entity may be deleted from the arena.
    #[must_use]
    pub const fn is_removable(&self) -> bool {
        match &self.inner {
            EntityInner::Mob(mob) => mob.is_removable(),
            EntityInner::Powerup(powerup) => powerup.is_consumed(),
            EntityInner::Projectile(projectile) => !projectile.is_alive(),
        }
    }

    /// Draw request for this entity, or `None` when it is hidden.
    #[must_use]
    pub fn sprite(&self) -> Option<SpriteDraw> {
        match &self.inner {
            EntityInner::Mob(mob) => mob.sprite(),
            EntityInner::Powerup(powerup) => powerup.sprite(),
            EntityInner::Projectile(projectile) => projectile.sprite(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
