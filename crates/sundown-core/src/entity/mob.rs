//! Mob controller: movement, contact damage, shooting and death.
//!
//! A [`Mob`] is one concrete struct for every [`MobKind`]; per-kind
//! differences come from its [`MobProfile`] and from rolls made at spawn
//! ([`MobRolls`]).
//!
//! # States
//!
//! ```text
//! Spawning -> Active{Patrolling | Chasing | Stuck} -> Damaged (transient)
//!          -> Dying -> Removed
//! ```
//!
//! - **Patrolling** walks horizontally and turns at the map boundary or at an
//!   impassable leading side, stepping half its width in the new direction.
//!   With both horizontal sides blocked it freezes (`moving_stuck`) and does
//!   not turn; the flag clears as soon as either side opens.
//! - **Chasing** faces the player, steps vertically toward the player until
//!   their colliders overlap on the y axis, and stops horizontally when the
//!   leading side is blocked. It never sets `moving_stuck`.
//! - **Dying** plays the death range once; the mob becomes removable when the
//!   sequence is done.

use glam::IVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::animation::AnimationState;
use crate::config::{Difficulty, DifficultyConfig, FrameTable, MobKind, MobProfile, SpeedConfig};
use crate::context::{SpeedWindows, TickContext};
use crate::entity::{EntityId, Faction};
use crate::geometry::{Body, Rect, Sides};
use crate::output::{Command, Event, Modifier, Output};
use crate::render::SpriteDraw;
use crate::resolver::{Reduction, Vitality};
use crate::scheduler::ActionId;

/// Sub-state of an active mob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivePhase {
    /// Walking back and forth.
    Patrolling,
    /// Tracking the player.
    Chasing,
    /// Both horizontal sides blocked.
    Stuck,
}

/// Observable controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MobPhase {
    /// Spawned but not yet updated.
    Spawning,
    /// Alive and moving.
    Active(ActivePhase),
    /// Alive, playing the damage sequence.
    Damaged,
    /// Playing the death sequence.
    Dying,
    /// Death finished; eligible for deletion.
    Removed,
}

/// Randomized stats decided once at spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobRolls {
    /// Starting health.
    pub health: i32,
    /// Base speed in pixels per tick.
    pub speed: i32,
    /// Chases the player instead of patrolling.
    pub chases: bool,
    /// Registers a shoot timer.
    pub shoots: bool,
    /// Nanoseconds between shots.
    pub shoot_interval: u64,
    /// Initial horizontal direction: -1 left, 1 right.
    pub facing: i32,
}

impl MobRolls {
    /// Rolls stats within the profile's bounds. Chase and shoot eligibility
    /// are difficulty-weighted coin flips; a chance that is not a finite
    /// number counts as zero. The starting direction is a fair coin flip.
    pub fn roll<R: Rng + ?Sized>(
        profile: &MobProfile,
        tables: &DifficultyConfig,
        difficulty: Difficulty,
        rng: &mut R,
    ) -> Self {
        let chases =
            profile.chase_eligible && rng.gen_bool(chance(tables.chase_chance.get(difficulty)));
        let shoots =
            profile.shooter_eligible && rng.gen_bool(chance(tables.shoot_chance.get(difficulty)));
        Self {
            health: profile.health.sample(rng),
            speed: profile.speed.sample(rng),
            chases,
            shoots,
            shoot_interval: profile.shoot_interval.sample(rng),
            facing: if rng.gen_bool(0.5) { 1 } else { -1 },
        }
    }
}

fn chance(p: f64) -> f64 {
    if p.is_finite() {
        p.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Per-mob controller state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mob {
    kind: MobKind,
    body: Body,
    animation: AnimationState,
    frames: FrameTable,
    vitality: Vitality,
    killable: bool,
    contact_damage: i32,
    speed: i32,
    dir: i32,
    last_delta: IVec2,
    dying: bool,
    activated: bool,
    chase_capable: bool,
    chasing: bool,
    moving_stuck: bool,
    excluded_from_speed_boost: bool,
    dies_on_contact: bool,
    tracked: bool,
    shooter: bool,
    shoot_timer: Option<ActionId>,
    touching_player: bool,
}

impl Mob {
    /// Creates a mob facing `rolls.facing` with its walk loop running.
    ///
    /// # Arguments
    ///
    /// * `kind` - Mob variant
    /// * `profile` - Immutable per-kind configuration
    /// * `position` - Top-left corner in pixels
    /// * `rolls` - Stats rolled for this mob
    /// * `now` - Spawn timestamp
    /// * `frame_interval` - Animation frame interval
    #[must_use]
    pub fn spawn(
        kind: MobKind,
        profile: &MobProfile,
        position: IVec2,
        rolls: MobRolls,
        now: u64,
        frame_interval: u64,
    ) -> Self {
        let mut animation =
            AnimationState::new(profile.sheet.sprite, profile.sheet.grid, frame_interval)
                .with_loop(profile.frames.walk);
        animation.anchor(now);
        Self {
            kind,
            body: Body::new(position, profile.size, profile.scale).with_collider(profile.collider),
            animation,
            frames: profile.frames,
            vitality: Vitality::new(rolls.health),
            killable: profile.killable,
            contact_damage: profile.contact_damage,
            speed: rolls.speed,
            dir: if rolls.facing < 0 { -1 } else { 1 },
            last_delta: IVec2::ZERO,
            dying: false,
            activated: false,
            chase_capable: rolls.chases,
            chasing: false,
            moving_stuck: false,
            excluded_from_speed_boost: profile.excluded_from_speed_boost,
            dies_on_contact: profile.dies_on_contact,
            tracked: profile.tracked,
            shooter: rolls.shoots,
            shoot_timer: None,
            touching_player: false,
        }
    }

    /// Sets the horizontal direction (-1 left, 1 right).
    #[cfg(test)]
    #[must_use]
    pub(crate) fn facing(mut self, dir: i32) -> Self {
        self.dir = if dir < 0 { -1 } else { 1 };
        self
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Runs one tick: movement, animation, then player contact. Dying mobs
    /// only advance their death sequence.
    pub fn update(&mut self, id: EntityId, ctx: &TickContext<'_>, out: &mut Vec<Output>) {
        if !self.vitality.is_alive() {
            if self.dying {
                self.animation.advance(ctx.now);
                if self.animation.is_sequence_done() {
                    self.dying = false;
                    debug!(mob = %id, kind = ?self.kind, "mob_death_finished");
                }
            }
            return;
        }

        self.activated = true;
        self.steer(ctx);
        self.animation.advance(ctx.now);
        self.check_player_contact(id, ctx, out);

        if self.tracked {
            let position = self.body.position();
            debug!(
                mob = %id,
                kind = ?self.kind,
                x = position.x,
                y = position.y,
                health = self.vitality.value(),
                chasing = self.chasing,
                "boss_tracked"
            );
        }
    }

    /// Effective speed under the current windows.
    ///
    /// Max speed wins when its window is open and the mob is not excluded.
    /// Otherwise zero speed beats slow, and slow beats the base speed.
    #[must_use]
    pub const fn effective_speed(&self, windows: SpeedWindows, speeds: &SpeedConfig) -> i32 {
        if windows.max_speed && !self.excluded_from_speed_boost {
            speeds.max_speed
        } else if windows.zero_speed {
            0
        } else if windows.slow {
            speeds.min_speed
        } else {
            self.speed
        }
    }

    fn steer(&mut self, ctx: &TickContext<'_>) {
        let speed = self.effective_speed(ctx.windows, &ctx.config.speed);
        let collider = self.body.collider();
        let sides = ctx.map.passable_sides(&collider);

        self.chasing = self.chase_capable && ctx.player.alive && !ctx.windows.zero_speed;
        let delta = if self.chasing {
            self.moving_stuck = false;
            self.chase(&collider, sides, speed, ctx)
        } else {
            self.patrol(&collider, sides, speed, ctx.map_bounds())
        };
        self.body.translate(delta.x, delta.y);
        self.last_delta = delta;
    }

    fn chase(&mut self, collider: &Rect, sides: Sides, speed: i32, ctx: &TickContext<'_>) -> IVec2 {
        let target = ctx.player.collider;
        let offset = target.center() - collider.center();
        if offset.x != 0 {
            self.dir = offset.x.signum();
        }

        let bounds = ctx.map_bounds();
        let blocked = !sides.contains(Sides::leading_horizontal(self.dir))
            || (self.dir < 0 && collider.left() <= bounds.left())
            || (self.dir > 0 && collider.right() >= bounds.right());
        let dx = if blocked { 0 } else { self.dir * speed };

        let mut dy = 0;
        if !collider.intersects_on_axes(&target, true, false) && offset.y != 0 {
            let vertical = offset.y.signum();
            if sides.contains(Sides::leading_vertical(vertical)) {
                dy = vertical * speed;
            }
        }
        IVec2::new(dx, dy)
    }

    fn patrol(&mut self, collider: &Rect, sides: Sides, speed: i32, bounds: Rect) -> IVec2 {
        let open = sides.intersects(Sides::HORIZONTAL);
        if self.moving_stuck {
            if !open {
                return IVec2::ZERO;
            }
            self.moving_stuck = false;
        } else if !open {
            self.moving_stuck = true;
            return IVec2::ZERO;
        }

        let at_boundary = if self.dir < 0 {
            collider.left() <= bounds.left()
        } else {
            collider.right() >= bounds.right()
        };
        if at_boundary || !sides.contains(Sides::leading_horizontal(self.dir)) {
            self.dir = -self.dir;
            return IVec2::new(self.dir * (self.body.width() / 2), 0);
        }
        IVec2::new(self.dir * speed, 0)
    }

    fn check_player_contact(&mut self, id: EntityId, ctx: &TickContext<'_>, out: &mut Vec<Output>) {
        let touching = ctx.player.alive && self.body.collider().intersects(&ctx.player.collider);
        if !touching {
            self.touching_player = false;
            return;
        }
        if self.touching_player {
            return;
        }
        self.touching_player = true;
        out.push(
            Modifier::DamagePlayer {
                amount: self.contact_damage,
                source: Some(id),
            }
            .into(),
        );
        if self.dies_on_contact {
            self.die(id, ctx.now, out);
        } else {
            self.animation.play_override(self.frames.impact, None, None);
        }
    }

    // =========================================================================
    // Combat
    // =========================================================================

    /// Applies damage. Negative amounts, dead mobs and non-killable
    /// (decorative) mobs ignore it. Lethal damage starts the death sequence;
    /// otherwise the damage sequence plays and an indicator is emitted.
    pub fn reduce_health(&mut self, id: EntityId, amount: i32, now: u64, out: &mut Vec<Output>) {
        if !self.killable {
            return;
        }
        match self.vitality.reduce(amount) {
            Reduction::Ignored => {}
            Reduction::Damaged { .. } => {
                self.animation.play_override(self.frames.damage, None, None);
                let bounds = self.body.bounds();
                out.push(
                    Event::DamageIndicator {
                        target: id,
                        amount,
                        position: IVec2::new(bounds.center().x, bounds.top()),
                    }
                    .into(),
                );
            }
            Reduction::Died => self.die(id, now, out),
        }
    }

    fn die(&mut self, id: EntityId, now: u64, out: &mut Vec<Output>) {
        self.vitality.kill();
        self.dying = true;
        self.chasing = false;
        self.animation.clear_override();
        self.animation.set_looping(false);
        self.animation.set_loop(self.frames.death);
        self.animation.anchor(now);
        out.push(
            Event::DeathEffect {
                entity: id,
                position: self.body.bounds().center(),
            }
            .into(),
        );
        out.push(Event::MobDied { mob: id, kind: self.kind }.into());
        debug!(mob = %id, kind = ?self.kind, "mob_died");
    }

    /// Fires a shot if alive and mobs are not frozen, playing the shoot
    /// sequence.
    pub fn fire(&mut self, id: EntityId, windows: SpeedWindows) -> Option<Command> {
        if !self.vitality.is_alive() || windows.zero_speed {
            return None;
        }
        self.animation.play_override(self.frames.shoot, None, None);
        Some(Command::SpawnProjectile {
            owner: Some(id),
            faction: Faction::Mob,
            origin: self.body.bounds().center(),
            dir: self.dir,
        })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Current controller state.
    #[must_use]
    pub fn phase(&self) -> MobPhase {
        if !self.vitality.is_alive() {
            return if self.dying {
                MobPhase::Dying
            } else {
                MobPhase::Removed
            };
        }
        if !self.activated {
            return MobPhase::Spawning;
        }
        if self.animation.override_range() == Some(self.frames.damage) {
            return MobPhase::Damaged;
        }
        MobPhase::Active(if self.chasing {
            ActivePhase::Chasing
        } else if self.moving_stuck {
            ActivePhase::Stuck
        } else {
            ActivePhase::Patrolling
        })
    }

    /// Draw request, or `None` when hidden.
    #[must_use]
    pub fn sprite(&self) -> Option<SpriteDraw> {
        SpriteDraw::of(&self.body, &self.animation, self.dir < 0)
    }

    /// Mob variant.
    #[must_use]
    pub const fn kind(&self) -> MobKind {
        self.kind
    }

    /// Spatial state.
    #[must_use]
    pub const fn body(&self) -> &Body {
        &self.body
    }

    /// Mutable spatial state.
    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// Animation state.
    #[must_use]
    pub const fn animation(&self) -> &AnimationState {
        &self.animation
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> i32 {
        self.vitality.value()
    }

    /// Damage dealt to the player on contact.
    #[must_use]
    pub const fn contact_damage(&self) -> i32 {
        self.contact_damage
    }

    /// Rolled base speed.
    #[must_use]
    pub const fn base_speed(&self) -> i32 {
        self.speed
    }

    /// Horizontal direction: -1 left, 1 right.
    #[must_use]
    pub const fn dir(&self) -> i32 {
        self.dir
    }

    /// Movement applied during the last update.
    #[must_use]
    pub const fn last_delta(&self) -> IVec2 {
        self.last_delta
    }

    /// False once health reached 0 or a contact death happened.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.vitality.is_alive()
    }

    /// True while the death sequence plays.
    #[must_use]
    pub const fn is_dying(&self) -> bool {
        self.dying
    }

    /// True once the death sequence finished.
    #[must_use]
    pub const fn is_removable(&self) -> bool {
        !self.vitality.is_alive() && !self.dying
    }

    /// Chase decision made at spawn.
    #[must_use]
    pub const fn is_chase_capable(&self) -> bool {
        self.chase_capable
    }

    /// True if the mob chased during its last update.
    #[must_use]
    pub const fn is_chasing(&self) -> bool {
        self.chasing
    }

    /// True while frozen between two blocked sides.
    #[must_use]
    pub const fn is_moving_stuck(&self) -> bool {
        self.moving_stuck
    }

    /// Shooter decision made at spawn.
    #[must_use]
    pub const fn is_shooter(&self) -> bool {
        self.shooter
    }

    /// False for decorative mobs.
    #[must_use]
    pub const fn is_killable(&self) -> bool {
        self.killable
    }

    /// Scheduler action driving this mob's shots.
    #[must_use]
    pub const fn shoot_timer(&self) -> Option<ActionId> {
        self.shoot_timer
    }

    /// Records the scheduler action driving this mob's shots.
    pub fn set_shoot_timer(&mut self, timer: ActionId) {
        self.shoot_timer = Some(timer);
    }
}

// =============================================================================
// Tests
// =============================================================================
