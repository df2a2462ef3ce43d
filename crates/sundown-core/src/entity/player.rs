//! The player entity.
//!
//! The player shares the combat rules with mobs through [`Vitality`] but is
//! driven by host input instead of a controller, and may be shielded: while
//! invulnerable, [`Player::reduce_strength`] does nothing at all, including
//! visual feedback.

use glam::IVec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::animation::AnimationState;
use crate::config::{PlayerConfig, PlayerFrames};
use crate::context::PlayerView;
use crate::geometry::{Body, Rect, Sides};
use crate::map::Passability;
use crate::output::{Event, Output};
use crate::render::SpriteDraw;
use crate::resolver::{Reduction, Vitality};

/// Movement requested by the host for the next ticks.
///
/// Each axis is read as its sign: negative, zero or positive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInput {
    /// Horizontal direction.
    pub dx: i32,
    /// Vertical direction.
    pub dy: i32,
}

impl PlayerInput {
    /// Creates an input.
    #[must_use]
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

/// Player state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    body: Body,
    animation: AnimationState,
    frames: PlayerFrames,
    vitality: Vitality,
    speed: i32,
    facing: i32,
    input: PlayerInput,
    invulnerable: bool,
    dying: bool,
}

impl Player {
    /// Creates a player at full strength at `config.start`.
    #[must_use]
    pub fn new(config: &PlayerConfig, now: u64, frame_interval: u64) -> Self {
        let mut animation =
            AnimationState::new(config.sheet.sprite, config.sheet.grid, frame_interval)
                .with_loop(config.frames.idle);
        animation.anchor(now);
        Self {
            body: Body::new(config.start, config.size, config.scale),
            animation,
            frames: config.frames,
            vitality: Vitality::new(config.strength),
            speed: config.speed,
            facing: 1,
            input: PlayerInput::default(),
            invulnerable: false,
            dying: false,
        }
    }

    /// Moves according to the current input, blocked by impassable sides and
    /// by the map boundary, then advances the animation.
    pub fn update(&mut self, now: u64, map: &dyn Passability, bounds: Rect) {
        if !self.vitality.is_alive() {
            if self.dying {
                self.animation.advance(now);
                if self.animation.is_sequence_done() {
                    self.dying = false;
                    debug!("player_death_finished");
                }
            }
            return;
        }

        let collider = self.body.collider();
        let sides = map.passable_sides(&collider);
        let mut dx = self.input.dx.signum() * self.speed;
        let mut dy = self.input.dy.signum() * self.speed;
        if dx != 0
            && (!sides.contains(Sides::leading_horizontal(dx))
                || !bounds.contains_rect(&self.body.bounds().translated(dx, 0)))
        {
            dx = 0;
        }
        if dy != 0
            && (!sides.contains(Sides::leading_vertical(dy))
                || !bounds.contains_rect(&self.body.bounds().translated(0, dy)))
        {
            dy = 0;
        }
        if dx != 0 {
            self.facing = dx.signum();
        }
        self.body.translate(dx, dy);

        let moving = dx != 0 || dy != 0;
        self.animation
            .set_loop(if moving { self.frames.walk } else { self.frames.idle });
        self.animation.advance(now);
    }

    /// Applies damage unless shielded. Reaching 0 starts the death sequence
    /// exactly once.
    pub fn reduce_strength(&mut self, amount: i32, now: u64, out: &mut Vec<Output>) {
        if self.invulnerable {
            return;
        }
        match self.vitality.reduce(amount) {
            Reduction::Ignored => {}
            Reduction::Damaged { remaining } => {
                self.animation.play_override(self.frames.damage, None, None);
                out.push(Event::PlayerDamaged { amount, remaining }.into());
            }
            Reduction::Died => {
                self.dying = true;
                self.animation.clear_override();
                self.animation.set_looping(false);
                self.animation.set_loop(self.frames.death);
                self.animation.anchor(now);
                out.push(Event::PlayerDamaged { amount, remaining: 0 }.into());
                out.push(Event::PlayerDied.into());
                debug!("player_died");
            }
        }
    }

    /// Restores strength up to `min(max strength, cap)`.
    pub fn heal(&mut self, amount: i32, cap: i32, out: &mut Vec<Output>) {
        let restored = self.vitality.heal(amount, cap);
        if restored > 0 {
            out.push(
                Event::PlayerHealed {
                    amount: restored,
                    strength: self.vitality.value(),
                }
                .into(),
            );
        }
    }

    /// Snapshot exposed to entity updates.
    #[must_use]
    pub fn view(&self) -> PlayerView {
        PlayerView {
            alive: self.vitality.is_alive(),
            collider: self.body.collider(),
            position: self.body.position(),
        }
    }

    /// Draw request, or `None` when hidden.
    #[must_use]
    pub fn sprite(&self) -> Option<SpriteDraw> {
        SpriteDraw::of(&self.body, &self.animation, self.facing < 0)
    }

    /// Sets the movement input used from the next update on.
    pub fn set_input(&mut self, input: PlayerInput) {
        self.input = input;
    }

    /// Turns the shield on or off.
    pub fn set_invulnerable(&mut self, invulnerable: bool) {
        self.invulnerable = invulnerable;
    }

    /// True while shielded.
    #[must_use]
    pub const fn is_invulnerable(&self) -> bool {
        self.invulnerable
    }

    /// Current strength.
    #[must_use]
    pub const fn strength(&self) -> i32 {
        self.vitality.value()
    }

    /// False once strength reached 0.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.vitality.is_alive()
    }

    /// True while the death sequence plays.
    #[must_use]
    pub const fn is_dying(&self) -> bool {
        self.dying
    }

    /// Horizontal facing: -1 left, 1 right.
    #[must_use]
    pub const fn facing(&self) -> i32 {
        self.facing
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
}
