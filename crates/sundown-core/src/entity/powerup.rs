//! Timed pickups.

use glam::IVec2;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::animation::{AnimationState, FrameRange};
use crate::config::PowerupConfig;
use crate::context::{TickContext, WindowKind};
use crate::entity::EntityId;
use crate::geometry::Body;
use crate::output::{Command, ConsumeReason, Event, Output};
use crate::render::SpriteDraw;

/// Powerup variants, in sprite-sheet row order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PowerupKind {
    /// Restores strength up to the difficulty cap.
    Heal,
    /// Makes the player invulnerable for a while.
    Shield,
    /// Opens the slow window.
    Slow,
    /// Opens the zero-speed window.
    Freeze,
    /// Opens the max-speed window (a hazard).
    Frenzy,
}

impl PowerupKind {
    /// Every powerup kind, in id order.
    pub const ALL: [Self; 5] = [Self::Heal, Self::Shield, Self::Slow, Self::Freeze, Self::Frenzy];

    /// Number of kinds.
    pub const COUNT: u32 = 5;

    /// Looks up a kind by numeric id. Out-of-range ids yield `None`.
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Heal),
            1 => Some(Self::Shield),
            2 => Some(Self::Slow),
            3 => Some(Self::Freeze),
            4 => Some(Self::Frenzy),
            _ => None,
        }
    }

    /// Numeric id, also the sprite-sheet row.
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Speed window opened by this kind, if any.
    #[must_use]
    pub const fn window(self) -> Option<WindowKind> {
        match self {
            Self::Slow => Some(WindowKind::Slow),
            Self::Freeze => Some(WindowKind::ZeroSpeed),
            Self::Frenzy => Some(WindowKind::MaxSpeed),
            Self::Heal | Self::Shield => None,
        }
    }
}

impl fmt::Display for PowerupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heal => write!(f, "Heal"),
            Self::Shield => write!(f, "Shield"),
            Self::Slow => write!(f, "Slow"),
            Self::Freeze => write!(f, "Freeze"),
            Self::Frenzy => write!(f, "Frenzy"),
        }
    }
}

/// A pickup that expires after a fixed lifetime.
///
/// Once consumed, by pickup or by expiry, it is inert: hidden, never updated
/// again, and removed from the arena at the end of the tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Powerup {
    kind: PowerupKind,
    body: Body,
    animation: AnimationState,
    spawned_at: u64,
    lifetime: u64,
    consumed: Option<ConsumeReason>,
}

impl Powerup {
    /// Creates a powerup whose lifetime starts at `spawned_at`.
    #[must_use]
    pub fn new(
        kind: PowerupKind,
        position: IVec2,
        spawned_at: u64,
        config: &PowerupConfig,
        frame_interval: u64,
    ) -> Self {
        let row = config.sheet.grid.columns * u32::from(kind.id());
        let frames = FrameRange::new(config.frames.min + row, config.frames.max + row);
        let mut animation =
            AnimationState::new(config.sheet.sprite, config.sheet.grid, frame_interval)
                .with_loop(frames);
        animation.anchor(spawned_at);
        Self {
            kind,
            body: Body::new(position, config.size, 1.0),
            animation,
            spawned_at,
            lifetime: config.lifetime,
            consumed: None,
        }
    }

    /// Overrides the lifetime.
    #[must_use]
    pub fn with_lifetime(mut self, lifetime: u64) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Checks for pickup, then for expiry. Pickup wins when both hold on the
    /// same tick.
    pub fn update(&mut self, id: EntityId, ctx: &TickContext<'_>, out: &mut Vec<Output>) {
        if self.consumed.is_some() {
            return;
        }
        if ctx.player.alive && self.body.bounds().intersects(&ctx.player.collider) {
            self.consume(ConsumeReason::Pickup);
            out.push(Command::ActivatePowerup { kind: self.kind }.into());
        } else if ctx.now.saturating_sub(self.spawned_at) >= self.lifetime {
            self.consume(ConsumeReason::Expired);
        } else {
            self.animation.advance(ctx.now);
            return;
        }
        out.push(
            Event::PowerupConsumed {
                powerup: id,
                kind: self.kind,
                reason: self.consumed.unwrap_or(ConsumeReason::Expired),
            }
            .into(),
        );
        debug!(powerup = %id, kind = %self.kind, reason = ?self.consumed, "powerup_consumed");
    }

    /// Marks the powerup consumed and hides it. Later calls keep the first
    /// reason.
    pub fn consume(&mut self, reason: ConsumeReason) {
        if self.consumed.is_none() {
            self.consumed = Some(reason);
            self.body.set_visible(false);
        }
    }

    /// Draw request, or `None` once consumed.
    #[must_use]
    pub fn sprite(&self) -> Option<SpriteDraw> {
        SpriteDraw::of(&self.body, &self.animation, false)
    }

    /// Powerup variant.
    #[must_use]
    pub const fn kind(&self) -> PowerupKind {
        self.kind
    }

    /// Spatial state.
    #[must_use]
    pub const fn body(&self) -> &Body {
        &self.body
    }

    /// True once collected or expired.
    #[must_use]
    pub const fn is_consumed(&self) -> bool {
        self.consumed.is_some()
    }

    /// How the powerup was consumed.
    #[must_use]
    pub const fn consume_reason(&self) -> Option<ConsumeReason> {
        self.consumed
    }

    /// Timestamp the lifetime counts from.
    #[must_use]
    pub const fn spawned_at(&self) -> u64 {
        self.spawned_at
    }
}
