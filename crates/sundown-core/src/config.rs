//! Simulation tuning and per-kind mob profiles.
//!
//! [`SimConfig`] gathers every constant the simulation reads: animation
//! timing, global speed constants, difficulty-weighted probabilities, powerup
//! and projectile tuning, the player record and one [`MobProfile`] per
//! [`MobKind`]. It is plain serde data and can be loaded from JSON.
//!
//! Configuration mistakes are construction-time errors: [`SimConfig::validate`]
//! reports them as [`ConfigError`] before a simulation is built, and nothing
//! downstream re-checks them.
//!
//! # Example
//!
//! ```
//! use sundown_core::config::{MobKind, SimConfig};
//!
//! let config = SimConfig::from_json(r#"{ "speed": { "max_speed": 9, "min_speed": 1 } }"#)
//!     .expect("valid config");
//! assert_eq!(config.speed.max_speed, 9);
//! assert!(config.mobs.contains_key(&MobKind::Cowboy));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use glam::IVec2;
use rand::distributions::uniform::SampleUniform;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::animation::{FrameGrid, FrameRange, SpriteId};
use crate::entity::PowerupKind;
use crate::geometry::{ColliderShape, Rect};
use crate::NANOS_PER_SECOND;

// =============================================================================
// Errors
// =============================================================================

/// Invalid configuration detected before the simulation starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// A frame range has `min > max`.
    #[error("{owner}: frame range `{slot}` is inverted: {range}")]
    InvertedFrames {
        /// Record that owns the range.
        owner: String,
        /// Name of the range.
        slot: &'static str,
        /// The offending range.
        range: FrameRange,
    },
    /// A frame range points past the end of its sprite sheet.
    #[error("{owner}: frame range `{slot}` {range} exceeds sheet of {frame_count} frames")]
    FrameOutOfSheet {
        /// Record that owns the range.
        owner: String,
        /// Name of the range.
        slot: &'static str,
        /// The offending range.
        range: FrameRange,
        /// Frames available in the sheet.
        frame_count: u32,
    },
    /// A randomized stat has `min > max`.
    #[error("{owner}: `{stat}` range is inverted: {min} > {max}")]
    InvertedStat {
        /// Record that owns the stat.
        owner: String,
        /// Name of the stat.
        stat: &'static str,
        /// Lower bound.
        min: i64,
        /// Upper bound.
        max: i64,
    },
    /// A value that must be strictly positive is not.
    #[error("{owner}: `{field}` must be positive, got {value}")]
    NotPositive {
        /// Record that owns the field.
        owner: String,
        /// Name of the field.
        field: &'static str,
        /// The offending value.
        value: f64,
    },
    /// A probability lies outside `[0, 1]`.
    #[error("difficulty: `{field}` probability {value} is outside [0, 1]")]
    Probability {
        /// Name of the probability table.
        field: &'static str,
        /// The offending value.
        value: f64,
    },
    /// A mob kind has no profile.
    #[error("no profile configured for mob kind {0}")]
    MissingProfile(MobKind),
}

// =============================================================================
// Shared value types
// =============================================================================

/// Level difficulty, read from the enclosing level each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    /// Fewer chasers and shooters.
    Easy,
    /// Default.
    #[default]
    Medium,
    /// More chasers and shooters, lower heal cap.
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Easy => write!(f, "Easy"),
            Self::Medium => write!(f, "Medium"),
            Self::Hard => write!(f, "Hard"),
        }
    }
}

/// One value per [`Difficulty`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerDifficulty<T> {
    /// Value on Easy.
    pub easy: T,
    /// Value on Medium.
    pub medium: T,
    /// Value on Hard.
    pub hard: T,
}

impl<T: Copy> PerDifficulty<T> {
    /// Creates a table.
    #[must_use]
    pub const fn new(easy: T, medium: T, hard: T) -> Self {
        Self { easy, medium, hard }
    }

    /// Value for `difficulty`.
    #[must_use]
    pub const fn get(&self, difficulty: Difficulty) -> T {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }

    fn values(&self) -> [T; 3] {
        [self.easy, self.medium, self.hard]
    }
}

/// Inclusive `[min, max]` bounds for a randomized stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span<T> {
    /// Lower bound.
    pub min: T,
    /// Upper bound (inclusive).
    pub max: T,
}

impl<T: Copy + PartialOrd + SampleUniform> Span<T> {
    /// Creates a span.
    #[must_use]
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    /// A span that always yields `value`.
    #[must_use]
    pub const fn fixed(value: T) -> Self {
        Self::new(value, value)
    }

    /// Draws a value uniformly from the span.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        if self.min >= self.max {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }
}

/// Sprite sheet handle plus its layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteSheet {
    /// Sheet handle in the host's asset cache.
    pub sprite: SpriteId,
    /// Sheet layout.
    pub grid: FrameGrid,
}

impl SpriteSheet {
    /// Creates a sheet descriptor.
    #[must_use]
    pub const fn new(sprite: SpriteId, grid: FrameGrid) -> Self {
        Self { sprite, grid }
    }
}

// =============================================================================
// Mob kinds and profiles
// =============================================================================

/// Concrete mob variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MobKind {
    /// Slow walker, dies on contact with the player.
    Cactus,
    /// Fast chaser.
    Coyote,
    /// Boss: tough, shoots, ignores speed boosts.
    Cowboy,
    /// Decorative prop that cannot be killed but may shoot.
    Coffin,
}

impl MobKind {
    /// Every mob kind.
    pub const ALL: [Self; 4] = [Self::Cactus, Self::Coyote, Self::Cowboy, Self::Coffin];
}

impl fmt::Display for MobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cactus => write!(f, "Cactus"),
            Self::Coyote => write!(f, "Coyote"),
            Self::Cowboy => write!(f, "Cowboy"),
            Self::Coffin => write!(f, "Coffin"),
        }
    }
}

/// Frame ranges driving a mob's animation transitions.
///
/// Ten slots: start/end pairs for walk, impact, damage, shoot and death.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameTable {
    /// Steady-state walking loop.
    pub walk: FrameRange,
    /// Played when the mob hits the player without dying.
    pub impact: FrameRange,
    /// Played when the mob takes non-lethal damage.
    pub damage: FrameRange,
    /// Played when the mob fires.
    pub shoot: FrameRange,
    /// Played once when the mob dies.
    pub death: FrameRange,
}

impl FrameTable {
    /// Builds a table from the flat ten-slot layout
    /// `[walk_min, walk_max, impact_min, ..., death_max]`.
    #[must_use]
    pub const fn from_slots(slots: [u32; 10]) -> Self {
        Self {
            walk: FrameRange::new(slots[0], slots[1]),
            impact: FrameRange::new(slots[2], slots[3]),
            damage: FrameRange::new(slots[4], slots[5]),
            shoot: FrameRange::new(slots[6], slots[7]),
            death: FrameRange::new(slots[8], slots[9]),
        }
    }

    /// Flat ten-slot layout of this table.
    #[must_use]
    pub const fn slots(&self) -> [u32; 10] {
        [
            self.walk.min,
            self.walk.max,
            self.impact.min,
            self.impact.max,
            self.damage.min,
            self.damage.max,
            self.shoot.min,
            self.shoot.max,
            self.death.min,
            self.death.max,
        ]
    }

    fn named(&self) -> [(&'static str, FrameRange); 5] {
        [
            ("walk", self.walk),
            ("impact", self.impact),
            ("damage", self.damage),
            ("shoot", self.shoot),
            ("death", self.death),
        ]
    }
}

/// Immutable per-kind configuration record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MobProfile {
    /// Sprite sheet.
    pub sheet: SpriteSheet,
    /// Unscaled sprite size in pixels.
    pub size: IVec2,
    /// Draw and collision scale.
    pub scale: f32,
    /// Collider derivation.
    pub collider: ColliderShape,
    /// Animation frame table.
    pub frames: FrameTable,
    /// Starting health.
    pub health: Span<i32>,
    /// Damage dealt to the player on contact.
    pub contact_damage: i32,
    /// Base movement speed in pixels per tick.
    pub speed: Span<i32>,
    /// Nanoseconds between shots for shooter mobs.
    pub shoot_interval: Span<u64>,
    /// May be rolled as a shooter at spawn.
    pub shooter_eligible: bool,
    /// May be rolled as a chaser at spawn.
    pub chase_eligible: bool,
    /// Dies immediately after hitting the player.
    pub dies_on_contact: bool,
    /// Ignores the global max-speed window.
    pub excluded_from_speed_boost: bool,
    /// Health reaching zero kills the mob. Decorative mobs set this to false.
    pub killable: bool,
    /// Emits debug tracking logs every tick (bosses).
    pub tracked: bool,
}

impl MobProfile {
    fn validate(&self, kind: MobKind) -> Result<(), ConfigError> {
        let owner = format!("mob {kind}");
        validate_sheet(&owner, self.sheet, &self.frames.named())?;
        validate_positive(&owner, "scale", f64::from(self.scale))?;
        validate_positive(&owner, "size.x", f64::from(self.size.x))?;
        validate_positive(&owner, "size.y", f64::from(self.size.y))?;
        validate_positive(&owner, "health.min", f64::from(self.health.min))?;
        validate_span(
            &owner,
            "health",
            i64::from(self.health.min),
            i64::from(self.health.max),
        )?;
        validate_span(
            &owner,
            "speed",
            i64::from(self.speed.min),
            i64::from(self.speed.max),
        )?;
        #[allow(clippy::cast_possible_wrap)]
        validate_span(
            &owner,
            "shoot_interval",
            self.shoot_interval.min as i64,
            self.shoot_interval.max as i64,
        )?;
        Ok(())
    }

    /// Built-in profile for `kind`.
    #[must_use]
    pub fn default_for(kind: MobKind) -> Self {
        let grid = FrameGrid::new(5, 8);
        let base = Self {
            sheet: SpriteSheet::new(SpriteId::new(10), grid),
            size: IVec2::new(32, 32),
            scale: 2.0,
            collider: ColliderShape::Feet,
            frames: FrameTable::from_slots([0, 3, 8, 10, 16, 17, 24, 26, 32, 37]),
            health: Span::new(2, 4),
            contact_damage: 10,
            speed: Span::new(1, 3),
            shoot_interval: Span::new(2 * NANOS_PER_SECOND, 4 * NANOS_PER_SECOND),
            shooter_eligible: false,
            chase_eligible: false,
            dies_on_contact: false,
            excluded_from_speed_boost: false,
            killable: true,
            tracked: false,
        };
        match kind {
            MobKind::Cactus => Self {
                health: Span::new(1, 2),
                speed: Span::fixed(1),
                dies_on_contact: true,
                ..base
            },
            MobKind::Coyote => Self {
                sheet: SpriteSheet::new(SpriteId::new(11), grid),
                size: IVec2::new(40, 24),
                speed: Span::new(2, 4),
                chase_eligible: true,
                contact_damage: 15,
                ..base
            },
            MobKind::Cowboy => Self {
                sheet: SpriteSheet::new(SpriteId::new(12), grid),
                size: IVec2::new(32, 48),
                health: Span::new(12, 18),
                contact_damage: 25,
                shooter_eligible: true,
                chase_eligible: true,
                excluded_from_speed_boost: true,
                tracked: true,
                ..base
            },
            MobKind::Coffin => Self {
                sheet: SpriteSheet::new(SpriteId::new(13), grid),
                size: IVec2::new(24, 48),
                collider: ColliderShape::Footprint(Rect::new(2, 36, 20, 12)),
                frames: FrameTable::from_slots([0, 0, 8, 9, 16, 17, 24, 27, 32, 35]),
                health: Span::fixed(1),
                speed: Span::fixed(0),
                shooter_eligible: true,
                killable: false,
                ..base
            },
        }
    }
}

// =============================================================================
// Subsystem tuning
// =============================================================================

/// Animation timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Default frame-advance interval in nanoseconds.
    pub frame_interval: u64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            frame_interval: NANOS_PER_SECOND / 10,
        }
    }
}

/// Global speed constants used by the speed windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedConfig {
    /// Speed of every non-excluded mob while the max-speed window is active.
    pub max_speed: i32,
    /// Speed of every mob while the slow window is active.
    pub min_speed: i32,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            max_speed: 6,
            min_speed: 1,
        }
    }
}

/// Difficulty-weighted spawn rolls and caps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyConfig {
    /// Probability that a chase-eligible mob chases.
    pub chase_chance: PerDifficulty<f64>,
    /// Probability that a shooter-eligible mob shoots.
    pub shoot_chance: PerDifficulty<f64>,
    /// Maximum strength a heal powerup can restore the player to.
    pub heal_cap: PerDifficulty<i32>,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            chase_chance: PerDifficulty::new(0.2, 0.4, 0.6),
            shoot_chance: PerDifficulty::new(0.25, 0.5, 0.8),
            heal_cap: PerDifficulty::new(100, 80, 60),
        }
    }
}

/// Powerup tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerupConfig {
    /// Nanoseconds an uncollected powerup stays on the map.
    pub lifetime: u64,
    /// Duration of slow, freeze and frenzy windows.
    pub window_duration: u64,
    /// Duration of the shield (player invulnerability).
    pub shield_duration: u64,
    /// Strength restored by a heal.
    pub heal_amount: i32,
    /// Sprite sheet; the powerup kind selects the row.
    pub sheet: SpriteSheet,
    /// Unscaled sprite size.
    pub size: IVec2,
    /// Idle loop; each kind uses its own sheet row, offset by
    /// `kind index * grid.columns`.
    pub frames: FrameRange,
}

impl Default for PowerupConfig {
    fn default() -> Self {
        Self {
            lifetime: 5 * NANOS_PER_SECOND,
            window_duration: 6 * NANOS_PER_SECOND,
            shield_duration: 4 * NANOS_PER_SECOND,
            heal_amount: 25,
            sheet: SpriteSheet::new(SpriteId::new(3), FrameGrid::new(5, 4)),
            size: IVec2::new(16, 16),
            frames: FrameRange::new(0, 3),
        }
    }
}

/// Projectile tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileConfig {
    /// Horizontal pixels per tick.
    pub speed: i32,
    /// Damage on impact.
    pub damage: i32,
    /// Unscaled sprite size.
    pub size: IVec2,
    /// Sprite sheet.
    pub sheet: SpriteSheet,
    /// Flight loop.
    pub frames: FrameRange,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            speed: 8,
            damage: 5,
            size: IVec2::new(8, 8),
            sheet: SpriteSheet::new(SpriteId::new(2), FrameGrid::new(1, 4)),
            frames: FrameRange::new(0, 3),
        }
    }
}

/// Frame ranges for the player sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerFrames {
    /// Standing still.
    pub idle: FrameRange,
    /// Moving.
    pub walk: FrameRange,
    /// Played when hurt.
    pub damage: FrameRange,
    /// Played once on death.
    pub death: FrameRange,
}

/// Player tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Starting (and maximum) strength.
    pub strength: i32,
    /// Pixels per tick per input axis.
    pub speed: i32,
    /// Top-left position at level start.
    pub start: IVec2,
    /// Unscaled sprite size.
    pub size: IVec2,
    /// Draw and collision scale.
    pub scale: f32,
    /// Sprite sheet.
    pub sheet: SpriteSheet,
    /// Frame ranges.
    pub frames: PlayerFrames,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            strength: 100,
            speed: 3,
            start: IVec2::new(64, 320),
            size: IVec2::new(32, 48),
            scale: 2.0,
            sheet: SpriteSheet::new(SpriteId::new(1), FrameGrid::new(4, 8)),
            frames: PlayerFrames {
                idle: FrameRange::new(0, 1),
                walk: FrameRange::new(8, 13),
                damage: FrameRange::new(16, 18),
                death: FrameRange::new(24, 29),
            },
        }
    }
}

/// Playfield extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Rectangle mobs patrol within; reaching its edge flips direction.
    pub bounds: Rect,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            bounds: Rect::new(0, 0, 1280, 720),
        }
    }
}

// =============================================================================
// SimConfig
// =============================================================================

/// Complete simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Animation timing.
    pub animation: AnimationConfig,
    /// Global speed constants.
    pub speed: SpeedConfig,
    /// Difficulty tables.
    pub difficulty: DifficultyConfig,
    /// Powerup tuning.
    pub powerup: PowerupConfig,
    /// Projectile tuning.
    pub projectile: ProjectileConfig,
    /// Player tuning.
    pub player: PlayerConfig,
    /// Playfield extent.
    pub map: MapConfig,
    /// Per-kind mob profiles.
    pub mobs: BTreeMap<MobKind, MobProfile>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            animation: AnimationConfig::default(),
            speed: SpeedConfig::default(),
            difficulty: DifficultyConfig::default(),
            powerup: PowerupConfig::default(),
            projectile: ProjectileConfig::default(),
            player: PlayerConfig::default(),
            map: MapConfig::default(),
            mobs: MobKind::ALL
                .into_iter()
                .map(|kind| (kind, MobProfile::default_for(kind)))
                .collect(),
        }
    }
}

impl SimConfig {
    /// Parses a JSON document and validates it. Missing sections take their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and any validation
    /// error reported by [`validate`](Self::validate).
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every construction-time invariant.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for kind in MobKind::ALL {
            self.mobs
                .get(&kind)
                .ok_or(ConfigError::MissingProfile(kind))?
                .validate(kind)?;
        }

        let player = &self.player;
        validate_sheet(
            "player",
            player.sheet,
            &[
                ("idle", player.frames.idle),
                ("walk", player.frames.walk),
                ("damage", player.frames.damage),
                ("death", player.frames.death),
            ],
        )?;
        validate_positive("player", "strength", f64::from(player.strength))?;
        validate_positive("player", "scale", f64::from(player.scale))?;

        validate_sheet(
            "projectile",
            self.projectile.sheet,
            &[("flight", self.projectile.frames)],
        )?;
        validate_positive("projectile", "speed", f64::from(self.projectile.speed))?;

        let powerup = &self.powerup;
        let last_row = powerup.sheet.grid.columns * (PowerupKind::COUNT - 1);
        validate_sheet(
            "powerup",
            powerup.sheet,
            &[
                ("idle", powerup.frames),
                (
                    "idle (last kind row)",
                    FrameRange::new(powerup.frames.min + last_row, powerup.frames.max + last_row),
                ),
            ],
        )?;

        validate_span(
            "speed",
            "min_speed..max_speed",
            i64::from(self.speed.min_speed),
            i64::from(self.speed.max_speed),
        )?;

        for (field, table) in [
            ("chase_chance", self.difficulty.chase_chance),
            ("shoot_chance", self.difficulty.shoot_chance),
        ] {
            for value in table.values() {
                if !(0.0..=1.0).contains(&value) {
                    return Err(ConfigError::Probability { field, value });
                }
            }
        }
        Ok(())
    }

    /// Profile for `kind`.
    ///
    /// Profiles for every kind are guaranteed present after
    /// [`validate`](Self::validate); an unvalidated config missing one falls
    /// back to the built-in profile.
    #[must_use]
    pub fn profile(&self, kind: MobKind) -> std::borrow::Cow<'_, MobProfile> {
        self.mobs.get(&kind).map_or_else(
            || std::borrow::Cow::Owned(MobProfile::default_for(kind)),
            std::borrow::Cow::Borrowed,
        )
    }
}

fn validate_sheet(
    owner: &str,
    sheet: SpriteSheet,
    ranges: &[(&'static str, FrameRange)],
) -> Result<(), ConfigError> {
    let frame_count = sheet.grid.frame_count();
    validate_positive(owner, "grid", f64::from(frame_count))?;
    for &(slot, range) in ranges {
        if range.is_empty() {
            return Err(ConfigError::InvertedFrames {
                owner: owner.to_string(),
                slot,
                range,
            });
        }
        if range.max >= frame_count {
            return Err(ConfigError::FrameOutOfSheet {
                owner: owner.to_string(),
                slot,
                range,
                frame_count,
            });
        }
    }
    Ok(())
}

fn validate_span(owner: &str, stat: &'static str, min: i64, max: i64) -> Result<(), ConfigError> {
    if min > max {
        return Err(ConfigError::InvertedStat {
            owner: owner.to_string(),
            stat,
            min,
            max,
        });
    }
    Ok(())
}

fn validate_positive(owner: &str, field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value <= 0.0 {
        return Err(ConfigError::NotPositive {
            owner: owner.to_string(),
            field,
            value,
        });
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
