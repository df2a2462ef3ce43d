//! Outputs emitted during a tick and routed to resolvers.
//!
//! Entity updates and timer dispatch never reach across into other entities.
//! Anything that affects something other than the emitting entity becomes an
//! [`Output`]:
//! - [`Command`]: structural requests (spawn a projectile, activate a powerup)
//! - [`Modifier`]: value changes (damage, healing)
//! - [`Event`]: notifications for the host (death effects, damage indicators)
//!
//! Every output travels in an [`OutputEnvelope`] recording who emitted it and
//! when.
//!
//! # Example
//!
//! ```
//! use sundown_core::output::{Modifier, Output, OutputEnvelope, OutputKind, OutputSource};
//!
//! let envelope = OutputEnvelope::new(
//!     Output::Modifier(Modifier::DamagePlayer { amount: 10, source: None }),
//!     OutputSource::Host,
//!     1_000,
//!     0,
//! );
//! assert_eq!(envelope.output().kind(), OutputKind::Modifier);
//! ```

use glam::IVec2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::config::MobKind;
use crate::context::WindowKind;
use crate::entity::{EntityId, Faction, PowerupKind};
use crate::scheduler::ActionId;

// =============================================================================
// Output Categories
// =============================================================================

/// Structural requests resolved after all entities updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Spawn a projectile at `origin` travelling in horizontal direction `dir`.
    SpawnProjectile {
        /// Firing mob, or `None` for the player
        owner: Option<EntityId>,
        /// Side the projectile damages
        faction: Faction,
        /// Center of the projectile at spawn
        origin: IVec2,
        /// -1 for left, 1 for right
        dir: i32,
    },
    /// Apply the effect of a collected powerup.
    ActivatePowerup {
        /// Powerup that was collected
        kind: PowerupKind,
    },
}

/// Value changes applied by the combat rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modifier {
    /// Reduce the player's strength.
    DamagePlayer {
        /// Damage amount; negative amounts are ignored
        amount: i32,
        /// Entity that dealt the damage, if any
        source: Option<EntityId>,
    },
    /// Reduce a mob's health.
    DamageMob {
        /// Mob to damage
        target: EntityId,
        /// Damage amount; negative amounts are ignored
        amount: i32,
    },
    /// Restore player strength up to the difficulty cap.
    HealPlayer {
        /// Heal amount; negative amounts are ignored
        amount: i32,
    },
}

/// Why a powerup stopped being collectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsumeReason {
    /// The player walked over it.
    Pickup,
    /// Its lifetime ran out.
    Expired,
}

/// Notifications surfaced to the host through
/// [`Simulation::take_events`](crate::simulation::Simulation::take_events).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Floating damage number above an entity.
    DamageIndicator {
        /// Entity that took damage
        target: EntityId,
        /// Damage taken
        amount: i32,
        /// Where to show the indicator
        position: IVec2,
    },
    /// Transient visual effect attached to a dying mob.
    DeathEffect {
        /// The dying mob
        entity: EntityId,
        /// Center of the effect
        position: IVec2,
    },
    /// A mob started dying.
    MobDied {
        /// The mob
        mob: EntityId,
        /// Its kind
        kind: MobKind,
    },
    /// A mob finished its death sequence and left the level.
    MobRemoved {
        /// The mob
        mob: EntityId,
        /// Its kind
        kind: MobKind,
    },
    /// The player took damage.
    PlayerDamaged {
        /// Damage taken
        amount: i32,
        /// Strength left
        remaining: i32,
    },
    /// The player regained strength.
    PlayerHealed {
        /// Strength actually restored
        amount: i32,
        /// Strength after healing
        strength: i32,
    },
    /// The player's strength reached zero.
    PlayerDied,
    /// A powerup was collected or expired.
    PowerupConsumed {
        /// The powerup
        powerup: EntityId,
        /// Its kind
        kind: PowerupKind,
        /// Pickup or expiry
        reason: ConsumeReason,
    },
    /// A projectile entered the level.
    ProjectileFired {
        /// The new projectile
        projectile: EntityId,
        /// Firing mob, or `None` for the player
        owner: Option<EntityId>,
    },
    /// A speed window opened (or was extended).
    WindowStarted {
        /// The window
        window: WindowKind,
    },
    /// A speed window closed.
    WindowEnded {
        /// The window
        window: WindowKind,
    },
    /// The player's shield ran out.
    ShieldEnded,
}

impl Event {
    /// Entity the event is about, if any.
    #[must_use]
    pub const fn entity(&self) -> Option<EntityId> {
        match self {
            Self::DamageIndicator { target, .. } => Some(*target),
            Self::DeathEffect { entity, .. } => Some(*entity),
            Self::MobDied { mob, .. } | Self::MobRemoved { mob, .. } => Some(*mob),
            Self::PowerupConsumed { powerup, .. } => Some(*powerup),
            Self::ProjectileFired { projectile, .. } => Some(*projectile),
            Self::PlayerDamaged { .. }
            | Self::PlayerHealed { .. }
            | Self::PlayerDied
            | Self::WindowStarted { .. }
            | Self::WindowEnded { .. }
            | Self::ShieldEnded => None,
        }
    }
}

// =============================================================================
// Top-Level Output Enum
// =============================================================================

/// Output kind for resolver routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputKind {
    /// Command outputs
    Command,
    /// Modifier outputs
    Modifier,
    /// Event outputs
    Event,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command => write!(f, "Command"),
            Self::Modifier => write!(f, "Modifier"),
            Self::Event => write!(f, "Event"),
        }
    }
}

/// Anything emitted during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Output {
    /// A structural request
    Command(Command),
    /// A value change
    Modifier(Modifier),
    /// A notification
    Event(Event),
}

impl Output {
    /// Returns the kind of this output for resolver routing.
    #[must_use]
    pub const fn kind(&self) -> OutputKind {
        match self {
            Self::Command(_) => OutputKind::Command,
            Self::Modifier(_) => OutputKind::Modifier,
            Self::Event(_) => OutputKind::Event,
        }
    }

    /// Returns the command if this is a command output.
    #[must_use]
    pub const fn as_command(&self) -> Option<&Command> {
        match self {
            Self::Command(cmd) => Some(cmd),
            _ => None,
        }
    }

    /// Returns the modifier if this is a modifier output.
    #[must_use]
    pub const fn as_modifier(&self) -> Option<&Modifier> {
        match self {
            Self::Modifier(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the event if this is an event output.
    #[must_use]
    pub const fn as_event(&self) -> Option<&Event> {
        match self {
            Self::Event(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Command> for Output {
    fn from(cmd: Command) -> Self {
        Self::Command(cmd)
    }
}

impl From<Modifier> for Output {
    fn from(m: Modifier) -> Self {
        Self::Modifier(m)
    }
}

impl From<Event> for Output {
    fn from(e: Event) -> Self {
        Self::Event(e)
    }
}

// =============================================================================
// Output Envelope
// =============================================================================

/// Who emitted an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputSource {
    /// An arena entity during its update.
    Entity(EntityId),
    /// The player entity.
    Player,
    /// A scheduler action during dispatch.
    Timer(ActionId),
    /// A resolver, as a follow-up to another output.
    Resolver,
    /// The host, between ticks.
    Host,
}

impl fmt::Display for OutputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity(id) => write!(f, "entity:{id}"),
            Self::Player => write!(f, "player"),
            Self::Timer(id) => write!(f, "timer:{id}"),
            Self::Resolver => write!(f, "resolver"),
            Self::Host => write!(f, "host"),
        }
    }
}

/// Wrapper for outputs with provenance metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputEnvelope {
    output: Output,
    source: OutputSource,
    time: u64,
    sequence: u32,
}

impl OutputEnvelope {
    /// Creates a new output envelope.
    ///
    /// # Arguments
    ///
    /// * `output` - The output to wrap
    /// * `source` - Who emitted the output
    /// * `time` - Host timestamp of the tick, in nanoseconds
    /// * `sequence` - Position among the outputs of the same source this tick
    #[must_use]
    pub const fn new(output: Output, source: OutputSource, time: u64, sequence: u32) -> Self {
        Self {
            output,
            source,
            time,
            sequence,
        }
    }

    /// Wraps a batch of outputs from one source, numbering them in order.
    pub fn wrap_all(
        outputs: impl IntoIterator<Item = Output>,
        source: OutputSource,
        time: u64,
    ) -> impl Iterator<Item = Self> {
        (0..)
            .zip(outputs)
            .map(move |(sequence, output)| Self::new(output, source, time, sequence))
    }

    /// Returns a reference to the wrapped output.
    #[must_use]
    pub const fn output(&self) -> &Output {
        &self.output
    }

    /// Consumes the envelope and returns the wrapped output.
    #[must_use]
    pub fn into_output(self) -> Output {
        self.output
    }

    /// Returns who emitted the output.
    #[must_use]
    pub const fn source(&self) -> OutputSource {
        self.source
    }

    /// Returns the tick timestamp.
    #[must_use]
    pub const fn time(&self) -> u64 {
        self.time
    }

    /// Returns the sequence number within the source.
    #[must_use]
    pub const fn sequence(&self) -> u32 {
        self.sequence
    }
}

/// Hands out per-source sequence numbers for one tick.
///
/// Every source counts from 0 in emission order, so `(source, sequence)`
/// identifies an output within its tick.
#[derive(Debug, Default)]
pub struct Sequencer {
    next: HashMap<OutputSource, u32>,
}

impl Sequencer {
    /// Creates a sequencer with every source at 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the next sequence number for `source`.
    pub fn next(&mut self, source: OutputSource) -> u32 {
        let slot = self.next.entry(source).or_insert(0);
        let sequence = *slot;
        *slot = slot.saturating_add(1);
        sequence
    }

    /// Renumbers `envelopes` in order, continuing each source's count.
    pub fn stamp(&mut self, envelopes: &mut [OutputEnvelope]) {
        for envelope in envelopes {
            envelope.sequence = self.next(envelope.source);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod output_tests {
        use super::*;

        #[test]
        fn kind_matches_category() {
            let command = Output::from(Command::ActivatePowerup {
                kind: PowerupKind::Heal,
            });
            let modifier = Output::from(Modifier::HealPlayer { amount: 3 });
            let event = Output::from(Event::PlayerDied);
            assert_eq!(command.kind(), OutputKind::Command);
            assert_eq!(modifier.kind(), OutputKind::Modifier);
            assert_eq!(event.kind(), OutputKind::Event);
            assert!(event.as_event().is_some());
            assert!(event.as_command().is_none());
        }

        #[test]
        fn event_entity_lookup() {
            let died = Event::MobDied {
                mob: EntityId::new(4),
                kind: MobKind::Coyote,
            };
            assert_eq!(died.entity(), Some(EntityId::new(4)));
            assert_eq!(Event::ShieldEnded.entity(), None);
        }
    }

    mod envelope_tests {
        use super::*;

        #[test]
        fn wrap_all_numbers_outputs_in_order() {
            let envelopes: Vec<_> = OutputEnvelope::wrap_all(
                vec![Event::PlayerDied.into(), Event::ShieldEnded.into()],
                OutputSource::Player,
                42,
            )
            .collect();
            assert_eq!(envelopes.len(), 2);
            assert_eq!(envelopes[0].sequence(), 0);
            assert_eq!(envelopes[1].sequence(), 1);
            assert_eq!(envelopes[1].time(), 42);
            assert_eq!(envelopes[1].source(), OutputSource::Player);
        }

        #[test]
        fn sequencer_counts_per_source() {
            let mut sequencer = Sequencer::new();
            let event = || Output::Event(Event::PlayerDied);
            let mut envelopes = vec![
                OutputEnvelope::new(event(), OutputSource::Resolver, 0, 0),
                OutputEnvelope::new(event(), OutputSource::Host, 0, 0),
                OutputEnvelope::new(event(), OutputSource::Resolver, 0, 0),
            ];
            sequencer.stamp(&mut envelopes);

            let numbered: Vec<_> = envelopes.iter().map(|e| (e.source(), e.sequence())).collect();
            assert_eq!(
                numbered,
                [
                    (OutputSource::Resolver, 0),
                    (OutputSource::Host, 0),
                    (OutputSource::Resolver, 1),
                ]
            );
            assert_eq!(sequencer.next(OutputSource::Resolver), 2);
        }

        #[test]
        fn source_display() {
            assert_eq!(OutputSource::Entity(EntityId::new(7)).to_string(), "entity:7");
            assert_eq!(OutputSource::Timer(ActionId::new(3)).to_string(), "timer:3");
        }

        #[test]
        fn serialization_roundtrip() {
            let envelope = OutputEnvelope::new(
                Output::Event(Event::WindowStarted {
                    window: WindowKind::Slow,
                }),
                OutputSource::Resolver,
                9,
                0,
            );
            let json = serde_json::to_string(&envelope).unwrap();
            let back: OutputEnvelope = serde_json::from_str(&json).unwrap();
            assert_eq!(back, envelope);
        }
    }
}
