//! Combat resolver for damage and healing.
//!
//! The same rules apply to the player and to mobs, via [`Vitality`]:
//! - Negative amounts are silently ignored.
//! - Strength is clamped at 0.
//! - Reaching 0 kills exactly once; later damage is a no-op.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::entity::Entity;
use crate::output::{Modifier, OutputEnvelope, OutputKind, OutputSource};
use crate::scheduler::Scheduler;
use crate::simulation::TimedTask;
use crate::world::World;

use super::Resolver;

// =============================================================================
// Vitality
// =============================================================================

/// Result of [`Vitality::reduce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// Negative amount or already dead; nothing changed.
    Ignored,
    /// Took damage and survived.
    Damaged {
        /// Strength left.
        remaining: i32,
    },
    /// This reduction brought strength to 0.
    Died,
}

/// Health or strength pool with the shared clamp-and-die-once rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vitality {
    value: i32,
    max: i32,
    alive: bool,
}

impl Vitality {
    /// Creates a full pool. A non-positive `max` yields a dead pool.
    #[must_use]
    pub fn new(max: i32) -> Self {
        let max = max.max(0);
        Self {
            value: max,
            max,
            alive: max > 0,
        }
    }

    /// Current value.
    #[must_use]
    pub const fn value(&self) -> i32 {
        self.value
    }

    /// Upper bound for healing.
    #[must_use]
    pub const fn max(&self) -> i32 {
        self.max
    }

    /// False once the pool reached 0 or [`kill`](Self::kill) was called.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Subtracts `amount`, clamping at 0.
    pub fn reduce(&mut self, amount: i32) -> Reduction {
        if amount < 0 || !self.alive {
            return Reduction::Ignored;
        }
        self.value = self.value.saturating_sub(amount).max(0);
        if self.value == 0 {
            self.alive = false;
            Reduction::Died
        } else {
            Reduction::Damaged {
                remaining: self.value,
            }
        }
    }

    /// Adds `amount` without exceeding `min(max, cap)`, and never lowers a
    /// value already above the cap. Returns the strength actually restored.
    pub fn heal(&mut self, amount: i32, cap: i32) -> i32 {
        if amount < 0 || !self.alive {
            return 0;
        }
        let ceiling = self.max.min(cap);
        let healed = self.value.saturating_add(amount).min(ceiling).max(self.value);
        let restored = healed - self.value;
        self.value = healed;
        restored
    }

    /// Marks the pool dead without changing its value. Returns false if it
    /// was already dead.
    pub fn kill(&mut self) -> bool {
        std::mem::replace(&mut self.alive, false)
    }
}

// =============================================================================
// CombatResolver
// =============================================================================

/// Resolver for damage and healing modifiers.
///
/// Modifiers are applied in output order. Each application may produce
/// follow-up events (damage indicators, death effects) which are returned
/// for the event resolver.
///
/// # Example
///
/// ```
/// use sundown_core::resolver::{CombatResolver, Resolver};
/// use sundown_core::output::OutputKind;
///
/// let resolver = CombatResolver::new();
/// assert!(resolver.handles().contains(&OutputKind::Modifier));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CombatResolver;

impl CombatResolver {
    /// Creates a new combat resolver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Resolver for CombatResolver {
    fn handles(&self) -> &[OutputKind] {
        &[OutputKind::Modifier]
    }

    fn resolve(
        &self,
        outputs: &[&OutputEnvelope],
        world: &mut World,
        _timers: &mut Scheduler<TimedTask>,
    ) -> Vec<OutputEnvelope> {
        let mut follow_ups = Vec::new();
        for envelope in outputs {
            let Some(modifier) = envelope.output().as_modifier() else {
                continue;
            };
            let now = envelope.time();
            let mut produced = Vec::new();
            match modifier {
                Modifier::DamagePlayer { amount, source } => {
                    trace!(amount, source = ?source, "damage_player");
                    world.player.reduce_strength(*amount, now, &mut produced);
                }
                Modifier::DamageMob { target, amount } => {
                    if let Some(mob) = world.arena.get_mut(*target).and_then(Entity::as_mob_mut) {
                        mob.reduce_health(*target, *amount, now, &mut produced);
                    }
                }
                Modifier::HealPlayer { amount } => {
                    let cap = world.config.difficulty.heal_cap.get(world.difficulty);
                    world.player.heal(*amount, cap, &mut produced);
                }
            }
            follow_ups.extend(OutputEnvelope::wrap_all(
                produced,
                OutputSource::Resolver,
                now,
            ));
        }
        follow_ups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod vitality_tests {
        use super::*;

        #[test]
        fn reduce_clamps_at_zero_and_dies_once() {
            let mut vitality = Vitality::new(10);
            assert_eq!(vitality.reduce(4), Reduction::Damaged { remaining: 6 });
            assert_eq!(vitality.reduce(50), Reduction::Died);
            assert_eq!(vitality.value(), 0);
            assert!(!vitality.is_alive());
            assert_eq!(vitality.reduce(5), Reduction::Ignored);
            assert_eq!(vitality.value(), 0);
        }

        #[test]
        fn negative_amounts_are_ignored() {
            let mut vitality = Vitality::new(10);
            assert_eq!(vitality.reduce(-5), Reduction::Ignored);
            assert_eq!(vitality.heal(-5, 100), 0);
            assert_eq!(vitality.value(), 10);
        }

        #[test]
        fn heal_respects_cap_and_max() {
            let mut vitality = Vitality::new(100);
            vitality.reduce(70);
            assert_eq!(vitality.heal(50, 60), 30);
            assert_eq!(vitality.value(), 60);
            assert_eq!(vitality.heal(50, 60), 0);

            let mut above_cap = Vitality::new(100);
            above_cap.reduce(10);
            assert_eq!(above_cap.heal(5, 60), 0);
            assert_eq!(above_cap.value(), 90);
        }

        #[test]
        fn dead_pool_does_not_heal() {
            let mut vitality = Vitality::new(3);
            vitality.reduce(3);
            assert_eq!(vitality.heal(10, 100), 0);
            assert_eq!(vitality.value(), 0);
        }

        #[test]
        fn kill_reports_first_transition_only() {
            let mut vitality = Vitality::new(5);
            assert!(vitality.kill());
            assert!(!vitality.kill());
            assert_eq!(vitality.value(), 5);
            assert_eq!(vitality.reduce(1), Reduction::Ignored);
        }
    }

    proptest! {
        #[test]
        fn strength_never_negative_and_death_reported_once(
            max in 1..500i32,
            hits in proptest::collection::vec(-50..200i32, 1..40),
        ) {
            let mut vitality = Vitality::new(max);
            let mut deaths = 0;
            for hit in hits {
                if vitality.reduce(hit) == Reduction::Died {
                    deaths += 1;
                }
                prop_assert!(vitality.value() >= 0);
            }
            prop_assert!(deaths <= 1);
            prop_assert_eq!(deaths == 1, !vitality.is_alive());
        }
    }
}
