//! Event resolver for the host-facing event log.
//!
//! The `EventResolver` does not mutate game state. It appends every event
//! output to the world's log, which the host drains with
//! [`Simulation::take_events`](crate::simulation::Simulation::take_events)
//! to trigger sounds, effects and score keeping.

use tracing::trace;

use crate::output::{OutputEnvelope, OutputKind};
use crate::scheduler::Scheduler;
use crate::simulation::TimedTask;
use crate::world::World;

use super::Resolver;

/// Resolver that records event outputs.
///
/// # Example
///
/// ```
/// use sundown_core::resolver::{EventResolver, Resolver};
/// use sundown_core::output::OutputKind;
///
/// let resolver = EventResolver::new();
/// assert!(resolver.handles().contains(&OutputKind::Event));
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventResolver;

impl EventResolver {
    /// Creates a new event resolver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Resolver for EventResolver {
    fn handles(&self) -> &[OutputKind] {
        &[OutputKind::Event]
    }

    fn resolve(
        &self,
        outputs: &[&OutputEnvelope],
        world: &mut World,
        _timers: &mut Scheduler<TimedTask>,
    ) -> Vec<OutputEnvelope> {
        for envelope in outputs {
            if let Some(event) = envelope.output().as_event() {
                trace!(source = %envelope.source(), event = ?event, "event_recorded");
                world.events.push((*envelope).clone());
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::entity::EntityId;
    use crate::output::{Event, Modifier, OutputSource};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn records_events_in_order_and_skips_others() {
        let mut world = World::new(SimConfig::default(), ChaCha8Rng::seed_from_u64(0));
        let first = OutputEnvelope::new(Event::PlayerDied.into(), OutputSource::Player, 5, 0);
        let modifier = OutputEnvelope::new(
            Modifier::HealPlayer { amount: 3 }.into(),
            OutputSource::Host,
            5,
            0,
        );
        let second = OutputEnvelope::new(
            Event::DeathEffect {
                entity: EntityId::new(2),
                position: glam::IVec2::ZERO,
            }
            .into(),
            OutputSource::Resolver,
            5,
            1,
        );

        let mut timers = Scheduler::new();
        let follow_ups =
            EventResolver::new().resolve(&[&first, &modifier, &second], &mut world, &mut timers);

        assert!(follow_ups.is_empty());
        assert_eq!(world.events(), &[first, second]);
    }
}
