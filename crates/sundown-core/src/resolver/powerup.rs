//! Powerup resolver: applies collected powerups.
//!
//! | Kind   | Effect                                              |
//! |--------|-----------------------------------------------------|
//! | Heal   | follow-up [`Modifier::HealPlayer`]                  |
//! | Shield | player invulnerable until an `EndShield` timer fires |
//! | Slow, Freeze, Frenzy | opens a speed window until an `EndWindow` timer fires |
//!
//! Collecting a timed powerup while its effect is active restarts the timer
//! from the current tick.

use tracing::debug;

use crate::context::WindowKind;
use crate::entity::PowerupKind;
use crate::output::{Command, Event, Modifier, OutputEnvelope, OutputKind, OutputSource};
use crate::scheduler::Scheduler;
use crate::simulation::TimedTask;
use crate::world::World;

use super::Resolver;

/// Resolver for [`Command::ActivatePowerup`].
#[derive(Debug, Clone, Default)]
pub struct PowerupResolver;

impl PowerupResolver {
    /// Creates a new powerup resolver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn open_window(world: &mut World, timers: &mut Scheduler<TimedTask>, window: WindowKind) {
        if let Some(previous) = world.window_timers.remove(&window) {
            timers.remove(previous);
        }
        world.windows.set(window, true);
        let timer = timers.add(
            world.config.powerup.window_duration,
            false,
            TimedTask::EndWindow(window),
        );
        world.window_timers.insert(window, timer);
    }

    fn raise_shield(world: &mut World, timers: &mut Scheduler<TimedTask>) {
        if let Some(previous) = world.shield_timer.take() {
            timers.remove(previous);
        }
        world.player.set_invulnerable(true);
        world.shield_timer = Some(timers.add(
            world.config.powerup.shield_duration,
            false,
            TimedTask::EndShield,
        ));
    }
}

impl Resolver for PowerupResolver {
    fn handles(&self) -> &[OutputKind] {
        &[OutputKind::Command]
    }

    fn resolve(
        &self,
        outputs: &[&OutputEnvelope],
        world: &mut World,
        timers: &mut Scheduler<TimedTask>,
    ) -> Vec<OutputEnvelope> {
        let mut follow_ups = Vec::new();
        for envelope in outputs {
            let Some(Command::ActivatePowerup { kind }) = envelope.output().as_command() else {
                continue;
            };
            let now = envelope.time();
            debug!(kind = %kind, "powerup_activated");
            match kind {
                PowerupKind::Heal => {
                    let amount = world.config.powerup.heal_amount;
                    follow_ups.push(OutputEnvelope::new(
                        Modifier::HealPlayer { amount }.into(),
                        OutputSource::Resolver,
                        now,
                        0,
                    ));
                }
                PowerupKind::Shield => Self::raise_shield(world, timers),
                PowerupKind::Slow | PowerupKind::Freeze | PowerupKind::Frenzy => {
                    if let Some(window) = kind.window() {
                        Self::open_window(world, timers, window);
                        follow_ups.push(OutputEnvelope::new(
                            Event::WindowStarted { window }.into(),
                            OutputSource::Resolver,
                            now,
                            0,
                        ));
                    }
                }
            }
        }
        follow_ups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::output::Output;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn activate(kind: PowerupKind) -> OutputEnvelope {
        OutputEnvelope::new(Command::ActivatePowerup { kind }.into(), OutputSource::Host, 0, 0)
    }

    fn world() -> World {
        World::new(SimConfig::default(), ChaCha8Rng::seed_from_u64(3))
    }

    #[test]
    fn heal_becomes_a_modifier() {
        let mut world = world();
        let heal = activate(PowerupKind::Heal);
        let mut timers = Scheduler::new();
        let follow_ups = PowerupResolver::new().resolve(&[&heal], &mut world, &mut timers);
        assert_eq!(
            follow_ups[0].output(),
            &Output::Modifier(Modifier::HealPlayer {
                amount: SimConfig::default().powerup.heal_amount
            })
        );
    }

    #[test]
    fn shield_sets_invulnerability_and_timer() {
        let mut world = world();
        let mut timers = Scheduler::new();
        PowerupResolver::new().resolve(&[&activate(PowerupKind::Shield)], &mut world, &mut timers);

        assert!(world.player().is_invulnerable());
        let timer = world.shield_timer().unwrap();
        assert!(timers.contains(timer));
    }

    #[test]
    fn repeated_window_replaces_its_timer() {
        let mut world = world();
        let mut timers = Scheduler::new();
        let resolver = PowerupResolver::new();

        resolver.resolve(&[&activate(PowerupKind::Freeze)], &mut world, &mut timers);
        let first = world.window_timer(WindowKind::ZeroSpeed).unwrap();
        resolver.resolve(&[&activate(PowerupKind::Freeze)], &mut world, &mut timers);
        let second = world.window_timer(WindowKind::ZeroSpeed).unwrap();
        timers.update(0, |_, _, _| true);

        assert_ne!(first, second);
        assert!(!timers.contains(first));
        assert!(timers.contains(second));
        assert!(world.windows().zero_speed);
    }
}
