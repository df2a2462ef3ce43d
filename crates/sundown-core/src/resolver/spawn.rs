//! Spawn resolver: turns fire commands into projectiles.

use tracing::debug;

use crate::entity::{EntityInner, Projectile};
use crate::output::{Command, Event, OutputEnvelope, OutputKind, OutputSource};
use crate::scheduler::Scheduler;
use crate::simulation::TimedTask;
use crate::world::World;

use super::Resolver;

/// Resolver for [`Command::SpawnProjectile`].
///
/// Projectiles are staged in the arena and start moving on the next tick.
#[derive(Debug, Clone, Default)]
pub struct SpawnResolver;

impl SpawnResolver {
    /// Creates a new spawn resolver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Resolver for SpawnResolver {
    fn handles(&self) -> &[OutputKind] {
        &[OutputKind::Command]
    }

    fn resolve(
        &self,
        outputs: &[&OutputEnvelope],
        world: &mut World,
        _timers: &mut Scheduler<TimedTask>,
    ) -> Vec<OutputEnvelope> {
        let mut follow_ups = Vec::new();
        for envelope in outputs {
            let Some(Command::SpawnProjectile {
                owner,
                faction,
                origin,
                dir,
            }) = envelope.output().as_command()
            else {
                continue;
            };
            let projectile = Projectile::new(
                *owner,
                *faction,
                *origin,
                *dir,
                &world.config.projectile,
                envelope.time(),
                world.config.animation.frame_interval,
            );
            let id = world.arena.queue_spawn(EntityInner::Projectile(projectile));
            debug!(projectile = %id, owner = ?owner, faction = ?faction, "projectile_fired");
            follow_ups.push(OutputEnvelope::new(
                Event::ProjectileFired {
                    projectile: id,
                    owner: *owner,
                }
                .into(),
                OutputSource::Resolver,
                envelope.time(),
                0,
            ));
        }
        follow_ups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::entity::{EntityId, Faction};
    use crate::output::Output;
    use glam::IVec2;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn spawn_command_stages_projectile_and_reports_it() {
        let mut world = World::new(SimConfig::default(), ChaCha8Rng::seed_from_u64(1));
        let mut timers = Scheduler::new();
        let envelope = OutputEnvelope::new(
            Command::SpawnProjectile {
                owner: Some(EntityId::new(9)),
                faction: Faction::Mob,
                origin: IVec2::new(200, 200),
                dir: -1,
            }
            .into(),
            OutputSource::Host,
            50,
            0,
        );

        let follow_ups = SpawnResolver::new().resolve(&[&envelope], &mut world, &mut timers);

        assert_eq!(world.arena().pending_len(), 1);
        assert_eq!(follow_ups.len(), 1);
        let Output::Event(Event::ProjectileFired { projectile, owner }) = follow_ups[0].output()
        else {
            panic!("expected ProjectileFired, got {:?}", follow_ups[0].output());
        };
        assert_eq!(*owner, Some(EntityId::new(9)));

        world.arena.flush();
        let spawned = world.arena().get(*projectile).and_then(|e| e.as_projectile()).unwrap();
        assert_eq!(spawned.dir(), -1);
        assert_eq!(spawned.faction(), Faction::Mob);
    }

    #[test]
    fn other_commands_are_skipped() {
        let mut world = World::new(SimConfig::default(), ChaCha8Rng::seed_from_u64(1));
        let envelope = OutputEnvelope::new(
            Command::ActivatePowerup {
                kind: crate::entity::PowerupKind::Heal,
            }
            .into(),
            OutputSource::Host,
            0,
            0,
        );
        let mut timers = Scheduler::new();
        let follow_ups = SpawnResolver::new().resolve(&[&envelope], &mut world, &mut timers);
        assert!(follow_ups.is_empty());
        assert_eq!(world.arena().pending_len(), 0);
    }
}
