//! Test helper functions for setting up simulations and entities.

use glam::IVec2;

use crate::config::{MobKind, SimConfig};
use crate::entity::{Entity, EntityId, MobRolls};
use crate::map::{OpenField, Passability};
use crate::output::{Event, OutputEnvelope};
use crate::simulation::Simulation;

/// Frame interval of the default configuration.
pub const FRAME: u64 = crate::NANOS_PER_SECOND / 10;

/// A simulation on an open field with the default configuration.
pub fn open_sim() -> Simulation {
    Simulation::new(SimConfig::default(), OpenField, 42)
}

/// A simulation on a custom map with the default configuration.
pub fn sim_on(map: impl Passability + 'static) -> Simulation {
    Simulation::new(SimConfig::default(), map, 42)
}

/// Deterministic stats: a patrolling, non-shooting mob.
pub fn walker(health: i32, speed: i32) -> MobRolls {
    MobRolls {
        health,
        speed,
        chases: false,
        shoots: false,
        shoot_interval: crate::NANOS_PER_SECOND,
        facing: 1,
    }
}

/// Deterministic stats: a stationary shooter firing every `interval`.
pub fn gunner(health: i32, interval: u64) -> MobRolls {
    MobRolls {
        health,
        speed: 0,
        chases: false,
        shoots: true,
        shoot_interval: interval,
        facing: 1,
    }
}

/// Spawns a mob and moves it so its collider is centered vertically on `y`.
pub fn spawn_mob_centered_on_row(
    sim: &mut Simulation,
    kind: MobKind,
    x: i32,
    y: i32,
    rolls: MobRolls,
) -> EntityId {
    let id = sim.spawn_mob_with(kind, IVec2::new(x, y), rolls);
    if let Some(mob) = sim.arena_mut().get_mut(id).and_then(Entity::as_mob_mut) {
        let offset = y - mob.body().collider().center().y;
        mob.body_mut().translate(0, offset);
    }
    id
}

/// Moves the player so its collider's top-left corner sits on `target`.
pub fn put_player_collider_at(sim: &mut Simulation, target: IVec2) {
    let body = sim.player().body();
    let collider = body.collider();
    let offset = IVec2::new(collider.x, collider.y) - body.position();
    sim.player_mut().body_mut().set_position(target - offset);
}

/// Steps from `from` in `FRAME` increments, `count` times. Returns the last
/// timestamp stepped.
pub fn step_frames(sim: &mut Simulation, from: u64, count: u64) -> u64 {
    let mut now = from;
    for i in 0..count {
        now = from + i * FRAME;
        sim.step(now);
    }
    now
}

/// Extracts the events of a drained log.
pub fn events(log: &[OutputEnvelope]) -> Vec<Event> {
    log.iter()
        .filter_map(|envelope| envelope.output().as_event().cloned())
        .collect()
}
