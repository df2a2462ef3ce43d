//! Simulation module with the per-frame execution loop.
//!
//! The `Simulation` struct orchestrates the Entity-Output-Resolver
//! architecture. Each call to [`Simulation::step`] runs:
//!
//! 1. **TIMERS**: The scheduler fires due actions (mob shots, window and
//!    shield expiry)
//! 2. **PLAYER**: The player moves according to host input
//! 3. **ENTITIES**: Every arena entity updates in id order against a
//!    read-only [`TickContext`], emitting outputs
//! 4. **HITS**: Player projectiles overlapping mobs become damage modifiers
//! 5. **RESOLUTION**: Resolvers apply the outputs in a fixed order
//! 6. **CLEANUP**: Removable entities leave the arena and staged spawns join
//!
//! The host supplies a monotonic timestamp in nanoseconds per frame; every
//! timed behavior (animation, scheduler, powerup lifetime) reads it.
//!
//! # Example
//!
//! ```
//! use sundown_core::simulation::Simulation;
//! use sundown_core::config::{MobKind, SimConfig};
//! use sundown_core::map::OpenField;
//! use glam::IVec2;
//!
//! let mut sim = Simulation::new(SimConfig::default(), OpenField, 42);
//! let cactus = sim.spawn_mob(MobKind::Cactus, IVec2::new(600, 300));
//!
//! for frame in 0..10u64 {
//!     sim.step(frame * 16_666_667);
//! }
//!
//! assert!(sim.mob(cactus).is_some());
//! ```

use std::fmt;

use glam::IVec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::arena::Arena;
use crate::config::{ConfigError, Difficulty, MobKind, SimConfig};
use crate::context::{SpeedWindows, TickContext, WindowKind};
use crate::entity::{
    Entity, EntityId, EntityInner, Faction, Mob, MobRolls, Player, PlayerInput, Powerup,
    PowerupKind,
};
use crate::map::Passability;
use crate::output::{
    Command, Event, Modifier, Output, OutputEnvelope, OutputSource, Sequencer,
};
use crate::render::DrawSink;
use crate::resolver::{CombatResolver, EventResolver, PowerupResolver, Resolver, SpawnResolver};
use crate::scheduler::Scheduler;
use crate::world::World;

// =============================================================================
// TimedTask
// =============================================================================

/// Payload of a scheduler action.
///
/// Tasks name their targets by id; a task whose target is gone retires
/// itself when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimedTask {
    /// Fire a projectile from a shooter mob.
    MobShoot(EntityId),
    /// Close a speed window.
    EndWindow(WindowKind),
    /// Drop the player's shield.
    EndShield,
}

// =============================================================================
// Simulation
// =============================================================================

/// The main simulation orchestrator.
///
/// `Simulation` manages:
/// - The scheduler for timed actions
/// - The [`World`]: arena, player, speed windows, RNG and event log
/// - The passability query for the current level
/// - Resolvers for output processing
///
/// # Determinism
///
/// Given the same seed, configuration, host timestamps and host calls, the
/// simulation produces identical results. This is achieved by:
/// - Iterating entities in id order (`BTreeMap`)
/// - Running resolvers in a fixed order over outputs in emission order
/// - Drawing all randomness from one seeded `ChaCha8Rng`
pub struct Simulation {
    /// Timed actions.
    scheduler: Scheduler<TimedTask>,
    /// State mutated by the tick phases and resolvers.
    world: World,
    /// Level geometry.
    map: Box<dyn Passability>,
    /// Resolvers that process outputs, in execution order.
    resolvers: Vec<Box<dyn Resolver>>,
    /// Outputs submitted by the host since the last step.
    pending: Vec<(OutputSource, Output)>,
    /// Seed the RNG was created from.
    seed: u64,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("scheduler", &self.scheduler)
            .field("world", &self.world)
            .field("resolvers", &format!("[{} resolvers]", self.resolvers.len()))
            .field("pending", &self.pending)
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Creates a simulation with an empty arena and a fresh player.
    ///
    /// The configuration is trusted as given; use [`try_new`](Self::try_new)
    /// for configurations loaded from outside.
    ///
    /// # Arguments
    ///
    /// * `config` - Tuning for every entity kind
    /// * `map` - Passability query for the level
    /// * `seed` - Seed for spawn rolls
    #[must_use]
    pub fn new(config: SimConfig, map: impl Passability + 'static, seed: u64) -> Self {
        info!(seed, mobs = config.mobs.len(), "simulation_created");
        Self {
            scheduler: Scheduler::new(),
            world: World::new(config, ChaCha8Rng::seed_from_u64(seed)),
            map: Box::new(map),
            resolvers: vec![
                Box::new(SpawnResolver::new()),
                Box::new(PowerupResolver::new()),
                Box::new(CombatResolver::new()),
                Box::new(EventResolver::new()),
            ],
            pending: Vec::new(),
            seed,
        }
    }

    /// Validates `config`, then creates a simulation.
    ///
    /// # Errors
    ///
    /// Returns the first invariant `config` violates.
    pub fn try_new(
        config: SimConfig,
        map: impl Passability + 'static,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config, map, seed))
    }

    // =========================================================================
    // Step
    // =========================================================================

    /// Advances the simulation to `now`.
    ///
    /// # Arguments
    ///
    /// * `now` - Monotonic host timestamp in nanoseconds
    pub fn step(&mut self, now: u64) {
        let mut sequencer = Sequencer::new();
        let mut outputs: Vec<OutputEnvelope> = self
            .pending
            .drain(..)
            .map(|(source, output)| {
                let sequence = sequencer.next(source);
                OutputEnvelope::new(output, source, now, sequence)
            })
            .collect();
        let mut stamped = outputs.len();

        // PHASE 1: TIMERS
        let world = &mut self.world;
        self.scheduler.update(now, |staging, action, task| {
            world.run_task(action, task, now, staging, &mut outputs)
        });
        sequencer.stamp(&mut outputs[stamped..]);
        stamped = outputs.len();

        // PHASE 2: PLAYER
        let bounds = self.world.config.map.bounds;
        self.world.player.update(now, self.map.as_ref(), bounds);

        // PHASE 3: ENTITIES
        self.update_entities(now, &mut outputs);
        sequencer.stamp(&mut outputs[stamped..]);
        stamped = outputs.len();

        // PHASE 4: HITS
        for hit in self.world.arena.projectile_hits() {
            if let Some(projectile) = self
                .world
                .arena
                .get_mut(hit.projectile)
                .and_then(Entity::as_projectile_mut)
            {
                projectile.spend();
            }
            outputs.push(OutputEnvelope::new(
                Modifier::DamageMob {
                    target: hit.mob,
                    amount: hit.damage,
                }
                .into(),
                OutputSource::Entity(hit.projectile),
                now,
                0,
            ));
        }
        sequencer.stamp(&mut outputs[stamped..]);
        stamped = outputs.len();

        // PHASE 5: RESOLUTION
        for resolver in &self.resolvers {
            let relevant: Vec<_> = outputs
                .iter()
                .filter(|o| resolver.handles().contains(&o.output().kind()))
                .collect();
            if relevant.is_empty() {
                continue;
            }
            let follow_ups = resolver.resolve(&relevant, &mut self.world, &mut self.scheduler);
            outputs.extend(follow_ups);
            sequencer.stamp(&mut outputs[stamped..]);
            stamped = outputs.len();
        }
        trace!(now, outputs = outputs.len(), "tick_resolved");

        // PHASE 6: CLEANUP
        self.remove_finished(now, &mut sequencer);
        self.world.arena.flush();
    }

    fn update_entities(&mut self, now: u64, outputs: &mut Vec<OutputEnvelope>) {
        let world = &mut self.world;
        let ctx = TickContext {
            now,
            difficulty: world.difficulty,
            windows: world.windows,
            player: world.player.view(),
            map: self.map.as_ref(),
            config: &world.config,
        };
        let mut produced = Vec::new();
        for entity in world.arena.entities_sorted_mut() {
            entity.update(&ctx, &mut produced);
            if !produced.is_empty() {
                outputs.extend(OutputEnvelope::wrap_all(
                    produced.drain(..),
                    OutputSource::Entity(entity.id()),
                    now,
                ));
            }
        }
    }

    fn remove_finished(&mut self, now: u64, sequencer: &mut Sequencer) {
        let finished: Vec<EntityId> = self
            .world
            .arena
            .entities_sorted()
            .filter(|e| e.is_removable())
            .map(Entity::id)
            .collect();
        for id in finished {
            if let Some(mob) = self.world.arena.get(id).and_then(Entity::as_mob) {
                if let Some(timer) = mob.shoot_timer() {
                    self.scheduler.remove(timer);
                }
                let kind = mob.kind();
                debug!(mob = %id, kind = ?kind, "mob_removed");
                let source = OutputSource::Entity(id);
                self.world.events.push(OutputEnvelope::new(
                    Event::MobRemoved { mob: id, kind }.into(),
                    source,
                    now,
                    sequencer.next(source),
                ));
            }
            self.world.arena.queue_despawn(id);
        }
    }

    // =========================================================================
    // Host API
    // =========================================================================

    /// Spawns a mob with stats rolled from its profile and the current
    /// difficulty.
    pub fn spawn_mob(&mut self, kind: MobKind, position: IVec2) -> EntityId {
        let rolls = {
            let world = &mut self.world;
            let profile = world.config.profile(kind);
            MobRolls::roll(&profile, &world.config.difficulty, world.difficulty, &mut world.rng)
        };
        self.spawn_mob_with(kind, position, rolls)
    }

    /// Spawns a mob with explicit stats. Shooters get an auto-reset shoot
    /// timer that the mob's removal cancels.
    pub fn spawn_mob_with(&mut self, kind: MobKind, position: IVec2, rolls: MobRolls) -> EntityId {
        let now = self.clock();
        let world = &mut self.world;
        let mob = Mob::spawn(
            kind,
            &world.config.profile(kind),
            position,
            rolls,
            now,
            world.config.animation.frame_interval,
        );
        let shooter = mob.is_shooter();
        let id = world.arena.spawn(EntityInner::Mob(mob));
        if shooter {
            let timer = self
                .scheduler
                .add(rolls.shoot_interval, true, TimedTask::MobShoot(id));
            if let Some(mob) = world.arena.get_mut(id).and_then(Entity::as_mob_mut) {
                mob.set_shoot_timer(timer);
            }
        }
        debug!(
            mob = %id,
            kind = ?kind,
            x = position.x,
            y = position.y,
            health = rolls.health,
            chases = rolls.chases,
            shooter,
            "mob_spawned"
        );
        id
    }

    /// Spawns a powerup whose lifetime starts at the last step.
    pub fn spawn_powerup(&mut self, kind: PowerupKind, position: IVec2) -> EntityId {
        let now = self.clock();
        let config = &self.world.config;
        let powerup = Powerup::new(
            kind,
            position,
            now,
            &config.powerup,
            config.animation.frame_interval,
        );
        let id = self.world.arena.spawn(EntityInner::Powerup(powerup));
        debug!(powerup = %id, kind = %kind, "powerup_spawned");
        id
    }

    /// Spawns a powerup by numeric kind id. Unknown ids are ignored.
    pub fn spawn_powerup_by_id(&mut self, id: u8, position: IVec2) -> Option<EntityId> {
        let Some(kind) = PowerupKind::from_id(id) else {
            debug!(id, "unknown_powerup_ignored");
            return None;
        };
        Some(self.spawn_powerup(kind, position))
    }

    /// Sets the player's movement input.
    pub fn set_player_input(&mut self, input: PlayerInput) {
        self.world.player.set_input(input);
    }

    /// Fires a player projectile from the player's center in the facing
    /// direction. The shot spawns during the next step. Returns false if the
    /// player is dead.
    pub fn player_fire(&mut self) -> bool {
        let player = &self.world.player;
        if !player.is_alive() {
            return false;
        }
        let command = Command::SpawnProjectile {
            owner: None,
            faction: Faction::Player,
            origin: player.body().bounds().center(),
            dir: player.facing(),
        };
        self.pending.push((OutputSource::Player, command.into()));
        true
    }

    /// Queues an output to be resolved during the next step.
    pub fn submit(&mut self, output: impl Into<Output>) {
        self.pending.push((OutputSource::Host, output.into()));
    }

    /// Drains the events resolved since the last call, in resolution order.
    pub fn take_events(&mut self) -> Vec<OutputEnvelope> {
        std::mem::take(&mut self.world.events)
    }

    /// Emits draw requests for every visible entity in id order, then the
    /// player.
    pub fn draw(&self, sink: &mut impl DrawSink) {
        for sprite in self.world.arena.entities_sorted().filter_map(Entity::sprite) {
            sink.draw_sprite(&sprite);
        }
        if let Some(sprite) = self.world.player.sprite() {
            sink.draw_sprite(&sprite);
        }
    }

    /// Changes the difficulty used by later spawns and heals.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        debug!(difficulty = ?difficulty, "difficulty_changed");
        self.world.difficulty = difficulty;
    }

    /// Adds a resolver after the built-in ones.
    pub fn add_resolver(&mut self, resolver: Box<dyn Resolver>) {
        self.resolvers.push(resolver);
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Timestamp of the last step, or 0 before the first.
    #[must_use]
    pub fn clock(&self) -> u64 {
        self.scheduler.last_tick().unwrap_or(0)
    }

    /// Active difficulty.
    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.world.difficulty
    }

    /// Returns a reference to the arena.
    #[must_use]
    pub const fn arena(&self) -> &Arena {
        &self.world.arena
    }

    /// Returns a mutable reference to the arena, for test and editor setup.
    #[must_use]
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.world.arena
    }

    /// A mob by id.
    #[must_use]
    pub fn mob(&self, id: EntityId) -> Option<&Mob> {
        self.world.arena.get(id).and_then(Entity::as_mob)
    }

    /// The player.
    #[must_use]
    pub const fn player(&self) -> &Player {
        &self.world.player
    }

    /// Mutable access to the player.
    #[must_use]
    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.world.player
    }

    /// Global speed windows.
    #[must_use]
    pub const fn windows(&self) -> SpeedWindows {
        self.world.windows
    }

    /// The scheduler.
    #[must_use]
    pub const fn scheduler(&self) -> &Scheduler<TimedTask> {
        &self.scheduler
    }

    /// The world.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.world.config
    }

    /// Seed the RNG was created from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the number of resolvers in the simulation.
    #[must_use]
    pub fn resolver_count(&self) -> usize {
        self.resolvers.len()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PerDifficulty, Span};
    use crate::map::OpenField;
    use crate::output::OutputKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn sim() -> Simulation {
        Simulation::new(SimConfig::default(), OpenField, 42)
    }

    mod construction_tests {
        use super::*;

        #[test]
        fn new_creates_simulation() {
            let sim = sim();
            assert!(sim.arena().is_empty());
            assert_eq!(sim.seed(), 42);
            assert_eq!(sim.resolver_count(), 4);
            assert_eq!(sim.clock(), 0);
            assert_eq!(sim.difficulty(), Difficulty::Medium);
        }

        #[test]
        fn try_new_rejects_invalid_config() {
            let mut config = SimConfig::default();
            config.speed.min_speed = 10;
            config.speed.max_speed = 1;
            assert!(Simulation::try_new(config, OpenField, 1).is_err());
            assert!(Simulation::try_new(SimConfig::default(), OpenField, 1).is_ok());
        }

        #[test]
        fn try_new_rejects_mobs_spawned_dead() {
            let mut config = SimConfig::default();
            if let Some(profile) = config.mobs.get_mut(&MobKind::Coyote) {
                profile.health = Span::new(0, 0);
            }
            assert!(matches!(
                Simulation::try_new(config, OpenField, 1),
                Err(ConfigError::NotPositive { .. })
            ));
        }

        #[test]
        fn unvalidated_nan_chances_spawn_without_chasing() {
            let mut config = SimConfig::default();
            let nan = PerDifficulty::new(f64::NAN, f64::NAN, f64::NAN);
            config.difficulty.chase_chance = nan;
            config.difficulty.shoot_chance = nan;
            assert!(config.validate().is_err());

            let mut sim = Simulation::new(config, OpenField, 1);
            let coyote = sim.spawn_mob(MobKind::Coyote, IVec2::new(400, 100));
            let cowboy = sim.spawn_mob(MobKind::Cowboy, IVec2::new(600, 100));
            sim.step(0);

            assert_eq!(sim.mob(coyote).map(Mob::is_chase_capable), Some(false));
            assert_eq!(sim.mob(cowboy).map(Mob::is_shooter), Some(false));
        }
    }

    mod step_tests {
        use super::*;

        #[test]
        fn step_with_no_entities() {
            let mut sim = sim();
            sim.step(0);
            sim.step(100);
            assert_eq!(sim.clock(), 100);
            assert!(sim.take_events().is_empty());
        }

        struct CountingResolver {
            seen: Arc<AtomicUsize>,
        }

        impl Resolver for CountingResolver {
            fn handles(&self) -> &[OutputKind] {
                &[OutputKind::Modifier]
            }

            fn resolve(
                &self,
                outputs: &[&OutputEnvelope],
                _world: &mut World,
                _timers: &mut Scheduler<TimedTask>,
            ) -> Vec<OutputEnvelope> {
                self.seen.fetch_add(outputs.len(), Ordering::SeqCst);
                Vec::new()
            }
        }

        #[test]
        fn resolver_receives_only_relevant_outputs() {
            let mut sim = sim();
            let seen = Arc::new(AtomicUsize::new(0));
            sim.add_resolver(Box::new(CountingResolver { seen: Arc::clone(&seen) }));

            sim.submit(Modifier::HealPlayer { amount: 1 });
            sim.submit(Event::PlayerDied);
            sim.step(0);

            assert_eq!(seen.load(Ordering::SeqCst), 1);
        }

        #[test]
        fn host_outputs_are_stamped_with_step_time() {
            let mut sim = sim();
            sim.submit(Event::ShieldEnded);
            sim.step(777);
            let events = sim.take_events();
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].time(), 777);
            assert_eq!(events[0].source(), OutputSource::Host);
        }

        #[test]
        fn sequences_count_up_per_source() {
            let mut sim = sim();
            for kind in [PowerupKind::Slow, PowerupKind::Freeze, PowerupKind::Frenzy] {
                sim.submit(Command::ActivatePowerup { kind });
            }
            sim.submit(Event::ShieldEnded);
            sim.submit(Event::ShieldEnded);
            sim.step(0);

            let events = sim.take_events();
            let sequences = |source: OutputSource| -> Vec<u32> {
                events
                    .iter()
                    .filter(|e| e.source() == source)
                    .map(OutputEnvelope::sequence)
                    .collect()
            };
            assert_eq!(sequences(OutputSource::Host), [0, 1]);
            assert_eq!(sequences(OutputSource::Resolver), [0, 1, 2]);
        }
    }

    mod determinism_tests {
        use super::*;

        fn run(seed: u64) -> Vec<(i32, i32, bool, bool)> {
            let mut sim = Simulation::new(SimConfig::default(), OpenField, seed);
            let ids: Vec<_> = (0..8)
                .map(|i| sim.spawn_mob(MobKind::Cowboy, IVec2::new(200 + i * 90, 400)))
                .collect();
            for frame in 0..30u64 {
                sim.step(frame * 50_000_000);
            }
            ids.iter()
                .filter_map(|id| sim.mob(*id))
                .map(|mob| {
                    let position = mob.body().position();
                    (position.x, mob.health(), mob.is_chase_capable(), mob.is_shooter())
                })
                .collect()
        }

        #[test]
        fn same_seed_same_results() {
            assert_eq!(run(9), run(9));
        }
    }
}
