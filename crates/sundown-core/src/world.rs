//! Mutable simulation state shared by the tick phases and the resolvers.
//!
//! [`Simulation`](crate::simulation::Simulation) owns the scheduler and the
//! map; everything else a resolver may touch lives here so the two can be
//! borrowed independently.

use std::collections::BTreeMap;

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::arena::Arena;
use crate::config::{Difficulty, SimConfig};
use crate::context::{SpeedWindows, WindowKind};
use crate::entity::{Entity, Player};
use crate::output::{Event, Output, OutputEnvelope, OutputSource};
use crate::scheduler::{ActionId, Staging};
use crate::simulation::TimedTask;

/// Entities, player, global speed windows and the event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub(crate) arena: Arena,
    pub(crate) player: Player,
    pub(crate) windows: SpeedWindows,
    pub(crate) difficulty: Difficulty,
    pub(crate) config: SimConfig,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) events: Vec<OutputEnvelope>,
    pub(crate) window_timers: BTreeMap<WindowKind, ActionId>,
    pub(crate) shield_timer: Option<ActionId>,
}

impl World {
    /// Creates a world with an empty arena and a fresh player.
    #[must_use]
    pub fn new(config: SimConfig, rng: ChaCha8Rng) -> Self {
        let player = Player::new(&config.player, 0, config.animation.frame_interval);
        Self {
            arena: Arena::new(),
            player,
            windows: SpeedWindows::default(),
            difficulty: Difficulty::default(),
            config,
            rng,
            events: Vec::new(),
            window_timers: BTreeMap::new(),
            shield_timer: None,
        }
    }

    /// Runs one due timed task. Returns whether the action completed.
    ///
    /// A shoot task whose mob is gone or dead cancels its own action.
    pub(crate) fn run_task(
        &mut self,
        action: ActionId,
        task: &mut TimedTask,
        now: u64,
        staging: &mut Staging<TimedTask>,
        outputs: &mut Vec<OutputEnvelope>,
    ) -> bool {
        let source = OutputSource::Timer(action);
        match *task {
            TimedTask::MobShoot(id) => {
                let windows = self.windows;
                let mob = self
                    .arena
                    .get_mut(id)
                    .and_then(Entity::as_mob_mut)
                    .filter(|mob| mob.is_alive());
                let Some(mob) = mob else {
                    debug!(mob = %id, action = %action, "shoot_timer_cancelled");
                    staging.remove(action);
                    return true;
                };
                if let Some(command) = mob.fire(id, windows) {
                    outputs.push(OutputEnvelope::new(command.into(), source, now, 0));
                }
            }
            TimedTask::EndWindow(kind) => {
                self.windows.set(kind, false);
                self.window_timers.remove(&kind);
                debug!(window = %kind, "window_ended");
                outputs.push(OutputEnvelope::new(
                    Output::Event(Event::WindowEnded { window: kind }),
                    source,
                    now,
                    0,
                ));
            }
            TimedTask::EndShield => {
                self.player.set_invulnerable(false);
                self.shield_timer = None;
                debug!("shield_ended");
                outputs.push(OutputEnvelope::new(
                    Output::Event(Event::ShieldEnded),
                    source,
                    now,
                    0,
                ));
            }
        }
        true
    }

    /// Entity storage.
    #[must_use]
    pub const fn arena(&self) -> &Arena {
        &self.arena
    }

    /// The player.
    #[must_use]
    pub const fn player(&self) -> &Player {
        &self.player
    }

    /// Global speed windows.
    #[must_use]
    pub const fn windows(&self) -> SpeedWindows {
        self.windows
    }

    /// Active difficulty.
    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Configuration the world was built with.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Events resolved since the last drain.
    #[must_use]
    pub fn events(&self) -> &[OutputEnvelope] {
        &self.events
    }

    /// Timer that closes a window, if the window is open.
    #[must_use]
    pub fn window_timer(&self, kind: WindowKind) -> Option<ActionId> {
        self.window_timers.get(&kind).copied()
    }

    /// Timer that ends the shield, if the shield is up.
    #[must_use]
    pub const fn shield_timer(&self) -> Option<ActionId> {
        self.shield_timer
    }
}
