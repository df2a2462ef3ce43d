//! Read-only state handed to every entity update.
//!
//! Level-scoped flags (speed windows, difficulty, player status) are passed
//! explicitly through [`TickContext`] instead of living in globals, so each
//! entity update is a function of its own state plus this snapshot.

use std::fmt;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::config::{Difficulty, SimConfig};
use crate::geometry::Rect;
use crate::map::Passability;

/// A level-wide speed modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WindowKind {
    /// Non-excluded mobs move at the max-speed constant.
    MaxSpeed,
    /// Mobs move at the min-speed constant.
    Slow,
    /// Mobs stop, stop chasing and stop shooting.
    ZeroSpeed,
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxSpeed => write!(f, "MaxSpeed"),
            Self::Slow => write!(f, "Slow"),
            Self::ZeroSpeed => write!(f, "ZeroSpeed"),
        }
    }
}

/// Which speed windows are currently open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedWindows {
    /// Max-speed window.
    pub max_speed: bool,
    /// Slow window.
    pub slow: bool,
    /// Zero-speed window.
    pub zero_speed: bool,
}

impl SpeedWindows {
    /// Returns true if `kind` is open.
    #[must_use]
    pub const fn is_active(&self, kind: WindowKind) -> bool {
        match kind {
            WindowKind::MaxSpeed => self.max_speed,
            WindowKind::Slow => self.slow,
            WindowKind::ZeroSpeed => self.zero_speed,
        }
    }

    /// Opens or closes `kind`.
    pub fn set(&mut self, kind: WindowKind, active: bool) {
        match kind {
            WindowKind::MaxSpeed => self.max_speed = active,
            WindowKind::Slow => self.slow = active,
            WindowKind::ZeroSpeed => self.zero_speed = active,
        }
    }
}

/// What entities may observe about the player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    /// False once the player's strength reached zero.
    pub alive: bool,
    /// Player collider.
    pub collider: Rect,
    /// Player top-left position.
    pub position: IVec2,
}

/// Snapshot of level state for one tick.
#[derive(Clone, Copy)]
pub struct TickContext<'a> {
    /// Host timestamp in nanoseconds.
    pub now: u64,
    /// Current level difficulty.
    pub difficulty: Difficulty,
    /// Open speed windows.
    pub windows: SpeedWindows,
    /// Player status.
    pub player: PlayerView,
    /// Static obstacle layout.
    pub map: &'a dyn Passability,
    /// Simulation tuning.
    pub config: &'a SimConfig,
}

impl fmt::Debug for TickContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickContext")
            .field("now", &self.now)
            .field("difficulty", &self.difficulty)
            .field("windows", &self.windows)
            .field("player", &self.player)
            .finish_non_exhaustive()
    }
}

impl TickContext<'_> {
    /// Rectangle mobs patrol within.
    #[must_use]
    pub const fn map_bounds(&self) -> Rect {
        self.config.map.bounds
    }
}
