//! # Sundown Core
//!
//! Runtime simulation core for Sundown, a 2D side-view action game.
//!
//! This crate owns everything that changes from one frame to the next:
//! sprite-sheet animation, timed actions, collision geometry, mob behavior,
//! combat, powerups and projectiles. Rendering, input, audio and level
//! loading belong to the host, which drives the simulation with a monotonic
//! nanosecond timestamp per frame.
//!
//! ## Architecture
//!
//! - **Entities**: Mobs, powerups and projectiles in an [`arena::Arena`],
//!   plus the player
//! - **Outputs**: Entities never touch each other; they emit commands,
//!   modifiers and events
//! - **Resolvers**: Spawn, powerup, combat and event resolvers apply the
//!   outputs to the [`world::World`]
//!
//! ## Usage
//!
//! ```
//! use sundown_core::config::{MobKind, SimConfig};
//! use sundown_core::map::OpenField;
//! use sundown_core::render::SpriteDraw;
//! use sundown_core::simulation::Simulation;
//! use glam::IVec2;
//!
//! let mut sim = Simulation::new(SimConfig::default(), OpenField, 7);
//! sim.spawn_mob(MobKind::Coyote, IVec2::new(500, 300));
//! sim.step(0);
//!
//! let mut frame: Vec<SpriteDraw> = Vec::new();
//! sim.draw(&mut frame);
//! assert_eq!(frame.len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

/// Nanoseconds per second; host timestamps and every interval use this unit.
pub const NANOS_PER_SECOND: u64 = 1_000_000_000;

pub mod animation;
pub mod arena;
pub mod config;
pub mod context;
pub mod entity;
pub mod geometry;
pub mod map;
pub mod output;
pub mod render;
pub mod resolver;
pub mod scheduler;
pub mod simulation;
pub mod world;

#[cfg(test)]
mod tests;
