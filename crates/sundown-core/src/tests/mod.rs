//! Crate-level tests that drive a whole [`Simulation`](crate::simulation::Simulation).
//!
//! - `scenarios.rs`: timing-exact walkthroughs of death, expiry, stuck
//!   handling, damage clamping and repeating timers
//! - `integration.rs`: end-to-end tests of powerups, projectiles, drawing
//!   and the event log
//! - `helpers.rs`: Test setup utilities and factory functions

mod helpers;
mod integration;

// Re-export for convenience
pub use helpers::*;
