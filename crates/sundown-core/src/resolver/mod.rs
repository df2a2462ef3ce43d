//! Resolver module for the Entity-Output-Resolver architecture.
//!
//! Entities never mutate each other. During their update they emit
//! [`Output`](crate::output::Output)s; resolvers then apply those outputs to
//! the [`World`].
//!
//! # Architecture
//!
//! Each resolver declares which output kinds it handles via [`Resolver::handles()`].
//! During resolution:
//! 1. Outputs are collected from timers, the player, entities and the host
//! 2. Resolvers run in a fixed order, each receiving the outputs of its kinds
//! 3. Follow-up outputs a resolver returns are appended to the collection, so
//!    resolvers later in the order see them
//!
//! The order is [`SpawnResolver`], [`PowerupResolver`], [`CombatResolver`],
//! [`EventResolver`]: commands first, then modifiers (including heals issued
//! by powerups), then every event, including those produced on the way.
//!
//! # Invariants
//!
//! - Resolvers MUST be deterministic given the same inputs and output order
//! - Spawns are staged in the arena and join at the end of the tick
//!
//! # Available Resolvers
//!
//! - [`SpawnResolver`]: Creates projectiles
//! - [`PowerupResolver`]: Applies powerup effects and their timers
//! - [`CombatResolver`]: Handles damage and healing
//! - [`EventResolver`]: Records events for the host

mod combat;
mod event;
mod powerup;
mod spawn;

pub use combat::{CombatResolver, Reduction, Vitality};
pub use event::EventResolver;
pub use powerup::PowerupResolver;
pub use spawn::SpawnResolver;

use crate::output::{OutputEnvelope, OutputKind};
use crate::scheduler::Scheduler;
use crate::simulation::TimedTask;
use crate::world::World;

/// Resolver applies outputs to the world.
///
/// # Implementation Guidelines
///
/// 1. **Determinism**: Given the same inputs and output order, a resolver must
///    produce identical results. Process outputs in the order received.
///
/// 2. **Follow-ups, not recursion**: When applying an output causes further
///    effects (a heal from a powerup, a death event from damage), return them
///    instead of applying them directly.
///
/// # Example
///
/// ```
/// use sundown_core::resolver::Resolver;
/// use sundown_core::output::{OutputEnvelope, OutputKind};
/// use sundown_core::scheduler::Scheduler;
/// use sundown_core::simulation::TimedTask;
/// use sundown_core::world::World;
///
/// struct MyResolver;
///
/// impl Resolver for MyResolver {
///     fn handles(&self) -> &[OutputKind] {
///         &[OutputKind::Command]
///     }
///
///     fn resolve(
///         &self,
///         outputs: &[&OutputEnvelope],
///         world: &mut World,
///         timers: &mut Scheduler<TimedTask>,
///     ) -> Vec<OutputEnvelope> {
///         Vec::new()
///     }
/// }
/// ```
pub trait Resolver: Send + Sync {
    /// Returns the output kinds this resolver handles.
    fn handles(&self) -> &[OutputKind];

    /// Applies outputs to the world.
    ///
    /// # Arguments
    ///
    /// * `outputs` - The outputs routed to this resolver (filtered by `handles()`)
    /// * `world` - Mutable simulation state
    /// * `timers` - Scheduler for effects that end later
    ///
    /// # Returns
    ///
    /// Follow-up outputs, for resolvers later in the order.
    fn resolve(
        &self,
        outputs: &[&OutputEnvelope],
        world: &mut World,
        timers: &mut Scheduler<TimedTask>,
    ) -> Vec<OutputEnvelope>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test that the trait is object-safe
    #[test]
    fn resolver_is_object_safe() {
        fn _accepts_boxed(_resolver: Box<dyn Resolver>) {}
        fn _accepts_slice(_resolvers: &[Box<dyn Resolver>]) {}
    }
}
