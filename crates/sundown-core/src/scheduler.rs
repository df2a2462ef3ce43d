//! Deferred, possibly repeating timed actions.
//!
//! The [`Scheduler`] is advanced once per frame with the host timestamp. It
//! holds *actions*: values of a task type `A` paired with a start time, an
//! interval and an auto-reset flag. When an action's interval has elapsed the
//! caller-supplied dispatcher runs it and reports whether it completed.
//!
//! # Pending buffers
//!
//! Adds and removals never touch the active list directly. They go into a
//! [`Staging`] buffer that is merged after every action has been visited:
//!
//! - An action added during `update(now)` cannot fire during that same call.
//! - Removing an action (even the one currently firing) never invalidates the
//!   iteration in progress.
//!
//! Tasks are plain values (typically an enum of commands that refer to arena
//! ids), so the scheduler holds no references into the state it affects.
//!
//! # Example
//!
//! ```
//! use sundown_core::scheduler::Scheduler;
//!
//! let mut scheduler: Scheduler<&str> = Scheduler::new();
//! scheduler.add(1_000, false, "spawn wave");
//!
//! let mut fired = Vec::new();
//! for now in [0, 500, 1_000, 2_000] {
//!     scheduler.update(now, |_, _, task| {
//!         fired.push((now, *task));
//!         true
//!     });
//! }
//! assert_eq!(fired, vec![(1_000, "spawn wave")]);
//! assert!(scheduler.is_empty());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

// =============================================================================
// Action identity
// =============================================================================

/// Identifier of a scheduled action, unique within one scheduler.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActionId(u64);

impl ActionId {
    /// Creates an id from its raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActionId({})", self.0)
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A deferred unit of work owned by a [`Scheduler`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedAction<A> {
    id: ActionId,
    start: u64,
    interval: u64,
    auto_reset: bool,
    task: A,
}

impl<A> TimedAction<A> {
    /// Identifier of this action.
    #[must_use]
    pub const fn id(&self) -> ActionId {
        self.id
    }

    /// Timestamp the current interval is measured from.
    #[must_use]
    pub const fn start(&self) -> u64 {
        self.start
    }

    /// Interval in nanoseconds.
    #[must_use]
    pub const fn interval(&self) -> u64 {
        self.interval
    }

    /// Returns true if the action re-arms after completing.
    #[must_use]
    pub const fn auto_reset(&self) -> bool {
        self.auto_reset
    }

    /// The task payload.
    #[must_use]
    pub const fn task(&self) -> &A {
        &self.task
    }

    fn is_due(&self, now: u64) -> bool {
        now.saturating_sub(self.start) >= self.interval
    }
}

// =============================================================================
// Staging
// =============================================================================

/// Pending-add and pending-remove buffers of a [`Scheduler`].
///
/// Dispatchers receive the staging area while an update is in progress, which
/// is how a firing action schedules or cancels other actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staging<A> {
    next_id: u64,
    adds: Vec<TimedAction<A>>,
    removals: Vec<ActionId>,
    clear_all: bool,
}

impl<A> Staging<A> {
    fn new() -> Self {
        Self {
            next_id: 0,
            adds: Vec::new(),
            removals: Vec::new(),
            clear_all: false,
        }
    }

    /// Queues a new action. It becomes active at the end of the current (or
    /// next) update and its interval is measured from that update's timestamp.
    ///
    /// # Arguments
    ///
    /// * `interval` - Nanoseconds between activation and the first firing
    /// * `auto_reset` - Re-arm after each completed firing instead of retiring
    /// * `task` - Payload handed to the dispatcher
    pub fn add(&mut self, interval: u64, auto_reset: bool, task: A) -> ActionId {
        let id = ActionId::new(self.next_id);
        self.next_id += 1;
        self.adds.push(TimedAction {
            id,
            start: 0,
            interval,
            auto_reset,
            task,
        });
        id
    }

    /// Queues removal of an action. Unknown ids are ignored.
    pub fn remove(&mut self, id: ActionId) {
        self.removals.push(id);
    }

    /// Queues removal of every active action and drops adds queued so far.
    ///
    /// Actions added after this call survive the flush.
    pub fn remove_all(&mut self) {
        self.clear_all = true;
        self.adds.clear();
        self.removals.clear();
    }

    /// Number of actions waiting to become active.
    #[must_use]
    pub fn pending_adds(&self) -> usize {
        self.adds.len()
    }
}

// =============================================================================
// Scheduler
// =============================================================================

/// Registry of timed actions advanced once per frame.
///
/// # Dispatcher contract
///
/// `update` calls the dispatcher for every active action whose interval has
/// elapsed. The dispatcher returns whether the action completed:
///
/// - One-shot action, `true`: queued for removal.
/// - One-shot action, `false`: stays active and is offered again next tick.
/// - Auto-reset action, `true`: start time resets to `now`.
/// - Auto-reset action, `false`: start time kept, offered again next tick.
///
/// A dispatcher that panics is a programming error and is not caught.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scheduler<A> {
    active: Vec<TimedAction<A>>,
    staging: Staging<A>,
    last_tick: Option<u64>,
}

impl<A> Scheduler<A> {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            active: Vec::new(),
            staging: Staging::new(),
            last_tick: None,
        }
    }

    /// Queues a new action. See [`Staging::add`].
    pub fn add(&mut self, interval: u64, auto_reset: bool, task: A) -> ActionId {
        self.staging.add(interval, auto_reset, task)
    }

    /// Queues removal of an action. See [`Staging::remove`].
    pub fn remove(&mut self, id: ActionId) {
        self.staging.remove(id);
    }

    /// Queues removal of every action. See [`Staging::remove_all`].
    pub fn remove_all(&mut self) {
        self.staging.remove_all();
    }

    /// Runs every due action, then merges the pending buffers.
    ///
    /// # Arguments
    ///
    /// * `now` - Monotonic host timestamp in nanoseconds
    /// * `dispatch` - Runs one action; receives the staging buffers, the
    ///   action id and its task, and returns whether the action completed
    pub fn update<F>(&mut self, now: u64, mut dispatch: F)
    where
        F: FnMut(&mut Staging<A>, ActionId, &mut A) -> bool,
    {
        let elapsed = self.last_tick.map_or(0, |last| now.saturating_sub(last));
        trace!(now, elapsed, active = self.active.len(), "scheduler_update");

        for action in &mut self.active {
            if !action.is_due(now) {
                continue;
            }
            let completed = dispatch(&mut self.staging, action.id, &mut action.task);
            trace!(id = %action.id, completed, "action_fired");
            if !completed {
                continue;
            }
            if action.auto_reset {
                action.start = now;
            } else {
                self.staging.removals.push(action.id);
            }
        }

        self.flush(now);
        self.last_tick = Some(now);
    }

    fn flush(&mut self, now: u64) {
        let staging = &mut self.staging;
        if staging.clear_all {
            self.active.clear();
            staging.clear_all = false;
        }
        if !staging.removals.is_empty() {
            let removals = std::mem::take(&mut staging.removals);
            self.active.retain(|a| !removals.contains(&a.id));
            staging.adds.retain(|a| !removals.contains(&a.id));
        }
        for mut action in staging.adds.drain(..) {
            action.start = now;
            self.active.push(action);
        }
    }

    /// Returns true if the action is active or waiting to become active.
    #[must_use]
    pub fn contains(&self, id: ActionId) -> bool {
        self.active.iter().any(|a| a.id == id) || self.staging.adds.iter().any(|a| a.id == id)
    }

    /// Returns an active action by id.
    #[must_use]
    pub fn get(&self, id: ActionId) -> Option<&TimedAction<A>> {
        self.active.iter().find(|a| a.id == id)
    }

    /// Number of active actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Returns true if no action is active or pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.staging.adds.is_empty()
    }

    /// Number of actions waiting to become active.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.staging.pending_adds()
    }

    /// Timestamp of the last completed update.
    #[must_use]
    pub const fn last_tick(&self) -> Option<u64> {
        self.last_tick
    }
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
