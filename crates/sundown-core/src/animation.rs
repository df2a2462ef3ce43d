//! Per-entity frame animation state machine.
//!
//! Every drawable entity embeds an [`AnimationState`]. It owns:
//! - The sprite sheet reference ([`SpriteId`]) and its [`FrameGrid`]
//! - A steady-state loop range ([`FrameRange`]) and frame-advance interval
//! - At most one temporary *override sequence* that plays once on top of
//!   the steady-state loop and then reverts automatically
//!
//! # Timing
//!
//! Time is the host-supplied monotonic timestamp in nanoseconds. The state
//! only advances from [`AnimationState::advance`]; nothing here reads a clock.
//!
//! # Example
//!
//! ```
//! use sundown_core::animation::{AnimationState, FrameGrid, FrameRange, SpriteId};
//!
//! let mut anim = AnimationState::new(SpriteId::new(1), FrameGrid::new(1, 4), 100)
//!     .with_loop(FrameRange::new(0, 3));
//!
//! for now in [100, 200, 300, 400] {
//!     anim.advance(now);
//! }
//! // 0 -> 1 -> 2 -> 3 -> wraps back to 0
//! assert_eq!(anim.frame(), 0);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Sprite and frame descriptors
// =============================================================================

/// Opaque handle to a sprite sheet owned by the host's asset cache.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SpriteId(u32);

impl SpriteId {
    /// Creates a new sprite handle from a raw id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for SpriteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpriteId({})", self.0)
    }
}

/// Inclusive range of frame indices `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRange {
    /// First frame of the sequence.
    pub min: u32,
    /// Last frame of the sequence (inclusive).
    pub max: u32,
}

impl FrameRange {
    /// Creates a new frame range.
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// A range consisting of one frame.
    #[must_use]
    pub const fn single(frame: u32) -> Self {
        Self::new(frame, frame)
    }

    /// Number of frames in the range, or 0 when the bounds are inverted.
    #[must_use]
    pub const fn len(self) -> u32 {
        if self.min > self.max {
            0
        } else {
            self.max - self.min + 1
        }
    }

    /// Returns true when the bounds are inverted.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Returns true if `frame` lies within `[min, max]`.
    #[must_use]
    pub const fn contains(self, frame: u32) -> bool {
        frame >= self.min && frame <= self.max
    }
}

impl fmt::Display for FrameRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Layout of a sprite sheet as rows x columns of equally sized cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameGrid {
    /// Number of rows in the sheet.
    pub rows: u32,
    /// Number of columns in the sheet.
    pub columns: u32,
}

impl FrameGrid {
    /// Creates a new grid.
    #[must_use]
    pub const fn new(rows: u32, columns: u32) -> Self {
        Self { rows, columns }
    }

    /// Total number of cells.
    #[must_use]
    pub const fn frame_count(self) -> u32 {
        self.rows * self.columns
    }

    /// Returns the `(column, row)` cell of a frame index. Frames are laid out
    /// row-major.
    #[must_use]
    pub const fn cell(self, frame: u32) -> (u32, u32) {
        if self.columns == 0 {
            return (0, 0);
        }
        (frame % self.columns, frame / self.columns)
    }
}

impl Default for FrameGrid {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

// =============================================================================
// Override sequence
// =============================================================================

/// Temporary sequence that takes priority over the steady-state loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct OverrideSequence {
    range: FrameRange,
    image: Option<SpriteId>,
    interval: Option<u64>,
}

// =============================================================================
// AnimationState
// =============================================================================

/// Frame-sequence state machine embedded in every drawable entity.
///
/// # Invariants
///
/// - At most one override sequence is active. Requests made while one is
///   playing are dropped, not queued.
/// - The current frame lies inside the steady-state range, or inside the
///   active override range.
/// - An animation without a steady-state range is static and never advances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationState {
    image: SpriteId,
    grid: FrameGrid,
    frame: u32,
    range: Option<FrameRange>,
    interval: u64,
    last_advance: u64,
    looping: bool,
    finished: bool,
    active_override: Option<OverrideSequence>,
    last_override: Option<FrameRange>,
}

impl AnimationState {
    /// Creates a static animation showing frame 0 of `image`.
    ///
    /// # Arguments
    ///
    /// * `image` - Sprite sheet handle
    /// * `grid` - Layout of the sheet
    /// * `interval` - Frame-advance interval in nanoseconds
    #[must_use]
    pub const fn new(image: SpriteId, grid: FrameGrid, interval: u64) -> Self {
        Self {
            image,
            grid,
            frame: 0,
            range: None,
            interval,
            last_advance: 0,
            looping: true,
            finished: false,
            active_override: None,
            last_override: None,
        }
    }

    /// Builder form of [`set_loop`](Self::set_loop).
    #[must_use]
    pub fn with_loop(mut self, range: FrameRange) -> Self {
        self.set_loop(range);
        self
    }

    /// Sets the time the current frame started showing.
    ///
    /// Spawners call this with the spawn timestamp so the first frame is shown
    /// for a full interval.
    pub fn anchor(&mut self, now: u64) {
        self.last_advance = now;
    }

    /// Sets the steady-state loop range.
    ///
    /// Calls with the bounds already in effect are no-ops and do not restart
    /// the animation. When the bounds change the frame resets to `range.min`,
    /// unless an override is playing, in which case the reset happens when
    /// the override ends.
    pub fn set_loop(&mut self, range: FrameRange) {
        if self.range == Some(range) {
            return;
        }
        self.range = Some(range);
        self.finished = false;
        if self.active_override.is_none() {
            self.frame = range.min;
        }
    }

    /// Chooses whether the steady-state range wraps (`true`) or plays once and
    /// holds on its last frame (`false`).
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
        if looping {
            self.finished = false;
        }
    }

    /// Starts a temporary override sequence.
    ///
    /// Returns `false` and changes nothing when an override is already playing
    /// or when the animation is static.
    ///
    /// # Arguments
    ///
    /// * `range` - Frames to play once
    /// * `image` - Optional sprite sheet to use while the override plays
    /// * `interval` - Optional frame interval to use while the override plays
    pub fn play_override(
        &mut self,
        range: FrameRange,
        image: Option<SpriteId>,
        interval: Option<u64>,
    ) -> bool {
        if self.active_override.is_some() || self.range.is_none() {
            return false;
        }
        if self.last_override != Some(range) || !range.contains(self.frame) {
            self.frame = range.min;
        }
        self.last_override = Some(range);
        self.active_override = Some(OverrideSequence {
            range,
            image,
            interval,
        });
        true
    }

    /// Stops a playing override and resumes the steady-state range at its
    /// `min`. Terminal transitions (death) use this to pre-empt whatever
    /// sequence is showing.
    pub fn clear_override(&mut self) {
        if self.active_override.take().is_some() {
            if let Some(range) = self.range {
                self.frame = range.min;
            }
        }
    }

    /// Advances the animation if at least one interval elapsed since the last
    /// advance.
    ///
    /// An override reverts to the steady-state range at its `min` after its
    /// last frame has been shown. A looping steady-state range wraps from
    /// `max` back to `min`; a one-shot range holds on `max` and reports
    /// [`is_sequence_done`](Self::is_sequence_done).
    pub fn advance(&mut self, now: u64) {
        let Some(range) = self.range else {
            return;
        };
        let interval = self
            .active_override
            .and_then(|o| o.interval)
            .unwrap_or(self.interval);
        if now.saturating_sub(self.last_advance) < interval {
            return;
        }
        self.last_advance = now;

        if let Some(sequence) = self.active_override {
            if self.frame >= sequence.range.max {
                self.active_override = None;
                self.frame = range.min;
            } else {
                self.frame += 1;
            }
            return;
        }

        if self.frame >= range.max {
            if self.looping {
                self.frame = range.min;
            } else {
                self.finished = true;
            }
        } else {
            self.frame += 1;
        }
    }

    /// Returns true once the relevant sequence has completed.
    ///
    /// - Static animations are always done.
    /// - While an override plays, the sequence is not done.
    /// - A looping range is done whenever it shows its last frame.
    /// - A one-shot range is done after its last frame was shown for a full
    ///   interval.
    #[must_use]
    pub fn is_sequence_done(&self) -> bool {
        let Some(range) = self.range else {
            return true;
        };
        if self.active_override.is_some() {
            return false;
        }
        if self.looping {
            self.frame == range.max
        } else {
            self.finished
        }
    }

    /// Current frame index.
    #[must_use]
    pub const fn frame(&self) -> u32 {
        self.frame
    }

    /// Current `(column, row)` cell in the sprite sheet.
    #[must_use]
    pub const fn frame_cell(&self) -> (u32, u32) {
        self.grid.cell(self.frame)
    }

    /// Sprite sheet to draw from, honoring an override image.
    #[must_use]
    pub fn image(&self) -> SpriteId {
        self.active_override
            .and_then(|o| o.image)
            .unwrap_or(self.image)
    }

    /// Steady-state range, if any.
    #[must_use]
    pub const fn range(&self) -> Option<FrameRange> {
        self.range
    }

    /// Range of the playing override, if any.
    #[must_use]
    pub fn override_range(&self) -> Option<FrameRange> {
        self.active_override.map(|o| o.range)
    }

    /// Returns true while an override sequence is playing.
    #[must_use]
    pub const fn is_override_active(&self) -> bool {
        self.active_override.is_some()
    }

    /// Interval currently governing frame advance.
    #[must_use]
    pub fn effective_interval(&self) -> u64 {
        self.active_override
            .and_then(|o| o.interval)
            .unwrap_or(self.interval)
    }

    /// Returns true if the steady-state range wraps.
    #[must_use]
    pub const fn is_looping(&self) -> bool {
        self.looping
    }

    /// Sprite sheet layout.
    #[must_use]
    pub const fn grid(&self) -> FrameGrid {
        self.grid
    }
}

// =============================================================================
// Tests
// =============================================================================
