//! Draw requests handed to the host.
//!
//! Drawing is an opaque side effect: the simulation describes each visible
//! sprite as a [`SpriteDraw`] and passes it to a [`DrawSink`] supplied by the
//! host. Nothing here changes simulation state.

use serde::{Deserialize, Serialize};

use crate::animation::{AnimationState, SpriteId};
use crate::geometry::{Body, Rect};

/// One sprite to draw this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteDraw {
    /// Sprite sheet.
    pub image: SpriteId,
    /// `(column, row)` cell in the sheet.
    pub cell: (u32, u32),
    /// Destination rectangle in pixels.
    pub bounds: Rect,
    /// Mirror horizontally.
    pub flip_x: bool,
}

impl SpriteDraw {
    /// Describes the current frame of `animation` drawn at `body`, or `None`
    /// if the body is hidden.
    #[must_use]
    pub fn of(body: &Body, animation: &AnimationState, flip_x: bool) -> Option<Self> {
        body.is_visible().then(|| Self {
            image: animation.image(),
            cell: animation.frame_cell(),
            bounds: body.bounds(),
            flip_x,
        })
    }
}

/// Receives draw requests during [`Simulation::draw`](crate::simulation::Simulation::draw).
pub trait DrawSink {
    /// Draws one sprite.
    fn draw_sprite(&mut self, sprite: &SpriteDraw);
}

impl DrawSink for Vec<SpriteDraw> {
    fn draw_sprite(&mut self, sprite: &SpriteDraw) {
        self.push(*sprite);
    }
}
