//! Collision geometry: rectangles, colliders and entity bodies.
//!
//! - [`Rect`]: integer axis-aligned rectangle in pixel space (top-left origin)
//! - [`Sides`]: set of rectangle sides, used both for intersection reports
//!   and for passability answers
//! - [`Body`]: position, scale and cached bounds of a simulated entity, plus
//!   its *collider*, the sub-rectangle used for gameplay collision
//!
//! # Colliders
//!
//! By default an entity collides with its feet: the bottom quarter of its
//! bounding box. Props and other hand-authored sprites may instead supply a
//! [`ColliderShape::Footprint`], a rectangle in unscaled sprite pixels that is
//! scaled with the body.

use std::cell::Cell;

use bitflags::bitflags;
use glam::IVec2;
use serde::{Deserialize, Serialize};

// =============================================================================
// Rect
// =============================================================================

/// Axis-aligned rectangle with integer pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Rect {
    /// Creates a new rectangle.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Left edge.
    #[must_use]
    pub const fn left(&self) -> i32 {
        self.x
    }

    /// Right edge (exclusive).
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Top edge.
    #[must_use]
    pub const fn top(&self) -> i32 {
        self.y
    }

    /// Bottom edge (exclusive).
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Center point, rounded toward the top-left.
    #[must_use]
    pub const fn center(&self) -> IVec2 {
        IVec2::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Returns a copy moved by `(dx, dy)`.
    #[must_use]
    pub const fn translated(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Returns true if the interiors of the two rectangles overlap.
    ///
    /// Rectangles that only share an edge do not intersect.
    #[must_use]
    pub const fn intersects(&self, other: &Self) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Intersection test that can ignore one or both axes.
    ///
    /// Ignoring an axis collapses `other` onto this rectangle's coordinate on
    /// that axis, so only overlap on the remaining axis is tested.
    /// `ignore_x` answers "are we vertically level with `other`?".
    #[must_use]
    pub fn intersects_on_axes(&self, other: &Self, ignore_x: bool, ignore_y: bool) -> bool {
        let mut collapsed = *other;
        if ignore_x {
            collapsed.x = self.x;
            collapsed.width = self.width;
        }
        if ignore_y {
            collapsed.y = self.y;
            collapsed.height = self.height;
        }
        self.intersects(&collapsed)
    }

    /// Returns the sides of this rectangle through which `other` penetrates.
    ///
    /// A side is reported when its edge lies strictly inside `other`'s span on
    /// the same axis. Returns an empty set when the rectangles do not
    /// intersect.
    #[must_use]
    pub fn intersecting_sides(&self, other: &Self) -> Sides {
        if !self.intersects(other) {
            return Sides::empty();
        }
        let mut sides = Sides::empty();
        let inside_x = |edge: i32| other.left() < edge && edge < other.right();
        let inside_y = |edge: i32| other.top() < edge && edge < other.bottom();
        if inside_x(self.left()) {
            sides |= Sides::LEFT;
        }
        if inside_x(self.right()) {
            sides |= Sides::RIGHT;
        }
        if inside_y(self.top()) {
            sides |= Sides::TOP;
        }
        if inside_y(self.bottom()) {
            sides |= Sides::BOTTOM;
        }
        sides
    }

    /// Returns true if `other` lies entirely within this rectangle.
    #[must_use]
    pub const fn contains_rect(&self, other: &Self) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

// =============================================================================
// Sides
// =============================================================================

bitflags! {
    /// Set of rectangle sides.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Sides: u8 {
        /// Left side (toward negative x).
        const LEFT = 0b0001;
        /// Right side (toward positive x).
        const RIGHT = 0b0010;
        /// Top side (toward negative y).
        const TOP = 0b0100;
        /// Bottom side (toward positive y).
        const BOTTOM = 0b1000;
        /// Both horizontal sides.
        const HORIZONTAL = Self::LEFT.bits() | Self::RIGHT.bits();
        /// Both vertical sides.
        const VERTICAL = Self::TOP.bits() | Self::BOTTOM.bits();
    }
}

impl Sides {
    /// The side facing horizontal direction `dir` (negative is left).
    #[must_use]
    pub const fn leading_horizontal(dir: i32) -> Self {
        if dir < 0 {
            Self::LEFT
        } else {
            Self::RIGHT
        }
    }

    /// The side facing vertical direction `dir` (negative is up).
    #[must_use]
    pub const fn leading_vertical(dir: i32) -> Self {
        if dir < 0 {
            Self::TOP
        } else {
            Self::BOTTOM
        }
    }
}

// =============================================================================
// Body
// =============================================================================

/// How a body derives its collider from its bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColliderShape {
    /// Bottom quarter of the bounding box.
    #[default]
    Feet,
    /// Hand-authored rectangle in unscaled sprite pixels, relative to the
    /// sprite's top-left corner.
    Footprint(Rect),
}

/// Spatial state shared by every simulated entity.
///
/// The bounding box is cached and recomputed lazily after the position or
/// scale changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    position: IVec2,
    size: IVec2,
    scale: f32,
    collider: ColliderShape,
    visible: bool,
    #[serde(skip)]
    bounds_cache: Cell<Option<Rect>>,
}

impl Body {
    /// Creates a visible body.
    ///
    /// # Arguments
    ///
    /// * `position` - Top-left corner in pixels
    /// * `size` - Unscaled sprite size in pixels
    /// * `scale` - Draw and collision scale factor
    #[must_use]
    pub fn new(position: IVec2, size: IVec2, scale: f32) -> Self {
        Self {
            position,
            size,
            scale,
            collider: ColliderShape::Feet,
            visible: true,
            bounds_cache: Cell::new(None),
        }
    }

    /// Builder that replaces the collider shape.
    #[must_use]
    pub fn with_collider(mut self, collider: ColliderShape) -> Self {
        self.collider = collider;
        self
    }

    /// Top-left position.
    #[must_use]
    pub const fn position(&self) -> IVec2 {
        self.position
    }

    /// Moves the body to `position`.
    pub fn set_position(&mut self, position: IVec2) {
        if self.position != position {
            self.position = position;
            self.bounds_cache.set(None);
        }
    }

    /// Moves the body by `(dx, dy)`.
    pub fn translate(&mut self, dx: i32, dy: i32) {
        self.set_position(self.position + IVec2::new(dx, dy));
    }

    /// Scale factor.
    #[must_use]
    pub const fn scale(&self) -> f32 {
        self.scale
    }

    /// Changes the scale factor.
    pub fn set_scale(&mut self, scale: f32) {
        if (self.scale - scale).abs() > f32::EPSILON {
            self.scale = scale;
            self.bounds_cache.set(None);
        }
    }

    /// Unscaled sprite size.
    #[must_use]
    pub const fn size(&self) -> IVec2 {
        self.size
    }

    /// Collider derivation rule.
    #[must_use]
    pub const fn collider_shape(&self) -> ColliderShape {
        self.collider
    }

    /// Returns true if the body should be drawn.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Shows or hides the body.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Bounding box: `(x, y)` sized `width * scale` by `height * scale`.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        if let Some(bounds) = self.bounds_cache.get() {
            return bounds;
        }
        let bounds = Rect::new(
            self.position.x,
            self.position.y,
            self.scaled(self.size.x),
            self.scaled(self.size.y),
        );
        self.bounds_cache.set(Some(bounds));
        bounds
    }

    /// Gameplay collision rectangle.
    #[must_use]
    pub fn collider(&self) -> Rect {
        let bounds = self.bounds();
        match self.collider {
            ColliderShape::Feet => {
                let feet = bounds.height / 4;
                Rect::new(bounds.x, bounds.bottom() - feet, bounds.width, feet)
            }
            ColliderShape::Footprint(footprint) => Rect::new(
                bounds.x + self.scaled(footprint.x),
                bounds.y + self.scaled(footprint.y),
                self.scaled(footprint.width),
                self.scaled(footprint.height),
            ),
        }
    }

    /// Scaled width of the bounding box.
    #[must_use]
    pub fn width(&self) -> i32 {
        self.bounds().width
    }

    /// Intersection with another body.
    ///
    /// # Arguments
    ///
    /// * `other` - Body to test against
    /// * `ignore_x` - Only test vertical overlap
    /// * `ignore_y` - Only test horizontal overlap
    /// * `use_collider` - Compare colliders instead of bounding boxes
    #[must_use]
    pub fn intersects(
        &self,
        other: &Self,
        ignore_x: bool,
        ignore_y: bool,
        use_collider: bool,
    ) -> bool {
        let (a, b) = self.pick(other, use_collider);
        a.intersects_on_axes(&b, ignore_x, ignore_y)
    }

    /// Sides of this body through which `other` penetrates.
    #[must_use]
    pub fn intersecting_sides(&self, other: &Self, use_collider: bool) -> Sides {
        let (a, b) = self.pick(other, use_collider);
        a.intersecting_sides(&b)
    }

    fn pick(&self, other: &Self, use_collider: bool) -> (Rect, Rect) {
        if use_collider {
            (self.collider(), other.collider())
        } else {
            (self.bounds(), other.bounds())
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn scaled(&self, value: i32) -> i32 {
        (value as f32 * self.scale).round() as i32
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod rect_tests {
        use super::*;

        #[test]
        fn touching_edges_do_not_intersect() {
            let a = Rect::new(0, 0, 10, 10);
            let b = Rect::new(10, 0, 10, 10);
            assert!(!a.intersects(&b));
            assert!(a.intersects(&b.translated(-1, 0)));
        }

        #[test]
        fn ignore_x_tests_vertical_overlap_only() {
            let a = Rect::new(0, 0, 10, 10);
            let far_right_level = Rect::new(500, 5, 10, 10);
            let far_right_below = Rect::new(500, 50, 10, 10);
            assert!(a.intersects_on_axes(&far_right_level, true, false));
            assert!(!a.intersects_on_axes(&far_right_below, true, false));
        }

        #[test]
        fn ignore_y_tests_horizontal_overlap_only() {
            let a = Rect::new(0, 0, 10, 10);
            let far_below_aligned = Rect::new(5, 900, 10, 10);
            assert!(a.intersects_on_axes(&far_below_aligned, false, true));
            assert!(!a.intersects(&far_below_aligned));
        }

        #[test]
        fn intersecting_sides_reports_penetrated_edges() {
            let this = Rect::new(10, 10, 10, 10);
            let from_right = Rect::new(15, 12, 20, 4);
            assert_eq!(this.intersecting_sides(&from_right), Sides::RIGHT);

            let from_below_left = Rect::new(5, 15, 10, 20);
            assert_eq!(
                this.intersecting_sides(&from_below_left),
                Sides::LEFT | Sides::BOTTOM
            );
        }

        #[test]
        fn intersecting_sides_empty_without_overlap() {
            let this = Rect::new(0, 0, 10, 10);
            assert!(this
                .intersecting_sides(&Rect::new(10, 0, 5, 5))
                .is_empty());
        }

        #[test]
        fn shared_edge_span_is_not_strictly_inside() {
            // Same left edge: left side is not strictly inside other's span.
            let this = Rect::new(0, 0, 10, 10);
            let other = Rect::new(0, 2, 5, 5);
            assert!(!this.intersecting_sides(&other).contains(Sides::LEFT));
        }

        #[test]
        fn leading_sides() {
            assert_eq!(Sides::leading_horizontal(-3), Sides::LEFT);
            assert_eq!(Sides::leading_horizontal(2), Sides::RIGHT);
            assert_eq!(Sides::leading_vertical(-1), Sides::TOP);
            assert_eq!(Sides::leading_vertical(1), Sides::BOTTOM);
        }
    }

    mod body_tests {
        use super::*;

        #[test]
        fn bounds_are_scaled() {
            let body = Body::new(IVec2::new(5, 7), IVec2::new(16, 32), 2.0);
            assert_eq!(body.bounds(), Rect::new(5, 7, 32, 64));
        }

        #[test]
        fn default_collider_is_bottom_quarter() {
            let body = Body::new(IVec2::new(0, 0), IVec2::new(20, 40), 1.0);
            assert_eq!(body.collider(), Rect::new(0, 30, 20, 10));
        }

        #[test]
        fn bounds_recomputed_after_move() {
            let mut body = Body::new(IVec2::ZERO, IVec2::new(10, 10), 1.0);
            assert_eq!(body.bounds().x, 0);
            body.translate(4, -2);
            assert_eq!(body.bounds(), Rect::new(4, -2, 10, 10));
            body.set_scale(3.0);
            assert_eq!(body.bounds(), Rect::new(4, -2, 30, 30));
        }

        #[test]
        fn footprint_collider_scales() {
            let body = Body::new(IVec2::new(100, 100), IVec2::new(32, 32), 2.0)
                .with_collider(ColliderShape::Footprint(Rect::new(8, 24, 16, 8)));
            assert_eq!(body.collider(), Rect::new(116, 148, 32, 16));
        }

        #[test]
        fn body_intersection_with_colliders() {
            let a = Body::new(IVec2::new(0, 0), IVec2::new(20, 40), 1.0);
            // Overlaps a's head but not its feet.
            let b = Body::new(IVec2::new(5, -30), IVec2::new(20, 40), 1.0);
            assert!(a.intersects(&b, false, false, false));
            assert!(!a.intersects(&b, false, false, true));
        }

        #[test]
        fn serde_roundtrip_recomputes_bounds() {
            let body = Body::new(IVec2::new(3, 4), IVec2::new(10, 20), 1.5);
            let json = serde_json::to_string(&body).unwrap();
            let back: Body = serde_json::from_str(&json).unwrap();
            assert_eq!(back.bounds(), body.bounds());
        }
    }
}
