//! Passability queries consumed from the enclosing level.
//!
//! The simulation never owns the map. It only asks, for a collider, which of
//! the collider's four sides may move further in their direction. Anything
//! that answers that question implements [`Passability`]; [`TileMap`] is a
//! grid-backed implementation for tests and simple hosts.
//!
//! # Example
//!
//! ```
//! use sundown_core::geometry::{Rect, Sides};
//! use sundown_core::map::{Passability, TileMap};
//!
//! let map = TileMap::from_rows(16, &["....", ".#..", "...."]);
//! let collider = Rect::new(0, 16, 16, 16);
//! let sides = map.passable_sides(&collider);
//! assert!(!sides.contains(Sides::RIGHT)); // solid tile at (1, 1)
//! assert!(!sides.contains(Sides::LEFT)); // map edge
//! ```

use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Sides};

/// Answers which sides of a collider may advance further.
pub trait Passability {
    /// Returns the set of passable sides for `collider`.
    fn passable_sides(&self, collider: &Rect) -> Sides;
}

impl<F> Passability for F
where
    F: Fn(&Rect) -> Sides,
{
    fn passable_sides(&self, collider: &Rect) -> Sides {
        self(collider)
    }
}

/// Map with no obstacles: every side is always passable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenField;

impl Passability for OpenField {
    fn passable_sides(&self, _collider: &Rect) -> Sides {
        Sides::all()
    }
}

/// Uniform grid of solid and open tiles.
///
/// Pixels outside the grid count as solid, so the grid edge behaves like a
/// wall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileMap {
    tile_size: i32,
    columns: i32,
    rows: i32,
    solid: Vec<bool>,
}

impl TileMap {
    /// Creates an open map of `columns x rows` tiles.
    ///
    /// Dimensions whose tile count or pixel extent overflows `i32` yield an
    /// empty grid, which is solid everywhere.
    #[must_use]
    pub fn new(columns: i32, rows: i32, tile_size: i32) -> Self {
        let tile_size = tile_size.max(1);
        let columns = columns.max(0);
        let rows = rows.max(0);
        let cells = columns
            .checked_mul(rows)
            .filter(|_| columns.checked_mul(tile_size).is_some())
            .filter(|_| rows.checked_mul(tile_size).is_some())
            .and_then(|cells| usize::try_from(cells).ok());
        let (columns, rows, cells) = cells.map_or((0, 0, 0), |cells| (columns, rows, cells));
        Self {
            tile_size,
            columns,
            rows,
            solid: vec![false; cells],
        }
    }

    /// Builds a map from text rows, `#` marking solid tiles.
    ///
    /// The widest row sets the column count; short rows are padded with open
    /// tiles.
    #[must_use]
    pub fn from_rows(tile_size: i32, rows: &[&str]) -> Self {
        let columns = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut map = Self::new(
            i32::try_from(columns).unwrap_or(i32::MAX),
            i32::try_from(rows.len()).unwrap_or(i32::MAX),
            tile_size,
        );
        for (row, line) in (0..).zip(rows) {
            for (column, ch) in (0..).zip(line.chars()) {
                map.set_solid(column, row, ch == '#');
            }
        }
        map
    }

    /// Marks tile `(column, row)` solid or open. Out-of-grid tiles are ignored.
    pub fn set_solid(&mut self, column: i32, row: i32, solid: bool) {
        if let Some(index) = self.index(column, row) {
            self.solid[index] = solid;
        }
    }

    /// Returns true if tile `(column, row)` is solid or outside the grid.
    #[must_use]
    pub fn is_solid(&self, column: i32, row: i32) -> bool {
        self.index(column, row).map_or(true, |index| self.solid[index])
    }

    /// Pixel extent of the grid.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.columns * self.tile_size, self.rows * self.tile_size)
    }

    /// Edge length of one tile in pixels.
    #[must_use]
    pub const fn tile_size(&self) -> i32 {
        self.tile_size
    }

    fn index(&self, column: i32, row: i32) -> Option<usize> {
        if column < 0 || row < 0 || column >= self.columns || row >= self.rows {
            return None;
        }
        usize::try_from(row * self.columns + column).ok()
    }

    /// Returns true if any pixel of `area` lies on a solid tile.
    fn overlaps_solid(&self, area: &Rect) -> bool {
        if area.width <= 0 || area.height <= 0 {
            return false;
        }
        let first_column = area.left().div_euclid(self.tile_size);
        let last_column = (area.right() - 1).div_euclid(self.tile_size);
        let first_row = area.top().div_euclid(self.tile_size);
        let last_row = (area.bottom() - 1).div_euclid(self.tile_size);
        (first_row..=last_row)
            .any(|row| (first_column..=last_column).any(|column| self.is_solid(column, row)))
    }
}

impl Passability for TileMap {
    /// A side is passable when the one-pixel strip just beyond it touches no
    /// solid tile.
    fn passable_sides(&self, collider: &Rect) -> Sides {
        let strips = [
            (Sides::LEFT, Rect::new(collider.left() - 1, collider.top(), 1, collider.height)),
            (Sides::RIGHT, Rect::new(collider.right(), collider.top(), 1, collider.height)),
            (Sides::TOP, Rect::new(collider.left(), collider.top() - 1, collider.width, 1)),
            (Sides::BOTTOM, Rect::new(collider.left(), collider.bottom(), collider.width, 1)),
        ];
        strips
            .iter()
            .filter(|(_, strip)| !self.overlaps_solid(strip))
            .fold(Sides::empty(), |sides, (side, _)| sides | *side)
    }
}
