use glam::Vec2;

use crate::narrowphase::Narrowphase;
use crate::types::*;

/// Read-only view of the host tile grid.
///
/// Implementors supply the tile size and per-tile queries; rectangle, midpoint and the
/// first-solid raycast have grid-generic defaults.
pub trait TileGrid {
    /// Side of a square tile in world units.
    fn tile_size(&self) -> f32;

    /// Whether the tile blocks the rope.
    fn is_solid(&self, coord: TileCoord) -> bool;

    /// Beam decoration of the tile, if any.
    fn beam(&self, coord: TileCoord) -> BeamKind;

    /// World-space rectangle covered by the tile.
    fn tile_rect(&self, coord: TileCoord) -> Rect {
        let s = self.tile_size();
        let min = Vec2::new(coord.x as f32 * s, coord.y as f32 * s);
        Rect::new(min, min + Vec2::splat(s))
    }

    fn tile_midpoint(&self, coord: TileCoord) -> Vec2 {
        self.tile_rect(coord).center()
    }

    /// First solid tile crossed walking from `from` to `to` (the start tile included).
    fn raycast_first_solid(&self, from: Vec2, to: Vec2) -> Option<TileCoord> {
        Narrowphase::walk_tiles(from, to, self.tile_size(), |c| self.is_solid(c))
    }
}

/// Registry of dynamic objects owned by the host.
///
/// The rope never holds borrowed objects across ticks; it keeps an `ObjectId` and looks it
/// up again, so a missing id is how a destroyed object shows up.
pub trait ObjectRegistry {
    /// Objects currently in `region`, in a stable order (first match wins on ties).
    fn objects_in(&self, region: RegionId) -> impl Iterator<Item = &DynamicObject>;

    fn object(&self, id: ObjectId) -> Option<&DynamicObject>;

    /// Mutable access for pull impulses.
    fn object_mut(&mut self, id: ObjectId) -> Option<&mut DynamicObject>;
}

/// Geometry primitives used by the rope.
pub trait NarrowphaseApi {
    /// Entry of segment `a -> b` into `rect`; `None` when the segment misses it.
    fn segment_rect_entry(a: Vec2, b: Vec2, rect: Rect) -> Option<SegmentHit>;

    /// Point where the line through `a`, `b` crosses the horizontal line at `y`.
    fn horizontal_cross(a: Vec2, b: Vec2, y: f32) -> Option<Vec2>;

    /// Point where the line through `a`, `b` crosses the vertical line at `x`.
    fn vertical_cross(a: Vec2, b: Vec2, x: f32) -> Option<Vec2>;

    /// Strict point-in-circle test.
    fn point_in_circle(p: Vec2, center: Vec2, r: f32) -> bool;

    /// Visit the tiles under segment `from -> to` in traversal order until `visit` returns
    /// true; returns that tile.
    fn walk_tiles<F>(from: Vec2, to: Vec2, tile_size: f32, visit: F) -> Option<TileCoord>
    where
        F: FnMut(TileCoord) -> bool;

    /// Collect at most `capacity` traversed tiles into `out` (cleared first); returns the count.
    fn trace_tiles(
        from: Vec2,
        to: Vec2,
        tile_size: f32,
        out: &mut Vec<TileCoord>,
        capacity: usize,
    ) -> usize;
}
