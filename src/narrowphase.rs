use glam::Vec2;

use crate::api::NarrowphaseApi;
use crate::types::*;

/// Geometry primitives for tip traces against tiles and object points.
pub struct Narrowphase;

impl NarrowphaseApi for Narrowphase {
    fn segment_rect_entry(a: Vec2, b: Vec2, rect: Rect) -> Option<SegmentHit> {
        // Slab method clamped to the segment [0,1]
        let d = b - a;
        let mut tmin = 0.0;
        let mut tmax = 1.0;
        let mut n_enter = Vec2::ZERO;

        // X axis
        if d.x.abs() < f32::EPSILON {
            if a.x < rect.min.x || a.x > rect.max.x {
                return None;
            }
        } else {
            let inv = 1.0 / d.x;
            let mut t1 = (rect.min.x - a.x) * inv;
            let mut t2 = (rect.max.x - a.x) * inv;
            let mut nx = -1.0;
            if t1 > t2 {
                core::mem::swap(&mut t1, &mut t2);
                nx = 1.0;
            }
            if t1 > tmin {
                tmin = t1;
                n_enter = Vec2::new(nx, 0.0);
            }
            if t2 < tmax {
                tmax = t2;
            }
            if tmin > tmax {
                return None;
            }
        }

        // Y axis
        if d.y.abs() < f32::EPSILON {
            if a.y < rect.min.y || a.y > rect.max.y {
                return None;
            }
        } else {
            let inv = 1.0 / d.y;
            let mut t1 = (rect.min.y - a.y) * inv;
            let mut t2 = (rect.max.y - a.y) * inv;
            let mut ny = -1.0;
            if t1 > t2 {
                core::mem::swap(&mut t1, &mut t2);
                ny = 1.0;
            }
            if t1 > tmin {
                tmin = t1;
                n_enter = Vec2::new(0.0, ny);
            }
            if t2 < tmax {
                tmax = t2;
            }
            if tmin > tmax {
                return None;
            }
        }

        let toi = tmin.clamp(0.0, 1.0);
        let contact = a + d * toi;
        let normal = if toi == 0.0 && rect.contains(a) { Vec2::ZERO } else { n_enter };
        Some(SegmentHit {
            toi,
            normal,
            contact,
        })
    }

    fn horizontal_cross(a: Vec2, b: Vec2, y: f32) -> Option<Vec2> {
        let d = b - a;
        if d.y.abs() < f32::EPSILON {
            return None;
        }
        let t = (y - a.y) / d.y;
        Some(Vec2::new(a.x + d.x * t, y))
    }

    fn vertical_cross(a: Vec2, b: Vec2, x: f32) -> Option<Vec2> {
        let d = b - a;
        if d.x.abs() < f32::EPSILON {
            return None;
        }
        let t = (x - a.x) / d.x;
        Some(Vec2::new(x, a.y + d.y * t))
    }

    fn point_in_circle(p: Vec2, center: Vec2, r: f32) -> bool {
        (p - center).length_squared() < r * r
    }

    fn walk_tiles<F>(from: Vec2, to: Vec2, tile_size: f32, mut visit: F) -> Option<TileCoord>
    where
        F: FnMut(TileCoord) -> bool,
    {
        // Grid DDA over the segment, parameterized by t in [0,1]
        let s = tile_size.max(1e-5);
        let d = to - from;
        let mut cell = TileCoord::containing(from, s);
        let end = TileCoord::containing(to, s);

        let step_x = if d.x > 0.0 { 1 } else if d.x < 0.0 { -1 } else { 0 };
        let step_y = if d.y > 0.0 { 1 } else if d.y < 0.0 { -1 } else { 0 };
        let next_boundary = |c: i32, step: i32| -> f32 {
            if step > 0 { (c as f32 + 1.0) * s } else { c as f32 * s }
        };
        let mut t_max_x = if step_x != 0 {
            (next_boundary(cell.x, step_x) - from.x) / d.x
        } else { f32::INFINITY };
        let mut t_max_y = if step_y != 0 {
            (next_boundary(cell.y, step_y) - from.y) / d.y
        } else { f32::INFINITY };
        let t_delta_x = if step_x != 0 { s / d.x.abs() } else { f32::INFINITY };
        let t_delta_y = if step_y != 0 { s / d.y.abs() } else { f32::INFINITY };

        let max_steps = (end.x - cell.x).unsigned_abs() + (end.y - cell.y).unsigned_abs() + 1;
        for _ in 0..=max_steps {
            if visit(cell) {
                return Some(cell);
            }
            if cell == end {
                break;
            }
            if t_max_x < t_max_y {
                if t_max_x > 1.0 { break; }
                cell.x += step_x;
                t_max_x += t_delta_x;
            } else {
                if t_max_y > 1.0 { break; }
                cell.y += step_y;
                t_max_y += t_delta_y;
            }
        }
        None
    }

    fn trace_tiles(
        from: Vec2,
        to: Vec2,
        tile_size: f32,
        out: &mut Vec<TileCoord>,
        capacity: usize,
    ) -> usize {
        out.clear();
        if capacity == 0 {
            return 0;
        }
        Self::walk_tiles(from, to, tile_size, |c| {
            out.push(c);
            out.len() >= capacity
        });
        out.len()
    }
}
