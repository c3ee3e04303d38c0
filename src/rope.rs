//! Rope attachment state machine and its two control loops.
//!
//! One `RopeState` belongs to one character and is advanced exactly once per tick from that
//! character's update via [`RopeState::update`]. Commands (`shoot`, `release`,
//! `set_ideal_length`, `set_pulling`) take effect immediately and are silent no-ops when the
//! current mode does not accept them.

use glam::Vec2;
use tracing::{debug, trace};

use crate::api::{NarrowphaseApi, ObjectRegistry, TileGrid};
use crate::config::RopeConfig;
use crate::narrowphase::Narrowphase;
use crate::types::*;

/// Below this length a direction is treated as degenerate and the operation is skipped.
const MIN_DIR_LEN: f32 = 1e-6;

pub struct RopeState {
    cfg: RopeConfig,
    mode: RopeMode,

    tip: Vec2,
    prev_tip: Vec2,
    tip_vel: Vec2,
    anchor: Option<Anchor>,

    ideal_length: f32,
    requested_length: f32,
    elasticity: f32,
    attached_ticks: u32,
    returning: bool,
    pulling: bool,

    // Scratch buffer for the beam probe, reused across ticks
    trace: Vec<TileCoord>,
    events: Vec<RopeEvent>,
}

impl RopeState {
    /// New retracted rope with its tip at `origin` (the character's reference point).
    pub fn new(cfg: RopeConfig, origin: Vec2) -> Self {
        let trace = Vec::with_capacity(cfg.trace_capacity);
        Self {
            cfg,
            mode: RopeMode::Retracted,
            tip: origin,
            prev_tip: origin,
            tip_vel: Vec2::ZERO,
            anchor: None,
            ideal_length: 0.0,
            requested_length: 0.0,
            elasticity: 0.0,
            attached_ticks: 0,
            returning: false,
            pulling: false,
            trace,
            events: Vec::new(),
        }
    }

    // --- Commands ------------------------------------------------------------

    /// Fire the tip from the character's reference point along `direction`.
    ///
    /// Accepted only while retracted; a degenerate direction is ignored.
    pub fn shoot(&mut self, body: &CharacterBody, direction: Vec2) {
        if self.mode != RopeMode::Retracted {
            return;
        }
        let Some(origin) = body.reference_pos() else { return };
        let Some(dir) = direction.try_normalize() else { return };

        self.tip = origin;
        self.prev_tip = origin;
        self.tip_vel = dir * self.cfg.shoot_speed;
        self.anchor = None;
        self.ideal_length = self.cfg.max_length;
        self.requested_length = 0.0;
        self.elasticity = 0.0;
        self.returning = false;
        self.pulling = false;
        self.transition(RopeMode::ShootingOut, "shoot");
        self.events.push(RopeEvent::Shot { direction: dir });
    }

    /// Let go of the anchor. Accepted only while attached.
    pub fn release(&mut self) {
        if !self.mode.is_attached() {
            return;
        }
        self.clear_attachment();
        self.transition(RopeMode::Retracting, "release");
        self.events.push(RopeEvent::Released);
    }

    /// Change the length the regulation loop eases toward. Accepted only while attached.
    pub fn set_ideal_length(&mut self, length: f32) {
        if !self.mode.is_attached() || !length.is_finite() {
            return;
        }
        self.ideal_length = self.cfg.clamp_length(length);
    }

    /// Start or stop reeling in the attached object. Starting is accepted only while attached
    /// to an object.
    pub fn set_pulling(&mut self, on: bool) {
        let Some(Anchor::Object { object, .. }) = self.anchor else { return };
        if on == self.pulling || self.mode != RopeMode::AttachedToObject {
            return;
        }
        self.pulling = on;
        debug!(object = object.0, pulling = on, "rope pull toggled");
        self.events.push(if on {
            RopeEvent::PullStarted { object }
        } else {
            RopeEvent::PullStopped { object }
        });
    }

    // --- Tick ----------------------------------------------------------------

    /// Advance one tick. Reads the tiles and objects, writes constraint corrections onto
    /// `body` and pull impulses onto the attached object.
    pub fn update<T, R>(&mut self, body: &mut CharacterBody, tiles: &T, objects: &mut R)
    where
        T: TileGrid,
        R: ObjectRegistry,
    {
        let Some(base) = body.reference().copied() else { return };

        self.prev_tip = self.tip;
        if self.mode.is_attached() {
            self.attached_ticks += 1;
        } else {
            self.attached_ticks = 0;
        }

        match self.mode {
            RopeMode::Retracted => self.track(base),
            RopeMode::ShootingOut => self.update_shooting_out(base, body.region, tiles, objects),
            RopeMode::AttachedToTerrain => self.update_attached_to_terrain(),
            RopeMode::AttachedToObject => self.update_attached_to_object(base, body.region, objects),
            RopeMode::Retracting => self.transition(RopeMode::Retracted, "retracted"),
        }

        if self.mode != RopeMode::Retracted {
            self.apply_elastic_constraint(body);
        }
        if self.mode.is_attached() {
            self.regulate_length();
        }
    }

    fn track(&mut self, base: BodyPoint) {
        self.requested_length = 0.0;
        self.tip = base.pos;
        self.tip_vel = base.vel;
    }

    fn update_shooting_out<T, R>(&mut self, base: BodyPoint, region: RegionId, tiles: &T, objects: &R)
    where
        T: TileGrid,
        R: ObjectRegistry,
    {
        let fall = self.cfg.gravity * inverse_lerp(self.cfg.max_elasticity, 0.0, self.elasticity);
        self.tip_vel.y -= fall;
        self.tip += self.tip_vel;

        // Terrain, then objects, then the return logic; first hit wins
        if let Some(tile) = tiles.raycast_first_solid(self.prev_tip, self.tip) {
            let rect = tiles.tile_rect(tile).grow(self.cfg.tile_grow);
            let point = Narrowphase::segment_rect_entry(self.prev_tip, self.tip, rect)
                .map(|hit| hit.contact)
                .unwrap_or_else(|| rect.clamp(self.tip));
            self.attach_to_terrain(point, base.pos, false);
            return;
        }

        if base.pos.distance(self.tip) >= self.cfg.object_probe_min_distance {
            if let Some((object, point, at)) = self.probe_objects(region, objects) {
                self.attach_to_object(object, point, at, base.pos);
                return;
            }
        }

        if self.returning {
            if let Some(point) = self.probe_beams(tiles) {
                self.attach_to_terrain(point, base.pos, true);
                return;
            }
            if base.pos.distance(self.tip) < self.cfg.return_catch_distance {
                self.returning = false;
                self.transition(RopeMode::Retracted, "returned");
                self.track(base);
                self.events.push(RopeEvent::Returned);
                return;
            }
        } else {
            let to_tip = (self.tip - base.pos).normalize_or_zero();
            if to_tip.dot(self.tip_vel.normalize_or_zero()) < 0.0 {
                self.returning = true;
                debug!(tip = ?self.tip, "rope returning");
            }
        }

        let out_of_range = self.cfg.max_flight_distance.is_some_and(|d| base.pos.distance(self.tip) > d);
        if out_of_range {
            self.returning = false;
            self.transition(RopeMode::Retracted, "overreach");
            self.track(base);
            self.events.push(RopeEvent::Missed);
        }
    }

    /// First pullable object point the tip touches, in registry order.
    fn probe_objects<R: ObjectRegistry>(
        &self,
        region: RegionId,
        objects: &R,
    ) -> Option<(ObjectId, usize, BodyPoint)> {
        for obj in objects.objects_in(region) {
            if !obj.category.is_pullable() {
                continue;
            }
            for (i, p) in obj.points.iter().enumerate() {
                if Narrowphase::point_in_circle(self.tip, p.pos, p.radius + self.cfg.object_probe_margin) {
                    return Some((obj.id, i, *p));
                }
            }
        }
        None
    }

    /// Snap point on the first beam the last tip step crossed.
    ///
    /// Only the first `trace_capacity` tiles of the step are inspected; a longer step can
    /// fly over a beam.
    fn probe_beams<T: TileGrid>(&mut self, tiles: &T) -> Option<Vec2> {
        let (from, to) = (self.prev_tip, self.tip);
        let n = Narrowphase::trace_tiles(from, to, tiles.tile_size(), &mut self.trace, self.cfg.trace_capacity);
        let range = self.cfg.beam_snap_range;
        self.trace[..n].iter().find_map(|&c| {
            let mid = tiles.tile_midpoint(c);
            match tiles.beam(c) {
                BeamKind::Horizontal => {
                    let x = Narrowphase::horizontal_cross(from, to, mid.y).map_or(mid.x, |p| p.x);
                    Some(Vec2::new(x.clamp(mid.x - range, mid.x + range), mid.y))
                }
                BeamKind::Vertical => {
                    let y = Narrowphase::vertical_cross(from, to, mid.x).map_or(mid.y, |p| p.y);
                    Some(Vec2::new(mid.x, y.clamp(mid.y - range, mid.y + range)))
                }
                BeamKind::None => None,
            }
        })
    }

    fn update_attached_to_terrain(&mut self) {
        match self.anchor {
            Some(Anchor::Terrain(point)) => {
                self.tip = point;
                self.tip_vel = Vec2::ZERO;
            }
            _ => self.detach(DetachReason::Stale),
        }
    }

    fn update_attached_to_object<R: ObjectRegistry>(&mut self, base: BodyPoint, region: RegionId, objects: &mut R) {
        let Some(Anchor::Object { object, point }) = self.anchor else {
            self.detach(DetachReason::Stale);
            return;
        };
        let Some(obj) = objects.object(object) else {
            self.detach(DetachReason::Stale);
            return;
        };
        let Some(p) = obj.points.get(point).copied() else {
            self.detach(DetachReason::Stale);
            return;
        };
        if obj.region != region {
            self.detach(DetachReason::RegionChanged);
            return;
        }

        self.tip = p.pos;
        self.tip_vel = p.vel;
        if self.pulling {
            self.pull_attached_object(base.pos, object, objects);
        }
    }

    /// Reel the attached object toward the character with mass-scaled velocity impulses.
    fn pull_attached_object<R: ObjectRegistry>(&mut self, base: Vec2, object: ObjectId, objects: &mut R) {
        let to_character = base - self.tip;
        let dist = to_character.length();
        if dist < self.cfg.pull_release_distance || dist < MIN_DIR_LEN {
            self.pulling = false;
            debug!(object = object.0, dist, "rope pull finished");
            self.events.push(RopeEvent::PullStopped { object });
            return;
        }
        let dir = to_character / dist;
        let Some(obj) = objects.object_mut(object) else { return };
        for p in &mut obj.points {
            let impulse = self.cfg.pull_force / p.mass.max(self.cfg.min_pull_mass);
            p.vel = (p.vel + dir * impulse).clamp_length_max(self.cfg.max_pull_speed);
        }
        trace!(object = object.0, dist, "rope pull impulse");
    }

    /// Pull the character back inside `requested_length` of the tip.
    ///
    /// Every body point gets the same positional correction and loses part of its velocity
    /// along the rope. Does nothing while slack.
    pub fn apply_elastic_constraint(&mut self, body: &mut CharacterBody) {
        if self.mode == RopeMode::Retracted || self.requested_length <= 0.0 {
            return;
        }
        let Some(base) = body.reference_pos() else { return };
        let delta = self.tip - base;
        let dist = delta.length();
        if dist <= self.requested_length || dist < MIN_DIR_LEN {
            return;
        }

        let dir = delta / dist;
        let excess = dist - self.requested_length;
        let amount = (excess * self.cfg.correction_factor).min(self.cfg.max_correction);
        let correction = dir * amount;
        for p in &mut body.points {
            p.pos += correction;
            p.vel -= dir * p.vel.dot(dir) * self.cfg.velocity_damping;
        }
        self.elasticity = (self.elasticity + self.cfg.elasticity_rise).min(self.cfg.max_elasticity);
        trace!(excess, amount, elasticity = self.elasticity, "rope overextended");
    }

    /// Ease `requested_length` toward `ideal_length`; high elasticity slows the approach.
    ///
    /// Runs only while attached and not pulling.
    pub fn regulate_length(&mut self) {
        if !self.mode.is_attached() || self.pulling {
            return;
        }
        self.elasticity = (self.elasticity - self.cfg.elasticity_decay).max(0.0);
        let step = (1.0 - self.elasticity) * self.cfg.regulation_rate;
        if self.requested_length < self.ideal_length {
            self.requested_length = (self.requested_length + step).min(self.ideal_length);
        } else if self.requested_length > self.ideal_length {
            self.requested_length = (self.requested_length - step).max(self.ideal_length);
        }
        self.requested_length = self.cfg.clamp_length(self.requested_length);
    }

    // --- Transitions -----------------------------------------------------------

    fn attach_to_terrain(&mut self, point: Vec2, base: Vec2, beam: bool) {
        self.anchor = Some(Anchor::Terrain(point));
        self.tip = point;
        self.tip_vel = Vec2::ZERO;
        self.begin_attachment(base);
        self.transition(RopeMode::AttachedToTerrain, if beam { "beam" } else { "terrain" });
        self.events.push(RopeEvent::AttachedTerrain { anchor: point, beam });
    }

    fn attach_to_object(&mut self, object: ObjectId, point: usize, at: BodyPoint, base: Vec2) {
        self.anchor = Some(Anchor::Object { object, point });
        self.tip = at.pos;
        self.tip_vel = at.vel;
        self.begin_attachment(base);
        self.transition(RopeMode::AttachedToObject, "object");
        self.events.push(RopeEvent::AttachedObject { object, point });
    }

    fn begin_attachment(&mut self, base: Vec2) {
        self.ideal_length = self.cfg.clamp_length(base.distance(self.tip));
        self.requested_length = self.ideal_length;
        self.elasticity = 0.0;
        self.returning = false;
        self.pulling = false;
    }

    /// Drop every anchor reference and the attachment's tension state.
    fn clear_attachment(&mut self) {
        self.anchor = None;
        self.pulling = false;
        self.tip_vel = Vec2::ZERO;
        self.requested_length = 0.0;
        self.elasticity = 0.0;
    }

    fn detach(&mut self, reason: DetachReason) {
        self.clear_attachment();
        self.transition(RopeMode::Retracting, match reason {
            DetachReason::Stale => "stale reference",
            DetachReason::RegionChanged => "region changed",
        });
        self.events.push(RopeEvent::Detached { reason });
    }

    fn transition(&mut self, to: RopeMode, reason: &'static str) {
        debug!(from = ?self.mode, to = ?to, reason, "rope transition");
        self.mode = to;
    }

    // --- Queries -------------------------------------------------------------

    pub fn config(&self) -> &RopeConfig { &self.cfg }

    pub fn mode(&self) -> RopeMode { self.mode }

    pub fn is_attached(&self) -> bool { self.mode.is_attached() }

    pub fn is_attached_to_object(&self) -> bool {
        self.mode == RopeMode::AttachedToObject && matches!(self.anchor, Some(Anchor::Object { .. }))
    }

    pub fn tip(&self) -> Vec2 { self.tip }

    pub fn previous_tip(&self) -> Vec2 { self.prev_tip }

    pub fn tip_velocity(&self) -> Vec2 { self.tip_vel }

    /// Tip blended between the last two ticks, `alpha` in [0,1].
    pub fn interpolated_tip(&self, alpha: f32) -> Vec2 {
        self.prev_tip.lerp(self.tip, alpha.clamp(0.0, 1.0))
    }

    pub fn anchor(&self) -> Option<Anchor> { self.anchor }

    pub fn ideal_length(&self) -> f32 { self.ideal_length }

    pub fn requested_length(&self) -> f32 { self.requested_length }

    pub fn elasticity(&self) -> f32 { self.elasticity }

    pub fn attached_ticks(&self) -> u32 { self.attached_ticks }

    pub fn is_returning(&self) -> bool { self.returning }

    pub fn is_pulling(&self) -> bool { self.pulling }

    /// Drain and return the events emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<RopeEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Position of `v` between `a` and `b`, clamped to [0,1].
fn inverse_lerp(a: f32, b: f32, v: f32) -> f32 {
    if (b - a).abs() < f32::EPSILON {
        return 0.0;
    }
    ((v - a) / (b - a)).clamp(0.0, 1.0)
}
