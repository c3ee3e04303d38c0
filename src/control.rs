//! Per-character input controller: turns held buttons and axes into rope commands,
//! climbing and swinging.

use glam::{IVec2, Vec2};

use crate::config::ControlConfig;
use crate::rope::RopeState;
use crate::types::*;

/// One tick of player input. Buttons carry their held state; edges are detected by the
/// controller.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RopeInput {
    pub shoot: bool,
    pub release: bool,
    pub pull: bool,
    /// Directional input, each component in {-1, 0, 1}. `y > 0` climbs.
    pub axis: IVec2,
    /// Cursor position minus the character's reference point, when a cursor exists.
    pub aim: Option<Vec2>,
}

#[derive(Clone, Debug, Default)]
pub struct RopeController {
    cfg: ControlConfig,
    shoot_held: bool,
    release_held: bool,
    pull_held: bool,
    vertical_held: bool,
}

impl RopeController {
    pub fn new(cfg: ControlConfig) -> Self {
        Self {
            cfg,
            ..Default::default()
        }
    }

    /// Apply one tick of input. Call before [`RopeState::update`] in the same tick.
    pub fn apply(&mut self, input: &RopeInput, rope: &mut RopeState, body: &mut CharacterBody) {
        let shoot_pressed = input.shoot && !self.shoot_held;
        let release_pressed = input.release && !self.release_held;
        let pull_pressed = input.pull && !self.pull_held;
        let vertical = input.axis.y != 0;
        let vertical_ended = self.vertical_held && !vertical;

        self.shoot_held = input.shoot;
        self.release_held = input.release;
        self.pull_held = input.pull;
        self.vertical_held = vertical;

        // Letting go of climb input holds the length reached so far
        if vertical_ended && rope.is_attached() {
            rope.set_ideal_length(rope.requested_length());
        }

        if release_pressed && rope.is_attached() {
            rope.release();
            return;
        }

        if shoot_pressed {
            if rope.mode() == RopeMode::Retracted {
                let dir = self.aim_direction(input, body);
                rope.shoot(body, dir);
            } else if rope.is_attached() {
                rope.release();
            }
        }

        if pull_pressed && rope.is_attached_to_object() {
            rope.set_pulling(!rope.is_pulling());
        }

        if !rope.is_attached() {
            return;
        }
        let Some(base) = body.reference_pos() else { return };
        let Some(to_anchor) = (rope.tip() - base).try_normalize() else { return };

        if vertical && rope.mode() == RopeMode::AttachedToTerrain {
            let sign = input.axis.y.signum() as f32;
            body.push(to_anchor * sign * self.cfg.climb_force);
            rope.set_ideal_length(rope.ideal_length() - sign * self.cfg.climb_step);
        }

        if input.axis.x != 0 {
            let perpendicular = Vec2::new(to_anchor.y, -to_anchor.x);
            let mut dv = perpendicular * input.axis.x.signum() as f32 * self.cfg.swing_force;
            if to_anchor.x.abs() > self.cfg.swing_sag_threshold {
                dv.y -= self.cfg.swing_sag;
            }
            body.push(dv);
        }
    }

    /// Unit shoot direction: cursor aim, else body velocity, else input axis, else facing.
    pub fn aim_direction(&self, input: &RopeInput, body: &CharacterBody) -> Vec2 {
        let facing = Vec2::new(if body.flip < 0.0 { -1.0 } else { 1.0 }, 0.0);
        let moving = body
            .reference()
            .map(|p| p.vel)
            .filter(|v| v.length() > self.cfg.aim_velocity_threshold);

        let candidate = match (input.aim, moving) {
            (Some(aim), _) => aim,
            (None, Some(vel)) => vel,
            (None, None) if input.axis != IVec2::ZERO => input.axis.as_vec2(),
            (None, None) => facing,
        };
        if candidate.length() < self.cfg.min_aim_magnitude {
            facing
        } else {
            candidate.normalize()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RopeConfig;
    use crate::tiles::{Tile, TileMap};
    use crate::world::ObjectPool;

    fn body_at(pos: Vec2) -> CharacterBody {
        CharacterBody::new(vec![BodyPoint::new(pos, 5.0, 0.7), BodyPoint::new(pos - Vec2::new(0.0, 10.0), 5.0, 0.7)], 0)
    }

    /// Rope hanging from a ceiling above the character.
    fn hanging() -> (RopeState, CharacterBody, TileMap, ObjectPool) {
        let mut map = TileMap::new(20, 20, 20.0);
        map.fill(TileCoord::new(0, 15), TileCoord::new(19, 15), Tile::Solid);
        let mut body = body_at(Vec2::new(205.0, 110.0));
        let mut objects = ObjectPool::new();
        let mut rope = RopeState::new(RopeConfig::default(), Vec2::new(205.0, 110.0));
        rope.shoot(&body, Vec2::Y);
        for _ in 0..5 {
            rope.update(&mut body, &map, &mut objects);
            if rope.is_attached() {
                break;
            }
        }
        assert_eq!(rope.mode(), RopeMode::AttachedToTerrain);
        (rope, body, map, objects)
    }

    #[test]
    fn test_aim_prefers_cursor() {
        let ctl = RopeController::default();
        let body = body_at(Vec2::ZERO);
        let input = RopeInput { aim: Some(Vec2::new(0.0, 30.0)), axis: IVec2::new(1, 0), ..Default::default() };
        assert_eq!(ctl.aim_direction(&input, &body), Vec2::Y);
    }

    #[test]
    fn test_aim_fallback_chain() {
        let ctl = RopeController::default();
        let mut body = body_at(Vec2::ZERO);
        body.points[0].vel = Vec2::new(0.0, -3.0);
        let input = RopeInput { axis: IVec2::new(1, 0), ..Default::default() };
        assert_eq!(ctl.aim_direction(&input, &body), -Vec2::Y);

        body.points[0].vel = Vec2::new(0.2, 0.0);
        assert_eq!(ctl.aim_direction(&input, &body), Vec2::X);

        body.flip = -1.0;
        assert_eq!(ctl.aim_direction(&RopeInput::default(), &body), -Vec2::X);

        let tiny = RopeInput { aim: Some(Vec2::new(0.01, 0.0)), ..Default::default() };
        assert_eq!(ctl.aim_direction(&tiny, &body), -Vec2::X);
    }

    #[test]
    fn test_shoot_fires_on_press_edge_only() {
        let map = TileMap::new(20, 20, 20.0);
        let mut objects = ObjectPool::new();
        let mut body = body_at(Vec2::new(200.0, 200.0));
        let mut rope = RopeState::new(RopeConfig::default(), Vec2::new(200.0, 200.0));
        let mut ctl = RopeController::default();
        let held = RopeInput { shoot: true, aim: Some(Vec2::X), ..Default::default() };

        ctl.apply(&held, &mut rope, &mut body);
        assert_eq!(rope.mode(), RopeMode::ShootingOut);
        rope.update(&mut body, &map, &mut objects);
        let tip = rope.tip();
        // Still held: no new command
        ctl.apply(&held, &mut rope, &mut body);
        assert_eq!(rope.mode(), RopeMode::ShootingOut);
        assert_eq!(rope.tip(), tip);
    }

    #[test]
    fn test_shoot_press_while_attached_releases() {
        let (mut rope, mut body, _, _) = hanging();
        let mut ctl = RopeController::default();
        ctl.apply(&RopeInput { shoot: true, ..Default::default() }, &mut rope, &mut body);
        assert_eq!(rope.mode(), RopeMode::Retracting);
    }

    #[test]
    fn test_release_press() {
        let (mut rope, mut body, _, _) = hanging();
        let mut ctl = RopeController::default();
        ctl.apply(&RopeInput { release: true, ..Default::default() }, &mut rope, &mut body);
        assert_eq!(rope.mode(), RopeMode::Retracting);
        assert!(rope.anchor().is_none());
    }

    #[test]
    fn test_climb_shortens_and_pulls_toward_anchor() {
        let (mut rope, mut body, _, _) = hanging();
        let mut ctl = RopeController::default();
        let ideal = rope.ideal_length();
        let up = RopeInput { axis: IVec2::new(0, 1), ..Default::default() };
        ctl.apply(&up, &mut rope, &mut body);
        assert!((rope.ideal_length() - (ideal - 4.0)).abs() < 1e-4);
        assert!(body.points.iter().all(|p| p.vel.y > 0.7));

        let down = RopeInput { axis: IVec2::new(0, -1), ..Default::default() };
        ctl.apply(&down, &mut rope, &mut body);
        assert!((rope.ideal_length() - ideal).abs() < 1e-4);
    }

    #[test]
    fn test_climb_release_holds_current_length() {
        let (mut rope, mut body, _, _) = hanging();
        let mut ctl = RopeController::default();
        let up = RopeInput { axis: IVec2::new(0, 1), ..Default::default() };
        for _ in 0..3 {
            ctl.apply(&up, &mut rope, &mut body);
        }
        ctl.apply(&RopeInput::default(), &mut rope, &mut body);
        assert_eq!(rope.ideal_length(), rope.requested_length());
    }

    #[test]
    fn test_swing_is_perpendicular_to_rope() {
        let (mut rope, mut body, _, _) = hanging();
        let mut ctl = RopeController::default();
        ctl.apply(&RopeInput { axis: IVec2::new(1, 0), ..Default::default() }, &mut rope, &mut body);
        // Rope points straight up, so swinging right pushes along +x without sag
        let v = body.points[0].vel;
        assert!((v.x - 1.2).abs() < 1e-4);
        assert!(v.y.abs() < 1e-4);
    }
}
