use std::collections::BTreeMap;

use glam::{IVec2, Vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use silkline::tiles::Tile;
use silkline::world::ObjectPool;
use silkline::*;

/// Open space with a solid wall filling every tile column from `x` on.
struct Wall {
    x: i32,
}

impl TileGrid for Wall {
    fn tile_size(&self) -> f32 {
        20.0
    }

    fn is_solid(&self, coord: TileCoord) -> bool {
        coord.x >= self.x
    }

    fn beam(&self, _coord: TileCoord) -> BeamKind {
        BeamKind::None
    }
}

fn body_at(pos: Vec2) -> CharacterBody {
    CharacterBody::new(vec![BodyPoint::new(pos, 5.0, 0.7), BodyPoint::new(pos - Vec2::new(0.0, 10.0), 5.0, 0.7)], 0)
}

/// Shoot along +x from the origin into a wall at x=120 and return the attached rope.
fn shoot_into_wall(body: &mut CharacterBody) -> RopeState {
    let wall = Wall { x: 6 };
    let mut objects = ObjectPool::new();
    let mut rope = RopeState::new(RopeConfig::default(), Vec2::ZERO);
    rope.shoot(body, Vec2::X);

    rope.update(body, &wall, &mut objects);
    assert!((rope.tip() - Vec2::new(50.0, -0.9)).length() < 1e-3);
    rope.update(body, &wall, &mut objects);
    assert!((rope.tip() - Vec2::new(100.0, -2.7)).length() < 1e-3);
    assert_eq!(rope.mode(), RopeMode::ShootingOut);
    rope.update(body, &wall, &mut objects);
    rope
}

#[test]
fn test_scenario_shoot_into_wall() {
    let mut body = body_at(Vec2::ZERO);
    let rope = shoot_into_wall(&mut body);

    assert_eq!(rope.mode(), RopeMode::AttachedToTerrain);
    let Some(Anchor::Terrain(anchor)) = rope.anchor() else { panic!("expected terrain anchor") };
    assert!((anchor.x - 119.0).abs() < 1e-3);
    assert!(anchor.y < 0.0 && anchor.y > -5.4);
    let dist = anchor.length();
    assert!((rope.ideal_length() - dist).abs() < 1e-3);
    assert!((50.0..=800.0).contains(&rope.ideal_length()));
    assert_eq!(rope.requested_length(), rope.ideal_length());
    assert_eq!(body.reference_pos(), Some(Vec2::ZERO));
}

#[test]
fn test_scenario_overextended_body_is_pulled_back() {
    let mut body = body_at(Vec2::ZERO);
    let mut rope = shoot_into_wall(&mut body);
    let Some(Anchor::Terrain(anchor)) = rope.anchor() else { panic!("expected terrain anchor") };

    rope.set_ideal_length(100.0);
    while rope.requested_length() > 100.0 {
        rope.regulate_length();
    }
    assert_eq!(rope.requested_length(), 100.0);
    assert_eq!(rope.elasticity(), 0.0);

    // Put the reference point 140 units from the anchor, straight to its left
    let start = anchor - Vec2::new(140.0, 0.0);
    body = body_at(start);
    rope.apply_elastic_constraint(&mut body);

    let moved = body.reference_pos().map(|p| p - start).unwrap_or_default();
    assert!((moved - Vec2::new(15.0, 0.0)).length() < 1e-3);
    assert!((rope.elasticity() - 0.15).abs() < 1e-6);
}

#[test]
fn test_scenario_pull_stops_near_character() {
    let map = TileMap::new(30, 30, 20.0);
    let mut objects = ObjectPool::new();
    let rock = objects.insert(ObjectCategory::Rock, 0, vec![BodyPoint::new(Vec2::new(205.0, 300.0), 5.0, 0.2)]);
    let mut body = body_at(Vec2::new(105.0, 300.0));
    let mut rope = RopeState::new(RopeConfig::default(), Vec2::ZERO);

    rope.shoot(&body, Vec2::X);
    rope.update(&mut body, &map, &mut objects);
    rope.update(&mut body, &map, &mut objects);
    assert_eq!(rope.mode(), RopeMode::AttachedToObject);
    rope.set_pulling(true);
    assert!(rope.is_pulling());

    // Object ends up 15 units from the character
    if let Some(obj) = objects.object_mut(rock) {
        obj.points[0].pos = Vec2::new(120.0, 300.0);
    }
    rope.update(&mut body, &map, &mut objects);

    assert!(!rope.is_pulling());
    assert_eq!(objects.object(rock).map(|o| o.points[0].vel), Some(Vec2::ZERO));
    let events = rope.drain_events();
    assert!(events.contains(&RopeEvent::PullStarted { object: rock }));
    assert!(events.contains(&RopeEvent::PullStopped { object: rock }));
}

#[test]
fn test_release_from_object_retracts_next_tick() {
    let map = TileMap::new(30, 30, 20.0);
    let mut objects = ObjectPool::new();
    let rock = objects.insert(ObjectCategory::Rock, 0, vec![BodyPoint::new(Vec2::new(205.0, 300.0), 5.0, 0.2)]);
    let mut body = body_at(Vec2::new(105.0, 300.0));
    let mut rope = RopeState::new(RopeConfig::default(), Vec2::ZERO);

    rope.shoot(&body, Vec2::X);
    rope.update(&mut body, &map, &mut objects);
    rope.update(&mut body, &map, &mut objects);
    assert_eq!(rope.anchor(), Some(Anchor::Object { object: rock, point: 0 }));
    rope.set_pulling(true);

    rope.release();
    assert_eq!(rope.mode(), RopeMode::Retracting);
    assert!(rope.anchor().is_none());
    assert!(!rope.is_pulling());

    rope.update(&mut body, &map, &mut objects);
    assert_eq!(rope.mode(), RopeMode::Retracted);
    assert!(rope.anchor().is_none());
    assert!(!rope.is_pulling());
    assert_eq!(rope.requested_length(), 0.0);
}

#[test]
fn test_invariants_hold_under_random_commands() {
    let mut map = TileMap::new(40, 30, 20.0);
    map.fill(TileCoord::new(0, 25), TileCoord::new(39, 25), Tile::Solid);
    map.fill(TileCoord::new(12, 10), TileCoord::new(13, 10), Tile::HorizontalBeam);
    let mut objects = ObjectPool::new();
    let rock = objects.insert(ObjectCategory::Rock, 0, vec![BodyPoint::new(Vec2::new(500.0, 250.0), 6.0, 0.3)]);
    objects.insert(ObjectCategory::Creature, 0, vec![BodyPoint::new(Vec2::new(200.0, 300.0), 8.0, 1.0)]);
    let mut body = body_at(Vec2::new(400.0, 250.0));
    let mut rope = RopeState::new(RopeConfig::default(), Vec2::ZERO);
    let mut rng = StdRng::seed_from_u64(7);

    for tick in 0..2000 {
        match rng.gen_range(0..16) {
            0 | 1 => {
                let angle = rng.gen_range(0.0..std::f32::consts::TAU);
                rope.shoot(&body, Vec2::from_angle(angle));
            }
            2 => rope.release(),
            3 => rope.set_ideal_length(rng.gen_range(0.0..1000.0)),
            4 => rope.set_pulling(rng.gen_bool(0.5)),
            5 if tick % 97 == 0 => {
                objects.remove(rock);
            }
            _ => {}
        }
        let was = rope.mode();
        rope.update(&mut body, &map, &mut objects);

        if was == RopeMode::Retracting {
            assert_eq!(rope.mode(), RopeMode::Retracted);
        }
        if rope.mode() == RopeMode::Retracted {
            assert_eq!(rope.requested_length(), 0.0);
            assert!(!rope.is_pulling());
            assert!(rope.anchor().is_none());
        }
        if rope.is_attached() {
            assert!((50.0..=800.0).contains(&rope.requested_length()));
            assert!(rope.anchor().is_some());
        }
        assert!(rope.elasticity() >= 0.0 && rope.elasticity() <= 0.8);
        rope.drain_events();
    }
}

#[test]
fn test_world_character_hangs_from_ceiling() {
    let mut room = String::from("####################\n");
    for _ in 0..15 {
        room.push_str("....................\n");
    }
    let mut world = World::from_ascii(WorldConfig::default(), &room).unwrap();
    let id = CharacterId(0);
    world.spawn(id, body_at(Vec2::new(205.0, 110.0))).unwrap();

    let mut inputs = BTreeMap::new();
    inputs.insert(id, RopeInput { shoot: true, aim: Some(Vec2::Y), ..Default::default() });
    world.step(&inputs);
    inputs.clear();
    for _ in 0..5 {
        world.step(&inputs);
    }
    let c = world.character(id).unwrap();
    assert_eq!(c.rope.mode(), RopeMode::AttachedToTerrain);

    for _ in 0..100 {
        world.step(&inputs);
    }
    let c = world.character(id).unwrap();
    let Some(Anchor::Terrain(anchor)) = c.rope.anchor() else { panic!("expected terrain anchor") };
    assert!((anchor.y - 299.0).abs() < 1e-3);
    let dist = c.body.reference_pos().map(|p| p.distance(anchor)).unwrap_or(f32::MAX);
    assert!(dist < c.rope.requested_length() + 20.0);
    assert!(c.rope.attached_ticks() > 100);
}

#[test]
fn test_world_swing_and_release() {
    let mut room = String::from("####################\n");
    for _ in 0..15 {
        room.push_str("....................\n");
    }
    let mut world = World::from_ascii(WorldConfig::default(), &room).unwrap();
    let id = CharacterId(0);
    world.spawn(id, body_at(Vec2::new(205.0, 110.0))).unwrap();

    let mut inputs = BTreeMap::new();
    inputs.insert(id, RopeInput { shoot: true, aim: Some(Vec2::Y), ..Default::default() });
    world.step(&inputs);
    inputs.insert(id, RopeInput::default());
    for _ in 0..5 {
        world.step(&inputs);
    }

    inputs.insert(id, RopeInput { axis: IVec2::new(1, 0), ..Default::default() });
    for _ in 0..10 {
        world.step(&inputs);
    }
    let c = world.character(id).unwrap();
    assert!(c.body.reference_pos().unwrap().x > 205.0);

    world.character_mut(id).unwrap().rope.drain_events();

    // Release lands before the rope update, which finishes the retraction in the same step
    inputs.insert(id, RopeInput { release: true, ..Default::default() });
    world.step(&inputs);
    let c = world.character_mut(id).unwrap();
    assert_eq!(c.rope.mode(), RopeMode::Retracted);
    assert_eq!(c.rope.requested_length(), 0.0);
    assert!(c.rope.anchor().is_none());
    assert_eq!(c.rope.drain_events(), vec![RopeEvent::Released]);
}
