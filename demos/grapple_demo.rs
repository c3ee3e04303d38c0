use std::collections::BTreeMap;

use glam::{IVec2, Vec2};
use silkline::*;
use tracing_subscriber::EnvFilter;

const ROOM: &str = "
    ####################
    #..................#
    #..................#
    #........-.........#
    #..................#
    #..................#
    #..................#
    #..................#
    #..................#
    #..................#
    #..................#
    ####################
";

fn main() {
    // RUST_LOG=silkline=debug shows every rope transition
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = WorldConfig {
        gravity: 0.3,
        enable_timing: true,
        ..Default::default()
    };
    let mut world = match World::from_ascii(cfg, ROOM) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("bad room: {e}");
            return;
        }
    };

    let swinger = CharacterId(1);
    let reeler = CharacterId(2);
    let body = |pos: Vec2| {
        CharacterBody::new(
            vec![BodyPoint::new(pos, 5.0, 0.7), BodyPoint::new(pos - Vec2::new(0.0, 10.0), 5.0, 0.7)],
            0,
        )
    };
    world.spawn(swinger, body(Vec2::new(100.0, 120.0))).ok();
    world.spawn(reeler, body(Vec2::new(60.0, 60.0))).ok();
    let rock = world.objects.insert(
        ObjectCategory::Rock,
        0,
        vec![BodyPoint::new(Vec2::new(310.0, 50.0), 6.0, 0.4)],
    );
    println!("Spawned swinger={:?} reeler={:?} rock={:?}", swinger, reeler, rock);

    for tick in 0..60u32 {
        let mut inputs = BTreeMap::new();
        inputs.insert(swinger, swinger_input(tick));
        inputs.insert(reeler, reeler_input(tick));
        world.step(&inputs);
        let now = world.tick();

        for id in [swinger, reeler] {
            let Some(c) = world.character_mut(id) else { continue };
            for ev in c.rope.drain_events() {
                println!("[{:>3}] {:?}: {:?}", now, id, ev);
            }
        }

        if tick % 10 == 9 {
            for c in world.characters() {
                println!(
                    "[{:>3}] {:?} mode={:?} tip=({:.1},{:.1}) requested={:.1} ideal={:.1} elasticity={:.2}",
                    now,
                    c.id,
                    c.rope.mode(),
                    c.rope.tip().x,
                    c.rope.tip().y,
                    c.rope.requested_length(),
                    c.rope.ideal_length(),
                    c.rope.elasticity()
                );
            }
            for o in world.objects.iter() {
                let p = o.points[0];
                println!(
                    "      {:?} {:?} pos=({:.1},{:.1}) vel=({:.2},{:.2})",
                    o.id, o.category, p.pos.x, p.pos.y, p.vel.x, p.vel.y
                );
            }
        }
    }

    if let Some(t) = world.timing() {
        println!(
            "timing: step={:.3}ms rope={:.3}ms integrate={:.3}ms characters={}",
            t.step_ms, t.rope_ms, t.integrate_ms, t.characters
        );
    }
}

/// Shoot at the ceiling, swing right, climb, then let go.
fn swinger_input(tick: u32) -> RopeInput {
    match tick {
        0 => RopeInput { shoot: true, aim: Some(Vec2::Y), ..Default::default() },
        5..=24 => RopeInput { axis: IVec2::new(1, 0), ..Default::default() },
        25..=39 => RopeInput { axis: IVec2::new(0, 1), ..Default::default() },
        50 => RopeInput { release: true, ..Default::default() },
        _ => RopeInput::default(),
    }
}

/// Shoot toward the rock, then start reeling it in.
fn reeler_input(tick: u32) -> RopeInput {
    match tick {
        0 => RopeInput { shoot: true, aim: Some(Vec2::X), ..Default::default() },
        10 => RopeInput { pull: true, ..Default::default() },
        _ => RopeInput::default(),
    }
}
