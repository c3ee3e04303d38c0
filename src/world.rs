use glam::Vec2;

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::info;

use crate::api::ObjectRegistry;
use crate::config::WorldConfig;
use crate::control::{RopeController, RopeInput};
use crate::error::Error;
use crate::rope::RopeState;
use crate::tiles::TileMap;
use crate::types::*;

/// Dynamic objects keyed by id; iteration is in id order.
#[derive(Clone, Debug, Default)]
pub struct ObjectPool {
    objects: BTreeMap<ObjectId, DynamicObject>,
    next_id: u32,
}

impl ObjectPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: ObjectCategory, region: RegionId, points: Vec<BodyPoint>) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.objects.insert(id, DynamicObject { id, category, region, points });
        id
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<DynamicObject> {
        self.objects.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DynamicObject> {
        self.objects.values()
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut DynamicObject> {
        self.objects.values_mut()
    }
}

impl ObjectRegistry for ObjectPool {
    fn objects_in(&self, region: RegionId) -> impl Iterator<Item = &DynamicObject> {
        self.objects.values().filter(move |o| o.region == region)
    }

    fn object(&self, id: ObjectId) -> Option<&DynamicObject> {
        self.objects.get(&id)
    }

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut DynamicObject> {
        self.objects.get_mut(&id)
    }
}

/// A character owns its body, its rope and the controller feeding the rope.
pub struct Character {
    pub id: CharacterId,
    pub body: CharacterBody,
    pub rope: RopeState,
    pub controller: RopeController,
}

impl Character {
    /// Apply input, then advance the rope exactly once.
    pub fn update(&mut self, input: &RopeInput, tiles: &TileMap, objects: &mut ObjectPool) {
        self.controller.apply(input, &mut self.rope, &mut self.body);
        self.rope.update(&mut self.body, tiles, objects);
    }
}

/// Reference host: tiles, objects and characters stepped together.
pub struct World {
    pub cfg: WorldConfig,
    pub tiles: TileMap,
    pub objects: ObjectPool,
    characters: BTreeMap<CharacterId, Character>,
    tick: u64,
    last_timing: Option<TickTiming>,
}

impl World {
    /// Empty `width x height` room.
    pub fn new(cfg: WorldConfig, width: usize, height: usize) -> Result<Self, Error> {
        cfg.validate()?;
        let tiles = TileMap::new(width, height, cfg.tile_size);
        Ok(Self::with_tiles(cfg, tiles))
    }

    /// Room parsed with [`TileMap::from_ascii`].
    pub fn from_ascii(cfg: WorldConfig, text: &str) -> Result<Self, Error> {
        cfg.validate()?;
        let tiles = TileMap::from_ascii(text, cfg.tile_size)?;
        Ok(Self::with_tiles(cfg, tiles))
    }

    fn with_tiles(cfg: WorldConfig, tiles: TileMap) -> Self {
        Self {
            cfg,
            tiles,
            objects: ObjectPool::new(),
            characters: BTreeMap::new(),
            tick: 0,
            last_timing: None,
        }
    }

    /// Add a character with a fresh retracted rope.
    pub fn spawn(&mut self, id: CharacterId, body: CharacterBody) -> Result<(), Error> {
        if self.characters.contains_key(&id) {
            return Err(Error::DuplicateCharacter(id));
        }
        let origin = body.reference_pos().unwrap_or(Vec2::ZERO);
        let character = Character {
            id,
            rope: RopeState::new(self.cfg.rope.clone(), origin),
            controller: RopeController::new(self.cfg.control.clone()),
            body,
        };
        info!(character = id.0, x = origin.x, y = origin.y, "character spawned");
        self.characters.insert(id, character);
        Ok(())
    }

    /// Remove a character together with its rope state.
    pub fn despawn(&mut self, id: CharacterId) -> Result<Character, Error> {
        let character = self.characters.remove(&id).ok_or(Error::UnknownCharacter(id))?;
        info!(character = id.0, "character despawned");
        Ok(character)
    }

    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.characters.get(&id)
    }

    pub fn character_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.characters.get_mut(&id)
    }

    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Advance one tick. Characters without an entry in `inputs` get idle input.
    pub fn step(&mut self, inputs: &BTreeMap<CharacterId, RopeInput>) {
        let t_all = if self.cfg.enable_timing { Some(Instant::now()) } else { None };
        let mut timing = TickTiming::default();

        let idle = RopeInput::default();
        for (id, character) in self.characters.iter_mut() {
            let input = inputs.get(id).unwrap_or(&idle);
            let t0 = if self.cfg.enable_timing { Some(Instant::now()) } else { None };
            character.update(input, &self.tiles, &mut self.objects);
            if let Some(t0) = t0 {
                timing.rope_ms += t0.elapsed().as_secs_f64() * 1000.0;
            }
        }

        let t_int = if self.cfg.enable_timing { Some(Instant::now()) } else { None };
        self.integrate();
        self.tick += 1;

        if let (Some(t_all), Some(t_int)) = (t_all, t_int) {
            timing.integrate_ms = t_int.elapsed().as_secs_f64() * 1000.0;
            timing.step_ms = t_all.elapsed().as_secs_f64() * 1000.0;
            timing.characters = self.characters.len();
            self.last_timing = Some(timing);
        }
    }

    /// Free flight for every host body: gravity, then velocity.
    fn integrate(&mut self) {
        let g = Vec2::new(0.0, -self.cfg.gravity);
        let points = self
            .characters
            .values_mut()
            .flat_map(|c| c.body.points.iter_mut())
            .chain(self.objects.iter_mut().flat_map(|o| o.points.iter_mut()));
        for p in points {
            p.vel += g;
            p.pos += p.vel;
        }
    }

    /// Timing breakdown of the last `step` when `enable_timing` is set.
    pub fn timing(&self) -> Option<TickTiming> {
        self.last_timing
    }
}
