use glam::Vec2;

/// Identifier of a spatial region (room). Bodies in different regions never interact.
pub type RegionId = u32;

/// Stable handle of a dynamic object in the host registry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub u32);

/// Stable handle of a character in the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CharacterId(pub u32);

/// Integer tile coordinate (x right, y up).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Tile containing world point `p` for square tiles of `tile_size`.
    pub fn containing(p: Vec2, tile_size: f32) -> Self {
        let s = tile_size.max(1e-5);
        Self {
            x: (p.x / s).floor() as i32,
            y: (p.y / s).floor() as i32,
        }
    }
}

/// Axis-aligned rectangle given by its corners.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Expand by `amount` on every side.
    pub fn grow(self, amount: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(amount),
            max: self.max + Vec2::splat(amount),
        }
    }

    pub fn center(self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Closest point of the rectangle to `p`.
    pub fn clamp(self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max)
    }
}

/// Where a segment first enters a shape.
#[derive(Copy, Clone, Debug)]
pub struct SegmentHit {
    /// Fraction in [0,1] along the segment.
    pub toi: f32,
    /// Entry normal (zero when the segment starts inside).
    pub normal: Vec2,
    pub contact: Vec2,
}

/// Climbable beam decoration carried by a tile.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BeamKind {
    #[default]
    None,
    Horizontal,
    Vertical,
}

/// One simulated point of a body (character or dynamic object).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BodyPoint {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub mass: f32,
}

impl BodyPoint {
    pub fn new(pos: Vec2, radius: f32, mass: f32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            radius,
            mass,
        }
    }

    pub fn with_vel(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }
}

/// The part of a host character the rope reads and corrects.
///
/// `points[0]` is the reference point the rope is fired from and measured against.
#[derive(Clone, Debug)]
pub struct CharacterBody {
    pub points: Vec<BodyPoint>,
    pub region: RegionId,
    /// Facing sign (+1 right, -1 left). Only used as an aim fallback.
    pub flip: f32,
}

impl CharacterBody {
    pub fn new(points: Vec<BodyPoint>, region: RegionId) -> Self {
        Self {
            points,
            region,
            flip: 1.0,
        }
    }

    pub fn reference(&self) -> Option<&BodyPoint> {
        self.points.first()
    }

    pub fn reference_pos(&self) -> Option<Vec2> {
        self.points.first().map(|p| p.pos)
    }

    /// Add `dv` to the velocity of every point.
    pub fn push(&mut self, dv: Vec2) {
        for p in &mut self.points {
            p.vel += dv;
        }
    }
}

/// Category tag of a dynamic object; decides whether the rope may grab it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ObjectCategory {
    Weapon,
    Fruit,
    Plant,
    Pearl,
    Rock,
    Explosive,
    Spear,
    Creature,
    Debris,
}

impl ObjectCategory {
    /// Allow-list of categories the rope can attach to and reel in.
    pub fn is_pullable(self) -> bool {
        matches!(
            self,
            ObjectCategory::Weapon
                | ObjectCategory::Fruit
                | ObjectCategory::Plant
                | ObjectCategory::Pearl
                | ObjectCategory::Rock
                | ObjectCategory::Explosive
                | ObjectCategory::Spear
        )
    }
}

/// A dynamic object as seen through the host registry.
#[derive(Clone, Debug)]
pub struct DynamicObject {
    pub id: ObjectId,
    pub category: ObjectCategory,
    pub region: RegionId,
    pub points: Vec<BodyPoint>,
}

/// Attachment state machine modes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RopeMode {
    #[default]
    Retracted,
    ShootingOut,
    AttachedToTerrain,
    AttachedToObject,
    /// One-tick transitional state on the way back to `Retracted`.
    Retracting,
}

impl RopeMode {
    pub fn is_attached(self) -> bool {
        matches!(self, RopeMode::AttachedToTerrain | RopeMode::AttachedToObject)
    }
}

/// What the tip is stuck to.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Anchor {
    /// Fixed world point on terrain.
    Terrain(Vec2),
    /// Back-reference to one point of a registry object; looked up every tick.
    Object { object: ObjectId, point: usize },
}

/// Why an attachment ended without a release command.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DetachReason {
    /// The object or its point is gone from the registry.
    Stale,
    /// The object left the character's region.
    RegionChanged,
}

/// Rope lifecycle notifications, drained by audio/render collaborators.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RopeEvent {
    Shot { direction: Vec2 },
    AttachedTerrain { anchor: Vec2, beam: bool },
    AttachedObject { object: ObjectId, point: usize },
    Released,
    Detached { reason: DetachReason },
    /// The tip flew back to the character without attaching.
    Returned,
    /// The tip flew past `max_flight_distance` without attaching.
    Missed,
    PullStarted { object: ObjectId },
    PullStopped { object: ObjectId },
}

/// Timing breakdown for the last world step.
#[derive(Copy, Clone, Debug, Default)]
pub struct TickTiming {
    pub step_ms: f64,
    /// Controller input plus rope update, summed over characters.
    pub rope_ms: f64,
    pub integrate_ms: f64,
    pub characters: usize,
}
