//! Tunables for the rope core, the input controller and the reference host.
//!
//! Every struct deserializes from a partial document: missing fields take their defaults.
//!
//! ```
//! use silkline::RopeConfig;
//!
//! let cfg = RopeConfig::default()
//!     .with_length_range(40.0, 600.0)
//!     .with_shoot_speed(35.0);
//! assert!(cfg.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Error;

/// Constants of the rope state machine and its two control loops.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RopeConfig {
    /// Shortest enforced rope length while attached.
    pub min_length: f32,
    /// Longest enforced rope length while attached.
    pub max_length: f32,
    /// Tip speed right after `shoot`, in units per tick.
    pub shoot_speed: f32,
    /// Downward tip acceleration while flying at zero elasticity.
    pub gravity: f32,
    pub max_elasticity: f32,
    /// Elasticity gained per tick of overextension.
    pub elasticity_rise: f32,
    /// Elasticity lost per tick of length regulation.
    pub elasticity_decay: f32,
    /// Share of the excess length corrected in one tick.
    pub correction_factor: f32,
    /// Cap on the positional correction per tick.
    pub max_correction: f32,
    /// Share of the along-rope velocity removed on correction.
    pub velocity_damping: f32,
    /// Length regulation speed at zero elasticity, in units per tick.
    pub regulation_rate: f32,
    /// The tip must be this far from the character before objects are probed.
    pub object_probe_min_distance: f32,
    /// Added to an object point's radius when probing.
    pub object_probe_margin: f32,
    /// A returning tip closer than this to the character retracts.
    pub return_catch_distance: f32,
    /// Beam snaps stay within this distance of the beam tile's midpoint.
    pub beam_snap_range: f32,
    /// Tile rectangles are grown by this much before computing the terrain attach point.
    pub tile_grow: f32,
    /// Capacity of the tile scratch buffer used by the beam probe. Longer traces are cut short.
    pub trace_capacity: usize,
    pub pull_force: f32,
    /// Floor on point mass when dividing the pull force.
    pub min_pull_mass: f32,
    pub max_pull_speed: f32,
    /// Pulling stops once the object is this close to the character.
    pub pull_release_distance: f32,
    /// When set, a flying tip farther than this from the character retracts as a miss.
    /// Off by default: the shot then ends only by attaching or returning.
    pub max_flight_distance: Option<f32>,
}

impl Default for RopeConfig {
    fn default() -> Self {
        Self {
            min_length: 50.0,
            max_length: 800.0,
            shoot_speed: 50.0,
            gravity: 0.9,
            max_elasticity: 0.8,
            elasticity_rise: 0.15,
            elasticity_decay: 0.05,
            correction_factor: 0.6,
            max_correction: 15.0,
            velocity_damping: 0.4,
            regulation_rate: 10.0,
            object_probe_min_distance: 60.0,
            object_probe_margin: 5.0,
            return_catch_distance: 40.0,
            beam_snap_range: 10.0,
            tile_grow: 1.0,
            trace_capacity: 20,
            pull_force: 1.8,
            min_pull_mass: 0.5,
            max_pull_speed: 25.0,
            pull_release_distance: 20.0,
            max_flight_distance: None,
        }
    }
}

impl RopeConfig {
    pub fn with_length_range(mut self, min: f32, max: f32) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    pub fn with_shoot_speed(mut self, speed: f32) -> Self {
        self.shoot_speed = speed;
        self
    }

    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_trace_capacity(mut self, capacity: usize) -> Self {
        self.trace_capacity = capacity;
        self
    }

    pub fn with_max_flight_distance(mut self, distance: f32) -> Self {
        self.max_flight_distance = Some(distance);
        self
    }

    /// Clamp `len` into `[min_length, max_length]`.
    pub fn clamp_length(&self, len: f32) -> f32 {
        len.clamp(self.min_length, self.max_length)
    }

    pub fn validate(&self) -> Result<(), Error> {
        let scalars = [
            ("min_length", self.min_length),
            ("max_length", self.max_length),
            ("shoot_speed", self.shoot_speed),
            ("gravity", self.gravity),
            ("max_elasticity", self.max_elasticity),
            ("elasticity_rise", self.elasticity_rise),
            ("elasticity_decay", self.elasticity_decay),
            ("correction_factor", self.correction_factor),
            ("max_correction", self.max_correction),
            ("velocity_damping", self.velocity_damping),
            ("regulation_rate", self.regulation_rate),
            ("object_probe_min_distance", self.object_probe_min_distance),
            ("object_probe_margin", self.object_probe_margin),
            ("return_catch_distance", self.return_catch_distance),
            ("beam_snap_range", self.beam_snap_range),
            ("tile_grow", self.tile_grow),
            ("pull_force", self.pull_force),
            ("min_pull_mass", self.min_pull_mass),
            ("max_pull_speed", self.max_pull_speed),
            ("pull_release_distance", self.pull_release_distance),
        ];
        for (field, v) in scalars {
            check(field, v.is_finite(), "must be finite")?;
            check(field, v >= 0.0, "must not be negative")?;
        }
        check("min_length", self.min_length > 0.0, "must be positive")?;
        check("max_length", self.max_length >= self.min_length, "must not be below min_length")?;
        check(
            "max_elasticity",
            self.max_elasticity > 0.0 && self.max_elasticity < 1.0,
            "must be in (0, 1)",
        )?;
        check("velocity_damping", self.velocity_damping <= 1.0, "must be at most 1")?;
        check("min_pull_mass", self.min_pull_mass > 0.0, "must be positive")?;
        check("trace_capacity", self.trace_capacity > 0, "must be positive")?;
        if let Some(d) = self.max_flight_distance {
            check("max_flight_distance", d.is_finite() && d > 0.0, "must be positive")?;
        }
        Ok(())
    }
}

/// Forces and thresholds of the input controller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Velocity added toward (up) or away from (down) the anchor per tick of climbing.
    pub climb_force: f32,
    /// Ideal length change per tick of climbing.
    pub climb_step: f32,
    pub swing_force: f32,
    /// Extra downward velocity while swinging with a mostly horizontal rope.
    pub swing_sag: f32,
    /// `|to_anchor.x|` above which `swing_sag` applies.
    pub swing_sag_threshold: f32,
    /// Body speed above which the velocity is used as aim direction.
    pub aim_velocity_threshold: f32,
    /// Aim vectors shorter than this fall back to the facing direction.
    pub min_aim_magnitude: f32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            climb_force: 0.8,
            climb_step: 4.0,
            swing_force: 1.2,
            swing_sag: 0.3,
            swing_sag_threshold: 0.3,
            aim_velocity_threshold: 0.5,
            min_aim_magnitude: 0.1,
        }
    }
}

impl ControlConfig {
    pub fn validate(&self) -> Result<(), Error> {
        let scalars = [
            ("climb_force", self.climb_force),
            ("climb_step", self.climb_step),
            ("swing_force", self.swing_force),
            ("swing_sag", self.swing_sag),
            ("swing_sag_threshold", self.swing_sag_threshold),
            ("aim_velocity_threshold", self.aim_velocity_threshold),
            ("min_aim_magnitude", self.min_aim_magnitude),
        ];
        for (field, v) in scalars {
            check(field, v.is_finite(), "must be finite")?;
            check(field, v >= 0.0, "must not be negative")?;
        }
        Ok(())
    }
}

/// Configuration of the reference host world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Side of a square tile in world units.
    pub tile_size: f32,
    /// Downward acceleration applied to host bodies per tick.
    pub gravity: f32,
    /// Record a per-step timing breakdown (adds small overhead when true).
    pub enable_timing: bool,
    pub rope: RopeConfig,
    pub control: ControlConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            tile_size: 20.0,
            gravity: 0.9,
            enable_timing: false,
            rope: RopeConfig::default(),
            control: ControlConfig::default(),
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> Result<(), Error> {
        check("tile_size", self.tile_size.is_finite() && self.tile_size > 0.0, "must be positive")?;
        check("gravity", self.gravity.is_finite(), "must be finite")?;
        self.rope.validate()?;
        self.control.validate()
    }
}

fn check(field: &'static str, ok: bool, reason: &'static str) -> Result<(), Error> {
    if ok {
        Ok(())
    } else {
        warn!(field, reason, "rejected configuration");
        Err(Error::InvalidConfig { field, reason })
    }
}
