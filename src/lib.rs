//! silkline: grapple rope core for 2D platformer characters (shoot, stick, swing, reel)

pub mod types;
pub mod config;
pub mod error;
pub mod api;
pub mod narrowphase;
pub mod rope;
pub mod control;
pub mod tiles;
pub mod world;

pub use crate::types::*;
pub use crate::api::*;
pub use crate::config::{ControlConfig, RopeConfig, WorldConfig};
pub use crate::error::Error;
pub use crate::rope::RopeState;
pub use crate::control::{RopeController, RopeInput};
pub use crate::tiles::TileMap;
pub use crate::world::World;
