//! Error types for configuration and host setup.

use core::fmt;

use crate::types::CharacterId;

/// Errors raised outside the per-tick rope update (which never fails).
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A configuration value is out of its accepted range.
    InvalidConfig { field: &'static str, reason: &'static str },
    /// An ASCII map had no rows.
    EmptyMap,
    /// An ASCII map row has a different width than the first row.
    RaggedMap { row: usize, expected: usize, found: usize },
    /// An ASCII map contains a character with no tile meaning.
    UnknownTile { row: usize, col: usize, ch: char },
    /// A character with this id already exists.
    DuplicateCharacter(CharacterId),
    /// No character with this id exists.
    UnknownCharacter(CharacterId),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfig { field, reason } => {
                write!(f, "invalid config `{}`: {}", field, reason)
            }
            Error::EmptyMap => write!(f, "tile map has no rows"),
            Error::RaggedMap { row, expected, found } => {
                write!(f, "tile map row {} has width {} (expected {})", row, found, expected)
            }
            Error::UnknownTile { row, col, ch } => {
                write!(f, "unknown tile {:?} at row {}, column {}", ch, row, col)
            }
            Error::DuplicateCharacter(id) => write!(f, "character {} already exists", id.0),
            Error::UnknownCharacter(id) => write!(f, "no character {}", id.0),
        }
    }
}

impl std::error::Error for Error {}
