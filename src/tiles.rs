//! In-memory tile grid for hosts that don't bring their own.

use crate::api::TileGrid;
use crate::error::Error;
use crate::types::*;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Tile {
    #[default]
    Air,
    Solid,
    HorizontalBeam,
    VerticalBeam,
}

impl Tile {
    fn from_char(ch: char) -> Option<Self> {
        match ch {
            '.' | ' ' => Some(Tile::Air),
            '#' => Some(Tile::Solid),
            '-' => Some(Tile::HorizontalBeam),
            '|' => Some(Tile::VerticalBeam),
            _ => None,
        }
    }
}

/// Dense `width x height` grid with tile (0,0) at the world origin, y up.
///
/// Coordinates outside the grid read as solid, so a room is always closed.
#[derive(Clone, Debug)]
pub struct TileMap {
    width: usize,
    height: usize,
    tile_size: f32,
    tiles: Vec<Tile>,
}

impl TileMap {
    /// All-air map.
    pub fn new(width: usize, height: usize, tile_size: f32) -> Self {
        Self {
            width,
            height,
            tile_size,
            tiles: vec![Tile::Air; width * height],
        }
    }

    /// Parse rows written top to bottom: `#` solid, `.` air, `-` horizontal beam,
    /// `|` vertical beam. Blank lines and surrounding whitespace are ignored.
    pub fn from_ascii(text: &str, tile_size: f32) -> Result<Self, Error> {
        let rows: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        let Some(first) = rows.first() else { return Err(Error::EmptyMap) };
        let width = first.chars().count();
        let height = rows.len();
        let mut map = Self::new(width, height, tile_size);

        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(Error::RaggedMap { row, expected: width, found });
            }
            let y = (height - 1 - row) as i32;
            for (col, ch) in line.chars().enumerate() {
                let tile = Tile::from_char(ch).ok_or(Error::UnknownTile { row, col, ch })?;
                map.set(TileCoord::new(col as i32, y), tile);
            }
        }
        Ok(map)
    }

    pub fn width(&self) -> usize { self.width }

    pub fn height(&self) -> usize { self.height }

    pub fn get(&self, coord: TileCoord) -> Tile {
        self.index(coord).map_or(Tile::Solid, |i| self.tiles[i])
    }

    /// Set one tile; returns false when `coord` is outside the grid.
    pub fn set(&mut self, coord: TileCoord, tile: Tile) -> bool {
        match self.index(coord) {
            Some(i) => {
                self.tiles[i] = tile;
                true
            }
            None => false,
        }
    }

    /// Set every in-bounds tile of the inclusive rectangle spanned by `a` and `b`.
    pub fn fill(&mut self, a: TileCoord, b: TileCoord, tile: Tile) {
        for y in a.y.min(b.y)..=a.y.max(b.y) {
            for x in a.x.min(b.x)..=a.x.max(b.x) {
                self.set(TileCoord::new(x, y), tile);
            }
        }
    }

    fn index(&self, c: TileCoord) -> Option<usize> {
        if c.x < 0 || c.y < 0 {
            return None;
        }
        let (x, y) = (c.x as usize, c.y as usize);
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }
}

impl TileGrid for TileMap {
    fn tile_size(&self) -> f32 {
        self.tile_size
    }

    fn is_solid(&self, coord: TileCoord) -> bool {
        self.get(coord) == Tile::Solid
    }

    fn beam(&self, coord: TileCoord) -> BeamKind {
        match self.get(coord) {
            Tile::HorizontalBeam => BeamKind::Horizontal,
            Tile::VerticalBeam => BeamKind::Vertical,
            _ => BeamKind::None,
        }
    }
}
