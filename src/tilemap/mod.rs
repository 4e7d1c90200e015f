//! Tile painting surface.
//!
//! The generator paints four layers (water, sand, grass, decoration) through
//! the `TileSurface` trait. Cells are integer coordinates; world positions
//! map to cells with a unit cell size. `MemoryTilemap` is the in-process
//! implementation used by the streaming plugin, the tests and the benches.

use std::collections::HashMap;

use bevy::math::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

/// Integer cell coordinate
pub type CellPos = IVec2;

/// Opaque tile reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(pub String);

impl TileId {
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Paint layers, bottom to top
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TileLayer {
    Water,
    Sand,
    Grass,
    Decoration,
}

impl TileLayer {
    pub const ALL: [TileLayer; 4] = [
        TileLayer::Water,
        TileLayer::Sand,
        TileLayer::Grass,
        TileLayer::Decoration,
    ];

    /// Salt mixed into positional hashes so layers decorrelate
    pub fn salt(&self) -> u64 {
        match self {
            TileLayer::Water => 0x57A7,
            TileLayer::Sand => 0x5A4D,
            TileLayer::Grass => 0x6A55,
            TileLayer::Decoration => 0xDEC0,
        }
    }
}

/// Quarter-turn rotation of a placed tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    pub fn from_quarter_turns(turns: u64) -> Self {
        match turns % 4 {
            0 => Rotation::R0,
            1 => Rotation::R90,
            2 => Rotation::R180,
            _ => Rotation::R270,
        }
    }

    pub fn degrees(&self) -> f32 {
        match self {
            Rotation::R0 => 0.0,
            Rotation::R90 => 90.0,
            Rotation::R180 => 180.0,
            Rotation::R270 => 270.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacedTile {
    pub tile: TileId,
    pub rotation: Rotation,
}

/// A surface the generator can paint onto
pub trait TileSurface {
    fn set_tile(&mut self, layer: TileLayer, cell: CellPos, tile: PlacedTile);
    fn clear_tile(&mut self, layer: TileLayer, cell: CellPos);
    fn tile(&self, layer: TileLayer, cell: CellPos) -> Option<&PlacedTile>;

    fn has_tile(&self, layer: TileLayer, cell: CellPos) -> bool {
        self.tile(layer, cell).is_some()
    }

    /// World position to the cell containing it
    fn world_to_cell(&self, world: Vec2) -> CellPos {
        world.floor().as_ivec2()
    }

    /// Center of a cell in world space
    fn cell_center_world(&self, cell: CellPos) -> Vec2 {
        cell.as_vec2() + Vec2::splat(0.5)
    }
}

/// HashMap-backed tile surface with unit cells
#[derive(Debug, Clone, Default)]
pub struct MemoryTilemap {
    tiles: HashMap<(TileLayer, CellPos), PlacedTile>,
}

impl MemoryTilemap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn count_layer(&self, layer: TileLayer) -> usize {
        self.tiles.keys().filter(|(l, _)| *l == layer).count()
    }

    pub fn clear_all(&mut self) {
        self.tiles.clear();
    }

    /// All tiles of one layer, sorted by (x, y) for stable comparisons
    pub fn layer_tiles(&self, layer: TileLayer) -> Vec<(CellPos, PlacedTile)> {
        let mut out: Vec<(CellPos, PlacedTile)> = self
            .tiles
            .iter()
            .filter(|((l, _), _)| *l == layer)
            .map(|((_, cell), tile)| (*cell, tile.clone()))
            .collect();
        out.sort_by_key(|(cell, _)| (cell.x, cell.y));
        out
    }
}

impl TileSurface for MemoryTilemap {
    fn set_tile(&mut self, layer: TileLayer, cell: CellPos, tile: PlacedTile) {
        self.tiles.insert((layer, cell), tile);
    }

    fn clear_tile(&mut self, layer: TileLayer, cell: CellPos) {
        self.tiles.remove(&(layer, cell));
    }

    fn tile(&self, layer: TileLayer, cell: CellPos) -> Option<&PlacedTile> {
        self.tiles.get(&(layer, cell))
    }
}
