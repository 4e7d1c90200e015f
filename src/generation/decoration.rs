//! Decoration placement.
//!
//! Each interior cell of a band gets a decoration with the band's density.
//! Cells on band edges are skipped so overlays never fight the rule tiles:
//! - water: bottom and top water rows
//! - sand: the ground row, cells beside or above a neighbour's water line,
//!   and the topmost sand row when grass covers it
//! - grass: bottom and top grass rows
//!
//! All randomness comes from `cell_hash`, a pure function of the world seed
//! and the absolute cell, so repainting a cell always yields the same tile
//! and rotation.

use bevy::math::IVec2;
use serde::{Deserialize, Serialize};

use super::terrain::{Band, TerrainColumn};
use super::weighted;
use crate::config::{DecorationBand, DecorationSettings};
use crate::tilemap::{CellPos, PlacedTile, Rotation, TileId, TileLayer, TileSurface};

/// splitmix64 finaliser
pub fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Positional hash of a cell.
///
/// `salt` separates independent uses of the same cell (one per band).
pub fn cell_hash(seed: u64, x: i32, y: i32, salt: u64) -> u64 {
    let mut h = seed ^ salt.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    h = mix64(h ^ (x as u32 as u64));
    mix64(h ^ ((y as u32 as u64) << 32))
}

/// Top 24 bits as a float in `[0, 1)`
pub fn unit_f32(h: u64) -> f32 {
    (h >> 40) as f32 / (1u64 << 24) as f32
}

/// Random values a cell draws from its hash
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRoll {
    pub chance: f32,
    pub choice: f32,
    pub rotation: Rotation,
}

impl CellRoll {
    pub fn new(seed: u64, cell: CellPos, band: Band) -> Self {
        let h = cell_hash(seed, cell.x, cell.y, band_salt(band));
        Self {
            chance: unit_f32(h),
            choice: unit_f32(mix64(h ^ 1)),
            rotation: Rotation::from_quarter_turns(mix64(h ^ 2)),
        }
    }
}

fn band_salt(band: Band) -> u64 {
    match band {
        Band::Water => TileLayer::Water.salt(),
        Band::Sand => TileLayer::Sand.salt(),
        Band::Grass => TileLayer::Grass.salt(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecorationPlacement {
    pub cell: (i32, i32),
    pub band: Band,
    pub tile: TileId,
    pub rotation: Rotation,
}

/// Band of local cell `(x, y)` if it may carry a decoration
pub fn decoratable_band(columns: &[TerrainColumn], x: usize, y: i32, height: i32) -> Option<Band> {
    let column = columns.get(x)?;
    let water = column.water_depth(height);
    let grass_start = column.grass_start(height);

    match column.band_at(y, height)? {
        Band::Water => (y != 0 && y != water - 1).then_some(Band::Water),
        Band::Sand => {
            if y <= water || y >= grass_start {
                return None;
            }
            let left = if x > 0 {
                columns[x - 1].water_depth(height)
            } else {
                water
            };
            let right = columns
                .get(x + 1)
                .map_or(water, |c| c.water_depth(height));
            let side_edge = y < left || y < right;
            let below_edge = y - 1 == water || y - 1 < left || y - 1 < right;
            if side_edge || below_edge {
                return None;
            }
            let topmost = y == grass_start - 1;
            (!topmost || column.grass_depth == 0).then_some(Band::Sand)
        }
        Band::Grass => {
            let top = grass_start + column.grass_depth - 1;
            (y != grass_start && y != top).then_some(Band::Grass)
        }
    }
}

fn band_settings(settings: &DecorationSettings, band: Band) -> &DecorationBand {
    match band {
        Band::Water => &settings.water,
        Band::Sand => &settings.sand,
        Band::Grass => &settings.grass,
    }
}

/// Decorate every eligible cell of a chunk.
///
/// `origin` is the world cell of the chunk's bottom-left corner.
pub fn decorate(
    settings: &DecorationSettings,
    seed: u64,
    origin: IVec2,
    height: u32,
    columns: &[TerrainColumn],
    tiles: &mut dyn TileSurface,
) -> Vec<DecorationPlacement> {
    let height = height as i32;
    let mut placed = Vec::new();

    for x in 0..columns.len() {
        for y in 0..height {
            let Some(band) = decoratable_band(columns, x, y, height) else {
                continue;
            };
            let table = band_settings(settings, band);
            if table.tiles.is_empty() || table.density.is_nan() || table.density <= 0.0 {
                continue;
            }

            let cell = origin + IVec2::new(x as i32, y);
            let roll = CellRoll::new(seed, cell, band);
            if roll.chance >= table.density {
                continue;
            }

            let world_x = cell.x as f32;
            let total = weighted::total_weight(&table.tiles, world_x);
            if !weighted::drawable(total) {
                continue;
            }
            let Some(entry) = weighted::select(&table.tiles, world_x, roll.choice * total) else {
                continue;
            };

            let rotation = if entry.allow_rotation {
                roll.rotation
            } else {
                Rotation::R0
            };
            tiles.set_tile(
                TileLayer::Decoration,
                cell,
                PlacedTile {
                    tile: entry.tile.clone(),
                    rotation,
                },
            );
            placed.push(DecorationPlacement {
                cell: (cell.x, cell.y),
                band,
                tile: entry.tile.clone(),
                rotation,
            });
        }
    }

    placed
}
