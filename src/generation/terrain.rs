//! Terrain profile generation.
//!
//! Columns are laid out bottom-up as water, sand, grass. Depths are held for
//! `min_area_width` columns, then each takes a random step in
//! `[-waviness, waviness]`, is clamped into its range, and grass shrinks if
//! sand + grass would exceed the chunk height. The depths after the final
//! step become the next chunk's starting depths.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::TerrainSettings;

/// Terrain band of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    Water,
    Sand,
    Grass,
}

/// Band thicknesses of one column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainColumn {
    pub sand_depth: i32,
    pub grass_depth: i32,
}

impl TerrainColumn {
    /// Rows of water below the sand
    pub fn water_depth(&self, height: i32) -> i32 {
        (height - self.sand_depth - self.grass_depth).max(0)
    }

    /// First row of the grass band
    pub fn grass_start(&self, height: i32) -> i32 {
        self.water_depth(height) + self.sand_depth
    }

    /// Band of local row `y`; `None` above the chunk
    pub fn band_at(&self, y: i32, height: i32) -> Option<Band> {
        if y < 0 || y >= height {
            return None;
        }
        let water = self.water_depth(height);
        if y < water {
            Some(Band::Water)
        } else if y >= self.grass_start(height) && y < self.grass_start(height) + self.grass_depth
        {
            Some(Band::Grass)
        } else {
            Some(Band::Sand)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainProfile {
    pub columns: Vec<TerrainColumn>,
    pub end_sand_depth: i32,
    pub end_grass_depth: i32,
}

/// Clamp a depth pair into the configured ranges and the chunk height
fn settle(settings: &TerrainSettings, height: i32, sand: i32, grass: i32) -> (i32, i32) {
    let sand = settings.sand_depth_range.clamp(sand);
    let mut grass = settings.grass_depth_range.clamp(grass);
    if sand.saturating_add(grass) > height {
        grass = settings.grass_depth_range.clamp(height.saturating_sub(sand));
    }
    (sand, grass)
}

/// Random-walk depth profile for one chunk
pub fn generate_profile<R: Rng>(
    settings: &TerrainSettings,
    width: u32,
    height: u32,
    start_sand_depth: i32,
    start_grass_depth: i32,
    rng: &mut R,
) -> TerrainProfile {
    // a step larger than the chunk height only ever clamps
    let waviness = i32::try_from(settings.edge_waviness.min(height)).unwrap_or(i32::MAX);
    let height = i32::try_from(height).unwrap_or(i32::MAX);
    let width = width as usize;
    let run = settings.min_area_width.max(1) as usize;

    let (mut sand, mut grass) = settle(settings, height, start_sand_depth, start_grass_depth);
    let mut columns = Vec::with_capacity(width);

    while columns.len() < width {
        let run_end = (columns.len() + run).min(width);
        columns.resize(
            run_end,
            TerrainColumn {
                sand_depth: sand,
                grass_depth: grass,
            },
        );

        let sand_delta = rng.gen_range(-waviness..=waviness);
        let grass_delta = rng.gen_range(-waviness..=waviness);
        (sand, grass) = settle(
            settings,
            height,
            sand.saturating_add(sand_delta),
            grass.saturating_add(grass_delta),
        );
    }

    TerrainProfile {
        columns,
        end_sand_depth: sand,
        end_grass_depth: grass,
    }
}
