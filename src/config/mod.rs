//! Generator settings.
//!
//! One immutable value describes everything a chunk needs: dimensions,
//! terrain bounds, decoration tables, spawn tables and streaming margins.
//! Settings load from RON or JSON and are validated before use:
//! - Structurally impossible values are rejected (`ProcgenError::InvalidSettings`)
//! - Zero or negative densities and weights are accepted and mean "nothing to do"

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ProcgenError;
use crate::tilemap::TileId;
use crate::world::PrefabId;

/// Inclusive integer depth bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthRange {
    pub min: i32,
    pub max: i32,
}

impl DepthRange {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: i32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

impl Default for DepthRange {
    fn default() -> Self {
        Self::new(DEFAULT_DEPTH_MIN, DEFAULT_DEPTH_MAX)
    }
}

/// Chunk size in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkDimensions {
    pub width: u32,
    pub height: u32,
}

impl Default for ChunkDimensions {
    fn default() -> Self {
        Self {
            width: DEFAULT_CHUNK_WIDTH,
            height: DEFAULT_CHUNK_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainSettings {
    pub min_area_width: u32,
    pub edge_waviness: u32,
    pub sand_depth_range: DepthRange,
    pub grass_depth_range: DepthRange,
    /// Depths used when no previous chunk exists
    pub start_sand_depth: i32,
    pub start_grass_depth: i32,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            min_area_width: DEFAULT_MIN_AREA_WIDTH,
            edge_waviness: DEFAULT_EDGE_WAVINESS,
            sand_depth_range: DepthRange::default(),
            grass_depth_range: DepthRange::default(),
            start_sand_depth: DEFAULT_START_SAND_DEPTH,
            start_grass_depth: DEFAULT_START_GRASS_DEPTH,
        }
    }
}

/// Base tiles painted for each band
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainTiles {
    pub water: TileId,
    pub sand: TileId,
    pub grass: TileId,
}

impl Default for TerrainTiles {
    fn default() -> Self {
        Self {
            water: TileId::new("water"),
            sand: TileId::new("sand"),
            grass: TileId::new("grass"),
        }
    }
}

/// Where the world seed comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeedMode {
    Fixed(u64),
    /// Drawn once per generator from the process RNG
    Random,
}

impl Default for SeedMode {
    fn default() -> Self {
        Self::Random
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecorationEntry {
    pub tile: TileId,
    #[serde(default = "default_weight")]
    pub weight: f32,
    #[serde(default)]
    pub min_x: f32,
    #[serde(default)]
    pub max_x: Option<f32>,
    #[serde(default)]
    pub allow_rotation: bool,
}

impl DecorationEntry {
    pub fn new(tile: &str, weight: f32) -> Self {
        Self {
            tile: TileId::new(tile),
            weight,
            min_x: 0.0,
            max_x: None,
            allow_rotation: false,
        }
    }

    pub fn rotatable(mut self) -> Self {
        self.allow_rotation = true;
        self
    }
}

/// Decoration table and chance for one band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorationBand {
    pub density: f32,
    pub tiles: Vec<DecorationEntry>,
}

impl Default for DecorationBand {
    fn default() -> Self {
        Self {
            density: DEFAULT_DECORATION_DENSITY,
            tiles: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorationSettings {
    pub water: DecorationBand,
    pub sand: DecorationBand,
    pub grass: DecorationBand,
}

/// A prefab with its weight and the world X range it may appear in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnEntry {
    pub prefab: PrefabId,
    #[serde(default = "default_weight")]
    pub weight: f32,
    #[serde(default)]
    pub min_x: f32,
    #[serde(default)]
    pub max_x: Option<f32>,
}

impl SpawnEntry {
    pub fn new(prefab: &str, weight: f32) -> Self {
        Self {
            prefab: PrefabId::new(prefab),
            weight,
            min_x: 0.0,
            max_x: None,
        }
    }

    pub fn within(mut self, min_x: f32, max_x: Option<f32>) -> Self {
        self.min_x = min_x;
        self.max_x = max_x;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementSettings {
    /// No object spawns left of this world X
    pub task_min_x: f32,
    pub density: f32,
    pub other_task_edge_offset: f32,
    pub allow_grass_edge: bool,
    pub grass_top_buffer: u32,
    pub enemies: Vec<SpawnEntry>,
    pub ground_tasks: Vec<SpawnEntry>,
    pub water_tasks: Vec<SpawnEntry>,
    pub grass_tasks: Vec<SpawnEntry>,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            task_min_x: 0.0,
            density: DEFAULT_TASK_DENSITY,
            other_task_edge_offset: DEFAULT_OTHER_TASK_EDGE_OFFSET,
            allow_grass_edge: false,
            grass_top_buffer: DEFAULT_GRASS_TOP_BUFFER,
            enemies: Vec::new(),
            ground_tasks: Vec::new(),
            water_tasks: Vec::new(),
            grass_tasks: Vec::new(),
        }
    }
}

/// Camera margins for the chunk window. `None` means one chunk width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingSettings {
    pub preload_chunks: u32,
    pub lookahead: Option<f32>,
    pub trailing_margin: Option<f32>,
    pub path_grid_center_y: f32,
}

impl Default for StreamingSettings {
    fn default() -> Self {
        Self {
            preload_chunks: DEFAULT_PRELOAD_CHUNKS,
            lookahead: None,
            trailing_margin: None,
            path_grid_center_y: DEFAULT_PATH_GRID_CENTER_Y,
        }
    }
}

/// Complete generator configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub chunk: ChunkDimensions,
    pub terrain: TerrainSettings,
    pub tiles: TerrainTiles,
    pub seed: SeedMode,
    pub decoration: DecorationSettings,
    pub placement: PlacementSettings,
    pub streaming: StreamingSettings,
}

fn default_weight() -> f32 {
    1.0
}

impl GeneratorSettings {
    /// Settings with a fixed seed, otherwise default
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: SeedMode::Fixed(seed),
            ..Default::default()
        }
    }

    pub fn from_ron_str(text: &str) -> Result<Self, ProcgenError> {
        let settings: Self = ron::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ProcgenError> {
        let settings: Self = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load by file extension (`.ron` or `.json`)
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProcgenError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("ron") => Self::from_ron_str(&text),
            Some("json") => Self::from_json_str(&text),
            other => Err(ProcgenError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    pub fn to_ron(&self) -> Result<String, ProcgenError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ProcgenError::Parse(e.to_string()))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Reject settings no generator could honour
    pub fn validate(&self) -> Result<(), ProcgenError> {
        let invalid = |msg: String| Err(ProcgenError::InvalidSettings(msg));
        let height = self.chunk.height as i32;

        if self.chunk.width == 0 || self.chunk.height == 0 {
            return invalid(format!(
                "chunk dimensions must be non-zero, got {}x{}",
                self.chunk.width, self.chunk.height
            ));
        }
        if self.chunk.width > MAX_CHUNK_DIMENSION || self.chunk.height > MAX_CHUNK_DIMENSION {
            return invalid(format!(
                "chunk dimensions must be at most {MAX_CHUNK_DIMENSION}, got {}x{}",
                self.chunk.width, self.chunk.height
            ));
        }
        if self.terrain.edge_waviness > self.chunk.height {
            return invalid(format!(
                "terrain.edge_waviness ({}) exceeds chunk height ({height})",
                self.terrain.edge_waviness
            ));
        }
        if self.terrain.min_area_width == 0 {
            return invalid("terrain.min_area_width must be at least 1".into());
        }
        for (name, range) in [
            ("sand_depth_range", self.terrain.sand_depth_range),
            ("grass_depth_range", self.terrain.grass_depth_range),
        ] {
            if range.min < 0 || range.min > range.max {
                return invalid(format!(
                    "terrain.{name} must satisfy 0 <= min <= max, got {}..={}",
                    range.min, range.max
                ));
            }
        }
        if self.terrain.sand_depth_range.max > height {
            return invalid(format!(
                "terrain.sand_depth_range.max ({}) exceeds chunk height ({height})",
                self.terrain.sand_depth_range.max
            ));
        }
        if self.terrain.sand_depth_range.max + self.terrain.grass_depth_range.min > height {
            return invalid(format!(
                "sand max ({}) + grass min ({}) exceeds chunk height ({height})",
                self.terrain.sand_depth_range.max, self.terrain.grass_depth_range.min
            ));
        }
        self.validate_numbers()
    }

    /// Every float must be finite and every candidate list must have a
    /// finite summed weight
    fn validate_numbers(&self) -> Result<(), ProcgenError> {
        let bands = [
            ("water", &self.decoration.water),
            ("sand", &self.decoration.sand),
            ("grass", &self.decoration.grass),
        ];
        for (name, band) in bands {
            finite(&format!("decoration.{name}.density"), band.density)?;
            for entry in &band.tiles {
                let path = format!("decoration.{name} tile {:?}", entry.tile.as_str());
                candidate(&path, entry.weight, entry.min_x, entry.max_x)?;
            }
            summed(&format!("decoration.{name}"), band.tiles.iter().map(|e| e.weight))?;
        }

        let placement = &self.placement;
        finite("placement.task_min_x", placement.task_min_x)?;
        finite("placement.density", placement.density)?;
        finite("placement.other_task_edge_offset", placement.other_task_edge_offset)?;
        let lists = [
            ("enemies", &placement.enemies),
            ("ground_tasks", &placement.ground_tasks),
            ("water_tasks", &placement.water_tasks),
            ("grass_tasks", &placement.grass_tasks),
        ];
        for (name, entries) in lists {
            for entry in entries {
                let path = format!("placement.{name} prefab {:?}", entry.prefab.as_str());
                candidate(&path, entry.weight, entry.min_x, entry.max_x)?;
            }
            summed(&format!("placement.{name}"), entries.iter().map(|e| e.weight))?;
        }
        summed(
            "placement candidates",
            lists.iter().flat_map(|(_, entries)| entries.iter().map(|e| e.weight)),
        )?;

        finite("streaming.path_grid_center_y", self.streaming.path_grid_center_y)?;
        for (name, margin) in [
            ("lookahead", self.streaming.lookahead),
            ("trailing_margin", self.streaming.trailing_margin),
        ] {
            if let Some(margin) = margin {
                finite(&format!("streaming.{name}"), margin)?;
                if margin < 0.0 {
                    return Err(ProcgenError::InvalidSettings(format!(
                        "streaming.{name} must not be negative, got {margin}"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn lookahead(&self) -> f32 {
        self.streaming
            .lookahead
            .unwrap_or(self.chunk.width as f32)
    }

    pub fn trailing_margin(&self) -> f32 {
        self.streaming
            .trailing_margin
            .unwrap_or(self.chunk.width as f32)
    }
}

fn finite(path: &str, value: f32) -> Result<(), ProcgenError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ProcgenError::InvalidSettings(format!(
            "{path} must be finite, got {value}"
        )))
    }
}

fn candidate(path: &str, weight: f32, min_x: f32, max_x: Option<f32>) -> Result<(), ProcgenError> {
    finite(&format!("{path} weight"), weight)?;
    finite(&format!("{path} min_x"), min_x)?;
    match max_x {
        Some(max_x) => finite(&format!("{path} max_x"), max_x),
        None => Ok(()),
    }
}

/// Positive weights of one selection pool must not overflow to infinity
fn summed(path: &str, weights: impl Iterator<Item = f32>) -> Result<(), ProcgenError> {
    let total: f32 = weights.filter(|w| *w > 0.0).sum();
    if total.is_finite() {
        Ok(())
    } else {
        Err(ProcgenError::InvalidSettings(format!(
            "{path} weights sum to {total}"
        )))
    }
}
