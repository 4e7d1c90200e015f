//! Chunk lifecycle: generate terrain, paint it, decorate it, place objects,
//! and clear it again.

use std::sync::Arc;

use bevy::math::{IVec2, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::decoration::{decorate, DecorationPlacement};
use super::placement::{ChunkArea, PlacedObject, PlacementEngine, PlacementReport, SpawnCategory};
use super::terrain::{generate_profile, TerrainColumn, TerrainProfile};
use super::{RngStream, WorldSeed};
use crate::config::GeneratorSettings;
use crate::error::ProcgenError;
use crate::logging::TimingSpan;
use crate::tilemap::{PlacedTile, TileId, TileLayer, TileSurface};
use crate::world::{ObjectHandle, PrefabId, WorldAccess};

/// A generated chunk and everything it put into the world
#[derive(Debug, Clone)]
pub struct Chunk {
    pub index: i64,
    pub origin: Vec2,
    pub width: u32,
    pub height: u32,
    pub start_sand_depth: i32,
    pub start_grass_depth: i32,
    pub profile: TerrainProfile,
    pub decorations: Vec<DecorationPlacement>,
    pub objects: Vec<PlacedObject>,
    pub placement: PlacementReport,
}

impl Chunk {
    pub fn right_edge(&self) -> f32 {
        self.origin.x + self.width as f32
    }

    pub fn area(&self) -> ChunkArea {
        ChunkArea {
            origin: self.origin,
            width: self.width,
            height: self.height,
        }
    }

    pub fn columns(&self) -> &[TerrainColumn] {
        &self.profile.columns
    }

    /// Depths the next chunk to the right starts from
    pub fn end_depths(&self) -> (i32, i32) {
        (self.profile.end_sand_depth, self.profile.end_grass_depth)
    }

    pub fn task_handles(&self) -> impl Iterator<Item = ObjectHandle> + '_ {
        self.objects
            .iter()
            .filter(|o| o.category.is_task())
            .map(|o| o.handle)
    }

    pub fn snapshot(&self) -> ChunkSnapshot {
        ChunkSnapshot {
            index: self.index,
            origin_x: self.origin.x,
            columns: self.profile.columns.clone(),
            end_sand_depth: self.profile.end_sand_depth,
            end_grass_depth: self.profile.end_grass_depth,
            decorations: self.decorations.clone(),
            objects: self
                .objects
                .iter()
                .map(|o| ObjectSnapshot {
                    prefab: o.prefab.clone(),
                    category: o.category,
                    x: o.x,
                    y: o.y,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    pub prefab: PrefabId,
    pub category: SpawnCategory,
    pub x: f32,
    pub y: f32,
}

/// Handle-free record of a chunk, comparable across runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkSnapshot {
    pub index: i64,
    pub origin_x: f32,
    pub columns: Vec<TerrainColumn>,
    pub end_sand_depth: i32,
    pub end_grass_depth: i32,
    pub decorations: Vec<DecorationPlacement>,
    pub objects: Vec<ObjectSnapshot>,
}

impl ChunkSnapshot {
    pub fn to_json(&self) -> Result<String, ProcgenError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ProcgenError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Remove every tile of a chunk-sized area on all layers
pub fn clear_area(tiles: &mut dyn TileSurface, origin: IVec2, width: u32, height: u32) {
    for x in 0..width as i32 {
        for y in 0..height as i32 {
            for layer in TileLayer::ALL {
                tiles.clear_tile(layer, origin + IVec2::new(x, y));
            }
        }
    }
}

/// Builds chunks from shared settings and a world seed
#[derive(Debug, Clone)]
pub struct ChunkGenerator {
    settings: Arc<GeneratorSettings>,
    seed: WorldSeed,
}

impl ChunkGenerator {
    /// Validates the settings and resolves the seed mode
    pub fn new(settings: GeneratorSettings) -> Result<Self, ProcgenError> {
        let seed = WorldSeed::from_mode(settings.seed);
        Self::with_seed(settings, seed)
    }

    pub fn with_seed(settings: GeneratorSettings, seed: WorldSeed) -> Result<Self, ProcgenError> {
        settings.validate()?;
        Ok(Self {
            settings: Arc::new(settings),
            seed,
        })
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    pub fn shared_settings(&self) -> Arc<GeneratorSettings> {
        Arc::clone(&self.settings)
    }

    pub fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Swap in new settings for chunks generated from now on.
    ///
    /// The world seed is kept unless the seed mode changed.
    pub fn apply_settings(&mut self, settings: GeneratorSettings) -> Result<(), ProcgenError> {
        settings.validate()?;
        if settings.seed != self.settings.seed {
            self.seed = WorldSeed::from_mode(settings.seed);
            info!(seed = self.seed.seed, "Seed mode changed, world reseeded");
        }
        self.settings = Arc::new(settings);
        Ok(())
    }

    pub fn chunk_index(&self, origin_x: f32) -> i64 {
        (origin_x / self.settings.chunk.width as f32).floor() as i64
    }

    /// Depths of the first chunk
    pub fn initial_depths(&self) -> (i32, i32) {
        (
            self.settings.terrain.start_sand_depth,
            self.settings.terrain.start_grass_depth,
        )
    }

    /// Terrain, band painting and decoration for the chunk at `origin_x`.
    ///
    /// Any tiles already in the chunk's area are cleared first, so the same
    /// chunk can be regenerated in place.
    pub fn generate_terrain(
        &self,
        origin_x: f32,
        start_sand_depth: i32,
        start_grass_depth: i32,
        tiles: &mut dyn TileSurface,
    ) -> Chunk {
        let settings = &*self.settings;
        let width = settings.chunk.width;
        let height = settings.chunk.height;
        let index = self.chunk_index(origin_x);
        let origin = Vec2::new(origin_x, 0.0);

        let mut rng = self.seed.rng(index, RngStream::Terrain);
        let profile = generate_profile(
            &settings.terrain,
            width,
            height,
            start_sand_depth,
            start_grass_depth,
            &mut rng,
        );

        let origin_cell = origin.round().as_ivec2();
        clear_area(tiles, origin_cell, width, height);
        self.paint_bands(&profile.columns, origin_cell, tiles);
        let decorations = decorate(
            &settings.decoration,
            self.seed.seed,
            origin_cell,
            height,
            &profile.columns,
            tiles,
        );

        debug!(
            index,
            origin_x,
            end_sand = profile.end_sand_depth,
            end_grass = profile.end_grass_depth,
            decorations = decorations.len(),
            "Chunk terrain generated"
        );

        Chunk {
            index,
            origin,
            width,
            height,
            start_sand_depth,
            start_grass_depth,
            profile,
            decorations,
            objects: Vec::new(),
            placement: PlacementReport::default(),
        }
    }

    fn paint_bands(&self, columns: &[TerrainColumn], origin: IVec2, tiles: &mut dyn TileSurface) {
        let height = self.settings.chunk.height as i32;
        let names = &self.settings.tiles;
        let tile = |id: &TileId| PlacedTile {
            tile: id.clone(),
            rotation: Default::default(),
        };

        for (x, column) in columns.iter().enumerate() {
            let water = column.water_depth(height);
            let grass_start = column.grass_start(height);
            let grass_end = (grass_start + column.grass_depth).min(height);
            for y in 0..height {
                let cell = origin + IVec2::new(x as i32, y);
                if y < water {
                    tiles.set_tile(TileLayer::Water, cell, tile(&names.water));
                } else {
                    // sand runs under the grass
                    tiles.set_tile(TileLayer::Sand, cell, tile(&names.sand));
                }
                if y >= grass_start && y < grass_end {
                    tiles.set_tile(TileLayer::Grass, cell, tile(&names.grass));
                }
            }
        }
    }

    /// Place enemies and tasks into an already painted chunk
    pub fn spawn_objects(&self, chunk: &mut Chunk, world: &mut WorldAccess<'_>) {
        let mut rng = self.seed.rng(chunk.index, RngStream::Placement);
        let engine = PlacementEngine::new(&self.settings.placement);
        let report = engine.place(&chunk.area(), world, &mut rng);
        chunk.objects.extend(report.placed().cloned());
        chunk.placement = report;
    }

    /// Full chunk: terrain, paint, decorate and place objects
    pub fn generate_chunk(
        &self,
        origin_x: f32,
        start_sand_depth: i32,
        start_grass_depth: i32,
        world: &mut WorldAccess<'_>,
    ) -> Chunk {
        let _span = TimingSpan::new("generate_chunk");
        let mut chunk =
            self.generate_terrain(origin_x, start_sand_depth, start_grass_depth, world.tiles);
        self.spawn_objects(&mut chunk, world);
        chunk
    }

    /// Erase a chunk's cells on every layer, deregister its tasks and
    /// despawn its objects
    pub fn clear_chunk(&self, chunk: &mut Chunk, world: &mut WorldAccess<'_>) {
        clear_area(
            world.tiles,
            chunk.origin.round().as_ivec2(),
            chunk.width,
            chunk.height,
        );
        if let Some(tasks) = world.tasks.as_deref_mut() {
            for handle in chunk.task_handles() {
                tasks.remove_task_object(handle);
            }
        }
        for object in chunk.objects.drain(..) {
            world.spawner.despawn(object.handle);
        }
        chunk.decorations.clear();
        debug!(index = chunk.index, "Chunk cleared");
    }
}
