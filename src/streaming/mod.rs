//! Camera-driven chunk streaming.
//!
//! `ChunkManager` keeps a contiguous window of chunks around the camera.
//! Each update spawns at most one chunk on the right (or the preload batch
//! when empty) and removes chunks that fell behind the trailing margin. An
//! empty window starts at the chunk boundary under the camera.
//! Terrain of a new chunk is painted before the path grid is refreshed, and
//! objects are placed only after the refresh.

pub mod plugin;

use std::collections::VecDeque;

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::GeneratorSettings;
use crate::constants::PATH_GRID_CHUNK_SPAN;
use crate::error::ProcgenError;
use crate::generation::{Chunk, ChunkGenerator};
use crate::world::{Pathfinder, WorldAccess};

pub use plugin::{
    ChunkRemovedEvent, ChunkSpawnedEvent, ChunkStreamingPlugin, StreamCamera, StreamingWorld,
};

/// What one update changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamUpdate {
    pub spawned: Vec<i64>,
    pub removed: Vec<i64>,
    pub path_refreshes: u32,
}

impl StreamUpdate {
    pub fn changed(&self) -> bool {
        !self.spawned.is_empty() || !self.removed.is_empty()
    }
}

/// Running totals over the manager's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamStats {
    pub chunks_spawned: u64,
    pub chunks_removed: u64,
    pub objects_placed: u64,
    pub placements_skipped: u64,
    pub grid_fallback_scans: u64,
}

pub struct ChunkManager {
    generator: ChunkGenerator,
    chunks: VecDeque<Chunk>,
    next_x: f32,
    next_sand_depth: i32,
    next_grass_depth: i32,
    stats: StreamStats,
}

impl ChunkManager {
    pub fn new(generator: ChunkGenerator) -> Self {
        let (sand, grass) = generator.initial_depths();
        Self {
            generator,
            chunks: VecDeque::new(),
            next_x: 0.0,
            next_sand_depth: sand,
            next_grass_depth: grass,
            stats: StreamStats::default(),
        }
    }

    pub fn from_settings(settings: GeneratorSettings) -> Result<Self, ProcgenError> {
        Ok(Self::new(ChunkGenerator::new(settings)?))
    }

    pub fn generator(&self) -> &ChunkGenerator {
        &self.generator
    }

    pub fn settings(&self) -> &GeneratorSettings {
        self.generator.settings()
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn next_x(&self) -> f32 {
        self.next_x
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Use new settings for chunks generated from now on.
    ///
    /// Existing chunks stay as they are. Invalid settings leave the manager
    /// untouched.
    pub fn apply_settings(&mut self, settings: GeneratorSettings) -> Result<(), ProcgenError> {
        self.generator.apply_settings(settings)
    }

    /// One streaming tick for the given camera X.
    ///
    /// Without a camera nothing happens.
    pub fn update(
        &mut self,
        camera_x: Option<f32>,
        world: &mut WorldAccess<'_>,
        pathfinder: &mut dyn Pathfinder,
    ) -> StreamUpdate {
        let mut update = StreamUpdate::default();
        let Some(camera_x) = camera_x else {
            warn!("No camera position; skipping chunk streaming");
            return update;
        };

        if self.chunks.is_empty() {
            self.next_x = self.anchor_x(camera_x);
            let preload = self.settings().streaming.preload_chunks.max(1);
            for _ in 0..preload {
                self.spawn_next(camera_x, world, pathfinder, &mut update);
            }
        } else if self.needs_spawn(camera_x) {
            self.spawn_next(camera_x, world, pathfinder, &mut update);
        }

        let trailing = camera_x - self.settings().trailing_margin();
        while self
            .chunks
            .front()
            .is_some_and(|c| c.right_edge() < trailing)
        {
            if let Some(mut chunk) = self.chunks.pop_front() {
                self.generator.clear_chunk(&mut chunk, world);
                self.stats.chunks_removed += 1;
                update.removed.push(chunk.index);
                info!(index = chunk.index, "Chunk removed");
            }
        }
        if !update.removed.is_empty() {
            self.refresh_pathfinding(camera_x, pathfinder);
            update.path_refreshes += 1;
        }

        update
    }

    /// Left edge of the chunk containing `camera_x`
    fn anchor_x(&self, camera_x: f32) -> f32 {
        let width = self.settings().chunk.width as f32;
        (camera_x / width).floor() * width
    }

    fn needs_spawn(&self, camera_x: f32) -> bool {
        let lookahead = self.settings().lookahead();
        self.chunks
            .back()
            .map_or(true, |c| camera_x + lookahead > c.right_edge())
    }

    fn spawn_next(
        &mut self,
        camera_x: f32,
        world: &mut WorldAccess<'_>,
        pathfinder: &mut dyn Pathfinder,
        update: &mut StreamUpdate,
    ) {
        let mut chunk = self.generator.generate_terrain(
            self.next_x,
            self.next_sand_depth,
            self.next_grass_depth,
            world.tiles,
        );
        (self.next_sand_depth, self.next_grass_depth) = chunk.end_depths();
        self.next_x += chunk.width as f32;

        self.refresh_pathfinding(camera_x, pathfinder);
        update.path_refreshes += 1;

        self.generator.spawn_objects(&mut chunk, world);
        self.stats.chunks_spawned += 1;
        self.stats.objects_placed += chunk.placement.placed_count() as u64;
        self.stats.placements_skipped += chunk.placement.skipped_count() as u64;

        info!(
            index = chunk.index,
            origin_x = chunk.origin.x,
            objects = chunk.objects.len(),
            "Chunk spawned"
        );
        update.spawned.push(chunk.index);
        self.chunks.push_back(chunk);
    }

    /// Recenter the path grid on the camera and rescan.
    ///
    /// Without a grid graph only the rescan runs.
    fn refresh_pathfinding(&mut self, camera_x: f32, pathfinder: &mut dyn Pathfinder) {
        let settings = self.generator.settings();
        let center = Vec2::new(camera_x, settings.streaming.path_grid_center_y);
        let width = settings.chunk.width * PATH_GRID_CHUNK_SPAN;
        let height = settings.chunk.height;
        if !pathfinder.recenter_grid(center, width, height) {
            debug!("No grid graph; falling back to a full scan");
            self.stats.grid_fallback_scans += 1;
        }
        pathfinder.scan();
    }

    /// Remove every chunk. The next update restarts the stream under the
    /// camera.
    pub fn reset(&mut self, world: &mut WorldAccess<'_>) {
        for mut chunk in self.chunks.drain(..) {
            self.generator.clear_chunk(&mut chunk, world);
            self.stats.chunks_removed += 1;
        }
        let (sand, grass) = self.generator.initial_depths();
        self.next_x = 0.0;
        self.next_sand_depth = sand;
        self.next_grass_depth = grass;
        info!("Chunk stream reset");
    }
}
