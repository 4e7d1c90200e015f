//! Enemy and task placement.
//!
//! A chunk receives `round((width - start_offset) * density)` placement
//! attempts. Each attempt samples a column, picks a category and prefab from
//! the weighted tables, resolves a position for that category and validates
//! it against blocking geometry. Invalid positions are re-sampled up to
//! `MAX_PLACEMENT_ATTEMPTS` checks; after that the attempt is skipped.
//!
//! Categories are weighed in the order enemies, water-edge tasks, grass
//! tasks, ground tasks. Water-edge and grass tasks only compete when the
//! sampled column has a water edge or an eligible grass cell.

use bevy::math::{IVec2, Vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::weighted::{drawable, hierarchical_total, select_hierarchical, CategoryPool};
use crate::config::{PlacementSettings, SpawnEntry};
use crate::constants::{BLOCKED_AHEAD_RADIUS, BLOCKED_AHEAD_TOLERANCE, MAX_PLACEMENT_ATTEMPTS};
use crate::tilemap::{TileLayer, TileSurface};
use crate::world::{BlockingGeometry, ObjectHandle, PrefabId, WorldAccess};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnCategory {
    Enemy,
    GroundTask,
    WaterEdgeTask,
    GrassTask,
}

impl SpawnCategory {
    /// Tasks are registered with the task scheduler, enemies are not
    pub fn is_task(&self) -> bool {
        !matches!(self, SpawnCategory::Enemy)
    }
}

/// World-space rectangle a chunk covers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkArea {
    pub origin: Vec2,
    pub width: u32,
    pub height: u32,
}

impl ChunkArea {
    pub fn origin_cell(&self) -> IVec2 {
        self.origin.round().as_ivec2()
    }

    /// First row above the chunk
    fn top_row(&self) -> i32 {
        self.origin_cell().y + self.height as i32
    }

    /// One row below the chunk, where scans stop
    fn scan_floor(&self) -> i32 {
        self.origin_cell().y - 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedObject {
    pub handle: ObjectHandle,
    pub prefab: PrefabId,
    pub category: SpawnCategory,
    pub x: f32,
    pub y: f32,
}

/// Result of one placement attempt
#[derive(Debug, Clone, PartialEq)]
pub enum PlacementOutcome {
    Placed(PlacedObject),
    /// Every category had zero weight at the sampled X
    NoCandidate,
    /// All validity checks failed
    Blocked { tries: u32 },
    /// A grass re-sample found no eligible cell
    NoEligibleCell { tries: u32 },
    /// The spawner refused the prefab
    SpawnFailed,
}

#[derive(Debug, Clone, Default)]
pub struct PlacementReport {
    pub target: u32,
    pub outcomes: Vec<PlacementOutcome>,
    /// Task objects in the order they were registered
    pub registered: Vec<(ObjectHandle, f32)>,
}

impl PlacementReport {
    pub fn placed(&self) -> impl Iterator<Item = &PlacedObject> {
        self.outcomes.iter().filter_map(|o| match o {
            PlacementOutcome::Placed(p) => Some(p),
            _ => None,
        })
    }

    pub fn placed_count(&self) -> usize {
        self.placed().count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.len() - self.placed_count()
    }
}

/// Highest water cell with sand directly above it in the column at `world_x`
pub fn find_water_edge(tiles: &dyn TileSurface, world_x: f32, area: &ChunkArea) -> Option<Vec2> {
    let cell_x = tiles.world_to_cell(Vec2::new(world_x, area.origin.y)).x;
    (area.scan_floor()..=area.top_row()).rev().find_map(|y| {
        let water = tiles.has_tile(TileLayer::Water, IVec2::new(cell_x, y));
        let sand_above = tiles.has_tile(TileLayer::Sand, IVec2::new(cell_x, y + 1));
        (water && sand_above).then(|| tiles.cell_center_world(IVec2::new(cell_x, y)))
    })
}

/// Grass cells of the column at `world_x` that may hold a grass task.
///
/// Edge cells (bare sand below, or no grass to the left or right) are
/// excluded unless `allow_edge`; the top `top_buffer` rows are never used.
pub fn eligible_grass_cells(
    tiles: &dyn TileSurface,
    world_x: f32,
    area: &ChunkArea,
    allow_edge: bool,
    top_buffer: u32,
) -> Vec<IVec2> {
    let cell_x = tiles.world_to_cell(Vec2::new(world_x, area.origin.y)).x;
    let top = area.top_row();
    let bottom = area.origin_cell().y;
    let max_y = (top - top_buffer as i32).clamp(bottom, top);

    let grass = |x: i32, y: i32| tiles.has_tile(TileLayer::Grass, IVec2::new(x, y));
    (area.scan_floor()..=max_y)
        .rev()
        .filter(|&y| grass(cell_x, y))
        .filter(|&y| {
            if allow_edge {
                return true;
            }
            let sand_below =
                tiles.has_tile(TileLayer::Sand, IVec2::new(cell_x, y - 1)) && !grass(cell_x, y - 1);
            let left_empty = !grass(cell_x - 1, y);
            let right_empty = !grass(cell_x + 1, y);
            !(sand_below || left_empty || right_empty)
        })
        .map(|y| IVec2::new(cell_x, y))
        .collect()
}

fn pick_grass_position<R: Rng>(
    tiles: &dyn TileSurface,
    world_x: f32,
    area: &ChunkArea,
    settings: &PlacementSettings,
    rng: &mut R,
) -> Option<Vec2> {
    let cells = eligible_grass_cells(
        tiles,
        world_x,
        area,
        settings.allow_grass_edge,
        settings.grass_top_buffer,
    );
    if cells.is_empty() {
        return None;
    }
    let cell = cells[rng.gen_range(0..cells.len())];
    Some(tiles.cell_center_world(cell))
}

fn random_position_at<R: Rng>(area: &ChunkArea, local_x: f32, rng: &mut R) -> Vec2 {
    let y = rng.gen_range(0.0..area.height as f32);
    Vec2::new(area.origin.x + local_x, area.origin.y + y)
}

/// A blocker contains the point, or a blocker near it extends above it
pub fn is_obstructed(blockers: &dyn BlockingGeometry, pos: Vec2) -> bool {
    blockers.overlaps_point(pos)
        || blockers
            .overlapping_circle(pos, BLOCKED_AHEAD_RADIUS)
            .iter()
            .any(|r| r.min.y > pos.y - BLOCKED_AHEAD_TOLERANCE)
}

/// Samples, validates and instantiates spawn candidates for one chunk
pub struct PlacementEngine<'a> {
    settings: &'a PlacementSettings,
}

impl<'a> PlacementEngine<'a> {
    pub fn new(settings: &'a PlacementSettings) -> Self {
        Self { settings }
    }

    /// Local X before which nothing spawns
    pub fn start_offset(&self, area: &ChunkArea) -> f32 {
        (self.settings.task_min_x - area.origin.x).max(0.0)
    }

    /// Attempts for a chunk, at most one per cell of the chunk
    pub fn target_count(&self, area: &ChunkArea) -> u32 {
        let span = area.width as f32 - self.start_offset(area);
        let count = (span * self.settings.density).round();
        if !count.is_finite() || count <= 0.0 {
            return 0;
        }
        let cells = area.width.saturating_mul(area.height);
        (count as u32).min(cells)
    }

    /// Run every placement attempt for a chunk and register placed tasks in
    /// ascending X order.
    pub fn place<R: Rng>(
        &self,
        area: &ChunkArea,
        world: &mut WorldAccess<'_>,
        rng: &mut R,
    ) -> PlacementReport {
        let mut report = PlacementReport::default();
        let Some(tasks) = world.tasks.as_deref_mut() else {
            warn!("No task registry; skipping object placement");
            return report;
        };

        report.target = self.target_count(area);
        let start_offset = self.start_offset(area);
        let mut pending: Vec<(f32, ObjectHandle)> = Vec::new();

        for _ in 0..report.target {
            let outcome = self.attempt(area, start_offset, &*world.tiles, world.blockers, rng);
            let outcome = match outcome {
                Attempt::Spawn(category, prefab, pos) => match world.spawner.spawn(prefab, pos) {
                    Some(handle) => {
                        if category.is_task() {
                            pending.push((pos.x, handle));
                        }
                        PlacementOutcome::Placed(PlacedObject {
                            handle,
                            prefab: prefab.clone(),
                            category,
                            x: pos.x,
                            y: pos.y,
                        })
                    }
                    None => PlacementOutcome::SpawnFailed,
                },
                Attempt::Skip(outcome) => outcome,
            };
            report.outcomes.push(outcome);
        }

        pending.sort_by(|a, b| a.0.total_cmp(&b.0));
        for (x, handle) in pending {
            tasks.add_placed_task_object(handle, x);
            report.registered.push((handle, x));
        }

        debug!(
            target_count = report.target,
            placed = report.placed_count(),
            skipped = report.skipped_count(),
            "Placement finished"
        );
        report
    }

    fn attempt<'s, R: Rng>(
        &'s self,
        area: &ChunkArea,
        start_offset: f32,
        tiles: &dyn TileSurface,
        blockers: &dyn BlockingGeometry,
        rng: &mut R,
    ) -> Attempt<'s> {
        let width = area.width as f32;
        if start_offset >= width {
            return Attempt::Skip(PlacementOutcome::NoCandidate);
        }
        let local_x = rng.gen_range(start_offset..width);
        let world_x = area.origin.x + local_x;

        let water_pos = find_water_edge(tiles, world_x, area);
        let grass_pos = pick_grass_position(tiles, world_x, area, self.settings, rng);

        let s = self.settings;
        let pools: [CategoryPool<'s, SpawnCategory, SpawnEntry>; 4] = [
            CategoryPool::new(SpawnCategory::Enemy, &s.enemies, true),
            CategoryPool::new(SpawnCategory::WaterEdgeTask, &s.water_tasks, water_pos.is_some()),
            CategoryPool::new(SpawnCategory::GrassTask, &s.grass_tasks, grass_pos.is_some()),
            CategoryPool::new(SpawnCategory::GroundTask, &s.ground_tasks, true),
        ];
        let total = hierarchical_total(&pools, world_x);
        if !drawable(total) {
            return Attempt::Skip(PlacementOutcome::NoCandidate);
        }
        let draw = rng.gen_range(0.0..total);
        let Some((category, entry)) = select_hierarchical(&pools, world_x, draw) else {
            return Attempt::Skip(PlacementOutcome::NoCandidate);
        };

        let mut pos = match (category, water_pos, grass_pos) {
            (SpawnCategory::WaterEdgeTask, Some(p), _) => p,
            (SpawnCategory::GrassTask, _, Some(p)) => p,
            _ => random_position_at(area, local_x, rng),
        };

        let mut tries = 0;
        loop {
            tries += 1;
            if self.position_valid(category, pos, water_pos, blockers) {
                return Attempt::Spawn(category, &entry.prefab, pos);
            }
            if tries >= MAX_PLACEMENT_ATTEMPTS {
                return Attempt::Skip(PlacementOutcome::Blocked { tries });
            }
            pos = match category {
                SpawnCategory::GrassTask => {
                    match pick_grass_position(tiles, world_x, area, self.settings, rng) {
                        Some(p) => p,
                        None => return Attempt::Skip(PlacementOutcome::NoEligibleCell { tries }),
                    }
                }
                SpawnCategory::WaterEdgeTask => pos,
                SpawnCategory::Enemy | SpawnCategory::GroundTask => {
                    random_position_at(area, local_x, rng)
                }
            };
        }
    }

    fn position_valid(
        &self,
        category: SpawnCategory,
        pos: Vec2,
        water_pos: Option<Vec2>,
        blockers: &dyn BlockingGeometry,
    ) -> bool {
        if is_obstructed(blockers, pos) {
            return false;
        }
        let near_water = matches!(
            category,
            SpawnCategory::GroundTask | SpawnCategory::GrassTask
        ) && water_pos
            .is_some_and(|w| (pos.y - w.y).abs() < self.settings.other_task_edge_offset);
        !near_water
    }
}

enum Attempt<'s> {
    Spawn(SpawnCategory, &'s PrefabId, Vec2),
    Skip(PlacementOutcome),
}
