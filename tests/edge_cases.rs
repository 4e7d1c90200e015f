//! Edge case & boundary tests
//!
//! Behavior at configuration and collaborator boundaries:
//! - Zero / negative densities and weights mean "nothing to do"
//! - Empty candidate lists and out-of-range candidates
//! - Missing camera, task registry and grid graph
//! - Extreme seeds, negative chunk origins and tiny chunks
//! - Maximum values (u32::MAX waviness, f32::MAX / inf weights, NaN / inf
//!   densities, huge X bounds)

use bevy::math::Vec2;
use rand::SeedableRng;

use vasteria_core::config::{
    DecorationBand, DecorationEntry, DepthRange, GeneratorSettings, SpawnEntry,
};
use vasteria_core::generation::terrain::generate_profile;
use vasteria_core::generation::placement::PlacementOutcome;
use vasteria_core::streaming::{ChunkManager, StreamingWorld};
use vasteria_core::tilemap::{MemoryTilemap, TileLayer};
use vasteria_core::world::{
    ColliderWorld, GridPathfinder, ObjectHandle, ObjectSpawner, PrefabId, SpawnLedger, TaskQueue,
    WorldAccess,
};
use vasteria_core::{ChunkGenerator, ProcgenError};

// ============================================================
// Helpers
// ============================================================

struct Collaborators {
    tiles: MemoryTilemap,
    blockers: ColliderWorld,
    spawner: SpawnLedger,
    tasks: TaskQueue,
}

impl Collaborators {
    fn new() -> Self {
        Self {
            tiles: MemoryTilemap::new(),
            blockers: ColliderWorld::new(),
            spawner: SpawnLedger::new(),
            tasks: TaskQueue::new(),
        }
    }

    fn access(&mut self) -> WorldAccess<'_> {
        WorldAccess {
            tiles: &mut self.tiles,
            blockers: &self.blockers,
            spawner: &mut self.spawner,
            tasks: Some(&mut self.tasks),
        }
    }
}

fn with_candidates(seed: u64) -> GeneratorSettings {
    let mut settings = GeneratorSettings::with_seed(seed);
    settings.placement.enemies = vec![SpawnEntry::new("slime", 1.0)];
    settings.placement.ground_tasks = vec![SpawnEntry::new("rock", 1.0)];
    settings
}

// ============================================================
// 1. Degenerate numeric configuration
// ============================================================

#[test]
fn zero_density_places_nothing() {
    let mut settings = with_candidates(1);
    settings.placement.density = 0.0;
    let generator = ChunkGenerator::new(settings).unwrap();
    let mut world = Collaborators::new();
    let chunk = generator.generate_chunk(0.0, 3, 3, &mut world.access());
    assert_eq!(chunk.placement.target, 0);
    assert!(chunk.placement.outcomes.is_empty());
    assert_eq!(world.spawner.live_count(), 0);
}

#[test]
fn negative_density_places_nothing() {
    let mut settings = with_candidates(1);
    settings.placement.density = -3.0;
    settings.decoration.grass = DecorationBand {
        density: -1.0,
        tiles: vec![DecorationEntry::new("flower", 1.0)],
    };
    let generator = ChunkGenerator::new(settings).unwrap();
    let mut world = Collaborators::new();
    let chunk = generator.generate_chunk(0.0, 3, 3, &mut world.access());
    assert!(chunk.objects.is_empty());
    assert!(chunk.decorations.is_empty());
}

#[test]
fn all_zero_weights_yield_no_candidate() {
    let mut settings = GeneratorSettings::with_seed(2);
    settings.placement.enemies = vec![SpawnEntry::new("slime", 0.0)];
    settings.placement.ground_tasks = vec![SpawnEntry::new("rock", -1.0)];
    let generator = ChunkGenerator::new(settings).unwrap();
    let mut world = Collaborators::new();
    let chunk = generator.generate_chunk(0.0, 3, 3, &mut world.access());
    assert_eq!(chunk.placement.outcomes.len(), 6);
    assert!(chunk
        .placement
        .outcomes
        .iter()
        .all(|o| *o == PlacementOutcome::NoCandidate));
}

#[test]
fn empty_candidate_lists() {
    let generator = ChunkGenerator::new(GeneratorSettings::with_seed(3)).unwrap();
    let mut world = Collaborators::new();
    let chunk = generator.generate_chunk(0.0, 3, 3, &mut world.access());
    assert!(chunk.objects.is_empty());
    assert!(chunk.decorations.is_empty(), "No decoration tiles configured");
    assert!(!world.tiles.is_empty(), "Terrain is still painted");
}

#[test]
fn zero_waviness_gives_flat_terrain() {
    let mut settings = GeneratorSettings::with_seed(4);
    settings.terrain.edge_waviness = 0;
    let generator = ChunkGenerator::new(settings).unwrap();
    let mut tiles = MemoryTilemap::new();
    let chunk = generator.generate_terrain(0.0, 4, 2, &mut tiles);
    assert!(chunk
        .columns()
        .iter()
        .all(|c| c.sand_depth == 4 && c.grass_depth == 2));
    assert_eq!(chunk.end_depths(), (4, 2));
}

#[test]
fn candidates_outside_x_range_never_spawn() {
    let mut settings = GeneratorSettings::with_seed(5);
    settings.placement.density = 0.5;
    settings.placement.enemies = vec![SpawnEntry::new("boss", 1.0).within(1000.0, None)];
    settings.placement.ground_tasks = vec![SpawnEntry::new("rock", 1.0)];
    let generator = ChunkGenerator::new(settings).unwrap();
    let mut world = Collaborators::new();
    let chunk = generator.generate_chunk(0.0, 3, 3, &mut world.access());
    assert!(chunk.objects.iter().all(|o| o.prefab.as_str() == "rock"));
}

#[test]
fn task_min_x_beyond_chunk() {
    let mut settings = with_candidates(6);
    settings.placement.task_min_x = 500.0;
    let generator = ChunkGenerator::new(settings).unwrap();
    let mut world = Collaborators::new();
    let chunk = generator.generate_chunk(0.0, 3, 3, &mut world.access());
    assert_eq!(chunk.placement.target, 0);
}

// ============================================================
// 2. Invalid configuration
// ============================================================

#[test]
fn zero_height_rejected() {
    let mut settings = GeneratorSettings::with_seed(1);
    settings.chunk.height = 0;
    assert!(matches!(
        ChunkGenerator::new(settings),
        Err(ProcgenError::InvalidSettings(_))
    ));
}

#[test]
fn zero_min_area_width_rejected() {
    let mut settings = GeneratorSettings::with_seed(1);
    settings.terrain.min_area_width = 0;
    assert!(ChunkManager::from_settings(settings).is_err());
}

#[test]
fn negative_depth_range_rejected() {
    let mut settings = GeneratorSettings::with_seed(1);
    settings.terrain.sand_depth_range = DepthRange::new(-1, 3);
    assert!(settings.validate().is_err());
}

#[test]
fn malformed_ron_is_parse_error() {
    assert!(matches!(
        GeneratorSettings::from_ron_str("(chunk: (width: \"wide\"))"),
        Err(ProcgenError::Parse(_))
    ));
}

// ============================================================
// 3. Missing collaborators
// ============================================================

#[test]
fn missing_task_registry_spawns_nothing() {
    let generator = ChunkGenerator::new(with_candidates(7)).unwrap();
    let mut tiles = MemoryTilemap::new();
    let blockers = ColliderWorld::new();
    let mut spawner = SpawnLedger::new();
    let mut world = WorldAccess {
        tiles: &mut tiles,
        blockers: &blockers,
        spawner: &mut spawner,
        tasks: None,
    };
    let chunk = generator.generate_chunk(0.0, 3, 3, &mut world);
    assert!(chunk.objects.is_empty());
    assert_eq!(spawner.live_count(), 0);
    assert!(tiles.count_layer(TileLayer::Water) > 0, "Terrain still generated");
}

#[test]
fn missing_camera_does_nothing() {
    let mut world = StreamingWorld::new(ChunkManager::from_settings(with_candidates(8)).unwrap());
    for _ in 0..5 {
        let update = world.update(None);
        assert!(!update.changed());
    }
    assert!(world.tiles.is_empty());
    assert_eq!(world.pathfinder.scan_count, 0);
}

#[test]
fn missing_grid_graph_still_scans() {
    let mut world = StreamingWorld::new(ChunkManager::from_settings(with_candidates(9)).unwrap());
    world.pathfinder = GridPathfinder::without_grid();
    world.update(Some(0.0));
    assert_eq!(world.pathfinder.scan_count, 2);
    assert!(world.pathfinder.grid.is_none());
}

#[test]
fn empty_prefab_never_selected() {
    let mut settings = GeneratorSettings::with_seed(10);
    settings.placement.ground_tasks = vec![SpawnEntry::new("", 5.0), SpawnEntry::new("rock", 1.0)];
    let generator = ChunkGenerator::new(settings).unwrap();
    let mut world = Collaborators::new();
    let chunk = generator.generate_chunk(0.0, 3, 3, &mut world.access());
    assert!(!chunk
        .placement
        .outcomes
        .iter()
        .any(|o| matches!(o, PlacementOutcome::SpawnFailed | PlacementOutcome::NoCandidate)));
    assert!(chunk.objects.iter().all(|o| o.prefab.as_str() == "rock"));
}

struct RefusingSpawner;

impl ObjectSpawner for RefusingSpawner {
    fn spawn(&mut self, _prefab: &PrefabId, _position: Vec2) -> Option<ObjectHandle> {
        None
    }

    fn despawn(&mut self, _handle: ObjectHandle) {}
}

#[test]
fn spawner_refusal_is_skipped() {
    let generator = ChunkGenerator::new(with_candidates(10)).unwrap();
    let mut tiles = MemoryTilemap::new();
    let blockers = ColliderWorld::new();
    let mut tasks = TaskQueue::new();
    let mut world = WorldAccess {
        tiles: &mut tiles,
        blockers: &blockers,
        spawner: &mut RefusingSpawner,
        tasks: Some(&mut tasks),
    };
    let chunk = generator.generate_chunk(0.0, 3, 3, &mut world);
    assert_eq!(chunk.placement.outcomes.len(), 6);
    assert!(chunk
        .placement
        .outcomes
        .iter()
        .all(|o| matches!(o, PlacementOutcome::SpawnFailed | PlacementOutcome::Blocked { .. })));
    assert!(tasks.is_empty());
}

// ============================================================
// 4. Extreme values
// ============================================================

#[test]
fn extreme_seeds_generate() {
    for seed in [0, 1, u64::MAX] {
        let generator = ChunkGenerator::new(GeneratorSettings::with_seed(seed)).unwrap();
        let mut tiles = MemoryTilemap::new();
        let chunk = generator.generate_terrain(0.0, 3, 3, &mut tiles);
        assert_eq!(chunk.columns().len(), 64);
    }
}

#[test]
fn negative_origin_chunk() {
    let generator = ChunkGenerator::new(with_candidates(11)).unwrap();
    let mut world = Collaborators::new();
    let chunk = generator.generate_chunk(-128.0, 3, 3, &mut world.access());
    assert_eq!(chunk.index, -2);
    assert!(chunk.objects.iter().all(|o| o.x >= -128.0 && o.x < -64.0));
}

#[test]
fn single_cell_chunk() {
    let mut settings = with_candidates(12);
    settings.chunk.width = 1;
    settings.chunk.height = 12;
    settings.placement.density = 1.0;
    let generator = ChunkGenerator::new(settings).unwrap();
    let mut world = Collaborators::new();
    let chunk = generator.generate_chunk(0.0, 3, 3, &mut world.access());
    assert_eq!(chunk.columns().len(), 1);
    assert_eq!(chunk.placement.target, 1);
    for object in &chunk.objects {
        assert!(object.x >= 0.0 && object.x < 1.0);
        assert!((0.0..=12.0).contains(&object.y), "{:?} outside the chunk", object);
    }
}

// ============================================================
// 5. Maximum values
// ============================================================

#[test]
fn max_waviness_rejected_by_validation() {
    let mut settings = GeneratorSettings::with_seed(13);
    settings.terrain.edge_waviness = u32::MAX;
    assert!(matches!(
        ChunkGenerator::new(settings.clone()),
        Err(ProcgenError::InvalidSettings(_))
    ));

    // unvalidated terrain settings still generate in bounds
    let mut rng = rand_xoshiro::Xoshiro256PlusPlus::seed_from_u64(13);
    let profile = generate_profile(&settings.terrain, 64, 18, 3, 3, &mut rng);
    assert!(profile
        .columns
        .iter()
        .all(|c| c.sand_depth + c.grass_depth <= 18));
}

#[test]
fn max_weights_rejected_by_validation() {
    let mut settings = with_candidates(14);
    settings.placement.ground_tasks = vec![
        SpawnEntry::new("a", f32::MAX),
        SpawnEntry::new("b", f32::MAX),
    ];
    assert!(ChunkGenerator::new(settings).is_err());

    let mut settings = with_candidates(14);
    settings.placement.enemies = vec![SpawnEntry::new("slime", f32::INFINITY)];
    assert!(ChunkGenerator::new(settings).is_err());
}

#[test]
fn max_weights_from_ron_rejected() {
    for weight in ["inf", "NaN", "3.4e38"] {
        let text = format!(
            r#"(placement: (ground_tasks: [(prefab: "a", weight: {weight}), (prefab: "b", weight: {weight})]))"#
        );
        assert!(
            GeneratorSettings::from_ron_str(&text).is_err(),
            "weight {weight} accepted"
        );
    }
}

#[test]
fn non_finite_densities_rejected() {
    for density in [f32::NAN, f32::INFINITY] {
        let mut settings = with_candidates(15);
        settings.placement.density = density;
        assert!(settings.validate().is_err(), "placement density {density}");

        let mut settings = with_candidates(15);
        settings.decoration.grass = DecorationBand {
            density,
            tiles: vec![DecorationEntry::new("flower", 1.0)],
        };
        assert!(settings.validate().is_err(), "grass density {density}");
    }
}

#[test]
fn huge_density_bounded_by_chunk_cells() {
    let mut settings = with_candidates(16);
    settings.placement.density = 1e30;
    let generator = ChunkGenerator::new(settings).unwrap();
    let mut world = Collaborators::new();
    let chunk = generator.generate_chunk(0.0, 3, 3, &mut world.access());
    assert_eq!(chunk.placement.target, 64 * 18);
    assert_eq!(chunk.placement.outcomes.len(), 64 * 18);
}

#[test]
fn huge_task_min_x_places_nothing() {
    let mut settings = with_candidates(17);
    settings.placement.task_min_x = f32::MAX;
    let generator = ChunkGenerator::new(settings).unwrap();
    let mut world = Collaborators::new();
    for origin in [0.0, 1e6, -1e6] {
        let chunk = generator.generate_chunk(origin, 3, 3, &mut world.access());
        assert_eq!(chunk.placement.target, 0, "origin {origin}");
    }
    assert_eq!(world.spawner.live_count(), 0);
}

#[test]
fn stream_starts_under_distant_camera() {
    let mut world = StreamingWorld::new(ChunkManager::from_settings(with_candidates(18)).unwrap());
    let update = world.update(Some(1.0e6));
    assert_eq!(update.spawned.len(), 2);
    assert!(update.removed.is_empty());
    let first = world.manager.chunks().next().map(|c| c.origin.x);
    assert_eq!(first, Some((1.0e6f32 / 64.0).floor() * 64.0));
}
