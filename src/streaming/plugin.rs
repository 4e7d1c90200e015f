//! Bevy integration for chunk streaming.

use bevy::prelude::*;

use super::{ChunkManager, StreamUpdate};
use crate::config::GeneratorSettings;
use crate::error::ProcgenError;
use crate::tilemap::MemoryTilemap;
use crate::world::{ColliderWorld, GridPathfinder, SpawnLedger, TaskQueue, WorldAccess};

pub struct ChunkStreamingPlugin {
    pub settings: GeneratorSettings,
}

impl Plugin for ChunkStreamingPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ChunkSpawnedEvent>()
            .add_event::<ChunkRemovedEvent>()
            .add_systems(Update, stream_chunks);

        match ChunkManager::from_settings(self.settings.clone()) {
            Ok(manager) => {
                app.insert_resource(StreamingWorld::new(manager));
            }
            Err(e) => error!("Chunk streaming disabled: {}", e),
        }
    }
}

/// Marks the entity whose X position drives streaming
#[derive(Component, Debug, Default)]
pub struct StreamCamera;

#[derive(Event, Debug, Clone, PartialEq)]
pub struct ChunkSpawnedEvent {
    pub index: i64,
}

#[derive(Event, Debug, Clone, PartialEq)]
pub struct ChunkRemovedEvent {
    pub index: i64,
}

/// The chunk manager together with the in-memory world it streams into
#[derive(Resource)]
pub struct StreamingWorld {
    pub manager: ChunkManager,
    pub tiles: MemoryTilemap,
    pub blockers: ColliderWorld,
    pub spawner: SpawnLedger,
    pub tasks: TaskQueue,
    pub pathfinder: GridPathfinder,
}

impl StreamingWorld {
    pub fn new(manager: ChunkManager) -> Self {
        Self {
            manager,
            tiles: MemoryTilemap::new(),
            blockers: ColliderWorld::new(),
            spawner: SpawnLedger::new(),
            tasks: TaskQueue::new(),
            pathfinder: GridPathfinder::with_grid(),
        }
    }

    pub fn update(&mut self, camera_x: Option<f32>) -> StreamUpdate {
        let Self {
            manager,
            tiles,
            blockers,
            spawner,
            tasks,
            pathfinder,
        } = self;
        let mut access = WorldAccess {
            tiles,
            blockers: &*blockers,
            spawner,
            tasks: Some(tasks),
        };
        manager.update(camera_x, &mut access, pathfinder)
    }

    /// Apply reloaded settings.
    ///
    /// A change of chunk dimensions restarts the stream, since existing
    /// chunks could no longer line up with new ones.
    pub fn apply_settings(&mut self, settings: GeneratorSettings) -> Result<(), ProcgenError> {
        let dimensions_changed = settings.chunk != self.manager.settings().chunk;
        self.manager.apply_settings(settings)?;
        if dimensions_changed {
            let Self {
                manager,
                tiles,
                blockers,
                spawner,
                tasks,
                ..
            } = self;
            let mut access = WorldAccess {
                tiles,
                blockers: &*blockers,
                spawner,
                tasks: Some(tasks),
            };
            manager.reset(&mut access);
        }
        Ok(())
    }
}

/// System: run one streaming tick from the camera's X position
pub fn stream_chunks(
    world: Option<ResMut<StreamingWorld>>,
    cameras: Query<&Transform, With<StreamCamera>>,
    mut spawned_events: EventWriter<ChunkSpawnedEvent>,
    mut removed_events: EventWriter<ChunkRemovedEvent>,
) {
    let Some(mut world) = world else {
        return;
    };

    let camera_x = cameras.iter().next().map(|t| t.translation.x);
    let update = world.update(camera_x);

    for index in update.spawned {
        spawned_events.send(ChunkSpawnedEvent { index });
    }
    for index in update.removed {
        removed_events.send(ChunkRemovedEvent { index });
    }
}
