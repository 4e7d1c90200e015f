//! Headless streaming run.
//!
//! `vasteria-stream [settings.ron|settings.json] [frames]`
//!
//! Scrolls a camera to the right for a fixed number of frames and logs every
//! chunk spawned and removed. Without a path, `config/generator.ron` is used
//! when present, otherwise default settings. A settings file is hot-reloaded.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bevy::prelude::*;

use vasteria_core::config::GeneratorSettings;
use vasteria_core::hotreload::HotReloadPlugin;
use vasteria_core::logging::{init_tracing, TracingConfig};
use vasteria_core::streaming::{
    ChunkRemovedEvent, ChunkSpawnedEvent, ChunkStreamingPlugin, StreamCamera, StreamingWorld,
};

const DEFAULT_SETTINGS_PATH: &str = "config/generator.ron";
const DEFAULT_RUN_FRAMES: u32 = 600;
/// World units the camera moves per frame
const CAMERA_SPEED: f32 = 4.0;

#[derive(Resource)]
struct ScriptedRun {
    frames_left: u32,
}

fn main() -> Result<()> {
    init_tracing(&TracingConfig::default());

    let mut args = std::env::args().skip(1);
    let settings_path = args.next().map(PathBuf::from).or_else(|| {
        let fallback = PathBuf::from(DEFAULT_SETTINGS_PATH);
        fallback.exists().then_some(fallback)
    });
    let frames = match args.next() {
        Some(raw) => raw
            .parse::<u32>()
            .with_context(|| format!("frame count must be a number, got {raw:?}"))?,
        None => DEFAULT_RUN_FRAMES,
    };

    let settings = match &settings_path {
        Some(path) => GeneratorSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => {
            info!("No settings file, using defaults");
            GeneratorSettings::default()
        }
    };

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(ChunkStreamingPlugin { settings })
        .insert_resource(ScriptedRun {
            frames_left: frames,
        })
        .add_systems(Startup, spawn_camera)
        .add_systems(Update, (move_camera, log_chunk_events, finish_run));
    if let Some(path) = settings_path {
        app.add_plugins(HotReloadPlugin { path });
    }

    match app.run() {
        AppExit::Success => Ok(()),
        AppExit::Error(code) => anyhow::bail!("streaming run exited with code {code}"),
    }
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn((StreamCamera, Transform::default()));
}

fn move_camera(mut cameras: Query<&mut Transform, With<StreamCamera>>) {
    for mut transform in &mut cameras {
        transform.translation.x += CAMERA_SPEED;
    }
}

fn log_chunk_events(
    mut spawned: EventReader<ChunkSpawnedEvent>,
    mut removed: EventReader<ChunkRemovedEvent>,
    world: Option<Res<StreamingWorld>>,
) {
    let Some(world) = world else {
        return;
    };
    for event in spawned.read() {
        let objects = world
            .manager
            .chunks()
            .find(|c| c.index == event.index)
            .map_or(0, |c| c.objects.len());
        info!(index = event.index, objects, "Spawned chunk");
    }
    for event in removed.read() {
        info!(index = event.index, "Removed chunk");
    }
}

fn finish_run(
    mut run: ResMut<ScriptedRun>,
    world: Option<Res<StreamingWorld>>,
    mut exit: EventWriter<AppExit>,
) {
    run.frames_left = run.frames_left.saturating_sub(1);
    if run.frames_left > 0 {
        return;
    }

    if let Some(world) = world {
        let stats = world.manager.stats();
        info!(
            chunks_spawned = stats.chunks_spawned,
            chunks_removed = stats.chunks_removed,
            objects_placed = stats.objects_placed,
            placements_skipped = stats.placements_skipped,
            live_objects = world.spawner.live_count(),
            tasks = world.tasks.len(),
            tiles = world.tiles.len(),
            "Streaming run finished"
        );
    }
    exit.send(AppExit::Success);
}
