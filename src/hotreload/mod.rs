//! Hot reload of generator settings.
//!
//! Watches a RON or JSON settings file with `notify`:
//! - Every change is parsed and validated before it is used
//! - Invalid files are rejected and the previous settings stay active
//! - Accepted settings are applied to the streaming world for chunks
//!   generated afterwards

use bevy::prelude::*;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::sync::{Arc, Mutex};

use crate::config::GeneratorSettings;
use crate::error::ProcgenError;
use crate::streaming::StreamingWorld;

pub struct HotReloadPlugin {
    pub path: PathBuf,
}

impl Plugin for HotReloadPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(HotReloadState {
            watched_file: Some(self.path.clone()),
            ..Default::default()
        })
        .add_event::<SettingsReloadEvent>()
        .add_systems(Startup, setup_settings_watcher)
        .add_systems(Update, process_settings_changes);
    }
}

/// Hot-reload state tracking
#[derive(Resource, Debug, Default)]
pub struct HotReloadState {
    pub enabled: bool,
    pub watched_file: Option<PathBuf>,
    pub reload_count: u32,
    pub last_reload_success: bool,
    pub last_error: Option<String>,
}

#[derive(Event, Debug, Clone)]
pub struct SettingsReloadEvent {
    pub path: PathBuf,
    pub success: bool,
    pub error: Option<String>,
}

/// Result of one reload
#[derive(Debug, Clone, PartialEq)]
pub enum ReloadOutcome {
    Applied(GeneratorSettings),
    Unchanged,
    /// The file was invalid; the previous settings are kept
    Rejected(String),
}

/// Watches one settings file and holds the last valid settings
pub struct SettingsWatcher {
    path: PathBuf,
    _watcher: RecommendedWatcher,
    receiver: Arc<Mutex<Receiver<notify::Result<Event>>>>,
    current: GeneratorSettings,
}

impl SettingsWatcher {
    /// Load the file once and start watching its directory
    pub fn watch(path: impl AsRef<Path>) -> Result<Self, ProcgenError> {
        let path = path.as_ref().to_path_buf();
        let current = GeneratorSettings::load(&path)?;

        let (tx, rx) = channel();
        let mut watcher = notify::recommended_watcher(tx)?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        info!("Hot-reload enabled for {:?}", path);
        Ok(Self {
            path,
            _watcher: watcher,
            receiver: Arc::new(Mutex::new(rx)),
            current,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current(&self) -> &GeneratorSettings {
        &self.current
    }

    /// Drain pending filesystem events and reload once if any touched the
    /// watched file
    pub fn poll(&mut self) -> Option<ReloadOutcome> {
        let mut touched = false;
        {
            let Ok(receiver) = self.receiver.lock() else {
                warn!("Settings watcher channel poisoned");
                return None;
            };
            while let Ok(result) = receiver.try_recv() {
                match result {
                    Ok(event) => touched |= is_settings_event(&event, &self.path),
                    Err(e) => warn!("File watcher error: {}", e),
                }
            }
        }
        touched.then(|| self.reload())
    }

    /// Re-read the file now
    pub fn reload(&mut self) -> ReloadOutcome {
        match GeneratorSettings::load(&self.path) {
            Ok(settings) if settings == self.current => ReloadOutcome::Unchanged,
            Ok(settings) => {
                self.current = settings.clone();
                ReloadOutcome::Applied(settings)
            }
            Err(e) => ReloadOutcome::Rejected(e.to_string()),
        }
    }
}

/// Check if event is a modification or creation of the watched file
fn is_settings_event(event: &Event, watched: &Path) -> bool {
    let Some(name) = watched.file_name() else {
        return false;
    };
    (event.kind.is_modify() || event.kind.is_create())
        && event.paths.iter().any(|p| p.file_name() == Some(name))
}

#[derive(Resource)]
struct WatcherResource(SettingsWatcher);

fn setup_settings_watcher(mut commands: Commands, mut state: ResMut<HotReloadState>) {
    let Some(path) = state.watched_file.clone() else {
        return;
    };

    match SettingsWatcher::watch(&path) {
        Ok(watcher) => {
            state.enabled = true;
            commands.insert_resource(WatcherResource(watcher));
        }
        Err(e) => {
            warn!("Hot-reload disabled for {:?}: {}", path, e);
            state.enabled = false;
        }
    }
}

fn process_settings_changes(
    watcher: Option<ResMut<WatcherResource>>,
    world: Option<ResMut<StreamingWorld>>,
    mut state: ResMut<HotReloadState>,
    mut events: EventWriter<SettingsReloadEvent>,
) {
    let Some(mut watcher) = watcher else {
        return;
    };
    let Some(outcome) = watcher.0.poll() else {
        return;
    };
    let path = watcher.0.path().to_path_buf();

    let result = match outcome {
        ReloadOutcome::Unchanged => return,
        ReloadOutcome::Applied(settings) => match world {
            Some(mut world) => world
                .apply_settings(settings)
                .map_err(|e| e.to_string()),
            None => Ok(()),
        },
        ReloadOutcome::Rejected(e) => Err(e),
    };

    match result {
        Ok(()) => {
            state.reload_count += 1;
            state.last_reload_success = true;
            state.last_error = None;
            info!("Settings reloaded (count: {})", state.reload_count);
            events.send(SettingsReloadEvent {
                path,
                success: true,
                error: None,
            });
        }
        Err(e) => {
            state.last_reload_success = false;
            state.last_error = Some(e.clone());
            error!("Settings reload failed, keeping previous settings: {}", e);
            events.send(SettingsReloadEvent {
                path,
                success: false,
                error: Some(e),
            });
        }
    }
}
