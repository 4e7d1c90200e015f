//! Collaborators of the generator.
//!
//! Everything the generator touches outside its own state goes through the
//! traits here: blocking geometry, object instantiation, the task registry
//! and the pathfinding grid. They are passed in explicitly, never looked up
//! globally. In-memory implementations live in `memory`.

pub mod memory;

use bevy::math::{Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::tilemap::TileSurface;

pub use memory::{ColliderWorld, GridPathfinder, SpawnLedger, TaskQueue};

/// Opaque prefab reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrefabId(pub String);

impl PrefabId {
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Handle to an instantiated object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectHandle(pub u64);

/// Obstruction queries against the blocking layer
pub trait BlockingGeometry {
    /// Does any blocker contain the point?
    fn overlaps_point(&self, point: Vec2) -> bool;

    /// Bounds of every blocker touching the circle
    fn overlapping_circle(&self, center: Vec2, radius: f32) -> Vec<Rect>;
}

/// Instantiates and destroys prefab objects
pub trait ObjectSpawner {
    /// `None` when the prefab cannot be instantiated
    fn spawn(&mut self, prefab: &PrefabId, position: Vec2) -> Option<ObjectHandle>;
    fn despawn(&mut self, handle: ObjectHandle);
}

/// External task scheduler
pub trait TaskRegistry {
    /// Called in ascending world X order within one placement batch
    fn add_placed_task_object(&mut self, handle: ObjectHandle, world_x: f32);
    fn remove_task_object(&mut self, handle: ObjectHandle);
}

/// Pathfinding grid that must be rebuilt after terrain changes
pub trait Pathfinder {
    /// Move and resize the grid. Returns false when no grid graph exists.
    fn recenter_grid(&mut self, center: Vec2, width: u32, height: u32) -> bool;
    /// Full re-scan of the navigation data
    fn scan(&mut self);
}

/// Mutable access to every collaborator a chunk touches.
///
/// `tasks` is optional: without a registry no objects are placed.
pub struct WorldAccess<'a> {
    pub tiles: &'a mut dyn TileSurface,
    pub blockers: &'a dyn BlockingGeometry,
    pub spawner: &'a mut dyn ObjectSpawner,
    pub tasks: Option<&'a mut dyn TaskRegistry>,
}
