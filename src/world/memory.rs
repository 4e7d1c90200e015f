//! In-memory collaborators.
//!
//! Used by the Bevy streaming plugin in headless runs and by every test.

use std::collections::BTreeMap;

use bevy::math::{Rect, Vec2};
use tracing::debug;

use super::{BlockingGeometry, ObjectHandle, ObjectSpawner, Pathfinder, PrefabId, TaskRegistry};

/// Axis-aligned blockers
#[derive(Debug, Clone, Default)]
pub struct ColliderWorld {
    pub blockers: Vec<Rect>,
}

impl ColliderWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_blocker(&mut self, rect: Rect) {
        self.blockers.push(rect);
    }

    pub fn clear(&mut self) {
        self.blockers.clear();
    }
}

impl BlockingGeometry for ColliderWorld {
    fn overlaps_point(&self, point: Vec2) -> bool {
        self.blockers.iter().any(|r| r.contains(point))
    }

    fn overlapping_circle(&self, center: Vec2, radius: f32) -> Vec<Rect> {
        self.blockers
            .iter()
            .filter(|r| center.clamp(r.min, r.max).distance_squared(center) <= radius * radius)
            .copied()
            .collect()
    }
}

/// A live object created through `SpawnLedger`
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRecord {
    pub prefab: PrefabId,
    pub position: Vec2,
}

/// Records spawned objects by handle
#[derive(Debug, Clone, Default)]
pub struct SpawnLedger {
    next_handle: u64,
    live: BTreeMap<ObjectHandle, SpawnRecord>,
    pub total_spawned: u64,
    pub total_despawned: u64,
}

impl SpawnLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn get(&self, handle: ObjectHandle) -> Option<&SpawnRecord> {
        self.live.get(&handle)
    }

    pub fn live(&self) -> impl Iterator<Item = (&ObjectHandle, &SpawnRecord)> {
        self.live.iter()
    }
}

impl ObjectSpawner for SpawnLedger {
    fn spawn(&mut self, prefab: &PrefabId, position: Vec2) -> Option<ObjectHandle> {
        if prefab.as_str().is_empty() {
            return None;
        }
        self.next_handle += 1;
        let handle = ObjectHandle(self.next_handle);
        self.live.insert(
            handle,
            SpawnRecord {
                prefab: prefab.clone(),
                position,
            },
        );
        self.total_spawned += 1;
        Some(handle)
    }

    fn despawn(&mut self, handle: ObjectHandle) {
        if self.live.remove(&handle).is_some() {
            self.total_despawned += 1;
        }
    }
}

/// Task registry that keeps registration order
#[derive(Debug, Clone, Default)]
pub struct TaskQueue {
    pub tasks: Vec<(ObjectHandle, f32)>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, handle: ObjectHandle) -> bool {
        self.tasks.iter().any(|(h, _)| *h == handle)
    }
}

impl TaskRegistry for TaskQueue {
    fn add_placed_task_object(&mut self, handle: ObjectHandle, world_x: f32) {
        self.tasks.push((handle, world_x));
    }

    fn remove_task_object(&mut self, handle: ObjectHandle) {
        self.tasks.retain(|(h, _)| *h != handle);
    }
}

/// Current placement of a grid graph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPlacement {
    pub center: Vec2,
    pub width: u32,
    pub height: u32,
}

/// Pathfinder stand-in that records recenters and scans
#[derive(Debug, Clone, Default)]
pub struct GridPathfinder {
    /// `None` simulates a pathfinder without a grid graph
    pub grid: Option<GridPlacement>,
    pub scan_count: u32,
}

impl GridPathfinder {
    pub fn with_grid() -> Self {
        Self {
            grid: Some(GridPlacement {
                center: Vec2::ZERO,
                width: 0,
                height: 0,
            }),
            scan_count: 0,
        }
    }

    pub fn without_grid() -> Self {
        Self::default()
    }
}

impl Pathfinder for GridPathfinder {
    fn recenter_grid(&mut self, center: Vec2, width: u32, height: u32) -> bool {
        let Some(grid) = self.grid.as_mut() else {
            return false;
        };
        grid.center = center;
        grid.width = width;
        grid.height = height;
        true
    }

    fn scan(&mut self) {
        self.scan_count += 1;
        debug!(scans = self.scan_count, "Path grid scanned");
    }
}
