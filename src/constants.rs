//! Centralized constants for the procedural core.
//!
//! Defaults for `GeneratorSettings` live here so the config layer, the
//! generators and the tests agree on one value.

// =====================================================
// Chunk dimensions
// =====================================================

/// Default chunk width in cells
pub const DEFAULT_CHUNK_WIDTH: u32 = 64;

/// Default chunk height in cells
pub const DEFAULT_CHUNK_HEIGHT: u32 = 18;

/// Largest accepted chunk width or height
pub const MAX_CHUNK_DIMENSION: u32 = 4096;

// =====================================================
// Terrain
// =====================================================

/// Columns held at constant depth before the next random step
pub const DEFAULT_MIN_AREA_WIDTH: u32 = 2;

/// Maximum per-step depth change (inclusive, both directions)
pub const DEFAULT_EDGE_WAVINESS: u32 = 1;

/// Default sand/grass depth bounds
pub const DEFAULT_DEPTH_MIN: i32 = 2;
pub const DEFAULT_DEPTH_MAX: i32 = 6;

/// Depths used for the very first chunk of a world
pub const DEFAULT_START_SAND_DEPTH: i32 = 3;
pub const DEFAULT_START_GRASS_DEPTH: i32 = 3;

// =====================================================
// Decoration
// =====================================================

/// Default per-cell decoration chance for every band
pub const DEFAULT_DECORATION_DENSITY: f32 = 0.05;

// =====================================================
// Placement
// =====================================================

/// Default objects per chunk column
pub const DEFAULT_TASK_DENSITY: f32 = 0.1;

/// Minimum vertical distance between a non-enemy task and the water line
pub const DEFAULT_OTHER_TASK_EDGE_OFFSET: f32 = 1.0;

/// Rows at the top of the grass band never used for grass tasks
pub const DEFAULT_GRASS_TOP_BUFFER: u32 = 2;

/// Validity checks per spawn before it is skipped
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 5;

/// Radius of the probe used to detect blockers extending above a point
pub const BLOCKED_AHEAD_RADIUS: f32 = 0.4;

/// A blocker whose bottom edge is above `point.y - tolerance` blocks the point
pub const BLOCKED_AHEAD_TOLERANCE: f32 = 0.1;

// =====================================================
// Streaming
// =====================================================

/// Chunks generated in one tick when the manager is empty
pub const DEFAULT_PRELOAD_CHUNKS: u32 = 2;

/// Vertical center of the pathfinding grid
pub const DEFAULT_PATH_GRID_CENTER_Y: f32 = 9.0;

/// Path grid spans this many chunk widths
pub const PATH_GRID_CHUNK_SPAN: u32 = 2;
