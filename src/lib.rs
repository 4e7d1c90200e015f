//! Echoes of Vasteria - Procedural Core Library
//!
//! Side-scrolling world generation for an idle adventure map:
//! - Chunk terrain profiles (water, sand and grass bands from a random walk)
//! - Positional-hash decoration of band interiors
//! - Weighted enemy and task placement with collision validation
//! - Camera-driven chunk streaming with path grid refresh
//! - Settings in RON/JSON with hot reload
//!
//! Collaborators (tile surface, blocking geometry, spawner, task registry,
//! pathfinder) are traits passed in explicitly; in-memory versions back the
//! Bevy plugin and the tests.

pub mod config;
pub mod constants;
pub mod error;
pub mod generation;
pub mod hotreload;
pub mod logging;
pub mod streaming;
pub mod tilemap;
pub mod world;

pub use config::GeneratorSettings;
pub use error::ProcgenError;
pub use generation::{Chunk, ChunkGenerator, WorldSeed};
pub use streaming::{ChunkManager, ChunkStreamingPlugin};
