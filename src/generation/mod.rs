//! Procedural chunk generation.
//!
//! A chunk is built in one synchronous pass:
//! - `terrain`: per-column sand/grass depths from a clamped random walk
//! - `chunk`: paints water/sand/grass bands onto the tile surface
//! - `decoration`: positional-hash decoration of band interiors
//! - `placement`: enemies and tasks sampled, validated and instantiated
//! - `weighted`: the weighted selector shared by decoration and placement
//!
//! Every chunk gets its own RNG streams derived from the world seed and the
//! chunk index, so regenerating a chunk reproduces it exactly.

pub mod chunk;
pub mod decoration;
pub mod placement;
pub mod terrain;
pub mod weighted;

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use crate::config::SeedMode;

pub use chunk::{Chunk, ChunkGenerator, ChunkSnapshot};
pub use terrain::{Band, TerrainColumn, TerrainProfile};

/// RNG used by every seeded stream
pub type ChunkRng = Xoshiro256PlusPlus;

/// Independent random streams of one chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RngStream {
    Terrain,
    Placement,
}

impl RngStream {
    fn tag(&self) -> u8 {
        match self {
            RngStream::Terrain => 1,
            RngStream::Placement => 2,
        }
    }
}

/// World seed - the root of all chunk randomness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSeed {
    pub seed: u64,
}

impl WorldSeed {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Resolve a seed mode; `Random` draws from the process RNG once
    pub fn from_mode(mode: SeedMode) -> Self {
        match mode {
            SeedMode::Fixed(seed) => Self::new(seed),
            SeedMode::Random => Self::new(rand::random()),
        }
    }

    /// Deterministic seed for one stream of one chunk
    pub fn stream_seed(&self, chunk_index: i64, stream: RngStream) -> u64 {
        let mut hasher = Sha3_256::new();
        hasher.update(self.seed.to_le_bytes());
        hasher.update(chunk_index.to_le_bytes());
        hasher.update([stream.tag()]);
        let result = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&result[0..8]);
        u64::from_le_bytes(bytes)
    }

    pub fn rng(&self, chunk_index: i64, stream: RngStream) -> ChunkRng {
        ChunkRng::seed_from_u64(self.stream_seed(chunk_index, stream))
    }
}
