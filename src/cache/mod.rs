//! Process-wide caches: embeddings, vocabulary, noise floors, and null
//! distributions. Each cache owns its own lock; no lock is held across a
//! provider call or another cache's lock.

pub mod embedding;
pub mod noise_floor;
pub mod stats;
pub mod vocabulary;

#[cfg(test)]
mod embedding_tests;
#[cfg(test)]
mod vocabulary_tests;

pub use embedding::{CacheStats, EmbeddingCache};
pub use noise_floor::{NeighborScore, NoiseFloorCache};
pub use stats::{StatsCache, StatsCacheStats};
pub use vocabulary::{FALLBACK_WORDS, PoolStats, VocabularyPool};
