//! Cache of computed noise-floor neighbor lists.
//!
//! A noise floor for a seed word is expensive (one embedding round trip plus
//! a scan over the vocabulary), so finished lists are kept under a bounded
//! TTL cache keyed by the normalized seed, its context, and the neighbor
//! count requested.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::sync::Cache;

use crate::config::Config;
use crate::constants::{DEFAULT_NOISE_FLOOR_CAPACITY, DEFAULT_NOISE_FLOOR_TTL_SECS};

/// One nearby vocabulary word and its similarity to the seed.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NeighborScore {
    pub word: String,
    pub similarity: f32,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct NoiseFloorKey {
    seed: String,
    context: Vec<String>,
    k: usize,
}

/// Bounded TTL cache of per-seed neighbor lists.
pub struct NoiseFloorCache {
    inner: Cache<NoiseFloorKey, Arc<Vec<NeighborScore>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl NoiseFloorCache {
    /// Creates a cache with default capacity and TTL.
    pub fn new() -> Self {
        Self::with_limits(
            DEFAULT_NOISE_FLOOR_CAPACITY,
            Duration::from_secs(DEFAULT_NOISE_FLOOR_TTL_SECS),
        )
    }

    /// Creates a cache sized from config.
    pub fn from_config(config: &Config) -> Self {
        Self::with_limits(config.noise_floor_capacity, config.noise_floor_ttl)
    }

    /// Creates a cache with explicit capacity and TTL.
    pub fn with_limits(capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Looks up the neighbor list computed for `(seed, context, k)`.
    pub fn get(&self, seed: &str, context: &[String], k: usize) -> Option<Arc<Vec<NeighborScore>>> {
        let key = Self::key(seed, context, k);
        match self.inner.get(&key) {
            Some(found) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(found)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Stores a finished neighbor list, returning the shared handle.
    pub fn insert(
        &self,
        seed: &str,
        context: &[String],
        k: usize,
        neighbors: Vec<NeighborScore>,
    ) -> Arc<Vec<NeighborScore>> {
        let key = Self::key(seed, context, k);
        let shared = Arc::new(neighbors);
        self.inner.insert(key, shared.clone());
        shared
    }

    /// `(hits, misses)` since construction.
    pub fn counters(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    /// Drops all entries.
    pub fn clear(&self) {
        self.inner.invalidate_all();
    }

    // Context order does not change the result set, so it is sorted into the
    // key to make lookups order-insensitive.
    fn key(seed: &str, context: &[String], k: usize) -> NoiseFloorKey {
        let mut context: Vec<String> = context.iter().map(|c| c.trim().to_lowercase()).collect();
        context.sort();
        NoiseFloorKey {
            seed: seed.trim().to_lowercase(),
            context,
            k,
        }
    }
}

impl Default for NoiseFloorCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NoiseFloorCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (hits, misses) = self.counters();
        f.debug_struct("NoiseFloorCache")
            .field("entries", &self.inner.entry_count())
            .field("hits", &hits)
            .field("misses", &misses)
            .finish()
    }
}
